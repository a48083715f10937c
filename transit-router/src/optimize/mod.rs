//! Transfer optimization of found paths.
//!
//! The range search keeps only departure time, arrival time and number
//! of transfers, so the transfer points of a path are whatever the search
//! happened to find first. This module revisits every path, enumerates
//! all valid transfer points between consecutive trips, and picks the
//! best combination under transfer priority, wait-time and generalized
//! cost, while still passing through the requested pass-through points.

mod config;
mod configure;
mod cost;
mod filter;
mod filter_chain;
mod generator;
mod pass_through_filter;
mod path_service;
mod service;

pub use config::{CostConfig, TransferOptimizationParameters};
pub use configure::TransferOptimizationConfigurator;
pub use cost::{
    GeneralizedCostCalculator, MinSafeTransferTimeCalculator, TransferWaitTimeCostCalculator,
};
pub use filter::TransferFilter;
pub use filter_chain::{MinCostFilterChain, OptimizedPathTail};
pub use generator::TransferGenerator;
pub use pass_through_filter::PassThroughPointFilter;
pub use path_service::OptimizePathService;
pub use service::OptimizeTransferService;

/// Error from optimizing the transfers of one path.
///
/// Both variants are internal faults; the caller keeps the path as the
/// search found it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptimizeError {
    /// No transfer candidate is left between two trips
    #[error("no transfer candidates at trip boundary {boundary}")]
    EmptyTransfers { boundary: usize },

    /// Transfer lists do not line up with the trips of the path
    #[error("{segments} trip segments do not match {transfers} transfer lists")]
    MismatchedLengths { segments: usize, transfers: usize },
}
