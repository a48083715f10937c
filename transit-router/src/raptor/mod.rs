//! Range-RAPTOR journey search.
//!
//! This module answers: "leaving the origin inside this time window,
//! which journeys reach the destination?" It runs a round-based search
//! per departure time, where round `k` finds the best arrivals with
//! `k - 1` transfers, and keeps the pareto-optimal paths over departure
//! time, arrival time and number of transfers.

mod boarding;
mod calculator;
mod config;
mod constrained;
mod pareto;
mod round;
mod slack;
mod state;
mod trip_search;
mod worker;


pub use boarding::{
    BoardingEvent, IterationState, PatternBoarding, TimeBasedBoardingSupport, TransitArrival,
};
pub use calculator::{SearchDirection, TransitCalculator};
pub use config::{ConfigError, RaptorConfig, SlackConfig, SlackOverride};
pub use constrained::{
    ConstrainedBoarding, ConstrainedBoardingSearch, ConstrainedTransfer,
    ConstrainedTransferSearch, TransferPoint, TransferService,
};
pub use pareto::ParetoSet;
pub use round::RoundTracker;
pub use slack::{DefaultSlackProvider, SlackProvider};
pub use trip_search::{ExactTripSearch, TripAlightSearch, TripBoardSearch, TripBoarding, TripSearch};
pub use worker::{RangeRaptorWorker, RaptorError, RaptorRequest, RaptorResponse};
