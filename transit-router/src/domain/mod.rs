//! Domain types for the transit router.
//!
//! This module contains the core domain model types that represent
//! validated timetable data. All types enforce their invariants at
//! construction time, so code that receives these types can trust their
//! validity.

mod error;
mod pass_through;
mod path;
mod pattern;
mod stop;
mod time;
mod timetable;
mod transfer;
mod trip;

pub use error::DomainError;
pub use pass_through::PassThroughPoint;
pub use path::{AccessEgress, OptimizedPath, TransitLeg, TransitPath};
pub use pattern::TripPattern;
pub use stop::{StopIndex, StopPos};
pub use time::{TimeError, TransitTime};
pub use timetable::{Timetable, TransitData, Walk};
pub use transfer::{TransferConstraint, TripStopTime, TripToTripTransfer};
pub use trip::TripSchedule;
