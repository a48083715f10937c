//! Domain error types.
//!
//! These errors represent validation failures while building timetable
//! data. They are distinct from search and optimization errors, and are
//! only ever raised at setup time.

use super::StopIndex;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A pass-through point must name at least one stop
    #[error("a pass-through point requires at least one stop")]
    EmptyPassThroughPoint,

    /// Stop index is outside the stops known to the transit data
    #[error("stop index {0} is out of bounds")]
    UnknownStop(StopIndex),

    /// Pattern has fewer than two stops
    #[error("pattern {0} must have at least two stops")]
    PatternTooShort(String),

    /// Trip times do not line up with the pattern stops
    #[error("trip {trip} has {times} times but the pattern has {stops} stops")]
    TimesMismatch {
        trip: String,
        times: usize,
        stops: usize,
    },

    /// Trip times go backwards
    #[error("trip {trip} has decreasing times at stop position {pos}")]
    DecreasingTimes { trip: String, pos: usize },

    /// Two trips of one pattern overtake each other
    #[error("trips {0} and {1} overtake each other")]
    OvertakingTrips(String, String),

    /// Trip was added to a timetable for another pattern
    #[error("trip {trip} does not belong to pattern {pattern}")]
    ForeignTrip { trip: String, pattern: String },
}
