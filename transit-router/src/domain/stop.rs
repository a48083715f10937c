//! Stop and stop-position index types.

use std::fmt;

/// Dense index of a physical stop, unique within one set of transit data.
///
/// The index carries no meaning beyond being an array offset, so it is
/// used directly to address per-stop state during a search.
///
/// # Examples
///
/// ```
/// use transit_router::domain::StopIndex;
///
/// let stop = StopIndex(3);
/// assert_eq!(stop.0, 3);
/// assert_eq!(stop.to_string(), "3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopIndex(pub usize);

impl fmt::Display for StopIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a stop within a pattern's stop sequence.
///
/// Used instead of `StopIndex` wherever a pattern may visit the same stop
/// twice (loops), so a boarding or alighting point is never ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopPos(pub usize);

impl StopPos {
    /// Returns the next position.
    pub fn next(self) -> Self {
        StopPos(self.0 + 1)
    }

    /// Returns the previous position, if any.
    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(StopPos)
    }
}

impl fmt::Display for StopPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
