//! Trip pattern type.

use super::{DomainError, StopIndex, StopPos};

/// An ordered sequence of stops shared by all trips of one timetable.
///
/// # Invariants
///
/// - At least two stops
/// - Immutable once built; shared between trips via `Arc`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripPattern {
    name: String,
    stops: Vec<StopIndex>,
    slack_index: usize,
}

impl TripPattern {
    /// Construct a pattern, rejecting patterns with fewer than two stops.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_router::domain::{StopIndex, StopPos, TripPattern};
    ///
    /// let pattern = TripPattern::new("Line 1", vec![StopIndex(4), StopIndex(7)], 0).unwrap();
    /// assert_eq!(pattern.stop_index(StopPos(1)), StopIndex(7));
    ///
    /// assert!(TripPattern::new("Stub", vec![StopIndex(4)], 0).is_err());
    /// ```
    pub fn new(
        name: impl Into<String>,
        stops: Vec<StopIndex>,
        slack_index: usize,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if stops.len() < 2 {
            return Err(DomainError::PatternTooShort(name));
        }
        Ok(Self {
            name,
            stops,
            slack_index,
        })
    }

    /// Returns the pattern name, used for logging.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stop at a position.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is not a position of this pattern.
    pub fn stop_index(&self, pos: StopPos) -> StopIndex {
        self.stops[pos.0]
    }

    pub fn number_of_stops(&self) -> usize {
        self.stops.len()
    }

    /// Returns the position of the last stop.
    pub fn last_pos(&self) -> StopPos {
        StopPos(self.stops.len() - 1)
    }

    /// Key used to look up board and alight slack for this pattern.
    pub fn slack_index(&self) -> usize {
        self.slack_index
    }

    pub fn stops(&self) -> &[StopIndex] {
        &self.stops
    }

    /// Find the first position at or after `start` visiting `stop`.
    pub fn find_stop_position_after(&self, start: StopPos, stop: StopIndex) -> Option<StopPos> {
        self.stops
            .iter()
            .enumerate()
            .skip(start.0)
            .find(|(_, s)| **s == stop)
            .map(|(pos, _)| StopPos(pos))
    }

    /// All positions visiting `stop`, in travel order.
    pub fn positions_of(&self, stop: StopIndex) -> impl Iterator<Item = StopPos> + '_ {
        self.stops
            .iter()
            .enumerate()
            .filter(move |(_, s)| **s == stop)
            .map(|(pos, _)| StopPos(pos))
    }

    /// Returns true if the pattern visits `stop` anywhere.
    pub fn serves(&self, stop: StopIndex) -> bool {
        self.stops.contains(&stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loop_pattern() -> TripPattern {
        TripPattern::new(
            "Loop",
            vec![StopIndex(1), StopIndex(2), StopIndex(3), StopIndex(1)],
            2,
        )
        .unwrap()
    }

    #[test]
    fn accessors() {
        let pattern = loop_pattern();
        assert_eq!(pattern.name(), "Loop");
        assert_eq!(pattern.number_of_stops(), 4);
        assert_eq!(pattern.last_pos(), StopPos(3));
        assert_eq!(pattern.slack_index(), 2);
        assert_eq!(pattern.stop_index(StopPos(2)), StopIndex(3));
    }

    #[test]
    fn find_position_in_loop() {
        let pattern = loop_pattern();
        assert_eq!(
            pattern.find_stop_position_after(StopPos(0), StopIndex(1)),
            Some(StopPos(0))
        );
        assert_eq!(
            pattern.find_stop_position_after(StopPos(1), StopIndex(1)),
            Some(StopPos(3))
        );
        assert_eq!(
            pattern.find_stop_position_after(StopPos(0), StopIndex(9)),
            None
        );
        let positions: Vec<_> = pattern.positions_of(StopIndex(1)).collect();
        assert_eq!(positions, vec![StopPos(0), StopPos(3)]);
    }

    #[test]
    fn reject_short_pattern() {
        assert_eq!(
            TripPattern::new("Empty", vec![], 0),
            Err(DomainError::PatternTooShort("Empty".into()))
        );
    }
}
