//! Round counter for one search iteration.

/// Tracks the current round of an iteration.
///
/// Round 0 is the access phase; round `k >= 1` boards the `k`-th trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundTracker {
    round: usize,
}

impl RoundTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round(&self) -> usize {
        self.round
    }

    /// Returns true in the round boarding the first trip.
    pub fn is_first_round(&self) -> bool {
        self.round == 1
    }

    /// Advance to the next round and return its number.
    pub fn next_round(&mut self) -> usize {
        self.round += 1;
        self.round
    }

    /// Back to the access phase, at the start of an iteration.
    pub fn reset(&mut self) {
        self.round = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_rounds() {
        let mut rounds = RoundTracker::new();
        assert_eq!(rounds.round(), 0);
        assert!(!rounds.is_first_round());

        assert_eq!(rounds.next_round(), 1);
        assert!(rounds.is_first_round());

        rounds.next_round();
        assert!(!rounds.is_first_round());

        rounds.reset();
        assert_eq!(rounds, RoundTracker::new());
    }
}
