//! Per-request search state: stop arrivals by round and marked stops.
//!
//! Arrivals are immutable and link to their predecessor, so a path can
//! always be rebuilt exactly as it was found, even after later
//! iterations improve the labels it started from.

use std::rc::Rc;
use std::sync::Arc;

use chrono::Duration;
use fixedbitset::FixedBitSet;

use super::boarding::TransitArrival;
use crate::domain::{StopIndex, StopPos, TransferConstraint, TransitTime, TripSchedule};

/// How a stop was reached.
#[derive(Debug)]
pub(crate) enum ArrivalKind {
    Access {
        access: usize,
        departure_time: TransitTime,
    },
    Transit {
        prev: Rc<StopArrival>,
        trip: Arc<TripSchedule>,
        board_pos: StopPos,
        alight_pos: StopPos,
        constraint: Option<TransferConstraint>,
    },
    Transfer {
        prev: Rc<StopArrival>,
        walk: Duration,
    },
}

/// Best known arrival at a stop in one round.
#[derive(Debug)]
pub(crate) struct StopArrival {
    pub stop: StopIndex,
    pub time: TransitTime,
    pub kind: ArrivalKind,
}

impl StopArrival {
    /// The transit leg this arrival ends, looking through a walking transfer.
    pub fn transit_arrival(&self) -> Option<TransitArrival> {
        match &self.kind {
            ArrivalKind::Access { .. } => None,
            ArrivalKind::Transit { trip, .. } => Some(TransitArrival {
                trip: Arc::clone(trip),
                stop: self.stop,
                arrival_time: self.time,
            }),
            ArrivalKind::Transfer { prev, .. } => prev.transit_arrival(),
        }
    }
}

/// Arrivals for every round, kept across iterations.
pub(crate) struct SearchState {
    rounds: Vec<Vec<Option<Rc<StopArrival>>>>,
    /// Stops reached in the previous round of this iteration.
    marked_prev: FixedBitSet,
    /// Stops reached in the current round of this iteration.
    marked: FixedBitSet,
    /// Stops reached by transit in the current round.
    transit_marked: FixedBitSet,
}

impl SearchState {
    /// State for `number_of_stops` stops and rounds `0..=max_rounds`.
    pub fn new(number_of_stops: usize, max_rounds: usize) -> Self {
        Self {
            rounds: vec![vec![None; number_of_stops]; max_rounds + 1],
            marked_prev: FixedBitSet::with_capacity(number_of_stops),
            marked: FixedBitSet::with_capacity(number_of_stops),
            transit_marked: FixedBitSet::with_capacity(number_of_stops),
        }
    }

    /// Start a new iteration: nothing is marked, arrivals are kept.
    pub fn start_iteration(&mut self) {
        self.marked_prev.clear();
        self.marked.clear();
        self.transit_marked.clear();
    }

    /// Move to the next round: current marks become previous marks.
    pub fn start_round(&mut self) {
        std::mem::swap(&mut self.marked_prev, &mut self.marked);
        self.marked.clear();
        self.transit_marked.clear();
    }

    pub fn is_round_empty(&self) -> bool {
        self.marked_prev.is_clear()
    }

    pub fn arrival(&self, round: usize, stop: StopIndex) -> Option<&Rc<StopArrival>> {
        self.rounds[round][stop.0].as_ref()
    }

    /// Stops reached in the previous round.
    pub fn marked_prev(&self) -> impl Iterator<Item = StopIndex> + '_ {
        self.marked_prev.ones().map(StopIndex)
    }

    pub fn is_marked_prev(&self, stop: StopIndex) -> bool {
        self.marked_prev.contains(stop.0)
    }

    /// Returns true if `stop` was reached in the current round.
    pub fn is_marked(&self, stop: StopIndex) -> bool {
        self.marked.contains(stop.0)
    }

    pub fn marked_count(&self) -> usize {
        self.marked.count_ones(..)
    }

    /// Stops reached by transit in the current round.
    pub fn transit_marked(&self) -> Vec<StopIndex> {
        self.transit_marked.ones().map(StopIndex).collect()
    }

    /// Best arrival time at `stop` over rounds `0..=round`.
    ///
    /// An arrival in a later round is only useful if it beats all of
    /// these, as it uses more transfers.
    fn best_time(&self, round: usize, stop: StopIndex) -> Option<TransitTime> {
        self.rounds[..=round]
            .iter()
            .filter_map(|arrivals| arrivals[stop.0].as_ref().map(|a| a.time))
            .min()
    }

    /// Record an arrival if it improves on every arrival with at most as
    /// many transfers. Returns true if it was recorded.
    pub fn try_update(&mut self, round: usize, arrival: StopArrival) -> bool {
        let stop = arrival.stop;
        if self
            .best_time(round, stop)
            .is_some_and(|best| best <= arrival.time)
        {
            return false;
        }

        if matches!(arrival.kind, ArrivalKind::Transit { .. }) {
            self.transit_marked.insert(stop.0);
        }
        self.marked.insert(stop.0);
        self.rounds[round][stop.0] = Some(Rc::new(arrival));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access(stop: usize, time: &str) -> StopArrival {
        StopArrival {
            stop: StopIndex(stop),
            time: TransitTime::parse(time).unwrap(),
            kind: ArrivalKind::Access {
                access: 0,
                departure_time: TransitTime::parse(time).unwrap(),
            },
        }
    }

    fn transfer(prev: &Rc<StopArrival>, stop: usize, time: &str) -> StopArrival {
        StopArrival {
            stop: StopIndex(stop),
            time: TransitTime::parse(time).unwrap(),
            kind: ArrivalKind::Transfer {
                prev: Rc::clone(prev),
                walk: Duration::minutes(1),
            },
        }
    }

    #[test]
    fn only_improvements_are_kept() {
        let mut state = SearchState::new(3, 2);

        assert!(state.try_update(0, access(1, "10:00")));
        assert!(!state.try_update(0, access(1, "10:00")));
        assert!(state.try_update(0, access(1, "09:59")));
        assert_eq!(state.arrival(0, StopIndex(1)).unwrap().time.to_string(), "09:59");

        // A later round must beat the earlier rounds too
        let prev = Rc::clone(state.arrival(0, StopIndex(1)).unwrap());
        assert!(!state.try_update(1, transfer(&prev, 1, "10:05")));
        assert!(state.try_update(1, transfer(&prev, 2, "10:05")));
    }

    #[test]
    fn marks_move_between_rounds() {
        let mut state = SearchState::new(3, 2);
        state.start_iteration();
        state.try_update(0, access(2, "10:00"));
        assert!(state.is_marked(StopIndex(2)));
        assert_eq!(state.marked_count(), 1);
        assert!(state.transit_marked().is_empty());

        state.start_round();
        assert!(state.is_marked_prev(StopIndex(2)));
        assert!(!state.is_round_empty());
        assert_eq!(state.marked_count(), 0);

        state.start_round();
        assert!(state.is_round_empty());
    }

    #[test]
    fn transit_arrival_through_transfer() {
        use crate::domain::TripPattern;

        let stops = vec![StopIndex(0), StopIndex(1)];
        let pattern = Arc::new(TripPattern::new("AB", stops, 0).unwrap());
        let times = vec![TransitTime::hms(10, 0, 0), TransitTime::hms(10, 10, 0)];
        let trip = Arc::new(TripSchedule::with_times("T1", pattern, times).unwrap());

        let origin = Rc::new(access(0, "09:58"));
        let ride = Rc::new(StopArrival {
            stop: StopIndex(1),
            time: TransitTime::hms(10, 10, 30),
            kind: ArrivalKind::Transit {
                prev: Rc::clone(&origin),
                trip: Arc::clone(&trip),
                board_pos: StopPos(0),
                alight_pos: StopPos(1),
                constraint: None,
            },
        });
        let walk = transfer(&ride, 2, "10:12");

        assert_eq!(origin.transit_arrival(), None);
        let arrival = walk.transit_arrival().unwrap();
        assert_eq!(arrival.trip.id(), "T1");
        assert_eq!(arrival.stop, StopIndex(1));
        assert_eq!(arrival.arrival_time, TransitTime::hms(10, 10, 30));
    }
}
