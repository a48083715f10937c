//! Direction-aware time arithmetic.
//!
//! All search code goes through a `TransitCalculator` so the same logic
//! works for a forward (depart-after) and a reverse (arrive-before)
//! search.

use chrono::Duration;

use super::slack::SlackProvider;
use super::trip_search::{ExactTripSearch, TripAlightSearch, TripBoardSearch, TripSearch};
use crate::domain::{AccessEgress, StopPos, Timetable, TransitTime, TripPattern, TripSchedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    /// Depart after a time, minimize arrival.
    Forward,
    /// Arrive before a time, maximize departure.
    Reverse,
}

/// Time arithmetic for one search direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitCalculator {
    direction: SearchDirection,
    iteration_step: Duration,
}

impl TransitCalculator {
    pub fn new(direction: SearchDirection, iteration_step: Duration) -> Self {
        Self {
            direction,
            iteration_step,
        }
    }

    pub fn forward(iteration_step: Duration) -> Self {
        Self::new(SearchDirection::Forward, iteration_step)
    }

    pub fn reverse(iteration_step: Duration) -> Self {
        Self::new(SearchDirection::Reverse, iteration_step)
    }

    pub fn direction(&self) -> SearchDirection {
        self.direction
    }

    pub fn iteration_step(&self) -> Duration {
        self.iteration_step
    }

    /// Move `time` forward in search direction.
    pub fn plus_duration(&self, time: TransitTime, duration: Duration) -> TransitTime {
        match self.direction {
            SearchDirection::Forward => time + duration,
            SearchDirection::Reverse => time - duration,
        }
    }

    /// Move `time` backward in search direction.
    pub fn minus_duration(&self, time: TransitTime, duration: Duration) -> TransitTime {
        match self.direction {
            SearchDirection::Forward => time - duration,
            SearchDirection::Reverse => time + duration,
        }
    }

    /// Returns true if `candidate` is strictly better than `current`.
    pub fn is_better(&self, candidate: TransitTime, current: TransitTime) -> bool {
        match self.direction {
            SearchDirection::Forward => candidate < current,
            SearchDirection::Reverse => candidate > current,
        }
    }

    /// Time the traveller gets on the trip at `pos`.
    pub fn board_time(&self, trip: &TripSchedule, pos: StopPos) -> TransitTime {
        match self.direction {
            SearchDirection::Forward => trip.departure(pos),
            SearchDirection::Reverse => trip.arrival(pos),
        }
    }

    /// Time the traveller gets off the trip at `pos`.
    pub fn alight_time(&self, trip: &TripSchedule, pos: StopPos) -> TransitTime {
        match self.direction {
            SearchDirection::Forward => trip.arrival(pos),
            SearchDirection::Reverse => trip.departure(pos),
        }
    }

    /// Slack before boarding, in search direction.
    pub fn board_slack(&self, slack: &dyn SlackProvider, slack_index: usize) -> Duration {
        match self.direction {
            SearchDirection::Forward => slack.board_slack(slack_index),
            SearchDirection::Reverse => slack.alight_slack(slack_index),
        }
    }

    /// Slack after alighting, in search direction.
    pub fn alight_slack(&self, slack: &dyn SlackProvider, slack_index: usize) -> Duration {
        match self.direction {
            SearchDirection::Forward => slack.alight_slack(slack_index),
            SearchDirection::Reverse => slack.board_slack(slack_index),
        }
    }

    /// Stop positions of a pattern in the order a trip is ridden.
    pub fn stop_positions(&self, pattern: &TripPattern) -> Vec<StopPos> {
        let positions = (0..pattern.number_of_stops()).map(StopPos);
        match self.direction {
            SearchDirection::Forward => positions.collect(),
            SearchDirection::Reverse => positions.rev().collect(),
        }
    }

    /// Iteration start times of a range search, in the order they run.
    ///
    /// A forward search starts with the latest departure and steps back
    /// to `start`; a reverse search starts with the earliest arrival and
    /// steps forward to `start`. There is always at least one iteration.
    pub fn iterations(&self, start: TransitTime, search_window: Duration) -> Vec<TransitTime> {
        let step = self.iteration_step.num_seconds().max(1);
        let window = search_window.num_seconds().max(0);
        let count = ((window + step - 1) / step).max(1);

        (0..count)
            .rev()
            .map(|k| self.plus_duration(start, Duration::seconds(k * step)))
            .collect()
    }

    /// Time-dependent departure time of an access leg.
    ///
    /// Returns the first time, in search direction, at or after
    /// `iteration_time` when the leg is open, or `None` if it has closed.
    pub fn departure_time(
        &self,
        access: &AccessEgress,
        iteration_time: TransitTime,
    ) -> Option<TransitTime> {
        let Some((open, close)) = access.opening else {
            return Some(iteration_time);
        };
        match self.direction {
            SearchDirection::Forward if iteration_time > close => None,
            SearchDirection::Forward => Some(iteration_time.max(open)),
            SearchDirection::Reverse if iteration_time < open => None,
            SearchDirection::Reverse => Some(iteration_time.min(close)),
        }
    }

    /// Regular trip search for this direction.
    pub fn create_trip_search<'a>(&self, timetable: &'a Timetable) -> Box<dyn TripSearch + 'a> {
        match self.direction {
            SearchDirection::Forward => Box::new(TripBoardSearch::new(timetable)),
            SearchDirection::Reverse => Box::new(TripAlightSearch::new(timetable)),
        }
    }

    /// Trip search restricted to one iteration step.
    pub fn create_exact_trip_search<'a>(
        &self,
        timetable: &'a Timetable,
    ) -> Box<dyn TripSearch + 'a> {
        Box::new(ExactTripSearch::new(
            self.create_trip_search(timetable),
            self.direction,
            self.iteration_step,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopIndex;
    use crate::raptor::slack::DefaultSlackProvider;

    fn t(s: &str) -> TransitTime {
        TransitTime::parse(s).unwrap()
    }

    #[test]
    fn direction_arithmetic() {
        let fwd = TransitCalculator::forward(Duration::minutes(1));
        let rev = TransitCalculator::reverse(Duration::minutes(1));
        let five = Duration::minutes(5);

        assert_eq!(fwd.plus_duration(t("10:00"), five), t("10:05"));
        assert_eq!(rev.plus_duration(t("10:00"), five), t("09:55"));
        assert_eq!(fwd.minus_duration(t("10:00"), five), t("09:55"));
        assert_eq!(rev.minus_duration(t("10:00"), five), t("10:05"));

        assert!(fwd.is_better(t("10:00"), t("10:01")));
        assert!(rev.is_better(t("10:01"), t("10:00")));
        assert!(!fwd.is_better(t("10:00"), t("10:00")));
    }

    #[test]
    fn slack_swaps_in_reverse() {
        let slack = DefaultSlackProvider::new(
            Duration::seconds(60),
            Duration::seconds(30),
            Duration::seconds(120),
        );
        let fwd = TransitCalculator::forward(Duration::minutes(1));
        let rev = TransitCalculator::reverse(Duration::minutes(1));

        assert_eq!(fwd.board_slack(&slack, 0), Duration::seconds(60));
        assert_eq!(rev.board_slack(&slack, 0), Duration::seconds(30));
        assert_eq!(rev.alight_slack(&slack, 0), Duration::seconds(60));
    }

    #[test]
    fn iterations_step_towards_start() {
        let fwd = TransitCalculator::forward(Duration::minutes(1));
        assert_eq!(
            fwd.iterations(t("10:00"), Duration::minutes(3)),
            vec![t("10:02"), t("10:01"), t("10:00")]
        );
        assert_eq!(fwd.iterations(t("10:00"), Duration::zero()), vec![t("10:00")]);

        let rev = TransitCalculator::reverse(Duration::minutes(1));
        assert_eq!(
            rev.iterations(t("10:00"), Duration::minutes(2)),
            vec![t("09:59"), t("10:00")]
        );
    }

    #[test]
    fn access_opening_hours() {
        let access = AccessEgress::new(StopIndex(0), Duration::minutes(5))
            .with_opening_hours(t("08:00"), t("09:00"));
        let fwd = TransitCalculator::forward(Duration::minutes(1));
        let rev = TransitCalculator::reverse(Duration::minutes(1));

        assert_eq!(fwd.departure_time(&access, t("07:30")), Some(t("08:00")));
        assert_eq!(fwd.departure_time(&access, t("08:30")), Some(t("08:30")));
        assert_eq!(fwd.departure_time(&access, t("09:01")), None);

        assert_eq!(rev.departure_time(&access, t("09:30")), Some(t("09:00")));
        assert_eq!(rev.departure_time(&access, t("07:59")), None);

        let always = AccessEgress::new(StopIndex(0), Duration::minutes(5));
        assert_eq!(fwd.departure_time(&always, t("03:00")), Some(t("03:00")));
    }
}
