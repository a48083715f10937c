//! Time-dependent boarding decisions.
//!
//! Once per round and stop the worker asks what to board next. The
//! answer depends on slack, on constrained transfers from the previous
//! trip, and on where the search is in its iteration: after the first
//! iteration the first round only looks for trips inside one iteration
//! step, as anything later was already found by the previous iteration.

use std::sync::Arc;

use chrono::Duration;
use tracing::trace;

use super::calculator::TransitCalculator;
use super::constrained::ConstrainedBoardingSearch;
use super::round::RoundTracker;
use super::slack::SlackProvider;
use super::trip_search::{TripBoarding, TripSearch};
use crate::domain::{
    AccessEgress, StopIndex, StopPos, Timetable, TransferConstraint, TransitTime, TripSchedule,
};

/// Arrival at a stop by a transit leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitArrival {
    pub trip: Arc<TripSchedule>,
    pub stop: StopIndex,
    /// Arrival time including alight slack.
    pub arrival_time: TransitTime,
}

/// Outcome of a boarding decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardingEvent {
    /// Board a trip.
    Board {
        stop: StopIndex,
        earliest_board_time: TransitTime,
        boarding: TripBoarding,
        constraint: Option<TransferConstraint>,
    },
    /// No better trip; stay on the trip already boarded.
    ContinueOnCurrentTrip {
        stop: StopIndex,
        stop_pos: StopPos,
        earliest_board_time: TransitTime,
    },
    /// A not-allowed transfer suppresses boarding at this stop.
    Blocked { stop: StopIndex },
    /// Nothing to board and no current trip.
    NotFound { stop: StopIndex },
}

/// Flags scoped to one search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationState {
    pub in_first_iteration: bool,
    pub has_time_dependent_access: bool,
}

impl Default for IterationState {
    fn default() -> Self {
        Self {
            in_first_iteration: true,
            has_time_dependent_access: false,
        }
    }
}

/// Boarding logic shared by all time-dependent searches.
pub struct TimeBasedBoardingSupport<'a> {
    slack: &'a dyn SlackProvider,
    calculator: TransitCalculator,
    exact_window_search: bool,
    state: IterationState,
}

impl<'a> TimeBasedBoardingSupport<'a> {
    pub fn new(
        slack: &'a dyn SlackProvider,
        calculator: TransitCalculator,
        exact_window_search: bool,
    ) -> Self {
        Self {
            slack,
            calculator,
            exact_window_search,
            state: IterationState::default(),
        }
    }

    pub fn state(&self) -> IterationState {
        self.state
    }

    /// Mark the end of an iteration.
    pub fn iteration_complete(&mut self) {
        self.state.in_first_iteration = false;
    }

    /// Choose the trip search for one pattern in the current round.
    pub fn prepare_for_transit_with<'t>(
        &self,
        timetable: &'t Timetable,
        rounds: &RoundTracker,
    ) -> PatternBoarding<'t>
    where
        'a: 't,
    {
        let exact = self.exact_window_search
            && !self.state.in_first_iteration
            && rounds.is_first_round()
            && !self.state.has_time_dependent_access;

        let search = if exact {
            self.calculator.create_exact_trip_search(timetable)
        } else {
            self.calculator.create_trip_search(timetable)
        };

        PatternBoarding {
            slack: self.slack,
            calculator: self.calculator,
            timetable,
            search,
            exact,
        }
    }

    /// Departure time of an access leg in the current iteration.
    ///
    /// Returns `None` if the leg is unavailable. Any access whose time
    /// differs from the iteration time disables the exact-window search
    /// for the rest of the request, as iterations no longer shift by a
    /// uniform step.
    pub fn time_dependent_departure_time(
        &mut self,
        access: &AccessEgress,
        iteration_time: TransitTime,
    ) -> Option<TransitTime> {
        let departure = self.calculator.departure_time(access, iteration_time)?;
        if departure != iteration_time && !self.state.has_time_dependent_access {
            trace!(stop = %access.stop, %iteration_time, %departure, "time-dependent access");
            self.state.has_time_dependent_access = true;
        }
        Some(departure)
    }
}

/// Boarding decisions for one pattern, valid for the rest of a round.
pub struct PatternBoarding<'t> {
    slack: &'t dyn SlackProvider,
    calculator: TransitCalculator,
    timetable: &'t Timetable,
    search: Box<dyn TripSearch + 't>,
    exact: bool,
}

impl PatternBoarding<'_> {
    /// Returns true if the exact-window trip search is in use.
    pub fn uses_exact_search(&self) -> bool {
        self.exact
    }

    /// Board after a regular transfer (or access).
    ///
    /// `on_trip_index` is the trip the traveller is already on, if any;
    /// only strictly better trips are then considered.
    pub fn board_with_regular_transfer(
        &self,
        prev_arrival_time: TransitTime,
        stop: StopIndex,
        stop_pos: StopPos,
        board_slack: Duration,
        on_trip_index: Option<usize>,
    ) -> BoardingEvent {
        let earliest_board_time = self.calculator.plus_duration(prev_arrival_time, board_slack);

        match self.search.search(earliest_board_time, stop_pos, on_trip_index) {
            Some(boarding) => BoardingEvent::Board {
                stop,
                earliest_board_time,
                boarding,
                constraint: None,
            },
            None if on_trip_index.is_some() => BoardingEvent::ContinueOnCurrentTrip {
                stop,
                stop_pos,
                earliest_board_time,
            },
            None => BoardingEvent::NotFound { stop },
        }
    }

    /// Board through a constrained transfer from the previous transit leg.
    ///
    /// `prev_arrival_time` is the arrival at `stop`, which differs from
    /// the previous transit arrival after a walking transfer. Returns
    /// `None` if there is no previous transit leg or no rule applies; the
    /// caller then falls back to a regular transfer.
    pub fn board_with_constrained_transfer(
        &self,
        prev_transit: Option<&TransitArrival>,
        prev_arrival_time: TransitTime,
        stop: StopIndex,
        board_slack: Duration,
        search: &dyn ConstrainedBoardingSearch,
    ) -> Option<BoardingEvent> {
        let prev = prev_transit?;

        let alight_slack = self
            .calculator
            .alight_slack(self.slack, prev.trip.pattern().slack_index());
        let prev_transit_arrival_time = self
            .calculator
            .minus_duration(prev.arrival_time, alight_slack);
        let earliest_board_time = self.calculator.plus_duration(prev_arrival_time, board_slack);

        let result = search.find(
            self.timetable,
            self.slack.transfer_slack(),
            &prev.trip,
            prev.stop,
            prev_transit_arrival_time,
            earliest_board_time,
        )?;

        if result.constraint.is_not_allowed() {
            trace!(
                %stop,
                from = prev.trip.id(),
                to = result.boarding.trip.id(),
                "boarding blocked by transfer constraint"
            );
            return Some(BoardingEvent::Blocked { stop });
        }

        Some(BoardingEvent::Board {
            stop,
            earliest_board_time: result.earliest_board_time,
            boarding: result.boarding,
            constraint: Some(result.constraint),
        })
    }
}
