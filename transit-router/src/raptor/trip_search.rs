//! Trip searches over one timetable.
//!
//! Trips in a timetable never overtake each other, so every search here
//! is a binary search on the board or alight times at one stop position.

use std::sync::Arc;

use chrono::Duration;

use super::calculator::SearchDirection;
use crate::domain::{StopPos, Timetable, TransitTime, TripSchedule};

/// A trip found by a trip search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripBoarding {
    /// Position of the trip in its timetable.
    pub trip_index: usize,
    pub trip: Arc<TripSchedule>,
    pub stop_pos: StopPos,
    /// Departure time at `stop_pos`, or arrival time in a reverse search.
    pub time: TransitTime,
}

/// Find the best trip to board at a stop position.
pub trait TripSearch {
    /// Find the first trip that can be boarded at `stop_pos` no earlier
    /// than `earliest_time` (no later, in a reverse search).
    ///
    /// With `trip_index_limit` set, only trips strictly better than that
    /// trip in search direction are considered.
    fn search(
        &self,
        earliest_time: TransitTime,
        stop_pos: StopPos,
        trip_index_limit: Option<usize>,
    ) -> Option<TripBoarding>;
}

/// Forward search: earliest trip departing at or after a time.
#[derive(Debug, Clone, Copy)]
pub struct TripBoardSearch<'a> {
    timetable: &'a Timetable,
}

impl<'a> TripBoardSearch<'a> {
    pub fn new(timetable: &'a Timetable) -> Self {
        Self { timetable }
    }
}

impl TripSearch for TripBoardSearch<'_> {
    fn search(
        &self,
        earliest_time: TransitTime,
        stop_pos: StopPos,
        trip_index_limit: Option<usize>,
    ) -> Option<TripBoarding> {
        let trips = self.timetable.trips();
        let end = trip_index_limit.map_or(trips.len(), |limit| limit.min(trips.len()));

        let trip_index = trips[..end].partition_point(|t| t.departure(stop_pos) < earliest_time);
        let trip = trips.get(trip_index).filter(|_| trip_index < end)?;

        Some(TripBoarding {
            trip_index,
            trip: Arc::clone(trip),
            stop_pos,
            time: trip.departure(stop_pos),
        })
    }
}

/// Reverse search: latest trip arriving at or before a time.
#[derive(Debug, Clone, Copy)]
pub struct TripAlightSearch<'a> {
    timetable: &'a Timetable,
}

impl<'a> TripAlightSearch<'a> {
    pub fn new(timetable: &'a Timetable) -> Self {
        Self { timetable }
    }
}

impl TripSearch for TripAlightSearch<'_> {
    fn search(
        &self,
        latest_time: TransitTime,
        stop_pos: StopPos,
        trip_index_limit: Option<usize>,
    ) -> Option<TripBoarding> {
        let trips = self.timetable.trips();
        let start = trip_index_limit.map_or(0, |limit| limit.saturating_add(1).min(trips.len()));

        let count = trips[start..].partition_point(|t| t.arrival(stop_pos) <= latest_time);
        if count == 0 {
            return None;
        }
        let trip_index = start + count - 1;
        let trip = &trips[trip_index];

        Some(TripBoarding {
            trip_index,
            trip: Arc::clone(trip),
            stop_pos,
            time: trip.arrival(stop_pos),
        })
    }
}

/// Accept only trips boarded strictly within one iteration step of the
/// earliest time.
///
/// Used in the first round of every iteration but the first: trips
/// outside the step were already reachable from the previous iteration.
pub struct ExactTripSearch<'a> {
    inner: Box<dyn TripSearch + 'a>,
    direction: SearchDirection,
    iteration_step: Duration,
}

impl<'a> ExactTripSearch<'a> {
    pub fn new(
        inner: Box<dyn TripSearch + 'a>,
        direction: SearchDirection,
        iteration_step: Duration,
    ) -> Self {
        Self {
            inner,
            direction,
            iteration_step,
        }
    }
}

impl TripSearch for ExactTripSearch<'_> {
    fn search(
        &self,
        earliest_time: TransitTime,
        stop_pos: StopPos,
        trip_index_limit: Option<usize>,
    ) -> Option<TripBoarding> {
        let boarding = self.inner.search(earliest_time, stop_pos, trip_index_limit)?;

        let offset = match self.direction {
            SearchDirection::Forward => boarding.time.duration_since(earliest_time),
            SearchDirection::Reverse => earliest_time.duration_since(boarding.time),
        };
        (offset < self.iteration_step).then_some(boarding)
    }
}
