//! Pass-through point filter.
//!
//! Drops transfer candidates that would let a path skip one of its
//! pass-through points. Each trip of the path gets a segment: the range
//! of stop positions it can possibly ride given the candidates around it.
//! Points are consumed in order; a segment that visits the current point
//! narrows where the traveller may alight from (or board) that trip.
//!
//! ```text
//!   first trip   A ---- B ---- C ---- D
//!                        \      \      \
//!   second trip           E ---- F ---- G ---- H
//! ```
//!
//! With the point `{C}` a transfer `B -> E` skips `C` and is dropped,
//! while `C -> F` and `D -> G` are kept.
//!
//! Segment bounds come from the candidates, so dropping candidates at one
//! boundary can narrow a segment another boundary was filtered against.
//! The pass is repeated until nothing more is dropped.

use fixedbitset::FixedBitSet;
use tracing::trace;

use super::OptimizeError;
use super::filter::TransferFilter;
use crate::domain::{PassThroughPoint, StopPos, TripSchedule, TripToTripTransfer};

/// The positions of one trip a path can ride, and where a pass-through
/// point constrains them.
#[derive(Debug)]
struct TripSegment<'a> {
    trip: &'a TripSchedule,
    from_pos: StopPos,
    to_pos: StopPos,
    has_pass_through_point: bool,
    /// Alighting earlier than this skips the point.
    first_possible_alight: StopPos,
    /// Boarding later than this skips the point.
    last_possible_board: StopPos,
}

impl<'a> TripSegment<'a> {
    fn new(trip: &'a TripSchedule, from_pos: StopPos, to_pos: StopPos) -> Self {
        Self {
            trip,
            from_pos,
            to_pos,
            has_pass_through_point: false,
            first_possible_alight: from_pos,
            last_possible_board: to_pos,
        }
    }

    /// Scan `start..=to_pos` for a stop of the point.
    ///
    /// Without a match the whole segment stays usable.
    fn decorate(&mut self, stops: &FixedBitSet, start: StopPos) {
        let pattern = self.trip.pattern();
        let mut found = (start.max(self.from_pos).0..=self.to_pos.0)
            .map(StopPos)
            .filter(|pos| stops.contains(pattern.stop_index(*pos).0));

        match found.next() {
            Some(first) => {
                self.has_pass_through_point = true;
                self.first_possible_alight = first;
                self.last_possible_board = found.last().unwrap_or(first);
            }
            None => {
                self.has_pass_through_point = false;
                self.first_possible_alight = self.from_pos;
                self.last_possible_board = self.to_pos;
            }
        }
    }
}

/// Keep transfers that alight after, or board before, the point.
fn retain_passing(
    transfers: Vec<TripToTripTransfer>,
    from: &TripSegment<'_>,
    to: &TripSegment<'_>,
) -> Vec<TripToTripTransfer> {
    if !from.has_pass_through_point && !to.has_pass_through_point {
        return transfers;
    }
    transfers
        .into_iter()
        .filter(|tx| {
            tx.from.stop_pos >= from.first_possible_alight
                && tx.to.stop_pos <= to.last_possible_board
        })
        .collect()
}

/// One segment per trip, bounded by the transfer candidates around it.
fn trip_segments(
    board_pos_first_trip: StopPos,
    alight_pos_last_trip: StopPos,
    transfers: &[Vec<TripToTripTransfer>],
) -> Result<Vec<TripSegment<'_>>, OptimizeError> {
    let mut segments = Vec::with_capacity(transfers.len() + 1);
    let mut from_pos = board_pos_first_trip;
    let mut last_trip = None;

    for (boundary, list) in transfers.iter().enumerate() {
        let first = list
            .first()
            .ok_or(OptimizeError::EmptyTransfers { boundary })?;
        let (last_alight, next_board) = list.iter().fold(
            (first.from.stop_pos, first.to.stop_pos),
            |(alight, board), tx| (alight.max(tx.from.stop_pos), board.min(tx.to.stop_pos)),
        );
        segments.push(TripSegment::new(&first.from.trip, from_pos, last_alight));
        from_pos = next_board;
        last_trip = Some(first.to.trip.as_ref());
    }

    if let Some(trip) = last_trip {
        segments.push(TripSegment::new(trip, from_pos, alight_pos_last_trip));
    }
    Ok(segments)
}

/// Filter keeping only transfers compatible with visiting every
/// pass-through point, in order.
#[derive(Debug, Clone)]
pub struct PassThroughPointFilter {
    points: Vec<PassThroughPoint>,
    stops: Vec<FixedBitSet>,
}

impl PassThroughPointFilter {
    pub fn new(points: Vec<PassThroughPoint>) -> Self {
        let stops = points.iter().map(PassThroughPoint::as_bit_set).collect();
        Self { points, stops }
    }

    pub fn points(&self) -> &[PassThroughPoint] {
        &self.points
    }

    /// One pass over the boundaries, consuming points in order.
    fn filter_once(
        &self,
        board_pos_first_trip: StopPos,
        alight_pos_last_trip: StopPos,
        transfers: &[Vec<TripToTripTransfer>],
    ) -> Result<Vec<Vec<TripToTripTransfer>>, OptimizeError> {
        let mut segments = trip_segments(board_pos_first_trip, alight_pos_last_trip, transfers)?;
        if self.stops.is_empty() || segments.is_empty() {
            return Ok(transfers.to_vec());
        }

        let mut current = Some(0);
        let start = segments[0].from_pos;
        segments[0].decorate(&self.stops[0], start);

        let mut result = Vec::with_capacity(transfers.len());
        for (boundary, list) in transfers.iter().enumerate() {
            // Every point is already visited
            let Some(mut idx) = current else {
                result.push(list.clone());
                continue;
            };

            let (head, tail) = segments.split_at_mut(boundary + 1);
            let (from, to) = (&mut head[boundary], &mut tail[0]);

            let to_start = to.from_pos;
            to.decorate(&self.stops[idx], to_start);
            let mut kept = retain_passing(list.clone(), from, to);

            // Several points may be visited on the same trip
            while from.has_pass_through_point && idx + 1 < self.stops.len() {
                let start = from.first_possible_alight;
                idx += 1;
                from.decorate(&self.stops[idx], start);
                to.decorate(&self.stops[idx], to_start);
                kept = retain_passing(kept, from, to);
            }

            trace!(
                boundary,
                point = idx,
                before = list.len(),
                after = kept.len(),
                "pass-through filter"
            );
            current = (!from.has_pass_through_point).then_some(idx);
            result.push(kept);
        }

        Ok(result)
    }
}

impl TransferFilter for PassThroughPointFilter {
    fn filter_transfers(
        &self,
        board_pos_first_trip: StopPos,
        alight_pos_last_trip: StopPos,
        transfers: &[Vec<TripToTripTransfer>],
    ) -> Result<Vec<Vec<TripToTripTransfer>>, OptimizeError> {
        let mut current = self.filter_once(board_pos_first_trip, alight_pos_last_trip, transfers)?;
        // Each pass only drops candidates, so this terminates
        while !current.iter().any(Vec::is_empty) {
            let next = self.filter_once(board_pos_first_trip, alight_pos_last_trip, &current)?;
            if next == current {
                break;
            }
            current = next;
        }
        Ok(current)
    }
}
