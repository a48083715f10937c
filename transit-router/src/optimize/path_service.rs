//! Choosing the best transfer points for one path.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;

use super::OptimizeError;
use super::cost::{
    GeneralizedCostCalculator, MinSafeTransferTimeCalculator, TransferWaitTimeCostCalculator,
};
use super::filter::TransferFilter;
use super::filter_chain::{MinCostFilterChain, OptimizedPathTail};
use super::generator::TransferGenerator;
use crate::domain::{
    OptimizedPath, StopPos, TransitLeg, TransitPath, TripSchedule, TripStopTime,
    TripToTripTransfer,
};

/// Finds the best combination of transfer points for a path.
///
/// Every criterion is a sum over the legs and transfers, so the search
/// runs backwards from the last trip and keeps, for each position a trip
/// can be boarded at, only the tails the filter chain considers best.
pub struct OptimizePathService<'a> {
    generator: TransferGenerator<'a>,
    filter: Option<Box<dyn TransferFilter + 'a>>,
    min_safe: MinSafeTransferTimeCalculator<'a>,
    wait_time: Option<TransferWaitTimeCostCalculator>,
    cost: GeneralizedCostCalculator,
    chain: MinCostFilterChain<OptimizedPathTail>,
}

impl<'a> OptimizePathService<'a> {
    pub fn new(
        generator: TransferGenerator<'a>,
        min_safe: MinSafeTransferTimeCalculator<'a>,
        cost: GeneralizedCostCalculator,
        chain: MinCostFilterChain<OptimizedPathTail>,
    ) -> Self {
        Self {
            generator,
            filter: None,
            min_safe,
            wait_time: None,
            cost,
            chain,
        }
    }

    /// Restrict the candidates before choosing, e.g. to pass-through points.
    pub fn with_filter(mut self, filter: Box<dyn TransferFilter + 'a>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Add the wait-time cost to every transfer.
    pub fn with_wait_time_calculator(mut self, calculator: TransferWaitTimeCostCalculator) -> Self {
        self.wait_time = Some(calculator);
        self
    }

    /// The best versions of `path`. Ties the filter chain cannot break
    /// all appear in the result.
    ///
    /// An empty result means no combination of candidates reaches the end
    /// of the path.
    pub fn find_best_transit_path(
        &self,
        path: &TransitPath,
    ) -> Result<Vec<OptimizedPath>, OptimizeError> {
        let (Some(first), Some(last)) = (path.legs.first(), path.legs.last()) else {
            return Ok(vec![]);
        };
        if path.legs.len() == 1 {
            return Ok(vec![self.original(path)]);
        }

        let mut transfers = self.generator.find_all_possible_transfers(path);
        if let Some(filter) = &self.filter {
            transfers = filter.filter_transfers(first.board_pos, last.alight_pos, &transfers)?;
        }
        if transfers.len() + 1 != path.legs.len() {
            return Err(OptimizeError::MismatchedLengths {
                segments: path.legs.len(),
                transfers: transfers.len(),
            });
        }
        if let Some(boundary) = transfers.iter().position(Vec::is_empty) {
            return Err(OptimizeError::EmptyTransfers { boundary });
        }

        let baseline = self.min_safe.min_safe_transfer_time(path);

        // Tails of the last trip, one per position it can be boarded at
        let mut tails: BTreeMap<StopPos, Vec<OptimizedPathTail>> = BTreeMap::new();
        if let Some(last_boundary) = transfers.last() {
            for tx in last_boundary {
                tails
                    .entry(tx.to.stop_pos)
                    .or_insert_with(|| vec![self.last_trip_tail(last, tx.to.stop_pos)]);
            }
        }

        for (i, boundary) in transfers.iter().enumerate().rev() {
            let trip = &path.legs[i].trip;
            let board_positions: Vec<StopPos> = match i {
                0 => vec![first.board_pos],
                _ => transfers[i - 1].iter().map(|tx| tx.to.stop_pos).collect(),
            };

            let mut next_tails = BTreeMap::new();
            for board_pos in board_positions {
                if next_tails.contains_key(&board_pos) {
                    continue;
                }
                let candidates: Vec<OptimizedPathTail> = boundary
                    .iter()
                    .filter(|tx| tx.from.stop_pos > board_pos)
                    .flat_map(|tx| {
                        tails
                            .get(&tx.to.stop_pos)
                            .into_iter()
                            .flatten()
                            .map(move |next| (tx, next))
                    })
                    .map(|(tx, next)| self.tail_through(trip, board_pos, tx, next, baseline))
                    .collect();

                let best = self.chain.filter(candidates);
                if !best.is_empty() {
                    next_tails.insert(board_pos, best);
                }
            }
            tails = next_tails;
        }

        Ok(tails
            .remove(&first.board_pos)
            .unwrap_or_default()
            .into_iter()
            .map(|tail| self.to_optimized_path(path, tail))
            .collect())
    }

    /// `path` with its transfer points as found, and its costs.
    pub fn original(&self, path: &TransitPath) -> OptimizedPath {
        let Some(last) = path.legs.last() else {
            return self.to_optimized_path(path, self.empty_tail());
        };
        let baseline = self.min_safe.min_safe_transfer_time(path);

        let mut tail = self.last_trip_tail(last, last.board_pos);
        for (pair, walk) in path.legs.windows(2).zip(&path.walks).rev() {
            let (from, to) = (&pair[0], &pair[1]);
            let from_stop = TripStopTime::arrival(Arc::clone(&from.trip), from.alight_pos);
            let to_stop = TripStopTime::departure(Arc::clone(&to.trip), to.board_pos);
            let constraint = to
                .constraint
                .or_else(|| self.generator.constraint(&from_stop, &to_stop));
            let tx = TripToTripTransfer::new(from_stop, to_stop, *walk, constraint);
            tail = self.tail_through(&from.trip, from.board_pos, &tx, &tail, baseline);
        }
        self.to_optimized_path(path, tail)
    }

    fn empty_tail(&self) -> OptimizedPathTail {
        OptimizedPathTail {
            board_pos: StopPos(0),
            transfers: vec![],
            generalized_cost: 0,
            wait_time_cost: 0,
            transfer_priority_cost: 0,
            break_tie_cost: 0,
        }
    }

    fn last_trip_tail(&self, last: &TransitLeg, board_pos: StopPos) -> OptimizedPathTail {
        let leg = TransitLeg::new(Arc::clone(&last.trip), board_pos, last.alight_pos);
        OptimizedPathTail {
            board_pos,
            generalized_cost: self.cost.leg_cost(&leg),
            ..self.empty_tail()
        }
    }

    /// Ride `trip` from `board_pos` to the transfer, then continue with
    /// `next`.
    fn tail_through(
        &self,
        trip: &Arc<TripSchedule>,
        board_pos: StopPos,
        tx: &TripToTripTransfer,
        next: &OptimizedPathTail,
        baseline: Duration,
    ) -> OptimizedPathTail {
        let leg = TransitLeg::new(Arc::clone(trip), board_pos, tx.from.stop_pos);

        let wait_time_cost = self.wait_time.map_or(0, |calc| {
            let min_safe =
                self.min_safe
                    .min_safe_transfer_time_between(baseline, &tx.from.trip, &tx.to.trip);
            calc.cost(tx.wait_time(), min_safe)
        });

        // Time left on the incoming trip after alighting
        let trip_end = trip.arrival(trip.pattern().last_pos());
        let break_tie_cost = trip_end.duration_since(tx.from.time).num_seconds();

        let mut transfers = Vec::with_capacity(next.transfers.len() + 1);
        transfers.push(tx.clone());
        transfers.extend(next.transfers.iter().cloned());

        OptimizedPathTail {
            board_pos,
            transfers,
            generalized_cost: self.cost.leg_cost(&leg)
                + self.cost.transfer_cost(tx)
                + next.generalized_cost,
            wait_time_cost: wait_time_cost + next.wait_time_cost,
            transfer_priority_cost: tx.priority_cost() + next.transfer_priority_cost,
            break_tie_cost: break_tie_cost + next.break_tie_cost,
        }
    }

    fn to_optimized_path(&self, path: &TransitPath, tail: OptimizedPathTail) -> OptimizedPath {
        let n = path.legs.len();
        let legs = path
            .legs
            .iter()
            .enumerate()
            .map(|(i, leg)| {
                let (board_pos, constraint) = match i {
                    0 => (leg.board_pos, None),
                    _ => {
                        let tx = &tail.transfers[i - 1];
                        (tx.to.stop_pos, tx.constraint)
                    }
                };
                let alight_pos = if i + 1 == n {
                    leg.alight_pos
                } else {
                    tail.transfers[i].from.stop_pos
                };
                TransitLeg::new(Arc::clone(&leg.trip), board_pos, alight_pos)
                    .with_constraint(constraint)
            })
            .collect();

        let generalized_cost = tail.generalized_cost + self.cost.access_egress_cost(path);
        OptimizedPath {
            access: path.access.clone(),
            legs,
            egress: path.egress.clone(),
            departure_time: path.departure_time,
            arrival_time: path.arrival_time,
            generalized_cost,
            wait_time_optimized_cost: self
                .wait_time
                .map(|_| generalized_cost + tail.wait_time_cost),
            transfer_priority_cost: tail.transfer_priority_cost,
            break_tie_cost: tail.break_tie_cost,
            transfers: tail.transfers,
        }
    }
}
