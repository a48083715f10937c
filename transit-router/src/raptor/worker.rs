//! Range-RAPTOR search.
//!
//! Sweeps the departure window from the latest to the earliest
//! iteration time. Each iteration runs rounds; round `k` boards the
//! `k`-th trip from every stop reached in round `k - 1`, then relaxes
//! walking transfers. Arrivals survive from one iteration to the next,
//! so each iteration only explores what its earlier departure improves.

use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Duration;
use fixedbitset::FixedBitSet;
use tracing::{debug, trace};

use super::boarding::{BoardingEvent, PatternBoarding, TimeBasedBoardingSupport};
use super::calculator::TransitCalculator;
use super::config::RaptorConfig;
use super::constrained::{ConstrainedTransferSearch, TransferService};
use super::pareto::ParetoSet;
use super::round::RoundTracker;
use super::slack::SlackProvider;
use super::state::{ArrivalKind, SearchState, StopArrival};
use crate::domain::{
    AccessEgress, DomainError, StopPos, Timetable, TransferConstraint, TransitData, TransitLeg,
    TransitPath, TransitTime, TripSchedule,
};

/// Error from a range search.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RaptorError {
    /// The caller cancelled the search
    #[error("search was cancelled")]
    Cancelled,

    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// Request refers to data that does not exist
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Request for a range search.
#[derive(Debug, Clone)]
pub struct RaptorRequest {
    /// Start of the departure window.
    pub earliest_departure_time: TransitTime,

    /// Length of the departure window.
    pub search_window: Duration,

    /// Legs from the origin to the first stops.
    pub access: Vec<AccessEgress>,

    /// Legs from the last stops to the destination.
    pub egress: Vec<AccessEgress>,
}

impl RaptorRequest {
    pub fn new(
        earliest_departure_time: TransitTime,
        search_window: Duration,
        access: Vec<AccessEgress>,
        egress: Vec<AccessEgress>,
    ) -> Self {
        Self {
            earliest_departure_time,
            search_window,
            access,
            egress,
        }
    }

    /// Validate the request against the transit data.
    pub fn validate(&self, data: &TransitData) -> Result<(), RaptorError> {
        if self.access.is_empty() {
            return Err(RaptorError::InvalidRequest("no access legs".to_string()));
        }
        if self.egress.is_empty() {
            return Err(RaptorError::InvalidRequest("no egress legs".to_string()));
        }
        if self.search_window < Duration::zero() {
            return Err(RaptorError::InvalidRequest(
                "search window is negative".to_string(),
            ));
        }

        for leg in self.access.iter().chain(&self.egress) {
            if leg.stop.0 >= data.number_of_stops() {
                return Err(DomainError::UnknownStop(leg.stop).into());
            }
            if leg.duration < Duration::zero() {
                return Err(RaptorError::InvalidRequest(format!(
                    "negative access or egress duration at stop {}",
                    leg.stop
                )));
            }
        }

        Ok(())
    }
}

/// Result of a range search.
#[derive(Debug, Clone)]
pub struct RaptorResponse {
    /// Pareto-optimal paths, by departure time.
    pub paths: Vec<TransitPath>,

    /// Number of departure-time iterations run.
    pub iterations: usize,
}

/// The trip being ridden while scanning a pattern.
struct OnTrip {
    trip_index: usize,
    trip: Arc<TripSchedule>,
    board_pos: StopPos,
    prev: Rc<StopArrival>,
    constraint: Option<TransferConstraint>,
}

/// Range-RAPTOR over read-only transit data.
pub struct RangeRaptorWorker<'a> {
    data: &'a TransitData,
    config: &'a RaptorConfig,
    slack: &'a dyn SlackProvider,
    transfers: Option<&'a TransferService>,
}

impl<'a> RangeRaptorWorker<'a> {
    pub fn new(
        data: &'a TransitData,
        config: &'a RaptorConfig,
        slack: &'a dyn SlackProvider,
    ) -> Self {
        Self {
            data,
            config,
            slack,
            transfers: None,
        }
    }

    fn calculator(&self) -> TransitCalculator {
        TransitCalculator::forward(self.config.iteration_step())
    }

    /// Honor constrained transfers while boarding.
    pub fn with_transfer_service(mut self, service: &'a TransferService) -> Self {
        self.transfers = Some(service);
        self
    }

    /// Run the search.
    ///
    /// `cancel` is checked between rounds; once set, the search stops
    /// with [`RaptorError::Cancelled`] and partial results are dropped.
    pub fn route(
        &self,
        request: &RaptorRequest,
        cancel: &AtomicBool,
    ) -> Result<RaptorResponse, RaptorError> {
        request.validate(self.data)?;

        let calculator = self.calculator();
        let mut support =
            TimeBasedBoardingSupport::new(self.slack, calculator, self.config.exact_window_search);
        let max_rounds = self.config.max_rounds();
        let mut state = SearchState::new(self.data.number_of_stops(), max_rounds);
        let mut rounds = RoundTracker::new();
        let mut results = ParetoSet::new();

        let iterations =
            calculator.iterations(request.earliest_departure_time, request.search_window);

        for &iteration_time in &iterations {
            trace!(%iteration_time, "iteration start");
            state.start_iteration();
            rounds.reset();

            self.add_access(request, iteration_time, &mut support, &mut state);

            while rounds.round() < max_rounds {
                if cancel.load(Ordering::Relaxed) {
                    debug!(%iteration_time, "search cancelled");
                    return Err(RaptorError::Cancelled);
                }

                state.start_round();
                if state.is_round_empty() {
                    break;
                }
                let round = rounds.next_round();

                self.scan_patterns(&support, &rounds, calculator, &mut state);
                self.relax_transfers(round, &mut state);
                self.collect_paths(request, round, &state, &mut results);

                trace!(round, reached = state.marked_count(), "round complete");
            }

            support.iteration_complete();
        }

        debug!(
            iterations = iterations.len(),
            paths = results.len(),
            "range search complete"
        );

        Ok(RaptorResponse {
            paths: results.into_paths(),
            iterations: iterations.len(),
        })
    }

    /// Round 0: reach the access stops.
    fn add_access(
        &self,
        request: &RaptorRequest,
        iteration_time: TransitTime,
        support: &mut TimeBasedBoardingSupport<'_>,
        state: &mut SearchState,
    ) {
        for (idx, access) in request.access.iter().enumerate() {
            let Some(departure_time) = support.time_dependent_departure_time(access, iteration_time)
            else {
                continue;
            };
            state.try_update(
                0,
                StopArrival {
                    stop: access.stop,
                    time: departure_time + access.duration,
                    kind: ArrivalKind::Access {
                        access: idx,
                        departure_time,
                    },
                },
            );
        }
    }

    /// Scan every pattern serving a stop reached in the previous round.
    fn scan_patterns(
        &self,
        support: &TimeBasedBoardingSupport<'_>,
        rounds: &RoundTracker,
        calculator: TransitCalculator,
        state: &mut SearchState,
    ) {
        let mut patterns = FixedBitSet::with_capacity(self.data.timetables().len());
        for stop in state.marked_prev() {
            for &pattern in self.data.patterns_at(stop) {
                patterns.insert(pattern);
            }
        }

        for pattern in patterns.ones() {
            let timetable = self.data.timetable(pattern);
            if timetable.is_empty() {
                continue;
            }
            let boarding = support.prepare_for_transit_with(timetable, rounds);
            self.scan_pattern(timetable, &boarding, rounds.round(), calculator, state);
        }
    }

    fn scan_pattern(
        &self,
        timetable: &Timetable,
        boarding: &PatternBoarding<'_>,
        round: usize,
        calculator: TransitCalculator,
        state: &mut SearchState,
    ) {
        let pattern = timetable.pattern();
        let slack_index = pattern.slack_index();
        let alight_slack = self.slack.alight_slack(slack_index);
        let board_slack = if round > 1 {
            self.slack.board_slack(slack_index) + self.slack.transfer_slack()
        } else {
            self.slack.board_slack(slack_index)
        };

        let mut on_trip: Option<OnTrip> = None;

        for pos in calculator.stop_positions(pattern) {
            let stop = pattern.stop_index(pos);

            if let Some(on) = &on_trip {
                state.try_update(
                    round,
                    StopArrival {
                        stop,
                        time: on.trip.arrival(pos) + alight_slack,
                        kind: ArrivalKind::Transit {
                            prev: Rc::clone(&on.prev),
                            trip: Arc::clone(&on.trip),
                            board_pos: on.board_pos,
                            alight_pos: pos,
                            constraint: on.constraint,
                        },
                    },
                );
            }

            if pos == pattern.last_pos() || !state.is_marked_prev(stop) {
                continue;
            }
            let Some(prev) = state.arrival(round - 1, stop).cloned() else {
                continue;
            };

            let on_trip_index = on_trip.as_ref().map(|on| on.trip_index);
            let event = self.board(boarding, calculator, &prev, pos, board_slack, on_trip_index);

            match event {
                BoardingEvent::Board {
                    boarding: found,
                    constraint,
                    ..
                } => {
                    if on_trip_index.is_none_or(|current| found.trip_index < current) {
                        on_trip = Some(OnTrip {
                            trip_index: found.trip_index,
                            trip: found.trip,
                            board_pos: pos,
                            prev,
                            constraint,
                        });
                    }
                }
                BoardingEvent::Blocked { stop } => {
                    trace!(%stop, round, pattern = pattern.name(), "boarding blocked");
                }
                BoardingEvent::ContinueOnCurrentTrip { .. } | BoardingEvent::NotFound { .. } => {}
            }
        }
    }

    /// Constrained transfers first; a regular transfer if no rule applies.
    fn board(
        &self,
        boarding: &PatternBoarding<'_>,
        calculator: TransitCalculator,
        prev: &StopArrival,
        pos: StopPos,
        board_slack: Duration,
        on_trip_index: Option<usize>,
    ) -> BoardingEvent {
        let stop = prev.stop;
        if let Some(service) = self.transfers {
            let search = ConstrainedTransferSearch::new(service, calculator, pos);
            let prev_transit = prev.transit_arrival();
            if let Some(event) = boarding.board_with_constrained_transfer(
                prev_transit.as_ref(),
                prev.time,
                stop,
                board_slack,
                &search,
            ) {
                return event;
            }
        }
        boarding.board_with_regular_transfer(prev.time, stop, pos, board_slack, on_trip_index)
    }

    /// Walk from every stop reached by transit in this round.
    fn relax_transfers(&self, round: usize, state: &mut SearchState) {
        let sources: Vec<Rc<StopArrival>> = state
            .transit_marked()
            .into_iter()
            .filter_map(|stop| state.arrival(round, stop).cloned())
            .collect();

        for from in sources {
            for walk in self.data.walks_from(from.stop) {
                state.try_update(
                    round,
                    StopArrival {
                        stop: walk.to,
                        time: from.time + walk.duration,
                        kind: ArrivalKind::Transfer {
                            prev: Rc::clone(&from),
                            walk: walk.duration,
                        },
                    },
                );
            }
        }
    }

    /// Turn egress stops reached in this round into paths.
    fn collect_paths(
        &self,
        request: &RaptorRequest,
        round: usize,
        state: &SearchState,
        results: &mut ParetoSet,
    ) {
        for egress in &request.egress {
            if !state.is_marked(egress.stop) {
                continue;
            }
            let Some(arrival) = state.arrival(round, egress.stop) else {
                continue;
            };
            if let Some(path) = self.build_path(request, arrival, egress) {
                results.add(path);
            }
        }
    }

    /// Follow predecessor links back to the access leg.
    fn build_path(
        &self,
        request: &RaptorRequest,
        arrival: &Rc<StopArrival>,
        egress: &AccessEgress,
    ) -> Option<TransitPath> {
        let mut legs = Vec::new();
        let mut walks = Vec::new();
        let mut pending_walk = Duration::zero();
        let mut final_walk = Duration::zero();
        let mut current = Rc::clone(arrival);

        let (access_idx, access_departure) = loop {
            let prev = match &current.kind {
                ArrivalKind::Access {
                    access,
                    departure_time,
                } => break (*access, *departure_time),
                ArrivalKind::Transit {
                    prev,
                    trip,
                    board_pos,
                    alight_pos,
                    constraint,
                } => {
                    if legs.is_empty() {
                        final_walk = pending_walk;
                    } else {
                        walks.push(pending_walk);
                    }
                    pending_walk = Duration::zero();
                    legs.push(
                        TransitLeg::new(Arc::clone(trip), *board_pos, *alight_pos)
                            .with_constraint(*constraint),
                    );
                    Rc::clone(prev)
                }
                ArrivalKind::Transfer { prev, walk } => {
                    pending_walk = *walk;
                    Rc::clone(prev)
                }
            };
            current = prev;
        };
        legs.reverse();
        walks.reverse();

        let first = legs.first()?;
        let last = legs.last()?;
        let access = request.access.get(access_idx)?.clone();

        // Leave as late as the first boarding allows
        let board_slack = self.slack.board_slack(first.trip.pattern().slack_index());
        let latest = first.board_time() - board_slack - access.duration;
        let latest = access.opening.map_or(latest, |(_, close)| latest.min(close));
        let departure_time = latest.max(access_departure);

        // A walk after the last leg becomes part of the egress
        let egress = if final_walk > Duration::zero() {
            AccessEgress {
                stop: last.alight_stop(),
                duration: final_walk + egress.duration,
                opening: egress
                    .opening
                    .map(|(open, close)| (open - final_walk, close - final_walk)),
            }
        } else {
            egress.clone()
        };
        let egress_start = arrival.time - final_walk;
        let arrival_time = self
            .calculator()
            .departure_time(&egress, egress_start)?
            + egress.duration;

        Some(TransitPath {
            access,
            legs,
            walks,
            egress,
            departure_time,
            arrival_time,
        })
    }
}
