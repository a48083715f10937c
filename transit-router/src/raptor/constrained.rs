//! Constrained transfers: stay-seated, guaranteed, not-allowed and
//! minimum-transfer-time rules between two trips.

use std::sync::Arc;

use chrono::Duration;

use super::calculator::{SearchDirection, TransitCalculator};
use super::trip_search::TripBoarding;
use crate::domain::{StopIndex, StopPos, Timetable, TransferConstraint, TransitTime, TripSchedule};

/// One end of a transfer rule: a stop, optionally narrowed to one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPoint {
    pub stop: StopIndex,
    pub trip_id: Option<String>,
}

impl TransferPoint {
    /// Any trip at `stop`.
    pub fn stop(stop: StopIndex) -> Self {
        Self {
            stop,
            trip_id: None,
        }
    }

    /// Only `trip_id` at `stop`.
    pub fn trip(stop: StopIndex, trip_id: impl Into<String>) -> Self {
        Self {
            stop,
            trip_id: Some(trip_id.into()),
        }
    }

    pub fn matches(&self, stop: StopIndex, trip: &TripSchedule) -> bool {
        self.stop == stop && self.matches_trip(trip)
    }

    fn matches_trip(&self, trip: &TripSchedule) -> bool {
        self.trip_id.as_deref().is_none_or(|id| id == trip.id())
    }

    fn is_trip_specific(&self) -> bool {
        self.trip_id.is_some()
    }
}

/// A transfer rule from one point to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstrainedTransfer {
    pub from: TransferPoint,
    pub to: TransferPoint,
    pub constraint: TransferConstraint,
}

impl ConstrainedTransfer {
    pub fn new(from: TransferPoint, to: TransferPoint, constraint: TransferConstraint) -> Self {
        Self {
            from,
            to,
            constraint,
        }
    }

    /// Number of trip-specific ends; a higher value wins over a lower one.
    pub fn specificity(&self) -> u8 {
        u8::from(self.from.is_trip_specific()) + u8::from(self.to.is_trip_specific())
    }
}

/// Lookup of transfer rules.
#[derive(Debug, Clone, Default)]
pub struct TransferService {
    transfers: Vec<ConstrainedTransfer>,
}

impl TransferService {
    pub fn new(transfers: Vec<ConstrainedTransfer>) -> Self {
        Self { transfers }
    }

    pub fn add(&mut self, transfer: ConstrainedTransfer) {
        self.transfers.push(transfer);
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    pub fn transfers(&self) -> &[ConstrainedTransfer] {
        &self.transfers
    }

    /// The most specific rule between two trips, if any.
    ///
    /// Among rules of equal specificity the first one added wins.
    pub fn find(
        &self,
        from_trip: &TripSchedule,
        from_stop: StopIndex,
        to_trip: &TripSchedule,
        to_stop: StopIndex,
    ) -> Option<&ConstrainedTransfer> {
        self.transfers
            .iter()
            .filter(|tx| tx.from.matches(from_stop, from_trip) && tx.to.matches(to_stop, to_trip))
            .fold(None, |best: Option<&ConstrainedTransfer>, tx| match best {
                Some(b) if b.specificity() >= tx.specificity() => Some(b),
                _ => Some(tx),
            })
    }
}

/// Boarding found through a constrained transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstrainedBoarding {
    pub boarding: TripBoarding,
    pub constraint: TransferConstraint,
    /// Earliest board time the constraint allows, replacing the regular one.
    pub earliest_board_time: TransitTime,
}

/// Search for a boarding governed by a transfer rule.
pub trait ConstrainedBoardingSearch {
    /// Find a constrained boarding onto `timetable` from `prev_trip`,
    /// which was left at `prev_stop`.
    ///
    /// `prev_transit_arrival_time` is the previous trip's arrival without
    /// alight slack; `earliest_board_time` is what a regular transfer
    /// would allow. Returns `None` if no rule applies, or if a regular
    /// transfer boards an earlier trip than any rule does.
    fn find(
        &self,
        timetable: &Timetable,
        transfer_slack: Duration,
        prev_trip: &TripSchedule,
        prev_stop: StopIndex,
        prev_transit_arrival_time: TransitTime,
        earliest_board_time: TransitTime,
    ) -> Option<ConstrainedBoarding>;
}

/// Constrained boarding search at one stop position of a pattern.
#[derive(Debug, Clone, Copy)]
pub struct ConstrainedTransferSearch<'a> {
    service: &'a TransferService,
    calculator: TransitCalculator,
    stop_pos: StopPos,
}

impl<'a> ConstrainedTransferSearch<'a> {
    pub fn new(
        service: &'a TransferService,
        calculator: TransitCalculator,
        stop_pos: StopPos,
    ) -> Self {
        Self {
            service,
            calculator,
            stop_pos,
        }
    }

    /// Rules leaving the previous trip and arriving at `target`, with the
    /// point on the pattern side.
    fn rules_into(
        &self,
        prev_trip: &TripSchedule,
        prev_stop: StopIndex,
        target: StopIndex,
    ) -> Vec<(&'a ConstrainedTransfer, &'a TransferPoint)> {
        let forward = self.calculator.direction() == SearchDirection::Forward;
        self.service
            .transfers()
            .iter()
            .filter_map(|tx| {
                let (prev_point, next_point) = if forward {
                    (&tx.from, &tx.to)
                } else {
                    (&tx.to, &tx.from)
                };
                (prev_point.matches(prev_stop, prev_trip) && next_point.stop == target)
                    .then_some((tx, next_point))
            })
            .collect()
    }
}

impl ConstrainedBoardingSearch for ConstrainedTransferSearch<'_> {
    fn find(
        &self,
        timetable: &Timetable,
        transfer_slack: Duration,
        prev_trip: &TripSchedule,
        prev_stop: StopIndex,
        prev_transit_arrival_time: TransitTime,
        earliest_board_time: TransitTime,
    ) -> Option<ConstrainedBoarding> {
        let calc = &self.calculator;
        let target = timetable.pattern().stop_index(self.stop_pos);
        let rules = self.rules_into(prev_trip, prev_stop, target);
        if rules.is_empty() {
            return None;
        }

        // The trip a regular transfer would board; not-allowed rules only
        // block this one.
        let regular = calc
            .create_trip_search(timetable)
            .search(earliest_board_time, self.stop_pos, None)
            .map(|b| b.trip_index);

        let trip_indexes: Box<dyn Iterator<Item = usize>> = match calc.direction() {
            SearchDirection::Forward => Box::new(0..timetable.len()),
            SearchDirection::Reverse => Box::new((0..timetable.len()).rev()),
        };

        // Trips in boarding order: the first one either a rule or a regular
        // transfer can board wins.
        let mut blocked = None;
        for trip_index in trip_indexes {
            let trip = timetable.trip(trip_index);
            let is_regular = regular == Some(trip_index);
            let rule = rules
                .iter()
                .filter(|(_, point)| point.matches_trip(trip))
                .map(|(tx, _)| *tx)
                .fold(None, |best: Option<&ConstrainedTransfer>, tx| match best {
                    Some(b) if b.specificity() >= tx.specificity() => Some(b),
                    _ => Some(tx),
                });
            let Some(rule) = rule else {
                if is_regular {
                    return None;
                }
                continue;
            };

            let earliest = match rule.constraint {
                TransferConstraint::NotAllowed if !is_regular => continue,
                TransferConstraint::NotAllowed => earliest_board_time,
                TransferConstraint::StaySeated | TransferConstraint::Guaranteed => {
                    prev_transit_arrival_time
                }
                TransferConstraint::MinTransferTime(min) => {
                    calc.plus_duration(prev_transit_arrival_time, min.max(transfer_slack))
                }
            };

            let board_time = calc.board_time(trip, self.stop_pos);
            if calc.is_better(board_time, earliest) {
                continue;
            }

            let boarding = ConstrainedBoarding {
                boarding: TripBoarding {
                    trip_index,
                    trip: Arc::clone(trip),
                    stop_pos: self.stop_pos,
                    time: board_time,
                },
                constraint: rule.constraint,
                earliest_board_time: earliest,
            };
            // A later trip may still be reachable through another rule
            if rule.constraint.is_not_allowed() {
                blocked = Some(boarding);
                continue;
            }
            return Some(boarding);
        }

        blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TripPattern;

    fn t(s: &str) -> TransitTime {
        TransitTime::parse(s).unwrap()
    }

    fn trip(id: &str, pattern: &Arc<TripPattern>, times: &[&str]) -> TripSchedule {
        TripSchedule::with_times(id, pattern.clone(), times.iter().map(|s| t(s)).collect())
            .unwrap()
    }

    /// Incoming trip A(0) -> B(1) arriving 10:00; outgoing pattern B(1) -> C(2)
    /// with trips at 10:01, 10:03 and 10:10.
    fn setup() -> (TripSchedule, Timetable) {
        let ab = Arc::new(TripPattern::new("AB", vec![StopIndex(0), StopIndex(1)], 0).unwrap());
        let bc = Arc::new(TripPattern::new("BC", vec![StopIndex(1), StopIndex(2)], 0).unwrap());
        let incoming = trip("IN", &ab, &["09:50", "10:00"]);
        let timetable = Timetable::new(
            bc.clone(),
            vec![
                trip("X1", &bc, &["10:01", "10:20"]),
                trip("X2", &bc, &["10:03", "10:22"]),
                trip("X3", &bc, &["10:10", "10:30"]),
            ],
        )
        .unwrap();
        (incoming, timetable)
    }

    fn search(service: &TransferService) -> ConstrainedTransferSearch<'_> {
        ConstrainedTransferSearch::new(
            service,
            TransitCalculator::forward(Duration::minutes(1)),
            StopPos(0),
        )
    }

    fn find(service: &TransferService, earliest: &str) -> Option<ConstrainedBoarding> {
        let (incoming, timetable) = setup();
        search(service).find(
            &timetable,
            Duration::minutes(1),
            &incoming,
            StopIndex(1),
            t("10:00"),
            t(earliest),
        )
    }

    #[test]
    fn no_matching_rule() {
        let service = TransferService::new(vec![ConstrainedTransfer::new(
            TransferPoint::stop(StopIndex(5)),
            TransferPoint::stop(StopIndex(1)),
            TransferConstraint::Guaranteed,
        )]);
        assert!(find(&service, "10:05").is_none());
    }

    #[test]
    fn guaranteed_ignores_slack() {
        let service = TransferService::new(vec![ConstrainedTransfer::new(
            TransferPoint::trip(StopIndex(1), "IN"),
            TransferPoint::stop(StopIndex(1)),
            TransferConstraint::Guaranteed,
        )]);

        let found = find(&service, "10:05").unwrap();
        assert_eq!(found.boarding.trip.id(), "X1");
        assert_eq!(found.earliest_board_time, t("10:00"));
        assert_eq!(found.constraint, TransferConstraint::Guaranteed);
    }

    #[test]
    fn min_transfer_time() {
        let service = TransferService::new(vec![ConstrainedTransfer::new(
            TransferPoint::stop(StopIndex(1)),
            TransferPoint::stop(StopIndex(1)),
            TransferConstraint::MinTransferTime(Duration::minutes(2)),
        )]);

        let found = find(&service, "10:08").unwrap();
        assert_eq!(found.boarding.trip.id(), "X2");
        assert_eq!(found.earliest_board_time, t("10:02"));
    }

    #[test]
    fn not_allowed_blocks_regular_trip_only() {
        let service = TransferService::new(vec![ConstrainedTransfer::new(
            TransferPoint::stop(StopIndex(1)),
            TransferPoint::trip(StopIndex(1), "X3"),
            TransferConstraint::NotAllowed,
        )]);

        // Regular boarding would take X3
        let found = find(&service, "10:05").unwrap();
        assert!(found.constraint.is_not_allowed());
        assert_eq!(found.boarding.trip.id(), "X3");

        // Regular boarding takes X2, which no rule covers
        assert!(find(&service, "10:02").is_none());
    }

    #[test]
    fn most_specific_rule_per_trip() {
        let service = TransferService::new(vec![
            ConstrainedTransfer::new(
                TransferPoint::stop(StopIndex(1)),
                TransferPoint::stop(StopIndex(1)),
                TransferConstraint::Guaranteed,
            ),
            ConstrainedTransfer::new(
                TransferPoint::trip(StopIndex(1), "IN"),
                TransferPoint::trip(StopIndex(1), "X1"),
                TransferConstraint::NotAllowed,
            ),
        ]);

        // X1 is only covered by the trip-to-trip rule; X2 is guaranteed
        let found = find(&service, "10:05").unwrap();
        assert_eq!(found.boarding.trip.id(), "X2");
        assert_eq!(found.constraint, TransferConstraint::Guaranteed);
    }

    #[test]
    fn regular_transfer_to_earlier_trip() {
        let service = TransferService::new(vec![ConstrainedTransfer::new(
            TransferPoint::trip(StopIndex(1), "IN"),
            TransferPoint::trip(StopIndex(1), "X3"),
            TransferConstraint::StaySeated,
        )]);

        // Regular boarding takes X2, ahead of the stay-seated X3
        assert!(find(&service, "10:02").is_none());

        // Regular boarding would take X3 anyway
        let found = find(&service, "10:05").unwrap();
        assert_eq!(found.boarding.trip.id(), "X3");
        assert_eq!(found.constraint, TransferConstraint::StaySeated);
    }

    #[test]
    fn guaranteed_trip_after_blocked_regular_trip() {
        let service = TransferService::new(vec![
            ConstrainedTransfer::new(
                TransferPoint::stop(StopIndex(1)),
                TransferPoint::trip(StopIndex(1), "X2"),
                TransferConstraint::NotAllowed,
            ),
            ConstrainedTransfer::new(
                TransferPoint::trip(StopIndex(1), "IN"),
                TransferPoint::trip(StopIndex(1), "X3"),
                TransferConstraint::Guaranteed,
            ),
        ]);

        let found = find(&service, "10:02").unwrap();
        assert_eq!(found.boarding.trip.id(), "X3");
        assert_eq!(found.constraint, TransferConstraint::Guaranteed);
    }

    #[test]
    fn service_find_prefers_specific() {
        let (incoming, timetable) = setup();
        let service = TransferService::new(vec![
            ConstrainedTransfer::new(
                TransferPoint::stop(StopIndex(1)),
                TransferPoint::stop(StopIndex(1)),
                TransferConstraint::Guaranteed,
            ),
            ConstrainedTransfer::new(
                TransferPoint::stop(StopIndex(1)),
                TransferPoint::trip(StopIndex(1), "X1"),
                TransferConstraint::NotAllowed,
            ),
        ]);

        let found = service
            .find(&incoming, StopIndex(1), timetable.trip(0), StopIndex(1))
            .unwrap();
        assert!(found.constraint.is_not_allowed());

        let found = service
            .find(&incoming, StopIndex(1), timetable.trip(1), StopIndex(1))
            .unwrap();
        assert_eq!(found.constraint, TransferConstraint::Guaranteed);
    }
}
