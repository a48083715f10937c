//! Transfer candidate generation.

use std::sync::Arc;

use chrono::Duration;
use tracing::trace;

use crate::domain::{
    StopPos, TransferConstraint, TransitData, TransitLeg, TransitPath, TripSchedule, TripStopTime,
    TripToTripTransfer,
};
use crate::raptor::{SlackProvider, TransferService};

/// Finds every point where a path can change between two of its trips.
pub struct TransferGenerator<'a> {
    data: &'a TransitData,
    slack: &'a dyn SlackProvider,
    transfers: Option<&'a TransferService>,
}

impl<'a> TransferGenerator<'a> {
    pub fn new(data: &'a TransitData, slack: &'a dyn SlackProvider) -> Self {
        Self {
            data,
            slack,
            transfers: None,
        }
    }

    /// Apply constrained transfers to the candidates.
    pub fn with_transfer_service(mut self, service: &'a TransferService) -> Self {
        self.transfers = Some(service);
        self
    }

    /// Candidates for every trip boundary of `path`.
    ///
    /// `result[i]` holds the transfers from `legs[i]` to `legs[i + 1]`.
    /// Every candidate can be combined with at least one candidate of
    /// the neighbouring boundaries, unless a boundary ends up empty.
    pub fn find_all_possible_transfers(&self, path: &TransitPath) -> Vec<Vec<TripToTripTransfer>> {
        let mut result: Vec<Vec<TripToTripTransfer>> = path
            .legs
            .windows(2)
            .map(|pair| self.transfers_between(&pair[0].trip, &pair[1].trip))
            .collect();
        prune(&path.legs, &mut result);

        trace!(
            trips = ?path.trip_ids(),
            candidates = ?result.iter().map(Vec::len).collect::<Vec<_>>(),
            "transfer candidates"
        );
        result
    }

    /// All transfers from `from` to `to`, ignoring the rest of the path.
    fn transfers_between(
        &self,
        from: &Arc<TripSchedule>,
        to: &Arc<TripSchedule>,
    ) -> Vec<TripToTripTransfer> {
        let from_pattern = from.pattern();
        let to_pattern = to.pattern();
        let mut result = Vec::new();

        for alight_pos in (1..from_pattern.number_of_stops()).map(StopPos) {
            let stop = from_pattern.stop_index(alight_pos);
            let walks = self
                .data
                .walks_from(stop)
                .iter()
                .map(|walk| (walk.to, walk.duration));

            for (to_stop, walk) in std::iter::once((stop, Duration::zero())).chain(walks) {
                for board_pos in to_pattern.positions_of(to_stop) {
                    if board_pos == to_pattern.last_pos() {
                        continue;
                    }
                    let transfer = self.transfer(
                        TripStopTime::arrival(Arc::clone(from), alight_pos),
                        TripStopTime::departure(Arc::clone(to), board_pos),
                        walk,
                    );
                    result.extend(transfer);
                }
            }
        }
        result
    }

    /// The constraint governing a transfer, if any.
    pub fn constraint(&self, from: &TripStopTime, to: &TripStopTime) -> Option<TransferConstraint> {
        self.transfers?
            .find(&from.trip, from.stop(), &to.trip, to.stop())
            .map(|tx| tx.constraint)
    }

    /// A transfer between two trip stop times, if it can be made in time
    /// and is not forbidden.
    pub fn transfer(
        &self,
        from: TripStopTime,
        to: TripStopTime,
        walk: Duration,
    ) -> Option<TripToTripTransfer> {
        let constraint = self.constraint(&from, &to);
        let earliest_departure = match constraint {
            Some(TransferConstraint::NotAllowed) => return None,
            Some(TransferConstraint::StaySeated | TransferConstraint::Guaranteed) => from.time,
            Some(TransferConstraint::MinTransferTime(min)) => {
                from.time + min.max(self.slack.transfer_slack())
            }
            None => {
                from.time
                    + self.slack.alight_slack(from.trip.pattern().slack_index())
                    + self.slack.transfer_slack()
                    + walk
                    + self.slack.board_slack(to.trip.pattern().slack_index())
            }
        };

        (to.time >= earliest_departure).then(|| TripToTripTransfer::new(from, to, walk, constraint))
    }
}

/// Drop candidates that cannot be part of a complete path.
///
/// A trip must be left after it was boarded, so alighting has to come
/// after the earliest boarding of the previous boundary (or the path's
/// first boarding), and boarding before the latest alighting of the next
/// boundary (or the path's last alighting). Repeats until stable.
fn prune(legs: &[TransitLeg], transfers: &mut [Vec<TripToTripTransfer>]) {
    let (Some(first), Some(last)) = (legs.first(), legs.last()) else {
        return;
    };

    loop {
        let mut changed = false;

        let mut earliest_board = first.board_pos;
        for list in transfers.iter_mut() {
            let before = list.len();
            list.retain(|tx| tx.from.stop_pos > earliest_board);
            changed |= list.len() != before;
            let Some(board) = list.iter().map(|tx| tx.to.stop_pos).min() else {
                return;
            };
            earliest_board = board;
        }

        let mut latest_alight = last.alight_pos;
        for list in transfers.iter_mut().rev() {
            let before = list.len();
            list.retain(|tx| tx.to.stop_pos < latest_alight);
            changed |= list.len() != before;
            let Some(alight) = list.iter().map(|tx| tx.from.stop_pos).max() else {
                return;
            };
            latest_alight = alight;
        }

        if !changed {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccessEgress, StopIndex, Timetable, TransitTime, TripPattern, Walk};
    use crate::raptor::{ConstrainedTransfer, DefaultSlackProvider, TransferPoint};

    fn t(s: &str) -> TransitTime {
        TransitTime::parse(s).unwrap()
    }

    fn trip(id: &str, stops: &[usize], times: &[&str]) -> TripSchedule {
        let pattern = Arc::new(
            TripPattern::new(id, stops.iter().map(|s| StopIndex(*s)).collect(), 0).unwrap(),
        );
        TripSchedule::with_times(id, pattern, times.iter().map(|s| t(s)).collect()).unwrap()
    }

    fn data(trips: Vec<TripSchedule>, walks: Vec<Walk>) -> TransitData {
        let timetables = trips
            .into_iter()
            .map(|trip| Timetable::new(Arc::clone(trip.pattern()), vec![trip]).unwrap())
            .collect();
        TransitData::new(8, timetables, walks).unwrap()
    }

    /// A path riding the only trip of each timetable, between the given
    /// positions.
    fn path(data: &TransitData, rides: &[(usize, usize, usize)]) -> TransitPath {
        let legs: Vec<TransitLeg> = rides
            .iter()
            .map(|(tt, board, alight)| {
                TransitLeg::new(
                    Arc::clone(data.timetable(*tt).trip(0)),
                    StopPos(*board),
                    StopPos(*alight),
                )
            })
            .collect();
        let first = &legs[0];
        let last = &legs[legs.len() - 1];
        TransitPath {
            access: AccessEgress::new(first.board_stop(), Duration::zero()),
            egress: AccessEgress::new(last.alight_stop(), Duration::zero()),
            departure_time: first.board_time(),
            arrival_time: last.alight_time(),
            walks: vec![Duration::zero(); legs.len() - 1],
            legs,
        }
    }

    fn summary(transfers: &[Vec<TripToTripTransfer>]) -> Vec<Vec<String>> {
        transfers
            .iter()
            .map(|list| {
                let mut list: Vec<String> = list
                    .iter()
                    .map(|tx| format!("{}->{}", tx.from.stop(), tx.to.stop()))
                    .collect();
                list.sort();
                list
            })
            .collect()
    }

    /// T1: A(0) 10:00, B(1) 10:10, C(2) 10:20
    /// T2: B(1) 10:15, C(2) 10:25, D(3) 10:35
    fn two_lines() -> TransitData {
        data(
            vec![
                trip("T1", &[0, 1, 2], &["10:00", "10:10", "10:20"]),
                trip("T2", &[1, 2, 3], &["10:15", "10:25", "10:35"]),
            ],
            vec![],
        )
    }

    fn slack(board: i64, transfer: i64) -> DefaultSlackProvider {
        DefaultSlackProvider::new(
            Duration::seconds(board),
            Duration::zero(),
            Duration::seconds(transfer),
        )
    }

    #[test]
    fn same_stop_transfers() {
        let data = two_lines();
        let slack = slack(0, 60);
        let generator = TransferGenerator::new(&data, &slack);

        let result = generator.find_all_possible_transfers(&path(&data, &[(0, 0, 1), (1, 0, 2)]));
        assert_eq!(summary(&result), vec![vec!["1->1", "2->2"]]);
    }

    #[test]
    fn slack_removes_tight_transfers() {
        let data = two_lines();
        let slack = slack(60, 300);
        let generator = TransferGenerator::new(&data, &slack);

        let result = generator.find_all_possible_transfers(&path(&data, &[(0, 0, 1), (1, 0, 2)]));
        assert_eq!(result, vec![vec![]]);
    }

    #[test]
    fn constraints_replace_slack() {
        let data = two_lines();
        let slack = slack(60, 300);
        let service = TransferService::new(vec![
            ConstrainedTransfer::new(
                TransferPoint::stop(StopIndex(1)),
                TransferPoint::stop(StopIndex(1)),
                TransferConstraint::Guaranteed,
            ),
            ConstrainedTransfer::new(
                TransferPoint::trip(StopIndex(2), "T1"),
                TransferPoint::trip(StopIndex(2), "T2"),
                TransferConstraint::MinTransferTime(Duration::minutes(2)),
            ),
        ]);
        let generator = TransferGenerator::new(&data, &slack).with_transfer_service(&service);

        // Min transfer time is raised to the transfer slack: 10:20 + 5m
        let result = generator.find_all_possible_transfers(&path(&data, &[(0, 0, 1), (1, 0, 2)]));
        assert_eq!(summary(&result), vec![vec!["1->1", "2->2"]]);
        let constraints: Vec<_> = result[0].iter().map(|tx| tx.constraint).collect();
        assert!(constraints.contains(&Some(TransferConstraint::Guaranteed)));
        assert!(constraints.contains(&Some(TransferConstraint::MinTransferTime(
            Duration::minutes(2)
        ))));
    }

    #[test]
    fn walking_and_not_allowed() {
        let data = data(
            vec![
                trip("T1", &[0, 1, 2], &["10:00", "10:10", "10:20"]),
                trip("T3", &[4, 5], &["10:14", "10:30"]),
            ],
            vec![Walk::new(StopIndex(1), StopIndex(4), Duration::minutes(2))],
        );
        let slack = slack(0, 60);
        let path = path(&data, &[(0, 0, 1), (1, 0, 1)]);

        let generator = TransferGenerator::new(&data, &slack);
        let result = generator.find_all_possible_transfers(&path);
        assert_eq!(summary(&result), vec![vec!["1->4"]]);
        assert_eq!(result[0][0].walk, Duration::minutes(2));

        let service = TransferService::new(vec![ConstrainedTransfer::new(
            TransferPoint::stop(StopIndex(1)),
            TransferPoint::stop(StopIndex(4)),
            TransferConstraint::NotAllowed,
        )]);
        let generator = generator.with_transfer_service(&service);
        assert_eq!(generator.find_all_possible_transfers(&path), vec![vec![]]);
    }

    #[test]
    fn candidates_pruned_to_the_path() {
        // T3: C(2) 10:30, D(3) 10:40, E(4) 10:50
        let data = data(
            vec![
                trip("T1", &[0, 1], &["10:00", "10:10"]),
                trip("T2", &[1, 2, 3], &["10:15", "10:25", "10:35"]),
                trip("T3", &[2, 3, 4], &["10:30", "10:40", "10:50"]),
            ],
            vec![],
        );
        let slack = slack(0, 60);
        let generator = TransferGenerator::new(&data, &slack);

        let to_e = path(&data, &[(0, 0, 1), (1, 0, 1), (2, 0, 2)]);
        let to_e = generator.find_all_possible_transfers(&to_e);
        assert_eq!(summary(&to_e), vec![vec!["1->1"], vec!["2->2", "3->3"]]);

        // Leaving T3 at D rules out boarding it at D
        let to_d = path(&data, &[(0, 0, 1), (1, 0, 1), (2, 0, 1)]);
        let to_d = generator.find_all_possible_transfers(&to_d);
        assert_eq!(summary(&to_d), vec![vec!["1->1"], vec!["2->2"]]);
    }

    #[test]
    fn later_first_boarding() {
        let data = two_lines();
        let slack = slack(0, 60);
        let generator = TransferGenerator::new(&data, &slack);

        // Boarding T1 at B leaves only C to change at
        let result = generator.find_all_possible_transfers(&path(&data, &[(0, 1, 2), (1, 1, 2)]));
        assert_eq!(summary(&result), vec![vec!["2->2"]]);
    }
}
