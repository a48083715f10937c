//! Search results: transit paths and their transfer-optimized form.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;

use super::{
    StopIndex, StopPos, TransferConstraint, TransitTime, TripSchedule, TripToTripTransfer,
};

/// An access or egress leg: a walk between the origin (or destination)
/// and a stop, optionally only available inside an opening window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEgress {
    pub stop: StopIndex,
    pub duration: Duration,
    /// Earliest and latest time the leg may start, inclusive.
    pub opening: Option<(TransitTime, TransitTime)>,
}

impl AccessEgress {
    pub fn new(stop: StopIndex, duration: Duration) -> Self {
        Self {
            stop,
            duration,
            opening: None,
        }
    }

    /// Restrict the leg to start between `open` and `close`.
    pub fn with_opening_hours(mut self, open: TransitTime, close: TransitTime) -> Self {
        self.opening = Some((open, close));
        self
    }

    pub fn has_opening_hours(&self) -> bool {
        self.opening.is_some()
    }
}

/// One ride on a trip, from a board position to a later alight position.
#[derive(Clone, PartialEq, Eq)]
pub struct TransitLeg {
    pub trip: Arc<TripSchedule>,
    pub board_pos: StopPos,
    pub alight_pos: StopPos,
    /// The transfer rule this leg was boarded with.
    pub constraint: Option<TransferConstraint>,
}

impl TransitLeg {
    pub fn new(trip: Arc<TripSchedule>, board_pos: StopPos, alight_pos: StopPos) -> Self {
        Self {
            trip,
            board_pos,
            alight_pos,
            constraint: None,
        }
    }

    pub fn with_constraint(mut self, constraint: Option<TransferConstraint>) -> Self {
        self.constraint = constraint;
        self
    }

    pub fn board_stop(&self) -> StopIndex {
        self.trip.pattern().stop_index(self.board_pos)
    }

    pub fn alight_stop(&self) -> StopIndex {
        self.trip.pattern().stop_index(self.alight_pos)
    }

    pub fn board_time(&self) -> TransitTime {
        self.trip.departure(self.board_pos)
    }

    pub fn alight_time(&self) -> TransitTime {
        self.trip.arrival(self.alight_pos)
    }

    /// In-vehicle time.
    pub fn duration(&self) -> Duration {
        self.alight_time().duration_since(self.board_time())
    }
}

impl fmt::Debug for TransitLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{} {} -> {}{} {}",
            self.trip.id(),
            self.board_stop(),
            self.board_pos,
            self.board_time(),
            self.alight_stop(),
            self.alight_pos,
            self.alight_time()
        )
    }
}

/// A journey found by the range search.
///
/// `walks[i]` is the walking time between `legs[i]` and `legs[i + 1]`,
/// zero when both legs use the same stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitPath {
    pub access: AccessEgress,
    pub legs: Vec<TransitLeg>,
    pub walks: Vec<Duration>,
    pub egress: AccessEgress,
    pub departure_time: TransitTime,
    pub arrival_time: TransitTime,
}

impl TransitPath {
    pub fn number_of_transfers(&self) -> usize {
        self.legs.len().saturating_sub(1)
    }

    /// Door-to-door travel time.
    pub fn duration(&self) -> Duration {
        self.arrival_time.duration_since(self.departure_time)
    }

    /// Total in-vehicle time.
    pub fn transit_duration(&self) -> Duration {
        self.legs
            .iter()
            .fold(Duration::zero(), |acc, leg| acc + leg.duration())
    }

    /// Trip ids in travel order, e.g. `["T1", "T2"]`.
    pub fn trip_ids(&self) -> Vec<&str> {
        self.legs.iter().map(|leg| leg.trip.id()).collect()
    }
}

impl fmt::Display for TransitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({} transfers):",
            self.departure_time,
            self.arrival_time,
            self.number_of_transfers()
        )?;
        for leg in &self.legs {
            write!(f, " [{leg:?}]")?;
        }
        Ok(())
    }
}

/// A path after transfer optimization.
///
/// Legs are re-derived from the chosen transfers, so board and alight
/// positions may differ from the path the search produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedPath {
    pub access: AccessEgress,
    pub legs: Vec<TransitLeg>,
    pub transfers: Vec<TripToTripTransfer>,
    pub egress: AccessEgress,
    pub departure_time: TransitTime,
    pub arrival_time: TransitTime,
    pub generalized_cost: i64,
    /// Present only when wait-time optimization is enabled.
    pub wait_time_optimized_cost: Option<i64>,
    pub transfer_priority_cost: i64,
    pub break_tie_cost: i64,
}

impl OptimizedPath {
    pub fn number_of_transfers(&self) -> usize {
        self.transfers.len()
    }

    pub fn trip_ids(&self) -> Vec<&str> {
        self.legs.iter().map(|leg| leg.trip.id()).collect()
    }
}

impl fmt::Display for OptimizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} cost {}",
            self.departure_time, self.arrival_time, self.generalized_cost
        )?;
        if let Some(wait_cost) = self.wait_time_optimized_cost {
            write!(f, " (wait-optimized {wait_cost})")?;
        }
        write!(f, ":")?;
        for leg in &self.legs {
            write!(f, " [{leg:?}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TripPattern;

    fn t(s: &str) -> TransitTime {
        TransitTime::parse(s).unwrap()
    }

    fn leg(id: &str, stops: &[usize], times: &[&str], board: usize, alight: usize) -> TransitLeg {
        let pattern = Arc::new(
            TripPattern::new(id, stops.iter().map(|s| StopIndex(*s)).collect(), 0).unwrap(),
        );
        let times = times.iter().map(|s| t(s)).collect();
        let trip = Arc::new(TripSchedule::with_times(id, pattern, times).unwrap());
        TransitLeg::new(trip, StopPos(board), StopPos(alight))
    }

    #[test]
    fn leg_accessors() {
        let leg = leg("T1", &[0, 1, 2], &["10:00", "10:10", "10:25"], 1, 2);
        assert_eq!(leg.board_stop(), StopIndex(1));
        assert_eq!(leg.alight_stop(), StopIndex(2));
        assert_eq!(leg.duration(), Duration::minutes(15));
        assert_eq!(format!("{leg:?}"), "T1 1#1 10:10 -> 2#2 10:25");
    }

    #[test]
    fn path_summary() {
        let path = TransitPath {
            access: AccessEgress::new(StopIndex(0), Duration::minutes(2)),
            legs: vec![
                leg("T1", &[0, 1], &["10:00", "10:10"], 0, 1),
                leg("T2", &[1, 2], &["10:15", "10:40"], 0, 1),
            ],
            walks: vec![Duration::zero()],
            egress: AccessEgress::new(StopIndex(2), Duration::minutes(3)),
            departure_time: t("09:58"),
            arrival_time: t("10:43"),
        };

        assert_eq!(path.number_of_transfers(), 1);
        assert_eq!(path.duration(), Duration::minutes(45));
        assert_eq!(path.transit_duration(), Duration::minutes(35));
        assert_eq!(path.trip_ids(), vec!["T1", "T2"]);
        assert_eq!(
            path.to_string(),
            "09:58 -> 10:43 (1 transfers): [T1 0#0 10:00 -> 1#1 10:10] [T2 1#0 10:15 -> 2#1 10:40]"
        );
    }

    #[test]
    fn opening_hours() {
        let access = AccessEgress::new(StopIndex(0), Duration::minutes(5));
        assert!(!access.has_opening_hours());

        let access = access.with_opening_hours(t("08:00"), t("09:00"));
        assert_eq!(access.opening, Some((t("08:00"), t("09:00"))));
    }
}
