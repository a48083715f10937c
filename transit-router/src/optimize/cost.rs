//! Cost model for choosing between transfer points.
//!
//! All costs are integers in hundredths of a second, so that fractional
//! reluctance factors still compare exactly.

use chrono::Duration;

use super::config::CostConfig;
use crate::domain::{StopIndex, TransitLeg, TransitPath, TripSchedule, TripToTripTransfer};
use crate::raptor::SlackProvider;

/// Cost units per second.
const COST_PER_SECOND: f64 = 100.0;

/// Share of the in-vehicle time that counts as a safe transfer time.
const TRANSIT_TIME_DIVISOR: i32 = 15;

/// Upper bound for the safe transfer time of long journeys (minutes).
const MAX_MIN_SAFE_TRANSFER_MINS: i64 = 40;

fn cost_of(duration: Duration, factor: f64) -> i64 {
    (duration.num_seconds() as f64 * factor * COST_PER_SECOND).round() as i64
}

/// The shortest transfer time considered safe.
///
/// Longer journeys can afford (and deserve) more buffer, so the baseline
/// grows with the time spent on board.
pub struct MinSafeTransferTimeCalculator<'a> {
    slack: &'a dyn SlackProvider,
}

impl<'a> MinSafeTransferTimeCalculator<'a> {
    pub fn new(slack: &'a dyn SlackProvider) -> Self {
        Self { slack }
    }

    /// Baseline for a whole path: a fifteenth of its in-vehicle time,
    /// at most 40 minutes.
    pub fn min_safe_transfer_time(&self, path: &TransitPath) -> Duration {
        (path.transit_duration() / TRANSIT_TIME_DIVISOR)
            .min(Duration::minutes(MAX_MIN_SAFE_TRANSFER_MINS))
    }

    /// Safe transfer time between two trips: the path baseline, but never
    /// less than the slack the search itself required.
    pub fn min_safe_transfer_time_between(
        &self,
        baseline: Duration,
        from: &TripSchedule,
        to: &TripSchedule,
    ) -> Duration {
        let slack = self.slack.alight_slack(from.pattern().slack_index())
            + self.slack.transfer_slack()
            + self.slack.board_slack(to.pattern().slack_index());
        baseline.max(slack)
    }
}

/// Cost of the waiting time at a transfer.
///
/// For a wait `t` and a safe transfer time `t0` the cost is
/// `n * t0 / (1 + (n - 1) * t / t0) + a * t`, where `n` is the min safe
/// wait time factor and `a` the back-travel factor. A transfer with no
/// slack at all costs `n * t0`; the cost drops quickly as the wait
/// approaches `t0`, then the linear term takes over and penalizes
/// waiting longer than needed.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use transit_router::optimize::TransferWaitTimeCostCalculator;
///
/// let calc = TransferWaitTimeCostCalculator::new(0.0, 5.0);
/// let t0 = Duration::minutes(1);
///
/// // Zero wait costs five times the safe transfer time
/// assert_eq!(calc.cost(Duration::zero(), t0), 300 * 100);
/// assert!(calc.cost(Duration::minutes(1), t0) < calc.cost(Duration::seconds(30), t0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferWaitTimeCostCalculator {
    back_travel_wait_time_factor: f64,
    min_safe_wait_time_factor: f64,
}

impl TransferWaitTimeCostCalculator {
    pub fn new(back_travel_wait_time_factor: f64, min_safe_wait_time_factor: f64) -> Self {
        Self {
            back_travel_wait_time_factor,
            min_safe_wait_time_factor,
        }
    }

    /// Cost of waiting `wait` where `min_safe` would be a safe transfer.
    pub fn cost(&self, wait: Duration, min_safe: Duration) -> i64 {
        let t = wait.num_seconds().max(0) as f64;
        let t0 = min_safe.num_seconds().max(0) as f64;
        let n = self.min_safe_wait_time_factor;

        let back_travel = self.back_travel_wait_time_factor * t;
        let cost = if t0 > 0.0 {
            n * t0 / (1.0 + (n - 1.0) * t / t0) + back_travel
        } else {
            back_travel
        };
        (cost * COST_PER_SECOND).round() as i64
    }
}

/// Generalized cost: time weighted by how the traveller perceives it,
/// plus a fixed cost per boarding.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralizedCostCalculator {
    board_cost: i64,
    transit_reluctance: f64,
    wait_reluctance: f64,
    walk_reluctance: f64,
    /// Extra cost of boarding or alighting at a stop, indexed by stop.
    stop_board_alight_costs: Option<Vec<i64>>,
}

impl GeneralizedCostCalculator {
    pub fn new(config: &CostConfig) -> Self {
        Self {
            board_cost: cost_of(config.board_cost(), 1.0),
            transit_reluctance: config.transit_reluctance,
            wait_reluctance: config.wait_reluctance,
            walk_reluctance: config.walk_reluctance,
            stop_board_alight_costs: None,
        }
    }

    /// Add per-stop board and alight costs, given in seconds and scaled
    /// by `factor`.
    pub fn with_stop_board_alight_costs(mut self, costs_secs: &[i64], factor: f64) -> Self {
        let costs = costs_secs
            .iter()
            .map(|secs| cost_of(Duration::seconds(*secs), factor))
            .collect();
        self.stop_board_alight_costs = Some(costs);
        self
    }

    fn stop_cost(&self, stop: StopIndex) -> i64 {
        self.stop_board_alight_costs
            .as_ref()
            .and_then(|costs| costs.get(stop.0).copied())
            .unwrap_or(0)
    }

    pub fn wait_cost(&self, wait: Duration) -> i64 {
        cost_of(wait, self.wait_reluctance)
    }

    pub fn walk_cost(&self, walk: Duration) -> i64 {
        cost_of(walk, self.walk_reluctance)
    }

    /// Boarding, riding and alighting one leg.
    pub fn leg_cost(&self, leg: &TransitLeg) -> i64 {
        self.board_cost
            + cost_of(leg.duration(), self.transit_reluctance)
            + self.stop_cost(leg.board_stop())
            + self.stop_cost(leg.alight_stop())
    }

    /// Walking and waiting between two legs.
    pub fn transfer_cost(&self, transfer: &TripToTripTransfer) -> i64 {
        self.walk_cost(transfer.walk) + self.wait_cost(transfer.wait_time().max(Duration::zero()))
    }

    /// Access and egress legs, with the waiting around them.
    ///
    /// These are the same for every choice of transfer points.
    pub fn access_egress_cost(&self, path: &TransitPath) -> i64 {
        let (Some(first), Some(last)) = (path.legs.first(), path.legs.last()) else {
            return 0;
        };
        let wait_before =
            first.board_time().duration_since(path.departure_time) - path.access.duration;
        let wait_after =
            path.arrival_time.duration_since(last.alight_time()) - path.egress.duration;

        self.walk_cost(path.access.duration + path.egress.duration)
            + self.wait_cost(wait_before.max(Duration::zero()))
            + self.wait_cost(wait_after.max(Duration::zero()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccessEgress, StopPos, TransitTime, TripPattern, TripStopTime};
    use crate::raptor::DefaultSlackProvider;
    use std::sync::Arc;

    fn trip(id: &str, stops: &[usize], times: &[&str]) -> Arc<TripSchedule> {
        let pattern = Arc::new(
            TripPattern::new(id, stops.iter().map(|s| StopIndex(*s)).collect(), 0).unwrap(),
        );
        let times = times.iter().map(|s| TransitTime::parse(s).unwrap()).collect();
        Arc::new(TripSchedule::with_times(id, pattern, times).unwrap())
    }

    fn path(legs: Vec<TransitLeg>) -> TransitPath {
        let first = legs[0].clone();
        let last = legs[legs.len() - 1].clone();
        TransitPath {
            access: AccessEgress::new(first.board_stop(), Duration::minutes(2)),
            egress: AccessEgress::new(last.alight_stop(), Duration::minutes(3)),
            departure_time: first.board_time() - Duration::minutes(5),
            arrival_time: last.alight_time() + Duration::minutes(3),
            walks: vec![Duration::zero(); legs.len() - 1],
            legs,
        }
    }

    #[test]
    fn min_safe_transfer_time() {
        let slack = DefaultSlackProvider::new(
            Duration::seconds(30),
            Duration::seconds(30),
            Duration::minutes(2),
        );
        let calc = MinSafeTransferTimeCalculator::new(&slack);

        let t1 = trip("T1", &[0, 1], &["10:00", "11:00"]);
        let t2 = trip("T2", &[1, 2], &["11:10", "12:25"]);
        let short = path(vec![TransitLeg::new(t1.clone(), StopPos(0), StopPos(1))]);
        let long = path(vec![
            TransitLeg::new(t1.clone(), StopPos(0), StopPos(1)),
            TransitLeg::new(t2.clone(), StopPos(0), StopPos(1)),
        ]);

        assert_eq!(calc.min_safe_transfer_time(&short), Duration::minutes(4));
        assert_eq!(calc.min_safe_transfer_time(&long), Duration::minutes(9));
        assert_eq!(
            calc.min_safe_transfer_time_between(Duration::minutes(1), &t1, &t2),
            Duration::minutes(3)
        );

        let t3 = trip("T3", &[0, 1], &["00:00", "20:00"]);
        let very_long = path(vec![TransitLeg::new(t3, StopPos(0), StopPos(1))]);
        assert_eq!(calc.min_safe_transfer_time(&very_long), Duration::minutes(40));
    }

    #[test]
    fn wait_time_cost_shape() {
        let calc = TransferWaitTimeCostCalculator::new(1.0, 5.0);
        let t0 = Duration::minutes(2);

        // f(0) = n * t0, f(t0) = t0 + a * t0
        assert_eq!(calc.cost(Duration::zero(), t0), 600 * 100);
        assert_eq!(calc.cost(t0, t0), 240 * 100);

        // Waiting longer than needed costs more again
        let costs: Vec<i64> = [0, 1, 2, 5, 10, 20, 60]
            .iter()
            .map(|m| calc.cost(Duration::minutes(*m), t0))
            .collect();
        assert!(costs[0] > costs[1] && costs[1] > costs[2]);
        assert!(costs[4] < costs[5] && costs[5] < costs[6]);
    }

    #[test]
    fn wait_time_cost_without_safe_time() {
        let calc = TransferWaitTimeCostCalculator::new(0.5, 5.0);
        assert_eq!(calc.cost(Duration::minutes(4), Duration::zero()), 120 * 100);
        assert_eq!(calc.cost(Duration::minutes(-4), Duration::zero()), 0);
    }

    #[test]
    fn generalized_cost() {
        let calc = GeneralizedCostCalculator::new(&CostConfig::default());
        let t1 = trip("T1", &[0, 1, 2], &["10:00", "10:10", "10:20"]);
        let t2 = trip("T2", &[3, 4], &["10:25", "10:35"]);

        let leg = TransitLeg::new(t1.clone(), StopPos(0), StopPos(2));
        assert_eq!(calc.leg_cost(&leg), (600 + 1200) * 100);

        let tx = TripToTripTransfer::new(
            TripStopTime::arrival(t1.clone(), StopPos(2)),
            TripStopTime::departure(t2, StopPos(0)),
            Duration::minutes(2),
            None,
        );
        // Walk 2m at reluctance 2, then wait 3m
        assert_eq!(calc.transfer_cost(&tx), (240 + 180) * 100);

        // Walk 5m at reluctance 2, wait 3m before boarding
        let p = path(vec![leg]);
        assert_eq!(calc.access_egress_cost(&p), (600 + 180) * 100);
    }

    #[test]
    fn stop_board_alight_costs() {
        let calc = GeneralizedCostCalculator::new(&CostConfig {
            board_cost_secs: 0,
            ..CostConfig::default()
        })
        .with_stop_board_alight_costs(&[0, 0, 60], 0.5);
        let t1 = trip("T1", &[0, 1, 2], &["10:00", "10:10", "10:20"]);

        let to_b = TransitLeg::new(t1.clone(), StopPos(0), StopPos(1));
        let to_c = TransitLeg::new(t1, StopPos(0), StopPos(2));
        assert_eq!(calc.leg_cost(&to_b), 600 * 100);
        assert_eq!(calc.leg_cost(&to_c), (1200 + 30) * 100);
    }
}
