//! Configuration for transfer optimization and the cost model.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::raptor::ConfigError;

/// Check that a factor is a finite number of at least `min`.
fn check_factor(name: &'static str, value: f64, min: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min {
        Ok(())
    } else {
        Err(ConfigError::InvalidFactor { name, value })
    }
}

/// Weights of the generalized cost.
///
/// Costs are measured in seconds of "equivalent travel time"; reluctance
/// factors scale the time spent riding, waiting and walking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Fixed cost of every boarding (seconds).
    pub board_cost_secs: i64,

    pub transit_reluctance: f64,

    pub wait_reluctance: f64,

    pub walk_reluctance: f64,
}

impl CostConfig {
    /// Returns the board cost as a Duration.
    pub fn board_cost(&self) -> Duration {
        Duration::seconds(self.board_cost_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_cost_secs < 0 {
            return Err(ConfigError::NegativeCost {
                name: "board cost",
                value: self.board_cost_secs,
            });
        }
        check_factor("transit reluctance", self.transit_reluctance, 0.0)?;
        check_factor("wait reluctance", self.wait_reluctance, 0.0)?;
        check_factor("walk reluctance", self.walk_reluctance, 0.0)
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            board_cost_secs: 600, // 10 minutes
            transit_reluctance: 1.0,
            wait_reluctance: 1.0,
            walk_reluctance: 2.0,
        }
    }
}

/// Which transfer optimizations to run, and their weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferOptimizationParameters {
    /// Prefer stay-seated and guaranteed transfers over regular ones.
    pub optimize_transfer_priority: bool,

    /// Spread waiting time over transfers instead of minimizing
    /// generalized cost.
    pub optimize_transfer_wait_time: bool,

    /// Cost of a zero-wait transfer, as a multiple of the minimum safe
    /// transfer time. Must be at least 1.
    pub min_safe_wait_time_factor: f64,

    /// Cost per second of waiting, to avoid boarding earlier than needed.
    pub back_travel_wait_time_factor: f64,

    /// Weight of the per-stop board and alight costs.
    pub extra_stop_board_alight_costs_factor: f64,
}

impl TransferOptimizationParameters {
    /// Returns true if any optimization is enabled.
    pub fn enabled(&self) -> bool {
        self.optimize_transfer_priority || self.optimize_transfer_wait_time
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_factor("min safe wait time factor", self.min_safe_wait_time_factor, 1.0)?;
        check_factor(
            "back travel wait time factor",
            self.back_travel_wait_time_factor,
            0.0,
        )?;
        check_factor(
            "extra stop board alight costs factor",
            self.extra_stop_board_alight_costs_factor,
            0.0,
        )
    }
}

impl Default for TransferOptimizationParameters {
    fn default() -> Self {
        Self {
            optimize_transfer_priority: true,
            optimize_transfer_wait_time: true,
            min_safe_wait_time_factor: 5.0,
            back_travel_wait_time_factor: 1.0,
            extra_stop_board_alight_costs_factor: 0.0,
        }
    }
}
