//! Search configuration for the range search.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Error from validating configuration values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A slack value is below zero
    #[error("{name} must not be negative, got {value}s")]
    NegativeSlack { name: &'static str, value: i64 },

    /// A fixed cost is below zero
    #[error("{name} must not be negative, got {value}s")]
    NegativeCost { name: &'static str, value: i64 },

    /// A cost factor is below zero or not a number
    #[error("{name} must be a non-negative number, got {value}")]
    InvalidFactor { name: &'static str, value: f64 },

    /// The iteration step must move the departure time
    #[error("iteration step must be positive, got {0}s")]
    ZeroIterationStep(i64),

    /// The search window is negative
    #[error("search window must not be negative, got {0}s")]
    InvalidSearchWindow(i64),
}

/// Board and alight slack for one slack index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackOverride {
    pub slack_index: usize,
    pub board_slack_secs: i64,
    pub alight_slack_secs: i64,
}

/// Slack values applied around boarding and alighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Minimum time between arriving at a stop and boarding (seconds).
    pub board_slack_secs: i64,

    /// Time added after a vehicle arrives before the traveller is off (seconds).
    pub alight_slack_secs: i64,

    /// Extra time added to every transfer between two trips (seconds).
    pub transfer_slack_secs: i64,

    /// Board and alight slack for specific slack indexes.
    pub overrides: Vec<SlackOverride>,
}

impl SlackConfig {
    pub fn board_slack(&self) -> Duration {
        Duration::seconds(self.board_slack_secs)
    }

    pub fn alight_slack(&self) -> Duration {
        Duration::seconds(self.alight_slack_secs)
    }

    pub fn transfer_slack(&self) -> Duration {
        Duration::seconds(self.transfer_slack_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("board slack", self.board_slack_secs),
            ("alight slack", self.alight_slack_secs),
            ("transfer slack", self.transfer_slack_secs),
        ];
        let overrides = self.overrides.iter().flat_map(|o| {
            [
                ("board slack override", o.board_slack_secs),
                ("alight slack override", o.alight_slack_secs),
            ]
        });

        for (name, value) in values.into_iter().chain(overrides) {
            if value < 0 {
                return Err(ConfigError::NegativeSlack { name, value });
            }
        }
        Ok(())
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            board_slack_secs: 0,
            alight_slack_secs: 0,
            transfer_slack_secs: 120,
            overrides: Vec::new(),
        }
    }
}

/// Configuration parameters for the range search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaptorConfig {
    pub slack: SlackConfig,

    /// Distance between two departure-time iterations (seconds).
    pub iteration_step_secs: i64,

    /// Maximum number of transfers; the search runs one more round than this.
    pub max_transfers: usize,

    /// Restrict first-round boarding to the iteration time window in every
    /// iteration but the first.
    pub exact_window_search: bool,
}

impl RaptorConfig {
    /// Returns the iteration step as a Duration.
    pub fn iteration_step(&self) -> Duration {
        Duration::seconds(self.iteration_step_secs)
    }

    /// Number of transit rounds to run.
    pub fn max_rounds(&self) -> usize {
        self.max_transfers + 1
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iteration_step_secs <= 0 {
            return Err(ConfigError::ZeroIterationStep(self.iteration_step_secs));
        }
        self.slack.validate()
    }
}

impl Default for RaptorConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig::default(),
            iteration_step_secs: 60,
            max_transfers: 5,
            exact_window_search: true,
        }
    }
}
