//! Board, alight and transfer slack.

use std::collections::HashMap;

use chrono::Duration;

use super::config::SlackConfig;

/// Source of slack values, keyed by a pattern's slack index.
///
/// Values are always given for a forward search; the calculator swaps
/// board and alight slack when searching in reverse.
pub trait SlackProvider {
    /// Minimum time from arriving at a stop until a trip can be boarded.
    fn board_slack(&self, slack_index: usize) -> Duration;

    /// Time from a trip's arrival until the traveller has alighted.
    fn alight_slack(&self, slack_index: usize) -> Duration;

    /// Extra time for every transfer between two trips.
    fn transfer_slack(&self) -> Duration;
}

/// Slack from configuration, with optional per-index overrides.
#[derive(Debug, Clone)]
pub struct DefaultSlackProvider {
    board: Duration,
    alight: Duration,
    transfer: Duration,
    overrides: HashMap<usize, (Duration, Duration)>,
}

impl DefaultSlackProvider {
    pub fn new(board: Duration, alight: Duration, transfer: Duration) -> Self {
        Self {
            board,
            alight,
            transfer,
            overrides: HashMap::new(),
        }
    }

    /// Use other board and alight slack for one slack index.
    pub fn with_override(mut self, slack_index: usize, board: Duration, alight: Duration) -> Self {
        self.overrides.insert(slack_index, (board, alight));
        self
    }
}

impl From<&SlackConfig> for DefaultSlackProvider {
    fn from(config: &SlackConfig) -> Self {
        config.overrides.iter().fold(
            DefaultSlackProvider::new(
                config.board_slack(),
                config.alight_slack(),
                config.transfer_slack(),
            ),
            |provider, o| {
                provider.with_override(
                    o.slack_index,
                    Duration::seconds(o.board_slack_secs),
                    Duration::seconds(o.alight_slack_secs),
                )
            },
        )
    }
}

impl SlackProvider for DefaultSlackProvider {
    fn board_slack(&self, slack_index: usize) -> Duration {
        self.overrides
            .get(&slack_index)
            .map_or(self.board, |(board, _)| *board)
    }

    fn alight_slack(&self, slack_index: usize) -> Duration {
        self.overrides
            .get(&slack_index)
            .map_or(self.alight, |(_, alight)| *alight)
    }

    fn transfer_slack(&self) -> Duration {
        self.transfer
    }
}
