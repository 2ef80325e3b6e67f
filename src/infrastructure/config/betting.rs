//! Bet workflow and settlement worker configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::betting::BettingSettings;

/// `[betting]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BettingConfig {
    /// Seconds after placement during which a bet can be cancelled.
    pub cancellation_window_secs: u64,
    /// Slippage tolerance in percent for requests that name none.
    pub default_max_slippage: Decimal,
}

impl Default for BettingConfig {
    fn default() -> Self {
        let settings = BettingSettings::default();
        Self {
            cancellation_window_secs: settings.cancellation_window_secs,
            default_max_slippage: settings.default_max_slippage,
        }
    }
}

impl From<BettingConfig> for BettingSettings {
    fn from(config: BettingConfig) -> Self {
        Self {
            cancellation_window_secs: config.cancellation_window_secs,
            default_max_slippage: config.default_max_slippage,
        }
    }
}

/// `[settlement]` section: outbox worker tunables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Entries processed per worker pass.
    pub batch_size: usize,
    /// Attempts after which a failing entry is left for an operator.
    pub max_attempts: u32,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_attempts: 5,
        }
    }
}
