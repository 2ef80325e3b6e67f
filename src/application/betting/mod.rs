//! Bet and market workflows.

pub mod coordinator;
pub mod market;

use rust_decimal::Decimal;

pub use coordinator::BetCoordinator;
pub use market::MarketCoordinator;

/// Tunables of the bet workflows.
#[derive(Debug, Clone, PartialEq)]
pub struct BettingSettings {
    /// How long after placement a bet may still be cancelled.
    pub cancellation_window_secs: u64,
    /// Slippage tolerance in percent when a request names none.
    pub default_max_slippage: Decimal,
}

impl Default for BettingSettings {
    fn default() -> Self {
        Self {
            cancellation_window_secs: 300,
            default_max_slippage: Decimal::from(5),
        }
    }
}
