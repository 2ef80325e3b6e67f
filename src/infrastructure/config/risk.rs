//! Risk limit configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::risk::RiskLimits;

/// `[risk]` section: deployment-wide betting limits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Smallest bet accepted anywhere.
    pub min_bet_amount: Decimal,
    /// Largest bet accepted anywhere.
    pub max_bet_amount: Decimal,
    /// Cap on one user's active stake in a single market.
    pub max_position_per_market: Decimal,
    /// Cap on one user's active stake across all markets.
    pub max_position_per_user: Decimal,
    /// Bets allowed per user in any trailing minute.
    pub max_bets_per_minute: u32,
    /// Seconds a user must wait between bets (0 disables).
    pub cooldown_secs: u64,
    /// Summed amount a user may bet per UTC day.
    pub daily_limit: Decimal,
    pub enforce_position_limits: bool,
    pub require_kyc: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskLimits::default().into()
    }
}

impl From<RiskLimits> for RiskConfig {
    fn from(limits: RiskLimits) -> Self {
        Self {
            min_bet_amount: limits.min_bet_amount,
            max_bet_amount: limits.max_bet_amount,
            max_position_per_market: limits.max_position_per_market,
            max_position_per_user: limits.max_position_per_user,
            max_bets_per_minute: limits.max_bets_per_minute,
            cooldown_secs: limits.cooldown_secs,
            daily_limit: limits.daily_limit,
            enforce_position_limits: limits.enforce_position_limits,
            require_kyc: limits.require_kyc,
        }
    }
}

impl From<RiskConfig> for RiskLimits {
    fn from(config: RiskConfig) -> Self {
        Self {
            min_bet_amount: config.min_bet_amount,
            max_bet_amount: config.max_bet_amount,
            max_position_per_market: config.max_position_per_market,
            max_position_per_user: config.max_position_per_user,
            max_bets_per_minute: config.max_bets_per_minute,
            cooldown_secs: config.cooldown_secs,
            daily_limit: config.daily_limit,
            enforce_position_limits: config.enforce_position_limits,
            require_kyc: config.require_kyc,
        }
    }
}
