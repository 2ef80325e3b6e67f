//! Safeguard and pricing configuration.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Amount, Price, SafeguardPolicy};

/// `[safeguards]` section: deployment-wide safeguard policy.
///
/// Per-market thresholds (quorum, imbalance, house-bot budget) live on the
/// market itself; these values apply to every market.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SafeguardsConfig {
    pub house_bot_enabled: bool,
    pub severe_imbalance_threshold: Decimal,
    pub extreme_imbalance_threshold: Decimal,
    pub cheap_outcome_price: Price,
    /// Overrides the per-market manipulation threshold when set.
    pub manipulation_threshold: Option<Amount>,
    pub void_window_hours: u32,
    pub pool_drift_epsilon: Amount,
    /// Pool size the liquidity score treats as fully deep.
    pub liquidity_reference: Amount,
}

impl Default for SafeguardsConfig {
    fn default() -> Self {
        let policy = SafeguardPolicy::default();
        Self {
            house_bot_enabled: policy.house_bot_enabled,
            severe_imbalance_threshold: policy.severe_imbalance_threshold,
            extreme_imbalance_threshold: policy.extreme_imbalance_threshold,
            cheap_outcome_price: policy.cheap_outcome_price,
            manipulation_threshold: policy.manipulation_threshold,
            void_window_hours: 24,
            pool_drift_epsilon: policy.pool_drift_epsilon,
            liquidity_reference: Decimal::from(10_000),
        }
    }
}

impl SafeguardsConfig {
    /// The engine policy these settings describe.
    #[must_use]
    pub fn policy(&self) -> SafeguardPolicy {
        SafeguardPolicy {
            house_bot_enabled: self.house_bot_enabled,
            severe_imbalance_threshold: self.severe_imbalance_threshold,
            extreme_imbalance_threshold: self.extreme_imbalance_threshold,
            cheap_outcome_price: self.cheap_outcome_price,
            manipulation_threshold: self.manipulation_threshold,
            void_window: Duration::hours(i64::from(self.void_window_hours)),
            pool_drift_epsilon: self.pool_drift_epsilon,
        }
    }
}
