//! Market-health safeguards: quorum, imbalance, house-bot sizing and void risk.
//!
//! Everything here reads pool figures only. Nothing looks at individual users,
//! and nothing mutates the market; callers act on the returned assessments.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{MarketId, OutcomeKey};
use super::market::Market;
use super::money::{round_money, Amount, Price};
use super::pricing::{OutcomePrice, PricingModel};

/// Deployment-wide safeguard parameters.
///
/// The imbalance and manipulation constants have no derivation behind them
/// and are expected to be recalibrated, so all of them are configurable.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeguardPolicy {
    /// Master switch for house-bot interventions.
    pub house_bot_enabled: bool,
    /// Dominant share that lets the house bot step in.
    pub severe_imbalance_threshold: Decimal,
    /// Dominant share at which the whole budget goes to the weakest outcome.
    pub extreme_imbalance_threshold: Decimal,
    /// Outcomes priced below this are under-backed and the only ones the
    /// house bot supports once no outcome is empty.
    pub cheap_outcome_price: Price,
    /// Single-outcome pool above which manipulation is suspected.
    ///
    /// `None` falls back to `max_bet_amount × min_bet_amount` of the market.
    pub manipulation_threshold: Option<Amount>,
    /// How close to the close time a failed quorum recommends voiding.
    pub void_window: Duration,
    /// Tolerated gap between the market total and the outcome pools.
    pub pool_drift_epsilon: Amount,
}

impl Default for SafeguardPolicy {
    fn default() -> Self {
        Self {
            house_bot_enabled: true,
            severe_imbalance_threshold: Decimal::new(9, 1),
            extreme_imbalance_threshold: Decimal::new(95, 2),
            cheap_outcome_price: Decimal::TEN,
            manipulation_threshold: None,
            void_window: Duration::hours(24),
            pool_drift_epsilon: Decimal::new(1, 2),
        }
    }
}

/// Outcome of the quorum check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuorumCheck {
    pub met: bool,
    pub total_pool: Amount,
    pub required_pool: Amount,
    pub backed_outcomes: u32,
    pub required_outcomes: u32,
}

/// Outcome of the imbalance check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImbalanceCheck {
    pub balanced: bool,
    /// Share of the pool held by the largest outcome, in `[0, 1]`.
    pub max_share: Decimal,
    pub threshold: Decimal,
    pub dominant_outcome: Option<OutcomeKey>,
}

/// How the house bot spreads its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseBotStrategy {
    /// Whole budget on the least-backed outcome.
    BackWeakest,
    /// Budget split evenly across empty outcomes.
    FillEmpty,
    /// Budget split across cheaply priced outcomes.
    SupportCheap,
}

/// One house-bot bet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseBotPosition {
    pub outcome_key: OutcomeKey,
    pub amount: Amount,
}

/// A planned house-bot intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseBotPlan {
    pub strategy: HouseBotStrategy,
    pub budget: Amount,
    pub positions: Vec<HouseBotPosition>,
}

/// Why voiding is recommended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum VoidReason {
    /// Quorum failed and the market closes within the void window.
    QuorumFailed { closes_in_hours: i64 },
    /// A single outcome pool is suspiciously large.
    Manipulation { outcome_key: OutcomeKey, pool: Amount },
    /// The market total disagrees with its outcome pools.
    PoolDrift { drift: Amount },
}

/// Void recommendation with its reasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidAssessment {
    pub should_void: bool,
    pub reasons: Vec<VoidReason>,
}

/// Full health picture of a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeguardStatus {
    pub market_id: MarketId,
    pub quorum: QuorumCheck,
    pub imbalance: ImbalanceCheck,
    pub house_bot: Option<HouseBotPlan>,
    pub void: VoidAssessment,
    /// Advisory 0–100.
    pub risk_score: f64,
    /// Advisory 0–100.
    pub liquidity_score: f64,
    pub prices: Vec<OutcomePrice>,
}

/// Market-health analysis.
pub trait SafeguardEngine: Send + Sync {
    /// Enough money on enough outcomes.
    fn check_quorum(&self, market: &Market) -> QuorumCheck;

    /// Whether the largest outcome holds at most `threshold` of the pool.
    fn check_imbalance(&self, market: &Market, threshold: Decimal) -> ImbalanceCheck;

    /// Whether the house bot should intervene.
    fn should_trigger_house_bot(&self, market: &Market) -> bool;

    /// Positions the house bot would take, if it should intervene.
    fn house_bot_plan(&self, market: &Market) -> Option<HouseBotPlan>;

    /// Whether voiding is recommended at `now`.
    fn assess_void_risk(&self, market: &Market, now: DateTime<Utc>) -> VoidAssessment;

    /// Composite 0–100 risk score.
    fn risk_score(&self, market: &Market, now: DateTime<Utc>) -> f64;

    /// Every check at once.
    fn status(&self, market: &Market, now: DateTime<Utc>) -> SafeguardStatus;
}

/// Production safeguard engine over pool-ratio prices.
pub struct PoolSafeguards {
    policy: SafeguardPolicy,
    pricing: Arc<dyn PricingModel>,
}

impl PoolSafeguards {
    /// Create an engine with the given policy and pricing model.
    pub fn new(policy: SafeguardPolicy, pricing: Arc<dyn PricingModel>) -> Self {
        Self { policy, pricing }
    }

    /// The active policy.
    #[must_use]
    pub fn policy(&self) -> &SafeguardPolicy {
        &self.policy
    }

    fn backed_outcomes(market: &Market) -> u32 {
        let floor = market.safeguards.min_outcome_amount;
        market
            .outcomes
            .iter()
            .filter(|o| o.pool_amount > floor)
            .count() as u32
    }

    /// Saturates at `Decimal::MAX` for extreme bet bounds.
    fn manipulation_threshold(&self, market: &Market) -> Amount {
        self.policy.manipulation_threshold.unwrap_or_else(|| {
            market
                .max_bet_amount
                .checked_mul(market.min_bet_amount)
                .unwrap_or(Decimal::MAX)
        })
    }

    fn house_bot_budget(market: &Market) -> Amount {
        market
            .safeguards
            .house_bot_amount
            .checked_mul(market.min_bet_amount)
            .unwrap_or(Decimal::MAX)
    }

    /// Quadratic urgency ramp over the final quarter of the market lifetime.
    fn close_urgency(market: &Market, now: DateTime<Utc>) -> f64 {
        let lifetime = (market.close_time - market.created_at).num_seconds();
        let remaining = (market.close_time - now).num_seconds();
        if remaining <= 0 {
            return 1.0;
        }
        if lifetime <= 0 {
            return 0.0;
        }
        let fraction = remaining as f64 / lifetime as f64;
        if fraction >= 0.25 {
            return 0.0;
        }
        let ramp = (0.25 - fraction) / 0.25;
        ramp * ramp
    }

    /// Population standard deviation of outcome prices, scaled to `[0, 1]`.
    fn price_volatility(&self, market: &Market) -> f64 {
        let prices: Vec<f64> = self
            .pricing
            .market_prices(market)
            .iter()
            .filter_map(|p| p.price.to_f64())
            .collect();
        if prices.len() < 2 {
            return 0.0;
        }
        let n = prices.len() as f64;
        let mean = prices.iter().sum::<f64>() / n;
        let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        // Prices live in [0, 100], so the deviation can never exceed 50.
        (variance.sqrt() / 50.0).clamp(0.0, 1.0)
    }
}

impl SafeguardEngine for PoolSafeguards {
    fn check_quorum(&self, market: &Market) -> QuorumCheck {
        let config = &market.safeguards;
        let backed = Self::backed_outcomes(market);
        QuorumCheck {
            met: market.total_pool_amount >= config.min_quorum_amount
                && backed >= config.min_outcomes,
            total_pool: market.total_pool_amount,
            required_pool: config.min_quorum_amount,
            backed_outcomes: backed,
            required_outcomes: config.min_outcomes,
        }
    }

    fn check_imbalance(&self, market: &Market, threshold: Decimal) -> ImbalanceCheck {
        let total = market.total_pool_amount;
        let dominant = market.outcomes.iter().max_by_key(|o| o.pool_amount);
        let max_share = match dominant {
            Some(o) if total > Decimal::ZERO => o.pool_amount / total,
            _ => Decimal::ZERO,
        };
        let balanced = market.outcomes.len() > 1 && max_share <= threshold;
        ImbalanceCheck {
            balanced,
            max_share,
            threshold,
            dominant_outcome: dominant
                .filter(|o| o.pool_amount > Decimal::ZERO)
                .map(|o| o.key.clone()),
        }
    }

    fn should_trigger_house_bot(&self, market: &Market) -> bool {
        if !(self.policy.house_bot_enabled && market.safeguards.house_bot_enabled) {
            return false;
        }
        if market.total_pool_amount >= Self::house_bot_budget(market) {
            return false;
        }
        let imbalance = self.check_imbalance(market, self.policy.severe_imbalance_threshold);
        imbalance.max_share > self.policy.severe_imbalance_threshold
            || Self::backed_outcomes(market) < 2
    }

    fn house_bot_plan(&self, market: &Market) -> Option<HouseBotPlan> {
        if !self.should_trigger_house_bot(market) || market.outcomes.is_empty() {
            return None;
        }
        let budget = Self::house_bot_budget(market);
        let imbalance = self.check_imbalance(market, self.policy.extreme_imbalance_threshold);

        if imbalance.max_share > self.policy.extreme_imbalance_threshold {
            let weakest = market.outcomes.iter().min_by_key(|o| o.pool_amount)?;
            return Some(HouseBotPlan {
                strategy: HouseBotStrategy::BackWeakest,
                budget,
                positions: vec![HouseBotPosition {
                    outcome_key: weakest.key.clone(),
                    amount: budget,
                }],
            });
        }

        let empty: Vec<OutcomeKey> = market
            .outcomes
            .iter()
            .filter(|o| o.pool_amount.is_zero())
            .map(|o| o.key.clone())
            .collect();
        if !empty.is_empty() {
            return Some(HouseBotPlan {
                strategy: HouseBotStrategy::FillEmpty,
                budget,
                positions: split_evenly(budget, &empty),
            });
        }

        let cheap: Vec<OutcomeKey> = self
            .pricing
            .market_prices(market)
            .into_iter()
            .filter(|p| p.price < self.policy.cheap_outcome_price)
            .map(|p| p.key)
            .collect();
        if cheap.is_empty() {
            return None;
        }
        Some(HouseBotPlan {
            strategy: HouseBotStrategy::SupportCheap,
            budget,
            positions: split_evenly(budget, &cheap),
        })
    }

    fn assess_void_risk(&self, market: &Market, now: DateTime<Utc>) -> VoidAssessment {
        let mut reasons = Vec::new();

        let until_close = market.close_time - now;
        if market.safeguards.void_on_quorum_fail
            && until_close <= self.policy.void_window
            && !self.check_quorum(market).met
        {
            reasons.push(VoidReason::QuorumFailed {
                closes_in_hours: until_close.num_hours(),
            });
        }

        let threshold = self.manipulation_threshold(market);
        for outcome in &market.outcomes {
            if outcome.pool_amount > threshold {
                reasons.push(VoidReason::Manipulation {
                    outcome_key: outcome.key.clone(),
                    pool: outcome.pool_amount,
                });
            }
        }

        let drift = market.pool_drift();
        if drift > self.policy.pool_drift_epsilon {
            reasons.push(VoidReason::PoolDrift { drift });
        }

        VoidAssessment {
            should_void: !reasons.is_empty(),
            reasons,
        }
    }

    fn risk_score(&self, market: &Market, now: DateTime<Utc>) -> f64 {
        let mut score = 0.0;

        if !self.check_quorum(market).met {
            score += 25.0;
        }
        if !self
            .check_imbalance(market, market.safeguards.imbalance_threshold)
            .balanced
        {
            score += 20.0;
        }

        let required = market.safeguards.min_quorum_amount;
        if required > Decimal::ZERO {
            let ratio = (market.total_pool_amount / required).to_f64().unwrap_or(0.0);
            score += 15.0 * (1.0 - ratio).clamp(0.0, 1.0);
        }

        score += 10.0 * Self::close_urgency(market, now);

        let threshold = self.manipulation_threshold(market);
        if market.outcomes.iter().any(|o| o.pool_amount > threshold) {
            score += 20.0;
        }

        score += 10.0 * self.price_volatility(market);

        score.clamp(0.0, 100.0)
    }

    fn status(&self, market: &Market, now: DateTime<Utc>) -> SafeguardStatus {
        SafeguardStatus {
            market_id: market.id.clone(),
            quorum: self.check_quorum(market),
            imbalance: self.check_imbalance(market, market.safeguards.imbalance_threshold),
            house_bot: self.house_bot_plan(market),
            void: self.assess_void_risk(market, now),
            risk_score: self.risk_score(market, now),
            liquidity_score: self.pricing.liquidity_score(market),
            prices: self.pricing.market_prices(market),
        }
    }
}

fn split_evenly(budget: Amount, keys: &[OutcomeKey]) -> Vec<HouseBotPosition> {
    if keys.is_empty() {
        return Vec::new();
    }
    let share = round_money(budget / Decimal::from(keys.len()));
    keys.iter()
        .map(|key| HouseBotPosition {
            outcome_key: key.clone(),
            amount: share,
        })
        .collect()
}
