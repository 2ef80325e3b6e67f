//! Risk gatekeeper service.
//!
//! Validates a prospective bet against market and user eligibility, bet
//! size, daily and position caps, rate limit, cooldown and wallet funds.
//! Checks run in that order and stop at the first failure.

use chrono::{Duration, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::limits::RiskLimits;
use crate::application::seconds;
use crate::domain::{Amount, BetStatus, MarketStatus};
use crate::error::{PositionScope, Result, RiskError};
use crate::port::inbound::risk::{BetIntent, RiskCheckResult, RiskGate};
use crate::port::outbound::store::Repository;

/// Trailing window of the rate limit.
const RATE_WINDOW_SECS: i64 = 60;

/// Share of the pool on one outcome that counts as imbalanced for scoring.
const SCORE_IMBALANCE_SHARE: Decimal = Decimal::from_parts(8, 0, 0, false, 1);

/// Fallback for score components whose query failed.
const UNKNOWN_RISK: f64 = 0.5;

/// Risk gatekeeper that validates bets before execution.
pub struct RiskGatekeeper {
    limits: RiskLimits,
}

impl RiskGatekeeper {
    /// Create a gatekeeper with the given limits.
    pub const fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    /// The configured limits.
    #[must_use]
    pub const fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Run every check, returning the first violation.
    fn evaluate(
        &self,
        repo: &dyn Repository,
        intent: &BetIntent<'_>,
    ) -> Result<Option<RiskError>> {
        if let Some(e) = self.check_market(intent) {
            return Ok(Some(e));
        }
        if let Some(e) = self.check_user(repo, intent)? {
            return Ok(Some(e));
        }
        if let Some(e) = self.check_bet_size(intent) {
            return Ok(Some(e));
        }
        if let Some(e) = self.check_daily_limit(repo, intent)? {
            return Ok(Some(e));
        }
        if self.limits.enforce_position_limits {
            if let Some(e) = self.check_position_limits(repo, intent)? {
                return Ok(Some(e));
            }
        }
        if let Some(e) = self.check_rate_limit(repo, intent)? {
            return Ok(Some(e));
        }
        if let Some(e) = self.check_cooldown(repo, intent)? {
            return Ok(Some(e));
        }
        Ok(self.check_wallet(repo, intent))
    }

    fn check_market(&self, intent: &BetIntent<'_>) -> Option<RiskError> {
        let market = intent.market;
        let reason = market.betting_closed_reason(intent.now).or_else(|| {
            market
                .outcome(intent.outcome_key)
                .is_none()
                .then(|| format!("outcome '{}' does not exist", intent.outcome_key))
        })?;
        Some(RiskError::MarketNotOpenForBetting {
            market_id: market.id.to_string(),
            reason,
        })
    }

    fn check_user(
        &self,
        repo: &dyn Repository,
        intent: &BetIntent<'_>,
    ) -> Result<Option<RiskError>> {
        let reason = match repo.user(intent.user_id)? {
            None => "user is not registered",
            Some(profile) => match profile.ineligibility(intent.now, self.limits.require_kyc) {
                None => return Ok(None),
                Some(reason) => reason,
            },
        };
        Ok(Some(RiskError::Unauthorized {
            user_id: intent.user_id.to_string(),
            reason: reason.to_string(),
        }))
    }

    fn check_bet_size(&self, intent: &BetIntent<'_>) -> Option<RiskError> {
        let min = self.limits.effective_min(intent.market);
        let max = self.limits.effective_max(intent.market);
        if intent.amount < min {
            return Some(RiskError::BetTooSmall {
                amount: intent.amount,
                min,
            });
        }
        if intent.amount > max {
            return Some(RiskError::BetTooLarge {
                amount: intent.amount,
                max,
            });
        }
        None
    }

    fn check_daily_limit(
        &self,
        repo: &dyn Repository,
        intent: &BetIntent<'_>,
    ) -> Result<Option<RiskError>> {
        let day_start = intent.now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let spent = repo.amount_placed_since(intent.user_id, day_start)?;
        if spent + intent.amount > self.limits.daily_limit {
            return Ok(Some(RiskError::DailyLimitExceeded {
                spent,
                amount: intent.amount,
                limit: self.limits.daily_limit,
            }));
        }
        Ok(None)
    }

    fn check_position_limits(
        &self,
        repo: &dyn Repository,
        intent: &BetIntent<'_>,
    ) -> Result<Option<RiskError>> {
        let in_market = repo.active_position(intent.user_id, Some(&intent.market.id))?;
        if in_market + intent.amount > self.limits.max_position_per_market {
            return Ok(Some(RiskError::PositionLimitExceeded {
                scope: PositionScope::Market,
                current: in_market,
                amount: intent.amount,
                limit: self.limits.max_position_per_market,
            }));
        }

        let overall = repo.active_position(intent.user_id, None)?;
        if overall + intent.amount > self.limits.max_position_per_user {
            return Ok(Some(RiskError::PositionLimitExceeded {
                scope: PositionScope::User,
                current: overall,
                amount: intent.amount,
                limit: self.limits.max_position_per_user,
            }));
        }
        Ok(None)
    }

    fn check_rate_limit(
        &self,
        repo: &dyn Repository,
        intent: &BetIntent<'_>,
    ) -> Result<Option<RiskError>> {
        let since = intent.now - Duration::seconds(RATE_WINDOW_SECS);
        let count = repo.bets_placed_since(intent.user_id, since, Some(BetStatus::Active))?;
        if count >= self.limits.max_bets_per_minute {
            return Ok(Some(RiskError::RateLimitExceeded {
                count,
                limit: self.limits.max_bets_per_minute,
            }));
        }
        Ok(None)
    }

    fn check_cooldown(
        &self,
        repo: &dyn Repository,
        intent: &BetIntent<'_>,
    ) -> Result<Option<RiskError>> {
        if self.limits.cooldown_secs == 0 {
            return Ok(None);
        }
        let cooldown = seconds(self.limits.cooldown_secs);
        let Some(last) = repo.last_bet_at(intent.user_id)? else {
            return Ok(None);
        };
        let ready_at = last + cooldown;
        if ready_at > intent.now {
            let remaining_secs = (ready_at - intent.now).num_seconds().max(1);
            return Ok(Some(RiskError::BetCooldownActive { remaining_secs }));
        }
        Ok(None)
    }

    /// Lookup failures count as an empty wallet.
    fn check_wallet(&self, repo: &dyn Repository, intent: &BetIntent<'_>) -> Option<RiskError> {
        let available = match repo.wallet(intent.user_id, &intent.market.currency) {
            Ok(Some(wallet)) => wallet.available_balance(),
            Ok(None) => Decimal::ZERO,
            Err(e) => {
                warn!(
                    user_id = %intent.user_id,
                    error = %e,
                    "Wallet lookup failed during risk check"
                );
                Decimal::ZERO
            }
        };
        (intent.amount > available).then_some(RiskError::InsufficientWalletBalance {
            available,
            required: intent.amount,
        })
    }

    fn amount_risk(&self, intent: &BetIntent<'_>) -> f64 {
        let max = self.limits.effective_max(intent.market);
        ratio(intent.amount, max)
    }

    fn position_risk(&self, repo: &dyn Repository, intent: &BetIntent<'_>) -> f64 {
        match repo.active_position(intent.user_id, Some(&intent.market.id)) {
            Ok(current) => ratio(current + intent.amount, self.limits.max_position_per_market),
            Err(e) => {
                debug!(error = %e, "Position lookup failed, scoring as medium risk");
                UNKNOWN_RISK
            }
        }
    }

    fn frequency_risk(&self, repo: &dyn Repository, intent: &BetIntent<'_>) -> f64 {
        let since = intent.now - Duration::seconds(RATE_WINDOW_SECS);
        match repo.bets_placed_since(intent.user_id, since, Some(BetStatus::Active)) {
            Ok(count) => ratio(
                Decimal::from(count),
                Decimal::from(self.limits.max_bets_per_minute),
            ),
            Err(e) => {
                debug!(error = %e, "Bet count lookup failed, scoring as medium risk");
                UNKNOWN_RISK
            }
        }
    }

    fn market_risk(intent: &BetIntent<'_>) -> f64 {
        let market = intent.market;
        if market.status != MarketStatus::Open {
            return 1.0;
        }
        let mut risk = 0.0;
        if market.total_pool_amount < market.safeguards.min_quorum_amount {
            risk += 0.4;
        }
        if market.total_pool_amount > Decimal::ZERO {
            let largest = market
                .outcomes
                .iter()
                .map(|o| o.pool_amount)
                .max()
                .unwrap_or_default();
            if largest / market.total_pool_amount > SCORE_IMBALANCE_SHARE {
                risk += 0.3;
            }
        }
        f64::min(risk, 1.0)
    }

    fn time_risk(intent: &BetIntent<'_>) -> f64 {
        let remaining = intent.market.close_time - intent.now;
        if remaining <= Duration::hours(1) {
            1.0
        } else if remaining <= Duration::days(1) {
            0.5
        } else {
            0.1
        }
    }
}

impl RiskGate for RiskGatekeeper {
    fn check(&self, repo: &dyn Repository, intent: &BetIntent<'_>) -> Result<RiskCheckResult> {
        match self.evaluate(repo, intent)? {
            None => {
                debug!(
                    user_id = %intent.user_id,
                    market_id = %intent.market.id,
                    amount = %intent.amount,
                    "Bet approved"
                );
                Ok(RiskCheckResult::Approved)
            }
            Some(error) => {
                warn!(
                    user_id = %intent.user_id,
                    market_id = %intent.market.id,
                    amount = %intent.amount,
                    reason = %error,
                    "Bet rejected by risk check"
                );
                Ok(RiskCheckResult::Rejected(error))
            }
        }
    }

    fn risk_score(&self, repo: &dyn Repository, intent: &BetIntent<'_>) -> f64 {
        let score = 0.25 * self.amount_risk(intent)
            + 0.20 * self.position_risk(repo, intent)
            + 0.15 * self.frequency_risk(repo, intent)
            + 0.25 * Self::market_risk(intent)
            + 0.15 * Self::time_risk(intent);
        (score * 100.0).clamp(0.0, 100.0)
    }
}

/// `value / limit` clamped to `[0, 1]`; a non-positive limit is fully used.
fn ratio(value: Amount, limit: Amount) -> f64 {
    if limit <= Decimal::ZERO {
        return 1.0;
    }
    (value / limit).to_f64().unwrap_or(1.0).clamp(0.0, 1.0)
}
