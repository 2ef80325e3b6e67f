//! Markets, outcomes and their betting pools.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{MarketId, OutcomeKey};
use super::money::{Amount, CurrencyCode};

/// Lifecycle of a market.
///
/// `draft → open → closed → {resolved | voided}`. Only `open` accepts bets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    Draft,
    Open,
    Closed,
    Resolved,
    Voided,
}

impl MarketStatus {
    /// Stable lowercase name used in storage and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Resolved => "resolved",
            Self::Voided => "voided",
        }
    }

    /// Resolved and voided markets never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Voided)
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "resolved" => Ok(Self::Resolved),
            "voided" => Ok(Self::Voided),
            other => Err(format!("unknown market status '{other}'")),
        }
    }
}

/// Per-market safeguard thresholds, fixed at market creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeguardConfig {
    /// Minimum total pool for the market to be considered valid.
    pub min_quorum_amount: Amount,
    /// Minimum number of outcomes holding a meaningful pool.
    pub min_outcomes: u32,
    /// An outcome pool must exceed this to count as backed.
    pub min_outcome_amount: Amount,
    /// Largest allowed share of the pool on one outcome, in `(0, 1]`.
    pub imbalance_threshold: Decimal,
    /// House-bot budget, in multiples of the market minimum bet.
    pub house_bot_amount: Amount,
    /// Whether the house bot may trade in this market.
    pub house_bot_enabled: bool,
    /// Recommend voiding when quorum fails close to the deadline.
    pub void_on_quorum_fail: bool,
}

impl Default for SafeguardConfig {
    fn default() -> Self {
        Self {
            min_quorum_amount: Decimal::from(100),
            min_outcomes: 2,
            min_outcome_amount: Decimal::ZERO,
            imbalance_threshold: Decimal::new(8, 1),
            house_bot_amount: Decimal::from(50),
            house_bot_enabled: false,
            void_on_quorum_fail: true,
        }
    }
}

/// One possible result of a market, with its betting pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub key: OutcomeKey,
    pub label: String,
    pub pool_amount: Amount,
    /// `None` until the market resolves.
    #[serde(default)]
    pub is_winner: Option<bool>,
}

impl Outcome {
    /// Create an outcome with an empty pool.
    pub fn new(key: impl Into<OutcomeKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            pool_amount: Decimal::ZERO,
            is_winner: None,
        }
    }

    /// Outcomes need a non-empty key and label to be bettable.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.key.as_str().trim().is_empty() && !self.label.trim().is_empty()
    }
}

/// A prediction market with its outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub title: String,
    pub status: MarketStatus,
    pub currency: CurrencyCode,
    pub outcomes: Vec<Outcome>,
    /// Always equal to the sum of the outcome pools.
    pub total_pool_amount: Amount,
    pub min_bet_amount: Amount,
    pub max_bet_amount: Amount,
    /// Platform fee in percent of the pool, taken at settlement.
    pub rake_percentage: Decimal,
    /// Creator share in percent of the rake.
    pub creator_revenue_share: Decimal,
    #[serde(default)]
    pub safeguards: SafeguardConfig,
    pub created_at: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    #[serde(default)]
    pub resolution_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_outcome: Option<OutcomeKey>,
    #[serde(default)]
    pub resolution_source: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub void_reason: Option<String>,
}

impl Market {
    /// Look up an outcome by key.
    #[must_use]
    pub fn outcome(&self, key: &OutcomeKey) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| &o.key == key)
    }

    fn outcome_mut(&mut self, key: &OutcomeKey) -> Result<&mut Outcome, DomainError> {
        self.outcomes
            .iter_mut()
            .find(|o| &o.key == key)
            .ok_or_else(|| DomainError::UnknownOutcome {
                key: key.to_string(),
            })
    }

    /// Sum of all outcome pools.
    #[must_use]
    pub fn outcome_pool_sum(&self) -> Amount {
        self.outcomes.iter().map(|o| o.pool_amount).sum()
    }

    /// Difference between the recorded total and the outcome pools.
    #[must_use]
    pub fn pool_drift(&self) -> Amount {
        (self.total_pool_amount - self.outcome_pool_sum()).abs()
    }

    /// Add stake to an outcome pool and the market total.
    pub fn add_stake(&mut self, key: &OutcomeKey, amount: Amount) -> Result<(), DomainError> {
        self.outcome_mut(key)?.pool_amount += amount;
        self.total_pool_amount += amount;
        Ok(())
    }

    /// Remove stake from an outcome pool and the market total.
    pub fn remove_stake(&mut self, key: &OutcomeKey, amount: Amount) -> Result<(), DomainError> {
        let outcome = self.outcome_mut(key)?;
        if outcome.pool_amount < amount {
            return Err(DomainError::NegativePool {
                key: key.to_string(),
            });
        }
        outcome.pool_amount -= amount;
        self.total_pool_amount -= amount;
        Ok(())
    }

    /// Whether the market takes bets at `now`.
    ///
    /// Returns the reason when it does not.
    pub fn betting_closed_reason(&self, now: DateTime<Utc>) -> Option<String> {
        if self.status != MarketStatus::Open {
            return Some(format!("market is {}", self.status));
        }
        if self.close_time <= now {
            return Some("market close time has passed".to_string());
        }
        if self.outcomes.len() < 2 {
            return Some("market needs at least two outcomes".to_string());
        }
        if !self.outcomes.iter().all(Outcome::is_well_formed) {
            return Some("market has a malformed outcome".to_string());
        }
        None
    }

    /// Open markets past their close time, or closed markets, can be resolved.
    #[must_use]
    pub fn is_resolvable(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            MarketStatus::Open => self.close_time <= now,
            MarketStatus::Closed => true,
            _ => false,
        }
    }

    /// Mark the winner and record how the result was sourced.
    pub fn resolve(
        &mut self,
        winner: &OutcomeKey,
        source: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.outcome(winner).is_none() {
            return Err(DomainError::UnknownOutcome {
                key: winner.to_string(),
            });
        }
        for outcome in &mut self.outcomes {
            outcome.is_winner = Some(&outcome.key == winner);
        }
        self.status = MarketStatus::Resolved;
        self.resolved_outcome = Some(winner.clone());
        self.resolution_source = Some(source.into());
        self.resolved_at = Some(now);
        Ok(())
    }

    /// Mark the market voided.
    pub fn void(&mut self, reason: impl Into<String>, now: DateTime<Utc>) {
        self.status = MarketStatus::Voided;
        self.void_reason = Some(reason.into());
        self.resolved_at = Some(now);
    }

    /// The winning outcome, once resolved.
    #[must_use]
    pub fn winner(&self) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.is_winner == Some(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::{market_with_pools, open_market};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn market_status_round_trips_through_str() {
        for status in [
            MarketStatus::Draft,
            MarketStatus::Open,
            MarketStatus::Closed,
            MarketStatus::Resolved,
            MarketStatus::Voided,
        ] {
            assert_eq!(status.as_str().parse::<MarketStatus>(), Ok(status));
        }
        assert!("bogus".parse::<MarketStatus>().is_err());
    }

    #[test]
    fn stake_keeps_total_in_sync() {
        let mut market = market_with_pools(&[dec!(600), dec!(400)]);
        market.add_stake(&OutcomeKey::new("o1"), dec!(100)).unwrap();
        assert_eq!(market.total_pool_amount, dec!(1100));
        assert_eq!(market.pool_drift(), Decimal::ZERO);

        market.remove_stake(&OutcomeKey::new("o1"), dec!(100)).unwrap();
        assert_eq!(market.total_pool_amount, dec!(1000));
        assert_eq!(market.outcome_pool_sum(), dec!(1000));
    }

    #[test]
    fn remove_stake_refuses_negative_pool() {
        let mut market = market_with_pools(&[dec!(10), dec!(0)]);
        let err = market
            .remove_stake(&OutcomeKey::new("o1"), dec!(1))
            .unwrap_err();
        assert!(matches!(err, DomainError::NegativePool { .. }));
        assert_eq!(market.total_pool_amount, dec!(10));
    }

    #[test]
    fn unknown_outcome_is_rejected() {
        let mut market = open_market();
        let err = market
            .add_stake(&OutcomeKey::new("maybe"), dec!(1))
            .unwrap_err();
        assert!(matches!(err, DomainError::UnknownOutcome { .. }));
    }

    #[test]
    fn betting_requires_open_future_market() {
        let mut market = open_market();
        let now = Utc::now();
        assert_eq!(market.betting_closed_reason(now), None);

        market.close_time = now - Duration::seconds(1);
        assert!(market.betting_closed_reason(now).is_some());

        market.close_time = now + Duration::hours(1);
        market.status = MarketStatus::Draft;
        assert!(market.betting_closed_reason(now).is_some());
    }

    #[test]
    fn malformed_outcome_blocks_betting() {
        let mut market = open_market();
        market.outcomes[1].label = "  ".to_string();
        assert!(market.betting_closed_reason(Utc::now()).is_some());
    }

    #[test]
    fn resolve_marks_every_outcome() {
        let mut market = open_market();
        let now = Utc::now();
        market.resolve(&OutcomeKey::new("o0"), "oracle", now).unwrap();

        assert_eq!(market.status, MarketStatus::Resolved);
        assert_eq!(market.winner().map(|o| o.key.as_str()), Some("o0"));
        assert!(market
            .outcomes
            .iter()
            .all(|o| o.is_winner.is_some()));
        assert_eq!(
            market.outcomes.iter().filter(|o| o.is_winner == Some(true)).count(),
            1
        );
    }

    #[test]
    fn resolvable_after_close_or_when_closed() {
        let mut market = open_market();
        let now = Utc::now();
        assert!(!market.is_resolvable(now));
        assert!(market.is_resolvable(market.close_time));

        market.status = MarketStatus::Closed;
        assert!(market.is_resolvable(now));

        market.status = MarketStatus::Voided;
        assert!(!market.is_resolvable(now));
    }
}
