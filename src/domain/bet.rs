//! Bets placed against outcome pools.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{BetId, MarketId, OutcomeKey, TransactionId, UserId};
use super::money::{Amount, Price, CONTRACT_FACE_VALUE};

/// Lifecycle of a bet: `active → settled | refunded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Active,
    Settled,
    Refunded,
}

impl BetStatus {
    /// Stable lowercase name used in storage and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Settled => "settled",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "settled" => Ok(Self::Settled),
            "refunded" => Ok(Self::Refunded),
            other => Err(format!("unknown bet status '{other}'")),
        }
    }
}

/// A user's stake on one outcome of one market.
///
/// Amount and price never change after placement; only status, settlement
/// amount and the settlement timestamp move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub user_id: UserId,
    pub market_id: MarketId,
    pub outcome_key: OutcomeKey,
    pub amount: Amount,
    pub contracts: Decimal,
    pub price_per_contract: Price,
    pub total_cost: Amount,
    pub status: BetStatus,
    /// Debit transaction that funded the bet.
    pub transaction_id: Option<TransactionId>,
    pub settlement_amount: Option<Amount>,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Bet {
    /// Whether the bet still holds stake in its market.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == BetStatus::Active
    }

    /// What the contracts pay if the outcome wins at face value.
    #[must_use]
    pub fn max_payout(&self) -> Amount {
        self.contracts * CONTRACT_FACE_VALUE
    }

    /// Amount implied by contracts and price; equals `amount` up to rounding.
    #[must_use]
    pub fn implied_amount(&self) -> Amount {
        self.contracts * self.price_per_contract / Decimal::ONE_HUNDRED
    }

    /// Mark the bet refunded with its full stake.
    pub fn refund(&mut self, now: DateTime<Utc>) {
        self.status = BetStatus::Refunded;
        self.settlement_amount = Some(self.amount);
        self.settled_at = Some(now);
    }

    /// Mark the bet settled with the given payout (zero for losers).
    pub fn settle(&mut self, payout: Amount, now: DateTime<Utc>) {
        self.status = BetStatus::Settled;
        self.settlement_amount = Some(payout);
        self.settled_at = Some(now);
    }
}

/// Filter for a user's bet history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BetFilter {
    pub status: Option<BetStatus>,
    pub market_id: Option<MarketId>,
}

impl BetFilter {
    /// Whether a bet passes the filter.
    #[must_use]
    pub fn matches(&self, bet: &Bet) -> bool {
        self.status.map_or(true, |s| s == bet.status)
            && self.market_id.as_ref().map_or(true, |m| m == &bet.market_id)
    }
}
