//! Database model types for Diesel ORM.
//!
//! Decimals travel as text and timestamps as fixed-width RFC 3339 strings,
//! so both survive the round trip exactly and timestamps sort as text.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::schema::{bets, ledger_transactions, market_outcomes, markets, outbox, users, wallets};
use crate::domain::{
    Bet, CurrencyCode, LedgerTransaction, Market, Outcome, OutboxEntry, UserProfile, Wallet,
};
use crate::error::{Error, Result};

/// Render a timestamp the way every table stores it.
pub fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("timestamp '{value}': {e}")))
}

fn parse_optional_time(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_time).transpose()
}

pub fn parse_decimal(value: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|e| Error::Parse(format!("decimal '{value}': {e}")))
}

fn parse_enum<T: FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse().map_err(Error::Parse)
}

/// Database row for a market without its outcomes.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = markets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketRow {
    pub id: String,
    pub title: String,
    pub status: String,
    pub currency: String,
    pub total_pool_amount: String,
    pub min_bet_amount: String,
    pub max_bet_amount: String,
    pub rake_percentage: String,
    pub creator_revenue_share: String,
    pub safeguards: String,
    pub created_at: String,
    pub close_time: String,
    pub resolution_deadline: Option<String>,
    pub resolved_outcome: Option<String>,
    pub resolution_source: Option<String>,
    pub resolved_at: Option<String>,
    pub void_reason: Option<String>,
}

impl MarketRow {
    pub fn from_market(market: &Market) -> Result<Self> {
        Ok(Self {
            id: market.id.to_string(),
            title: market.title.clone(),
            status: market.status.as_str().to_string(),
            currency: market.currency.to_string(),
            total_pool_amount: market.total_pool_amount.to_string(),
            min_bet_amount: market.min_bet_amount.to_string(),
            max_bet_amount: market.max_bet_amount.to_string(),
            rake_percentage: market.rake_percentage.to_string(),
            creator_revenue_share: market.creator_revenue_share.to_string(),
            safeguards: serde_json::to_string(&market.safeguards)?,
            created_at: stamp(market.created_at),
            close_time: stamp(market.close_time),
            resolution_deadline: market.resolution_deadline.map(stamp),
            resolved_outcome: market.resolved_outcome.as_ref().map(ToString::to_string),
            resolution_source: market.resolution_source.clone(),
            resolved_at: market.resolved_at.map(stamp),
            void_reason: market.void_reason.clone(),
        })
    }

    /// Rebuild the market from this row and its outcome rows.
    pub fn into_market(self, mut outcomes: Vec<OutcomeRow>) -> Result<Market> {
        outcomes.sort_by_key(|o| o.position);
        let outcomes = outcomes
            .into_iter()
            .map(OutcomeRow::into_outcome)
            .collect::<Result<Vec<_>>>()?;
        Ok(Market {
            id: self.id.into(),
            title: self.title,
            status: parse_enum(&self.status)?,
            currency: CurrencyCode::new(&self.currency),
            outcomes,
            total_pool_amount: parse_decimal(&self.total_pool_amount)?,
            min_bet_amount: parse_decimal(&self.min_bet_amount)?,
            max_bet_amount: parse_decimal(&self.max_bet_amount)?,
            rake_percentage: parse_decimal(&self.rake_percentage)?,
            creator_revenue_share: parse_decimal(&self.creator_revenue_share)?,
            safeguards: serde_json::from_str(&self.safeguards)?,
            created_at: parse_time(&self.created_at)?,
            close_time: parse_time(&self.close_time)?,
            resolution_deadline: parse_optional_time(self.resolution_deadline)?,
            resolved_outcome: self.resolved_outcome.map(Into::into),
            resolution_source: self.resolution_source,
            resolved_at: parse_optional_time(self.resolved_at)?,
            void_reason: self.void_reason,
        })
    }
}

/// Database row for one outcome of a market.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = market_outcomes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OutcomeRow {
    pub market_id: String,
    pub outcome_key: String,
    pub position: i32,
    pub label: String,
    pub pool_amount: String,
    pub is_winner: Option<bool>,
}

impl OutcomeRow {
    /// Rows for every outcome of `market`, keeping their order.
    pub fn for_market(market: &Market) -> Vec<Self> {
        market
            .outcomes
            .iter()
            .enumerate()
            .map(|(i, outcome)| Self {
                market_id: market.id.to_string(),
                outcome_key: outcome.key.to_string(),
                position: i32::try_from(i).unwrap_or(i32::MAX),
                label: outcome.label.clone(),
                pool_amount: outcome.pool_amount.to_string(),
                is_winner: outcome.is_winner,
            })
            .collect()
    }

    fn into_outcome(self) -> Result<Outcome> {
        Ok(Outcome {
            key: self.outcome_key.into(),
            label: self.label,
            pool_amount: parse_decimal(&self.pool_amount)?,
            is_winner: self.is_winner,
        })
    }
}

/// Database row for a wallet.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = wallets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WalletRow {
    pub id: String,
    pub user_id: String,
    pub currency: String,
    pub balance: String,
    pub locked_balance: String,
    pub is_locked: bool,
}

impl From<&Wallet> for WalletRow {
    fn from(wallet: &Wallet) -> Self {
        Self {
            id: wallet.id().to_string(),
            user_id: wallet.user_id().to_string(),
            currency: wallet.currency().to_string(),
            balance: wallet.balance().to_string(),
            locked_balance: wallet.locked_balance().to_string(),
            is_locked: wallet.is_locked(),
        }
    }
}

impl TryFrom<WalletRow> for Wallet {
    type Error = Error;

    fn try_from(row: WalletRow) -> Result<Self> {
        Ok(Wallet::restore(
            row.id.into(),
            row.user_id.into(),
            CurrencyCode::new(&row.currency),
            parse_decimal(&row.balance)?,
            parse_decimal(&row.locked_balance)?,
            row.is_locked,
        ))
    }
}

/// Database row for a ledger transaction (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = ledger_transactions)]
pub struct NewTransactionRow {
    pub id: String,
    pub wallet_id: String,
    pub kind: String,
    pub amount: String,
    pub balance_before: String,
    pub balance_after: String,
    pub reference: Option<String>,
    pub description: String,
    pub created_at: String,
}

impl From<&LedgerTransaction> for NewTransactionRow {
    fn from(tx: &LedgerTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            wallet_id: tx.wallet_id.to_string(),
            kind: tx.kind.as_str().to_string(),
            amount: tx.amount.to_string(),
            balance_before: tx.balance_before.to_string(),
            balance_after: tx.balance_after.to_string(),
            reference: tx.reference.as_ref().map(ToString::to_string),
            description: tx.description.clone(),
            created_at: stamp(tx.created_at),
        }
    }
}

/// Database row for a ledger transaction (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = ledger_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionRow {
    pub seq: Option<i32>,
    pub id: String,
    pub wallet_id: String,
    pub kind: String,
    pub amount: String,
    pub balance_before: String,
    pub balance_after: String,
    pub reference: Option<String>,
    pub description: String,
    pub created_at: String,
}

impl TryFrom<TransactionRow> for LedgerTransaction {
    type Error = Error;

    fn try_from(row: TransactionRow) -> Result<Self> {
        Ok(LedgerTransaction {
            id: row.id.into(),
            wallet_id: row.wallet_id.into(),
            kind: parse_enum(&row.kind)?,
            amount: parse_decimal(&row.amount)?,
            balance_before: parse_decimal(&row.balance_before)?,
            balance_after: parse_decimal(&row.balance_after)?,
            reference: row.reference.map(Into::into),
            description: row.description,
            created_at: parse_time(&row.created_at)?,
        })
    }
}

/// Database row for a bet.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = bets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BetRow {
    pub id: String,
    pub user_id: String,
    pub market_id: String,
    pub outcome_key: String,
    pub amount: String,
    pub contracts: String,
    pub price_per_contract: String,
    pub total_cost: String,
    pub status: String,
    pub transaction_id: Option<String>,
    pub settlement_amount: Option<String>,
    pub placed_at: String,
    pub settled_at: Option<String>,
}

impl From<&Bet> for BetRow {
    fn from(bet: &Bet) -> Self {
        Self {
            id: bet.id.to_string(),
            user_id: bet.user_id.to_string(),
            market_id: bet.market_id.to_string(),
            outcome_key: bet.outcome_key.to_string(),
            amount: bet.amount.to_string(),
            contracts: bet.contracts.to_string(),
            price_per_contract: bet.price_per_contract.to_string(),
            total_cost: bet.total_cost.to_string(),
            status: bet.status.as_str().to_string(),
            transaction_id: bet.transaction_id.as_ref().map(ToString::to_string),
            settlement_amount: bet.settlement_amount.map(|a| a.to_string()),
            placed_at: stamp(bet.placed_at),
            settled_at: bet.settled_at.map(stamp),
        }
    }
}

impl TryFrom<BetRow> for Bet {
    type Error = Error;

    fn try_from(row: BetRow) -> Result<Self> {
        Ok(Bet {
            id: row.id.into(),
            user_id: row.user_id.into(),
            market_id: row.market_id.into(),
            outcome_key: row.outcome_key.into(),
            amount: parse_decimal(&row.amount)?,
            contracts: parse_decimal(&row.contracts)?,
            price_per_contract: parse_decimal(&row.price_per_contract)?,
            total_cost: parse_decimal(&row.total_cost)?,
            status: parse_enum(&row.status)?,
            transaction_id: row.transaction_id.map(Into::into),
            settlement_amount: row
                .settlement_amount
                .as_deref()
                .map(parse_decimal)
                .transpose()?,
            placed_at: parse_time(&row.placed_at)?,
            settled_at: parse_optional_time(row.settled_at)?,
        })
    }
}

/// Database row for a user profile.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub id: String,
    pub is_active: bool,
    pub locked_until: Option<String>,
    pub email_verified: bool,
    pub kyc_status: String,
}

impl From<&UserProfile> for UserRow {
    fn from(user: &UserProfile) -> Self {
        Self {
            id: user.id.to_string(),
            is_active: user.is_active,
            locked_until: user.locked_until.map(stamp),
            email_verified: user.email_verified,
            kyc_status: user.kyc_status.as_str().to_string(),
        }
    }
}

impl TryFrom<UserRow> for UserProfile {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(UserProfile {
            id: row.id.into(),
            is_active: row.is_active,
            locked_until: parse_optional_time(row.locked_until)?,
            email_verified: row.email_verified,
            kyc_status: parse_enum(&row.kyc_status)?,
        })
    }
}

/// Database row for an outbox entry (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = outbox)]
pub struct NewOutboxRow {
    pub id: String,
    pub kind: String,
    pub market_id: String,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: String,
    pub processed_at: Option<String>,
}

impl From<&OutboxEntry> for NewOutboxRow {
    fn from(entry: &OutboxEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            kind: entry.kind.as_str().to_string(),
            market_id: entry.market_id.to_string(),
            status: entry.status.as_str().to_string(),
            attempts: i32::try_from(entry.attempts).unwrap_or(i32::MAX),
            last_error: entry.last_error.clone(),
            created_at: stamp(entry.created_at),
            processed_at: entry.processed_at.map(stamp),
        }
    }
}

/// Database row for an outbox entry (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = outbox)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OutboxRow {
    pub seq: Option<i32>,
    pub id: String,
    pub kind: String,
    pub market_id: String,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: String,
    pub processed_at: Option<String>,
}

impl TryFrom<OutboxRow> for OutboxEntry {
    type Error = Error;

    fn try_from(row: OutboxRow) -> Result<Self> {
        Ok(OutboxEntry {
            id: row.id.into(),
            kind: parse_enum(&row.kind)?,
            market_id: row.market_id.into(),
            status: parse_enum(&row.status)?,
            attempts: u32::try_from(row.attempts).unwrap_or(0),
            last_error: row.last_error,
            created_at: parse_time(&row.created_at)?,
            processed_at: parse_optional_time(row.processed_at)?,
        })
    }
}
