//! Persistence ports for markets, wallets, bets, users and the outbox.
//!
//! All contracts are synchronous. Work that must be atomic goes through
//! [`Store::atomically`]; everything a closure does through the
//! [`Repository`] it receives commits together or not at all.

use chrono::{DateTime, Utc};

use crate::domain::{
    Amount, Bet, BetFilter, BetId, BetStatus, CurrencyCode, LedgerTransaction, Market, MarketId,
    MarketStatus, OutboxEntry, UserId, UserProfile, Wallet, WalletId,
};
use crate::error::Result;

/// Markets together with their outcomes.
pub trait MarketStore {
    /// Fetch a market with all of its outcomes.
    fn market(&self, id: &MarketId) -> Result<Option<Market>>;

    /// List markets, optionally restricted to one status.
    fn markets(&self, status: Option<MarketStatus>) -> Result<Vec<Market>>;

    /// Insert or replace a market and its outcomes.
    fn save_market(&self, market: &Market) -> Result<()>;

    /// Open markets whose close time is at or before `now`.
    fn expired_markets(&self, now: DateTime<Utc>) -> Result<Vec<Market>>;
}

/// Wallets and their append-only ledger.
pub trait WalletStore {
    /// Fetch the wallet of a user in one currency.
    fn wallet(&self, user_id: &UserId, currency: &CurrencyCode) -> Result<Option<Wallet>>;

    /// Every wallet a user holds.
    fn user_wallets(&self, user_id: &UserId) -> Result<Vec<Wallet>>;

    /// Insert or replace a wallet.
    fn save_wallet(&self, wallet: &Wallet) -> Result<()>;

    /// Append a ledger transaction. Transactions are never rewritten.
    fn append_transaction(&self, transaction: &LedgerTransaction) -> Result<()>;

    /// Most recent ledger transactions of a wallet, newest first.
    fn transactions(&self, wallet_id: &WalletId, limit: usize) -> Result<Vec<LedgerTransaction>>;
}

/// Bets and the aggregate history queries the risk checks rely on.
pub trait BetStore {
    /// Fetch one bet.
    fn bet(&self, id: &BetId) -> Result<Option<Bet>>;

    /// Insert or replace a bet.
    fn save_bet(&self, bet: &Bet) -> Result<()>;

    /// A user's bets matching `filter`, newest first.
    fn user_bets(&self, user_id: &UserId, filter: &BetFilter) -> Result<Vec<Bet>>;

    /// Bets on a market, oldest first.
    fn market_bets(&self, market_id: &MarketId, status: Option<BetStatus>) -> Result<Vec<Bet>>;

    /// Number of bets a user placed at or after `since`, optionally only
    /// those still in `status`.
    fn bets_placed_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
        status: Option<BetStatus>,
    ) -> Result<u32>;

    /// Summed amount of bets a user placed at or after `since`.
    fn amount_placed_since(&self, user_id: &UserId, since: DateTime<Utc>) -> Result<Amount>;

    /// When the user last placed a bet.
    fn last_bet_at(&self, user_id: &UserId) -> Result<Option<DateTime<Utc>>>;

    /// Summed amount of the user's active bets, in one market or across all.
    fn active_position(&self, user_id: &UserId, market_id: Option<&MarketId>) -> Result<Amount>;
}

/// Eligibility flags of users.
pub trait UserDirectory {
    fn user(&self, id: &UserId) -> Result<Option<UserProfile>>;

    fn save_user(&self, user: &UserProfile) -> Result<()>;
}

/// Durable queue of settlement and refund work.
pub trait OutboxStore {
    /// Append a new entry.
    fn enqueue(&self, entry: &OutboxEntry) -> Result<()>;

    /// Pending entries plus failed entries with attempts left, oldest first.
    fn due_entries(&self, limit: usize, max_attempts: u32) -> Result<Vec<OutboxEntry>>;

    /// Persist an entry's new status.
    fn save_entry(&self, entry: &OutboxEntry) -> Result<()>;

    /// Every entry recorded for a market, oldest first.
    fn market_entries(&self, market_id: &MarketId) -> Result<Vec<OutboxEntry>>;
}

/// Everything one unit of work can touch.
pub trait Repository: MarketStore + WalletStore + BetStore + UserDirectory + OutboxStore {}

impl<T> Repository for T where T: MarketStore + WalletStore + BetStore + UserDirectory + OutboxStore {}

/// Unit-of-work boundary over a [`Repository`].
///
/// # Implementation Notes
///
/// - `atomically` must isolate concurrent units touching the same rows and
///   discard every write when the closure returns `Err`.
/// - Neither method may be called from inside the other's closure.
pub trait Store: Send + Sync {
    /// Run read-only work without a transaction.
    fn read<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&dyn Repository) -> Result<T>;

    /// Run work in one all-or-nothing transaction.
    fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&dyn Repository) -> Result<T>;
}
