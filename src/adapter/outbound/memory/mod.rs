//! In-memory store.
//!
//! A single mutex serialises units of work. `atomically` runs the closure
//! against a working copy of every table and swaps it in only on success,
//! which gives the same all-or-nothing contract as the SQLite store.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{
    Amount, Bet, BetFilter, BetId, BetStatus, CurrencyCode, LedgerTransaction, Market, MarketId,
    MarketStatus, OutboxEntry, OutboxStatus, UserId, UserProfile, Wallet, WalletId,
};
use crate::error::Result;
use crate::port::outbound::store::{
    BetStore, MarketStore, OutboxStore, Repository, Store, UserDirectory, WalletStore,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    markets: BTreeMap<MarketId, Market>,
    wallets: HashMap<(UserId, CurrencyCode), Wallet>,
    transactions: Vec<LedgerTransaction>,
    bets: HashMap<BetId, Bet>,
    users: HashMap<UserId, UserProfile>,
    outbox: Vec<OutboxEntry>,
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn read<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&dyn Repository) -> Result<T>,
    {
        let mut tables = self.tables.lock();
        work(&Session::new(&mut tables))
    }

    fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&dyn Repository) -> Result<T>,
    {
        let mut tables = self.tables.lock();
        let mut working = tables.clone();
        let value = work(&Session::new(&mut working))?;
        *tables = working;
        Ok(value)
    }
}

/// Borrowed view of the tables for one unit of work.
struct Session<'a> {
    tables: RefCell<&'a mut Tables>,
}

impl<'a> Session<'a> {
    fn new(tables: &'a mut Tables) -> Self {
        Self {
            tables: RefCell::new(tables),
        }
    }

    fn user_bets_where(&self, user_id: &UserId, keep: impl Fn(&Bet) -> bool) -> Vec<Bet> {
        self.tables
            .borrow()
            .bets
            .values()
            .filter(|b| &b.user_id == user_id && keep(b))
            .cloned()
            .collect()
    }
}

impl MarketStore for Session<'_> {
    fn market(&self, id: &MarketId) -> Result<Option<Market>> {
        Ok(self.tables.borrow().markets.get(id).cloned())
    }

    fn markets(&self, status: Option<MarketStatus>) -> Result<Vec<Market>> {
        Ok(self
            .tables
            .borrow()
            .markets
            .values()
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect())
    }

    fn save_market(&self, market: &Market) -> Result<()> {
        self.tables
            .borrow_mut()
            .markets
            .insert(market.id.clone(), market.clone());
        Ok(())
    }

    fn expired_markets(&self, now: DateTime<Utc>) -> Result<Vec<Market>> {
        Ok(self
            .tables
            .borrow()
            .markets
            .values()
            .filter(|m| m.status == MarketStatus::Open && m.close_time <= now)
            .cloned()
            .collect())
    }
}

impl WalletStore for Session<'_> {
    fn wallet(&self, user_id: &UserId, currency: &CurrencyCode) -> Result<Option<Wallet>> {
        let key = (user_id.clone(), currency.clone());
        Ok(self.tables.borrow().wallets.get(&key).cloned())
    }

    fn user_wallets(&self, user_id: &UserId) -> Result<Vec<Wallet>> {
        let mut wallets: Vec<Wallet> = self
            .tables
            .borrow()
            .wallets
            .values()
            .filter(|w| w.user_id() == user_id)
            .cloned()
            .collect();
        wallets.sort_by(|a, b| a.currency().cmp(b.currency()));
        Ok(wallets)
    }

    fn save_wallet(&self, wallet: &Wallet) -> Result<()> {
        let key = (wallet.user_id().clone(), wallet.currency().clone());
        self.tables.borrow_mut().wallets.insert(key, wallet.clone());
        Ok(())
    }

    fn append_transaction(&self, transaction: &LedgerTransaction) -> Result<()> {
        self.tables
            .borrow_mut()
            .transactions
            .push(transaction.clone());
        Ok(())
    }

    fn transactions(&self, wallet_id: &WalletId, limit: usize) -> Result<Vec<LedgerTransaction>> {
        Ok(self
            .tables
            .borrow()
            .transactions
            .iter()
            .rev()
            .filter(|t| &t.wallet_id == wallet_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

impl BetStore for Session<'_> {
    fn bet(&self, id: &BetId) -> Result<Option<Bet>> {
        Ok(self.tables.borrow().bets.get(id).cloned())
    }

    fn save_bet(&self, bet: &Bet) -> Result<()> {
        self.tables
            .borrow_mut()
            .bets
            .insert(bet.id.clone(), bet.clone());
        Ok(())
    }

    fn user_bets(&self, user_id: &UserId, filter: &BetFilter) -> Result<Vec<Bet>> {
        let mut bets = self.user_bets_where(user_id, |b| filter.matches(b));
        bets.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then_with(|| a.id.cmp(&b.id)));
        Ok(bets)
    }

    fn market_bets(&self, market_id: &MarketId, status: Option<BetStatus>) -> Result<Vec<Bet>> {
        let mut bets: Vec<Bet> = self
            .tables
            .borrow()
            .bets
            .values()
            .filter(|b| &b.market_id == market_id && status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        bets.sort_by(|a, b| a.placed_at.cmp(&b.placed_at).then_with(|| a.id.cmp(&b.id)));
        Ok(bets)
    }

    fn bets_placed_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
        status: Option<BetStatus>,
    ) -> Result<u32> {
        let count = self
            .user_bets_where(user_id, |b| {
                b.placed_at >= since && status.map_or(true, |s| b.status == s)
            })
            .len();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn amount_placed_since(&self, user_id: &UserId, since: DateTime<Utc>) -> Result<Amount> {
        Ok(self
            .user_bets_where(user_id, |b| b.placed_at >= since)
            .iter()
            .map(|b| b.amount)
            .sum())
    }

    fn last_bet_at(&self, user_id: &UserId) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .user_bets_where(user_id, |_| true)
            .iter()
            .map(|b| b.placed_at)
            .max())
    }

    fn active_position(&self, user_id: &UserId, market_id: Option<&MarketId>) -> Result<Amount> {
        Ok(self
            .user_bets_where(user_id, |b| {
                b.is_active() && market_id.map_or(true, |m| &b.market_id == m)
            })
            .iter()
            .map(|b| b.amount)
            .fold(Decimal::ZERO, |acc, a| acc + a))
    }
}

impl UserDirectory for Session<'_> {
    fn user(&self, id: &UserId) -> Result<Option<UserProfile>> {
        Ok(self.tables.borrow().users.get(id).cloned())
    }

    fn save_user(&self, user: &UserProfile) -> Result<()> {
        self.tables
            .borrow_mut()
            .users
            .insert(user.id.clone(), user.clone());
        Ok(())
    }
}

impl OutboxStore for Session<'_> {
    fn enqueue(&self, entry: &OutboxEntry) -> Result<()> {
        self.tables.borrow_mut().outbox.push(entry.clone());
        Ok(())
    }

    fn due_entries(&self, limit: usize, max_attempts: u32) -> Result<Vec<OutboxEntry>> {
        Ok(self
            .tables
            .borrow()
            .outbox
            .iter()
            .filter(|e| match e.status {
                OutboxStatus::Pending => true,
                OutboxStatus::Failed => e.attempts < max_attempts,
                OutboxStatus::Done => false,
            })
            .take(limit)
            .cloned()
            .collect())
    }

    fn save_entry(&self, entry: &OutboxEntry) -> Result<()> {
        let mut tables = self.tables.borrow_mut();
        match tables.outbox.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => tables.outbox.push(entry.clone()),
        }
        Ok(())
    }

    fn market_entries(&self, market_id: &MarketId) -> Result<Vec<OutboxEntry>> {
        Ok(self
            .tables
            .borrow()
            .outbox
            .iter()
            .filter(|e| &e.market_id == market_id)
            .cloned()
            .collect())
    }
}
