//! SQLite store implementation.
//!
//! Every unit of work runs on one pooled connection. `atomically` wraps it in
//! an `IMMEDIATE` transaction, which takes SQLite's write lock up front so two
//! units can never interleave their reads and writes of the same rows.

use std::cell::RefCell;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use rust_decimal::Decimal;

use super::database::connection::{connect, DbPool, MEMORY_URL};
use super::database::model::{
    parse_decimal, parse_time, stamp, BetRow, MarketRow, NewOutboxRow, NewTransactionRow,
    OutboxRow, OutcomeRow, TransactionRow, UserRow, WalletRow,
};
use super::database::schema::{
    bets, ledger_transactions, market_outcomes, markets, outbox, users, wallets,
};
use crate::domain::{
    Amount, Bet, BetFilter, BetId, BetStatus, CurrencyCode, LedgerTransaction, Market, MarketId,
    MarketStatus, OutboxEntry, OutboxStatus, UserId, UserProfile, Wallet, WalletId,
};
use crate::error::Result;
use crate::port::outbound::store::{
    BetStore, MarketStore, OutboxStore, Repository, Store, UserDirectory, WalletStore,
};

/// SQLite-backed implementation of every persistence port.
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Wrap an already migrated pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database at `database_url` and migrate it.
    pub fn open(database_url: &str) -> Result<Self> {
        Ok(Self::new(connect(database_url)?))
    }

    /// A private, migrated in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::open(MEMORY_URL)
    }
}

impl Store for SqliteStore {
    fn read<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&dyn Repository) -> Result<T>,
    {
        let mut conn = self.pool.get()?;
        work(&Session::new(&mut conn))
    }

    fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&dyn Repository) -> Result<T>,
    {
        let mut conn = self.pool.get()?;
        conn.immediate_transaction(|conn| work(&Session::new(conn)))
    }
}

/// One connection lent to a unit of work.
struct Session<'a> {
    conn: RefCell<&'a mut SqliteConnection>,
}

impl<'a> Session<'a> {
    fn new(conn: &'a mut SqliteConnection) -> Self {
        Self {
            conn: RefCell::new(conn),
        }
    }

    fn with<T>(&self, query: impl FnOnce(&mut SqliteConnection) -> QueryResult<T>) -> Result<T> {
        let mut conn = self.conn.borrow_mut();
        Ok(query(&mut **conn)?)
    }

    fn hydrate(&self, row: MarketRow) -> Result<Market> {
        let outcomes = self.with(|conn| {
            market_outcomes::table
                .filter(market_outcomes::market_id.eq(&row.id))
                .select(OutcomeRow::as_select())
                .load(conn)
        })?;
        row.into_market(outcomes)
    }

    fn sum_amounts(amounts: Vec<String>) -> Result<Amount> {
        amounts
            .iter()
            .try_fold(Decimal::ZERO, |acc, a| Ok(acc + parse_decimal(a)?))
    }
}

fn limit_of(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl MarketStore for Session<'_> {
    fn market(&self, id: &MarketId) -> Result<Option<Market>> {
        let row = self.with(|conn| {
            markets::table
                .find(id.as_str())
                .select(MarketRow::as_select())
                .first(conn)
                .optional()
        })?;
        row.map(|r| self.hydrate(r)).transpose()
    }

    fn markets(&self, status: Option<MarketStatus>) -> Result<Vec<Market>> {
        let rows = self.with(|conn| {
            let mut query = markets::table
                .select(MarketRow::as_select())
                .order(markets::id.asc())
                .into_boxed();
            if let Some(status) = status {
                query = query.filter(markets::status.eq(status.as_str()));
            }
            query.load(conn)
        })?;
        rows.into_iter().map(|r| self.hydrate(r)).collect()
    }

    fn save_market(&self, market: &Market) -> Result<()> {
        let row = MarketRow::from_market(market)?;
        let outcomes = OutcomeRow::for_market(market);
        self.with(|conn| {
            diesel::replace_into(markets::table)
                .values(&row)
                .execute(conn)?;
            diesel::delete(
                market_outcomes::table.filter(market_outcomes::market_id.eq(&row.id)),
            )
            .execute(conn)?;
            diesel::insert_into(market_outcomes::table)
                .values(&outcomes)
                .execute(conn)
        })?;
        Ok(())
    }

    fn expired_markets(&self, now: DateTime<Utc>) -> Result<Vec<Market>> {
        let rows = self.with(|conn| {
            markets::table
                .filter(markets::status.eq(MarketStatus::Open.as_str()))
                .filter(markets::close_time.le(stamp(now)))
                .select(MarketRow::as_select())
                .order(markets::id.asc())
                .load(conn)
        })?;
        rows.into_iter().map(|r| self.hydrate(r)).collect()
    }
}

impl WalletStore for Session<'_> {
    fn wallet(&self, user_id: &UserId, currency: &CurrencyCode) -> Result<Option<Wallet>> {
        let row = self.with(|conn| {
            wallets::table
                .filter(wallets::user_id.eq(user_id.as_str()))
                .filter(wallets::currency.eq(currency.as_str()))
                .select(WalletRow::as_select())
                .first(conn)
                .optional()
        })?;
        row.map(Wallet::try_from).transpose()
    }

    fn user_wallets(&self, user_id: &UserId) -> Result<Vec<Wallet>> {
        let rows = self.with(|conn| {
            wallets::table
                .filter(wallets::user_id.eq(user_id.as_str()))
                .order(wallets::currency.asc())
                .select(WalletRow::as_select())
                .load(conn)
        })?;
        rows.into_iter().map(Wallet::try_from).collect()
    }

    fn save_wallet(&self, wallet: &Wallet) -> Result<()> {
        let row = WalletRow::from(wallet);
        self.with(|conn| {
            diesel::replace_into(wallets::table)
                .values(&row)
                .execute(conn)
        })?;
        Ok(())
    }

    fn append_transaction(&self, transaction: &LedgerTransaction) -> Result<()> {
        let row = NewTransactionRow::from(transaction);
        self.with(|conn| {
            diesel::insert_into(ledger_transactions::table)
                .values(&row)
                .execute(conn)
        })?;
        Ok(())
    }

    fn transactions(&self, wallet_id: &WalletId, limit: usize) -> Result<Vec<LedgerTransaction>> {
        let rows = self.with(|conn| {
            ledger_transactions::table
                .filter(ledger_transactions::wallet_id.eq(wallet_id.as_str()))
                .order(ledger_transactions::seq.desc())
                .limit(limit_of(limit))
                .select(TransactionRow::as_select())
                .load(conn)
        })?;
        rows.into_iter().map(LedgerTransaction::try_from).collect()
    }
}

impl BetStore for Session<'_> {
    fn bet(&self, id: &BetId) -> Result<Option<Bet>> {
        let row = self.with(|conn| {
            bets::table
                .find(id.as_str())
                .select(BetRow::as_select())
                .first(conn)
                .optional()
        })?;
        row.map(Bet::try_from).transpose()
    }

    fn save_bet(&self, bet: &Bet) -> Result<()> {
        let row = BetRow::from(bet);
        self.with(|conn| diesel::replace_into(bets::table).values(&row).execute(conn))?;
        Ok(())
    }

    fn user_bets(&self, user_id: &UserId, filter: &BetFilter) -> Result<Vec<Bet>> {
        let rows = self.with(|conn| {
            let mut query = bets::table
                .filter(bets::user_id.eq(user_id.as_str()))
                .select(BetRow::as_select())
                .order((bets::placed_at.desc(), bets::id.asc()))
                .into_boxed();
            if let Some(status) = filter.status {
                query = query.filter(bets::status.eq(status.as_str()));
            }
            if let Some(market_id) = &filter.market_id {
                query = query.filter(bets::market_id.eq(market_id.as_str()));
            }
            query.load(conn)
        })?;
        rows.into_iter().map(Bet::try_from).collect()
    }

    fn market_bets(&self, market_id: &MarketId, status: Option<BetStatus>) -> Result<Vec<Bet>> {
        let rows = self.with(|conn| {
            let mut query = bets::table
                .filter(bets::market_id.eq(market_id.as_str()))
                .select(BetRow::as_select())
                .order((bets::placed_at.asc(), bets::id.asc()))
                .into_boxed();
            if let Some(status) = status {
                query = query.filter(bets::status.eq(status.as_str()));
            }
            query.load(conn)
        })?;
        rows.into_iter().map(Bet::try_from).collect()
    }

    fn bets_placed_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
        status: Option<BetStatus>,
    ) -> Result<u32> {
        let count: i64 = self.with(|conn| {
            let placed = bets::table
                .filter(bets::user_id.eq(user_id.as_str()))
                .filter(bets::placed_at.ge(stamp(since)));
            match status {
                Some(status) => placed
                    .filter(bets::status.eq(status.as_str()))
                    .count()
                    .get_result(conn),
                None => placed.count().get_result(conn),
            }
        })?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn amount_placed_since(&self, user_id: &UserId, since: DateTime<Utc>) -> Result<Amount> {
        let amounts: Vec<String> = self.with(|conn| {
            bets::table
                .filter(bets::user_id.eq(user_id.as_str()))
                .filter(bets::placed_at.ge(stamp(since)))
                .select(bets::amount)
                .load(conn)
        })?;
        Self::sum_amounts(amounts)
    }

    fn last_bet_at(&self, user_id: &UserId) -> Result<Option<DateTime<Utc>>> {
        let latest: Option<String> = self.with(|conn| {
            bets::table
                .filter(bets::user_id.eq(user_id.as_str()))
                .select(diesel::dsl::max(bets::placed_at))
                .first(conn)
        })?;
        latest.as_deref().map(parse_time).transpose()
    }

    fn active_position(&self, user_id: &UserId, market_id: Option<&MarketId>) -> Result<Amount> {
        let amounts: Vec<String> = self.with(|conn| {
            let mut query = bets::table
                .filter(bets::user_id.eq(user_id.as_str()))
                .filter(bets::status.eq(BetStatus::Active.as_str()))
                .select(bets::amount)
                .into_boxed();
            if let Some(market_id) = market_id {
                query = query.filter(bets::market_id.eq(market_id.as_str()));
            }
            query.load(conn)
        })?;
        Self::sum_amounts(amounts)
    }
}

impl UserDirectory for Session<'_> {
    fn user(&self, id: &UserId) -> Result<Option<UserProfile>> {
        let row = self.with(|conn| {
            users::table
                .find(id.as_str())
                .select(UserRow::as_select())
                .first(conn)
                .optional()
        })?;
        row.map(UserProfile::try_from).transpose()
    }

    fn save_user(&self, user: &UserProfile) -> Result<()> {
        let row = UserRow::from(user);
        self.with(|conn| diesel::replace_into(users::table).values(&row).execute(conn))?;
        Ok(())
    }
}

impl OutboxStore for Session<'_> {
    fn enqueue(&self, entry: &OutboxEntry) -> Result<()> {
        let row = NewOutboxRow::from(entry);
        self.with(|conn| diesel::insert_into(outbox::table).values(&row).execute(conn))?;
        Ok(())
    }

    fn due_entries(&self, limit: usize, max_attempts: u32) -> Result<Vec<OutboxEntry>> {
        let max_attempts = i32::try_from(max_attempts).unwrap_or(i32::MAX);
        let rows = self.with(|conn| {
            outbox::table
                .filter(
                    outbox::status.eq(OutboxStatus::Pending.as_str()).or(outbox::status
                        .eq(OutboxStatus::Failed.as_str())
                        .and(outbox::attempts.lt(max_attempts))),
                )
                .order(outbox::seq.asc())
                .limit(limit_of(limit))
                .select(OutboxRow::as_select())
                .load(conn)
        })?;
        rows.into_iter().map(OutboxEntry::try_from).collect()
    }

    fn save_entry(&self, entry: &OutboxEntry) -> Result<()> {
        let row = NewOutboxRow::from(entry);
        self.with(|conn| {
            let updated = diesel::update(outbox::table.filter(outbox::id.eq(&row.id)))
                .set((
                    outbox::status.eq(&row.status),
                    outbox::attempts.eq(row.attempts),
                    outbox::last_error.eq(&row.last_error),
                    outbox::processed_at.eq(&row.processed_at),
                ))
                .execute(conn)?;
            if updated == 0 {
                diesel::insert_into(outbox::table).values(&row).execute(conn)?;
            }
            Ok(())
        })
    }

    fn market_entries(&self, market_id: &MarketId) -> Result<Vec<OutboxEntry>> {
        let rows = self.with(|conn| {
            outbox::table
                .filter(outbox::market_id.eq(market_id.as_str()))
                .order(outbox::seq.asc())
                .select(OutboxRow::as_select())
                .load(conn)
        })?;
        rows.into_iter().map(OutboxEntry::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OutboxKind, TransactionKind};
    use crate::error::Error;
    use crate::testkit::domain::{active_bet, funded_wallet, market_with_pools, verified_user};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn store() -> SqliteStore {
        SqliteStore::in_memory().unwrap()
    }

    fn alice() -> UserId {
        UserId::new("alice")
    }

    #[test]
    fn failed_unit_rolls_back_every_table() {
        let store = store();
        let result: Result<()> = store.atomically(|repo| {
            repo.save_market(&market_with_pools(&[dec!(5), dec!(5)]))?;
            repo.save_wallet(&funded_wallet("alice", dec!(10)))?;
            repo.save_bet(&active_bet("alice", "m1", "o0", dec!(5), dec!(50)))?;
            Err(Error::InvalidState("boom".into()))
        });
        assert!(result.is_err());

        store
            .read(|repo| {
                assert!(repo.market(&MarketId::new("m1"))?.is_none());
                assert!(repo.wallet(&alice(), &CurrencyCode::new("USD"))?.is_none());
                assert_eq!(repo.active_position(&alice(), None)?, dec!(0));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn market_round_trips_with_outcomes_in_order() {
        let store = store();
        let mut market = market_with_pools(&[dec!(12.5), dec!(0), dec!(7.25)]);
        market.outcomes.swap(0, 2);
        store.atomically(|repo| repo.save_market(&market)).unwrap();

        let loaded = store
            .read(|repo| repo.market(&market.id))
            .unwrap()
            .unwrap();
        let keys: Vec<_> = loaded.outcomes.iter().map(|o| o.key.to_string()).collect();
        assert_eq!(keys, vec!["o2", "o1", "o0"]);
        assert_eq!(loaded.total_pool_amount, dec!(19.75));
        assert_eq!(loaded.safeguards, market.safeguards);
    }

    #[test]
    fn saving_a_market_replaces_its_outcomes() {
        let store = store();
        let mut market = market_with_pools(&[dec!(1), dec!(2)]);
        store.atomically(|repo| repo.save_market(&market)).unwrap();
        market.add_stake(&"o1".into(), dec!(3)).unwrap();
        store.atomically(|repo| repo.save_market(&market)).unwrap();

        let loaded = store.read(|repo| repo.market(&market.id)).unwrap().unwrap();
        assert_eq!(loaded.outcomes.len(), 2);
        assert_eq!(loaded.outcomes[1].pool_amount, dec!(5));
        assert_eq!(loaded.total_pool_amount, dec!(6));
    }

    #[test]
    fn expired_markets_are_open_and_past_close() {
        let store = store();
        let mut expired = market_with_pools(&[dec!(0), dec!(0)]);
        expired.id = "expired".into();
        expired.close_time = Utc::now() - Duration::minutes(1);
        let mut closed = expired.clone();
        closed.id = "closed".into();
        closed.status = MarketStatus::Closed;
        let live = market_with_pools(&[dec!(0), dec!(0)]);

        store
            .atomically(|repo| {
                repo.save_market(&expired)?;
                repo.save_market(&closed)?;
                repo.save_market(&live)
            })
            .unwrap();

        let found = store
            .read(|repo| repo.expired_markets(Utc::now()))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, MarketId::new("expired"));
    }

    #[test]
    fn ledger_is_newest_first_and_limited() {
        let store = store();
        let mut wallet = funded_wallet("alice", dec!(0));
        let now = Utc::now();
        let txs = vec![
            wallet
                .credit(dec!(10), TransactionKind::Deposit, "one", now)
                .unwrap(),
            wallet
                .credit(dec!(20), TransactionKind::Deposit, "two", now)
                .unwrap(),
            wallet
                .debit(dec!(5), TransactionKind::Withdrawal, "three", now)
                .unwrap(),
        ];
        store
            .atomically(|repo| {
                repo.save_wallet(&wallet)?;
                txs.iter().try_for_each(|t| repo.append_transaction(t))
            })
            .unwrap();

        let latest = store
            .read(|repo| repo.transactions(wallet.id(), 2))
            .unwrap();
        let descriptions: Vec<_> = latest.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, vec!["three", "two"]);
        assert_eq!(latest[0].amount, dec!(-5));

        let loaded = store
            .read(|repo| repo.wallet(&alice(), wallet.currency()))
            .unwrap()
            .unwrap();
        assert_eq!(loaded.balance(), dec!(25));
    }

    #[test]
    fn bet_aggregates_follow_placement_time_and_status() {
        let store = store();
        let now = Utc::now();
        let mut old = active_bet("alice", "m1", "o0", dec!(4), dec!(50));
        old.placed_at = now - Duration::hours(2);
        let mut refunded = active_bet("alice", "m2", "o0", dec!(6), dec!(50));
        refunded.refund(now);
        let recent = active_bet("alice", "m1", "o1", dec!(10), dec!(50));
        let other = active_bet("bob", "m1", "o1", dec!(99), dec!(50));

        store
            .atomically(|repo| {
                for bet in [&old, &refunded, &recent, &other] {
                    repo.save_bet(bet)?;
                }
                Ok(())
            })
            .unwrap();

        store
            .read(|repo| {
                let hour_ago = now - Duration::hours(1);
                assert_eq!(repo.bets_placed_since(&alice(), hour_ago, None)?, 2);
                assert_eq!(
                    repo.bets_placed_since(&alice(), hour_ago, Some(BetStatus::Active))?,
                    1
                );
                assert_eq!(repo.amount_placed_since(&alice(), hour_ago)?, dec!(16));
                assert_eq!(repo.active_position(&alice(), None)?, dec!(14));
                assert_eq!(
                    repo.active_position(&alice(), Some(&MarketId::new("m1")))?,
                    dec!(14)
                );
                assert_eq!(
                    repo.last_bet_at(&alice())?.map(stamp),
                    Some(stamp(recent.placed_at.max(refunded.placed_at)))
                );
                let filter = BetFilter {
                    status: Some(BetStatus::Active),
                    market_id: None,
                };
                let active = repo.user_bets(&alice(), &filter)?;
                assert_eq!(active.len(), 2);
                assert_eq!(active[0].id, recent.id);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn users_round_trip() {
        let store = store();
        let mut user = verified_user("alice");
        user.locked_until = Some(Utc::now() + Duration::hours(1));
        store.atomically(|repo| repo.save_user(&user)).unwrap();

        let loaded = store.read(|repo| repo.user(&alice())).unwrap().unwrap();
        assert_eq!(loaded.kyc_status, user.kyc_status);
        assert_eq!(loaded.locked_until.map(stamp), user.locked_until.map(stamp));
        assert!(store
            .read(|repo| repo.user(&UserId::new("bob")))
            .unwrap()
            .is_none());
    }

    #[test]
    fn outbox_retries_failed_entries_until_attempts_run_out() {
        let store = store();
        let now = Utc::now();
        let first = OutboxEntry::pending(OutboxKind::Settlement, "m1".into(), now);
        let second = OutboxEntry::pending(OutboxKind::Refund, "m2".into(), now);
        store
            .atomically(|repo| {
                repo.enqueue(&first)?;
                repo.enqueue(&second)
            })
            .unwrap();

        let mut failed = first.clone();
        failed.fail("wallet missing", now);
        let mut done = second.clone();
        done.complete(now);
        store
            .atomically(|repo| {
                repo.save_entry(&failed)?;
                repo.save_entry(&done)
            })
            .unwrap();

        let due = store.read(|repo| repo.due_entries(10, 3)).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, first.id);
        assert_eq!(due[0].attempts, 1);
        assert_eq!(due[0].last_error.as_deref(), Some("wallet missing"));

        assert!(store.read(|repo| repo.due_entries(10, 1)).unwrap().is_empty());
        let history = store
            .read(|repo| repo.market_entries(&MarketId::new("m2")))
            .unwrap();
        assert_eq!(history[0].status, OutboxStatus::Done);
    }

    #[test]
    fn file_database_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let url = dir.path().join("bets.db").display().to_string();
        {
            let store = SqliteStore::open(&url).unwrap();
            store
                .atomically(|repo| repo.save_user(&verified_user("alice")))
                .unwrap();
        }
        let store = SqliteStore::open(&url).unwrap();
        assert!(store.read(|repo| repo.user(&alice())).unwrap().is_some());
    }
}
