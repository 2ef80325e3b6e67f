//! The full betting lifecycle over a SQLite database file.

mod support;

use std::sync::Arc;

use chrono::Duration;
use poolmarket::adapter::outbound::sqlite::SqliteStore;
use poolmarket::domain::{
    BetFilter, BetStatus, MarketId, MarketStatus, OutboxStatus, OutcomeKey, UserId,
};
use poolmarket::error::Error;
use poolmarket::infrastructure::bootstrap::{build_engine, Engine};
use poolmarket::port::inbound::betting::{BettingService, Pagination, PlaceBetRequest};
use poolmarket::port::inbound::market::MarketService;
use poolmarket::port::inbound::wallet::WalletService;
use poolmarket::port::outbound::store::{OutboxStore, Store, UserDirectory};
use poolmarket::testkit::clock::ManualClock;
use poolmarket::testkit::config::relaxed;
use poolmarket::testkit::domain::{market_with_pools, open_market, usd, verified_user, MARKET};
use rust_decimal_macros::dec;
use tempfile::TempDir;

use support::assertions::assert_pools_consistent;
use support::seed;

struct TempDb {
    _dir: TempDir,
    url: String,
}

impl TempDb {
    fn create() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let url = dir.path().join("poolmarket.db").display().to_string();
        Self { _dir: dir, url }
    }

    fn engine(&self, clock: Arc<ManualClock>) -> Engine<SqliteStore> {
        let store = SqliteStore::open(&self.url).expect("open sqlite store");
        build_engine(Arc::new(store), &relaxed(), clock)
    }
}

#[test]
fn lifecycle_survives_reopening_the_database() {
    let db = TempDb::create();
    let clock = Arc::new(ManualClock::new());
    let engine = db.engine(clock.clone());

    seed::import(&engine, open_market());
    seed::register(&engine, "alice", dec!(1000));
    seed::register(&engine, "bob", dec!(1000));

    let kept = engine
        .betting
        .place_bet(PlaceBetRequest::new("alice", MARKET, "o0", dec!(100)))
        .unwrap();
    let dropped = engine
        .betting
        .place_bet(PlaceBetRequest::new("bob", MARKET, "o1", dec!(33.33)))
        .unwrap();
    engine
        .betting
        .cancel_bet(&UserId::new("bob"), &dropped.bet.id)
        .unwrap();
    engine
        .betting
        .place_bet(PlaceBetRequest::new("bob", MARKET, "o1", dec!(100)))
        .unwrap();
    assert_pools_consistent(&seed::market(&engine, MARKET));

    clock.advance(Duration::days(8));
    engine
        .markets
        .resolve_market(&MarketId::new(MARKET), &OutcomeKey::new("o0"), "feed")
        .unwrap();
    drop(engine);

    let engine = db.engine(clock.clone());
    let report = engine.settlement.run_once(10).unwrap();
    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.processed[0].bets_paid, 1);
    assert_eq!(report.processed[0].bets_lost, 1);
    drop(engine);

    let engine = db.engine(clock);
    let market = seed::market(&engine, MARKET);
    assert_eq!(market.status, MarketStatus::Resolved);
    assert_eq!(market.resolved_outcome, Some(OutcomeKey::new("o0")));
    assert_eq!(market.total_pool_amount, dec!(200));
    assert_pools_consistent(&market);

    // Winner takes the whole raked pool.
    assert_eq!(seed::balance(&engine, "alice"), dec!(1090));
    assert_eq!(seed::balance(&engine, "bob"), dec!(900));

    let bet = engine
        .betting
        .bet(&UserId::new("alice"), &kept.bet.id)
        .unwrap();
    assert_eq!(bet.status, BetStatus::Settled);
    assert_eq!(bet.settlement_amount, Some(dec!(190)));
    assert_eq!(bet.contracts, kept.bet.contracts);

    let bob_bets = engine
        .betting
        .user_bets(
            &UserId::new("bob"),
            &BetFilter {
                status: Some(BetStatus::Refunded),
                market_id: None,
            },
            Pagination::default(),
        )
        .unwrap();
    assert_eq!(bob_bets.total, 1);
    assert_eq!(bob_bets.items[0].amount, dec!(33.33));

    let entries = engine
        .store
        .read(|repo| repo.market_entries(&MarketId::new(MARKET)))
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, OutboxStatus::Done);
}

#[test]
fn fractional_amounts_round_trip_exactly() {
    let db = TempDb::create();
    let engine = db.engine(Arc::new(ManualClock::new()));
    seed::import(&engine, market_with_pools(&[dec!(100), dec!(0.01)]));
    seed::register(&engine, "alice", dec!(12.345678));

    let placed = engine
        .betting
        .place_bet(PlaceBetRequest::new("alice", MARKET, "o0", dec!(3.3)))
        .unwrap();
    // 100 / 100.01 of the pool: 99.99 clamps to the 99 ceiling.
    assert_eq!(placed.bet.price_per_contract, dec!(99));
    assert_eq!(placed.bet.contracts, dec!(3.33333333));

    let stored = engine
        .betting
        .bet(&UserId::new("alice"), &placed.bet.id)
        .unwrap();
    assert_eq!(stored.contracts, placed.bet.contracts);
    assert_eq!(stored.price_per_contract, placed.bet.price_per_contract);
    assert_eq!(stored.amount, dec!(3.3));
    assert_eq!(stored.transaction_id, placed.bet.transaction_id);
    // Timestamps are stored at microsecond precision.
    assert!((stored.placed_at - placed.bet.placed_at).num_milliseconds().abs() < 1);
    assert_eq!(seed::balance(&engine, "alice"), dec!(9.045678));
    assert_eq!(
        seed::market(&engine, MARKET).total_pool_amount,
        dec!(103.31)
    );
}

#[test]
fn failed_unit_of_work_rolls_back() {
    let db = TempDb::create();
    let engine = db.engine(Arc::new(ManualClock::new()));

    let result: Result<(), Error> = engine.store.atomically(|repo| {
        repo.save_user(&verified_user("alice"))?;
        Err(Error::Validation("abort".into()))
    });
    assert!(result.is_err());

    let user = engine
        .store
        .read(|repo| repo.user(&UserId::new("alice")))
        .unwrap();
    assert!(user.is_none());
}

#[test]
fn wallet_ledger_is_persisted_in_order() {
    let db = TempDb::create();
    let engine = db.engine(Arc::new(ManualClock::new()));
    let alice = UserId::new("alice");

    engine.wallets.deposit(&alice, &usd(), dec!(50), "first").unwrap();
    engine.wallets.lock_funds(&alice, &usd(), dec!(20)).unwrap();
    engine.wallets.unlock_funds(&alice, &usd(), dec!(5)).unwrap();
    engine.wallets.withdraw(&alice, &usd(), dec!(35), "out").unwrap();

    let wallet = engine.wallets.wallet(&alice, &usd()).unwrap();
    assert_eq!(wallet.balance(), dec!(15));
    assert_eq!(wallet.locked_balance(), dec!(15));
    assert_eq!(wallet.available_balance(), dec!(0));

    let history = engine.wallets.transactions(&alice, &usd(), 10).unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].description, "out");
    assert_eq!(history[3].description, "first");
    for pair in history.windows(2) {
        assert_eq!(pair[1].balance_after, pair[0].balance_before);
    }
}
