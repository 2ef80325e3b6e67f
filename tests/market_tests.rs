//! Market import, price views and safeguard checks through the engine.

mod support;

use poolmarket::domain::{HouseBotStrategy, MarketId, OutcomeKey, VoidReason};
use poolmarket::error::ErrorKind;
use poolmarket::port::inbound::betting::{BettingService, PlaceBetRequest};
use poolmarket::port::inbound::market::MarketService;
use poolmarket::testkit::config::{memory_engine, relaxed};
use poolmarket::testkit::domain::{market_with_pools, open_market, MARKET};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use support::seed;

#[test]
fn lopsided_pool_is_imbalanced_and_house_bot_backs_the_underdog() {
    let (engine, _clock) = memory_engine(&relaxed());
    let mut market = market_with_pools(&[dec!(95), dec!(5)]);
    market.min_bet_amount = dec!(10);
    market.safeguards.house_bot_enabled = true;
    market.safeguards.house_bot_amount = dec!(50);
    seed::import(&engine, market);

    let status = engine
        .markets
        .check_safeguards(&MarketId::new(MARKET))
        .unwrap();
    assert!(!status.imbalance.balanced);
    assert_eq!(status.imbalance.threshold, dec!(0.8));
    assert_eq!(status.imbalance.max_share, dec!(0.95));

    let plan = status.house_bot.expect("house bot should step in");
    assert_eq!(plan.budget, dec!(500));
    assert_eq!(plan.positions.len(), 1);
    assert_eq!(plan.positions[0].outcome_key, OutcomeKey::new("o1"));
    assert_eq!(plan.positions[0].amount, plan.budget);
    assert!((0.0..=100.0).contains(&status.risk_score));
}

#[test]
fn house_bot_stays_out_when_disabled_for_the_deployment() {
    let mut config = relaxed();
    config.safeguards.house_bot_enabled = false;
    let (engine, _clock) = memory_engine(&config);
    let mut market = market_with_pools(&[dec!(97), dec!(2), dec!(1)]);
    market.safeguards.house_bot_enabled = true;
    market.safeguards.house_bot_amount = dec!(500);
    seed::import(&engine, market);

    let status = engine
        .markets
        .check_safeguards(&MarketId::new(MARKET))
        .unwrap();
    assert!(status.house_bot.is_none());
}

#[test]
fn extreme_imbalance_puts_the_budget_on_the_weakest_outcome() {
    let (engine, _clock) = memory_engine(&relaxed());
    let mut market = market_with_pools(&[dec!(97), dec!(2), dec!(1)]);
    market.safeguards.house_bot_enabled = true;
    market.safeguards.house_bot_amount = dec!(500);
    seed::import(&engine, market);

    let plan = engine
        .markets
        .check_safeguards(&MarketId::new(MARKET))
        .unwrap()
        .house_bot
        .unwrap();
    assert_eq!(plan.strategy, HouseBotStrategy::BackWeakest);
    assert_eq!(plan.positions[0].outcome_key, OutcomeKey::new("o2"));
}

#[test]
fn thin_market_near_close_recommends_voiding() {
    let (engine, clock) = memory_engine(&relaxed());
    seed::import(&engine, market_with_pools(&[dec!(30), Decimal::ZERO]));

    let status = engine
        .markets
        .check_safeguards(&MarketId::new(MARKET))
        .unwrap();
    assert!(!status.quorum.met);
    assert!(!status.void.should_void);

    clock.advance(chrono::Duration::days(6) + chrono::Duration::hours(12));
    let status = engine
        .markets
        .check_safeguards(&MarketId::new(MARKET))
        .unwrap();
    assert!(status.void.should_void);
    assert!(status
        .void
        .reasons
        .iter()
        .any(|r| matches!(r, VoidReason::QuorumFailed { .. })));
}

#[test]
fn malformed_markets_are_refused_at_import() {
    let (engine, _clock) = memory_engine(&relaxed());

    let mut drifted = open_market();
    drifted.total_pool_amount = dec!(10);
    let err = engine.markets.import_market(drifted).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut duplicate = open_market();
    duplicate.outcomes[1].key = OutcomeKey::new("o0");
    let err = engine.markets.import_market(duplicate).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut inverted = open_market();
    inverted.min_bet_amount = dec!(100);
    inverted.max_bet_amount = dec!(10);
    let err = engine.markets.import_market(inverted).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert!(engine.markets.markets(None).unwrap().is_empty());
}

#[test]
fn market_with_bets_cannot_be_reimported() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, open_market());

    let mut renamed = open_market();
    renamed.title = "Renamed".to_string();
    assert_eq!(seed::import(&engine, renamed).title, "Renamed");

    seed::register(&engine, "alice", dec!(100));
    engine
        .betting
        .place_bet(PlaceBetRequest::new("alice", MARKET, "o0", dec!(10)))
        .unwrap();
    let err = engine.markets.import_market(open_market()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(seed::market(&engine, MARKET).total_pool_amount, dec!(10));
}

#[test]
fn price_impact_reports_before_and_after() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, market_with_pools(&[dec!(600), dec!(400)]));

    let impact = engine
        .betting
        .price_impact(&MarketId::new(MARKET), &OutcomeKey::new("o1"), dec!(100))
        .unwrap();
    assert_eq!(impact.outcome_pool, dec!(400));
    assert_eq!(impact.current_price, dec!(40));
    assert_eq!(impact.new_price, dec!(45.4545));
    assert!(impact.price_impact > Decimal::ZERO);

    let err = engine
        .betting
        .price_impact(&MarketId::new(MARKET), &OutcomeKey::new("o7"), dec!(100))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn extreme_bet_bounds_do_not_break_safeguard_checks() {
    let (engine, _clock) = memory_engine(&relaxed());
    let mut market = market_with_pools(&[dec!(600), dec!(400)]);
    market.min_bet_amount = Decimal::from(10_u64.pow(14));
    market.max_bet_amount = Decimal::from(10_u64.pow(15));
    seed::import(&engine, market);

    let status = engine
        .markets
        .check_safeguards(&MarketId::new(MARKET))
        .unwrap();
    assert!(!status.void.should_void);
    assert!((0.0..=100.0).contains(&status.risk_score));
}
