//! Bet placement, cancellation and risk-gate behaviour through the engine.

mod support;

use chrono::Duration;
use poolmarket::domain::{
    BetFilter, BetStatus, DomainError, MarketId, OutcomeKey, TransactionKind, UserId,
};
use poolmarket::error::{Error, ErrorKind, PositionScope, RiskError};
use poolmarket::infrastructure::config::Config;
use poolmarket::port::inbound::betting::{BettingService, Pagination, PlaceBetRequest};
use poolmarket::port::inbound::market::MarketService;
use poolmarket::port::inbound::wallet::WalletService;
use poolmarket::testkit::config::{memory_engine, relaxed};
use poolmarket::testkit::domain::{market_with_pools, open_market, usd, MARKET};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use support::assertions::{
    assert_pools_consistent, assert_prices_in_band, assert_wallet_sane,
};
use support::seed;

fn bet(user: &str, outcome: &str, amount: Decimal) -> PlaceBetRequest {
    PlaceBetRequest::new(user, MARKET, outcome, amount)
}

fn risk(err: &Error) -> &RiskError {
    err.as_risk()
        .unwrap_or_else(|| panic!("expected a risk rejection, got {err:?}"))
}

#[test]
fn empty_market_prices_every_outcome_evenly() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, open_market());

    let prices = engine.markets.current_prices(&MarketId::new(MARKET)).unwrap();
    assert_eq!(prices.len(), 2);
    assert!(prices.iter().all(|p| p.price == dec!(50)));

    let quote = engine
        .betting
        .quote(&MarketId::new(MARKET), &OutcomeKey::new("o0"), dec!(10))
        .unwrap();
    assert_eq!(quote.current_price, dec!(50));
    assert_eq!(quote.contracts, dec!(20));
    assert_eq!(quote.potential_payout, dec!(20));
}

#[test]
fn bet_on_the_underdog_buys_at_pool_share_and_moves_the_price() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, market_with_pools(&[dec!(600), dec!(400)]));
    seed::register(&engine, "alice", dec!(1000));

    let prices = engine.markets.current_prices(&MarketId::new(MARKET)).unwrap();
    assert_eq!(prices[0].price, dec!(60));
    assert_eq!(prices[1].price, dec!(40));

    let placed = engine.betting.place_bet(bet("alice", "o1", dec!(100))).unwrap();
    assert_eq!(placed.bet.price_per_contract, dec!(40));
    assert_eq!(placed.bet.contracts, dec!(250));
    assert_eq!(placed.new_price, dec!(45.4545));
    assert_eq!(placed.wallet_balance, dec!(900));
    assert_eq!(placed.bet.status, BetStatus::Active);

    let market = seed::market(&engine, MARKET);
    assert_eq!(market.total_pool_amount, dec!(1100));
    assert_eq!(market.outcomes[1].pool_amount, dec!(500));
    assert_pools_consistent(&market);
}

#[test]
fn insufficient_funds_leave_no_trace() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, market_with_pools(&[dec!(600), dec!(400)]));
    seed::register(&engine, "alice", dec!(1000));

    let err = engine
        .betting
        .place_bet(bet("alice", "o0", dec!(1500)))
        .unwrap_err();
    assert_eq!(
        risk(&err),
        &RiskError::InsufficientWalletBalance {
            available: dec!(1000),
            required: dec!(1500),
        }
    );
    assert_eq!(err.kind(), ErrorKind::Rejected);

    assert_eq!(seed::balance(&engine, "alice"), dec!(1000));
    let market = seed::market(&engine, MARKET);
    assert_eq!(market.total_pool_amount, dec!(1000));
    let bets = engine
        .betting
        .user_bets(&UserId::new("alice"), &BetFilter::default(), Pagination::default())
        .unwrap();
    assert_eq!(bets.total, 0);
    let history = engine
        .wallets
        .transactions(&UserId::new("alice"), &usd(), 10)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionKind::Deposit);
}

#[test]
fn eleventh_bet_in_a_minute_is_rate_limited() {
    let (engine, clock) = memory_engine(&Config::default());
    seed::import(&engine, open_market());
    seed::register(&engine, "alice", dec!(100));

    for _ in 0..10 {
        engine.betting.place_bet(bet("alice", "o0", dec!(1))).unwrap();
    }
    let err = engine
        .betting
        .place_bet(bet("alice", "o0", dec!(1)))
        .unwrap_err();
    assert_eq!(
        risk(&err),
        &RiskError::RateLimitExceeded {
            count: 10,
            limit: 10
        }
    );
    assert_eq!(seed::balance(&engine, "alice"), dec!(90));

    clock.advance(Duration::seconds(61));
    engine.betting.place_bet(bet("alice", "o0", dec!(1))).unwrap();
}

#[test]
fn cancelled_bets_do_not_count_toward_the_rate_limit() {
    let (engine, _clock) = memory_engine(&Config::default());
    seed::import(&engine, open_market());
    seed::register(&engine, "alice", dec!(100));
    let alice = UserId::new("alice");

    for _ in 0..10 {
        let placed = engine.betting.place_bet(bet("alice", "o0", dec!(1))).unwrap();
        engine.betting.cancel_bet(&alice, &placed.bet.id).unwrap();
    }

    let placed = engine.betting.place_bet(bet("alice", "o0", dec!(1))).unwrap();
    assert_eq!(placed.bet.status, BetStatus::Active);
    assert_eq!(seed::balance(&engine, "alice"), dec!(99));
}

#[test]
fn bet_size_bounds_are_inclusive() {
    let (engine, _clock) = memory_engine(&relaxed());
    let mut market = open_market();
    market.max_bet_amount = dec!(500);
    seed::import(&engine, market);
    seed::register(&engine, "alice", dec!(2000));

    engine.betting.place_bet(bet("alice", "o0", dec!(1))).unwrap();
    engine.betting.place_bet(bet("alice", "o0", dec!(500))).unwrap();

    let err = engine
        .betting
        .place_bet(bet("alice", "o0", dec!(0.99)))
        .unwrap_err();
    assert_eq!(
        risk(&err),
        &RiskError::BetTooSmall {
            amount: dec!(0.99),
            min: dec!(1)
        }
    );

    let err = engine
        .betting
        .place_bet(bet("alice", "o0", dec!(500.01)))
        .unwrap_err();
    assert_eq!(
        risk(&err),
        &RiskError::BetTooLarge {
            amount: dec!(500.01),
            max: dec!(500)
        }
    );
}

#[test]
fn non_positive_amount_is_a_validation_error() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, open_market());
    seed::register(&engine, "alice", dec!(100));

    let err = engine
        .betting
        .place_bet(bet("alice", "o0", Decimal::ZERO))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn cancel_within_window_restores_wallet_and_pools() {
    let (engine, clock) = memory_engine(&relaxed());
    seed::import(&engine, market_with_pools(&[dec!(600), dec!(400)]));
    seed::register(&engine, "alice", dec!(1000));
    let before = seed::market(&engine, MARKET);

    let placed = engine.betting.place_bet(bet("alice", "o1", dec!(100))).unwrap();
    clock.advance(Duration::seconds(299));
    let cancelled = engine
        .betting
        .cancel_bet(&UserId::new("alice"), &placed.bet.id)
        .unwrap();

    assert_eq!(cancelled.status, BetStatus::Refunded);
    assert_eq!(seed::balance(&engine, "alice"), dec!(1000));
    let after = seed::market(&engine, MARKET);
    assert_eq!(after.total_pool_amount, before.total_pool_amount);
    assert_eq!(after.outcomes, before.outcomes);

    let history = engine
        .wallets
        .transactions(&UserId::new("alice"), &usd(), 10)
        .unwrap();
    let refund = history
        .iter()
        .find(|t| t.kind == TransactionKind::BetRefund)
        .expect("refund recorded");
    assert_eq!(refund.amount, dec!(100));
    assert_eq!(refund.reference.as_ref(), Some(&placed.bet.id));
    let debit = history
        .iter()
        .find(|t| t.kind == TransactionKind::BetPlaced)
        .expect("debit recorded");
    assert_eq!(debit.reference.as_ref(), Some(&placed.bet.id));
}

#[test]
fn cancel_after_window_is_refused() {
    let (engine, clock) = memory_engine(&relaxed());
    seed::import(&engine, open_market());
    seed::register(&engine, "alice", dec!(100));

    let placed = engine.betting.place_bet(bet("alice", "o0", dec!(10))).unwrap();
    clock.advance(Duration::seconds(301));
    let err = engine
        .betting
        .cancel_bet(&UserId::new("alice"), &placed.bet.id)
        .unwrap_err();

    assert!(matches!(err, Error::InvalidState(_)), "got {err:?}");
    assert_eq!(seed::balance(&engine, "alice"), dec!(90));
}

#[test]
fn cancel_is_refused_twice_and_for_other_users() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, open_market());
    seed::register(&engine, "alice", dec!(100));
    seed::register(&engine, "mallory", dec!(100));

    let placed = engine.betting.place_bet(bet("alice", "o0", dec!(10))).unwrap();

    let err = engine
        .betting
        .cancel_bet(&UserId::new("mallory"), &placed.bet.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    engine
        .betting
        .cancel_bet(&UserId::new("alice"), &placed.bet.id)
        .unwrap();
    let err = engine
        .betting
        .cancel_bet(&UserId::new("alice"), &placed.bet.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(seed::balance(&engine, "alice"), dec!(100));
}

#[test]
fn slippage_beyond_tolerance_rejects() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, market_with_pools(&[dec!(600), dec!(400)]));
    seed::register(&engine, "alice", dec!(1000));

    // Expected 30, actual 40: a third off.
    let request = bet("alice", "o1", dec!(10)).with_expected_price(dec!(30), None);
    let err = engine.betting.place_bet(request).unwrap_err();
    match risk(&err) {
        RiskError::SlippageExceeded { actual, max } => {
            assert!(*actual > dec!(33) && *actual < dec!(34), "actual {actual}");
            assert_eq!(*max, dec!(5));
        }
        other => panic!("unexpected rejection {other:?}"),
    }
    assert_eq!(seed::balance(&engine, "alice"), dec!(1000));

    let request = bet("alice", "o1", dec!(10)).with_expected_price(dec!(30), Some(dec!(50)));
    engine.betting.place_bet(request).unwrap();

    let request = bet("alice", "o1", dec!(10)).with_expected_price(dec!(40.5), None);
    engine.betting.place_bet(request).unwrap();
}

#[test]
fn unregistered_and_inactive_users_are_unauthorized() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, open_market());
    engine
        .wallets
        .deposit(&UserId::new("ghost"), &usd(), dec!(100), "seed")
        .unwrap();

    let err = engine.betting.place_bet(bet("ghost", "o0", dec!(10))).unwrap_err();
    assert!(matches!(risk(&err), RiskError::Unauthorized { .. }));

    let mut profile = poolmarket::testkit::domain::verified_user("ghost");
    profile.is_active = false;
    engine.wallets.upsert_user(profile).unwrap();
    let err = engine.betting.place_bet(bet("ghost", "o0", dec!(10))).unwrap_err();
    assert!(matches!(risk(&err), RiskError::Unauthorized { .. }));
    assert_eq!(seed::balance(&engine, "ghost"), dec!(100));
}

#[test]
fn closed_or_unknown_targets_are_not_open_for_betting() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, open_market());
    seed::register(&engine, "alice", dec!(100));

    let err = engine.betting.place_bet(bet("alice", "o9", dec!(10))).unwrap_err();
    assert!(matches!(
        risk(&err),
        RiskError::MarketNotOpenForBetting { .. }
    ));

    engine
        .markets
        .void_market(&MarketId::new(MARKET), "cancelled event")
        .unwrap();
    let err = engine.betting.place_bet(bet("alice", "o0", dec!(10))).unwrap_err();
    assert!(matches!(
        risk(&err),
        RiskError::MarketNotOpenForBetting { .. }
    ));

    let err = engine
        .betting
        .place_bet(PlaceBetRequest::new("alice", "nowhere", "o0", dec!(10)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn daily_limit_counts_everything_placed_today() {
    let mut config = relaxed();
    config.risk.daily_limit = dec!(100);
    let (engine, _clock) = memory_engine(&config);
    seed::import(&engine, open_market());
    seed::register(&engine, "alice", dec!(1000));

    let first = engine.betting.place_bet(bet("alice", "o0", dec!(60))).unwrap();
    engine
        .betting
        .cancel_bet(&UserId::new("alice"), &first.bet.id)
        .unwrap();

    let err = engine.betting.place_bet(bet("alice", "o0", dec!(50))).unwrap_err();
    assert_eq!(
        risk(&err),
        &RiskError::DailyLimitExceeded {
            spent: dec!(60),
            amount: dec!(50),
            limit: dec!(100),
        }
    );
    engine.betting.place_bet(bet("alice", "o0", dec!(40))).unwrap();
}

#[test]
fn position_limit_is_per_market_then_per_user() {
    let mut config = relaxed();
    config.risk.max_position_per_market = dec!(100);
    config.risk.max_position_per_user = dec!(150);
    let (engine, _clock) = memory_engine(&config);
    seed::import(&engine, open_market());
    let mut second = open_market();
    second.id = MarketId::new("m2");
    seed::import(&engine, second);
    seed::register(&engine, "alice", dec!(1000));

    engine.betting.place_bet(bet("alice", "o0", dec!(80))).unwrap();
    let err = engine.betting.place_bet(bet("alice", "o1", dec!(30))).unwrap_err();
    assert!(matches!(
        risk(&err),
        RiskError::PositionLimitExceeded {
            scope: PositionScope::Market,
            ..
        }
    ));

    engine
        .betting
        .place_bet(PlaceBetRequest::new("alice", "m2", "o0", dec!(60)))
        .unwrap();
    let err = engine
        .betting
        .place_bet(PlaceBetRequest::new("alice", "m2", "o0", dec!(20)))
        .unwrap_err();
    assert!(matches!(
        risk(&err),
        RiskError::PositionLimitExceeded {
            scope: PositionScope::User,
            ..
        }
    ));
}

#[test]
fn cooldown_spaces_out_bets() {
    let mut config = relaxed();
    config.risk.cooldown_secs = 30;
    let (engine, clock) = memory_engine(&config);
    seed::import(&engine, open_market());
    seed::register(&engine, "alice", dec!(100));

    engine.betting.place_bet(bet("alice", "o0", dec!(5))).unwrap();
    clock.advance(Duration::seconds(10));
    let err = engine.betting.place_bet(bet("alice", "o0", dec!(5))).unwrap_err();
    assert_eq!(
        risk(&err),
        &RiskError::BetCooldownActive { remaining_secs: 20 }
    );

    clock.advance(Duration::seconds(20));
    engine.betting.place_bet(bet("alice", "o0", dec!(5))).unwrap();
}

#[test]
fn frozen_wallet_refuses_bets_but_takes_deposits() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, open_market());
    seed::register(&engine, "alice", dec!(100));
    engine.wallets.freeze(&UserId::new("alice"), &usd()).unwrap();

    let err = engine.betting.place_bet(bet("alice", "o0", dec!(10))).unwrap_err();
    assert!(
        matches!(err, Error::Domain(DomainError::WalletFrozen { .. })),
        "got {err:?}"
    );
    assert_eq!(seed::market(&engine, MARKET).total_pool_amount, Decimal::ZERO);

    engine
        .wallets
        .deposit(&UserId::new("alice"), &usd(), dec!(5), "top up")
        .unwrap();
    assert_eq!(seed::balance(&engine, "alice"), dec!(105));

    engine.wallets.unfreeze(&UserId::new("alice"), &usd()).unwrap();
    engine.betting.place_bet(bet("alice", "o0", dec!(10))).unwrap();
}

#[test]
fn pools_stay_consistent_through_mixed_activity() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(
        &engine,
        market_with_pools(&[dec!(250), Decimal::ZERO, dec!(17.5)]),
    );
    let users = ["alice", "bob", "carol"];
    for user in users {
        seed::register(&engine, user, dec!(5000));
    }

    let amounts = [dec!(12.34), dec!(250), dec!(1), dec!(999.99), dec!(42), dec!(7.5)];
    let mut placed = Vec::new();
    for (i, amount) in amounts.iter().enumerate() {
        let user = users[i % users.len()];
        let outcome = format!("o{}", i % 3);
        placed.push(
            engine
                .betting
                .place_bet(bet(user, &outcome, *amount))
                .unwrap(),
        );
        let market = seed::market(&engine, MARKET);
        assert_pools_consistent(&market);
        assert_prices_in_band(&engine.markets.current_prices(&market.id).unwrap());
    }

    for p in placed.iter().step_by(2) {
        engine
            .betting
            .cancel_bet(&p.bet.user_id, &p.bet.id)
            .unwrap();
        assert_pools_consistent(&seed::market(&engine, MARKET));
    }

    let market = seed::market(&engine, MARKET);
    let kept: Decimal = placed.iter().skip(1).step_by(2).map(|p| p.bet.amount).sum();
    assert_eq!(market.total_pool_amount, dec!(267.5) + kept);

    for user in users {
        assert_wallet_sane(&seed::wallet(&engine, user));
    }
    let spent: Decimal = users
        .iter()
        .map(|u| dec!(5000) - seed::balance(&engine, u))
        .sum();
    assert_eq!(spent, kept);
}

#[test]
fn extreme_pools_still_price_within_band() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, market_with_pools(&[dec!(100000), Decimal::ZERO]));

    let prices = engine.markets.current_prices(&MarketId::new(MARKET)).unwrap();
    assert_eq!(prices[0].price, dec!(99));
    assert_eq!(prices[1].price, dec!(1));
}

#[test]
fn bet_listing_filters_and_pages() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, open_market());
    seed::register(&engine, "alice", dec!(1000));
    let user = UserId::new("alice");

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(engine.betting.place_bet(bet("alice", "o0", dec!(10))).unwrap().bet.id);
    }
    engine.betting.cancel_bet(&user, &ids[0]).unwrap();

    let active = BetFilter {
        status: Some(BetStatus::Active),
        market_id: Some(MarketId::new(MARKET)),
    };
    let page = engine
        .betting
        .user_bets(&user, &active, Pagination { limit: 3, offset: 0 })
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.items.len(), 3);
    assert!(page.items.iter().all(|b| b.status == BetStatus::Active));

    let page = engine
        .betting
        .user_bets(&user, &active, Pagination { limit: 3, offset: 3 })
        .unwrap();
    assert_eq!(page.items.len(), 1);

    let err = engine
        .betting
        .user_bets(&user, &BetFilter::default(), Pagination { limit: 0, offset: 0 })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let shown = engine.betting.bet(&user, &ids[1]).unwrap();
    assert_eq!(shown.id, ids[1]);
    let err = engine.betting.bet(&UserId::new("bob"), &ids[1]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[test]
fn portfolio_values_positions_at_current_prices() {
    let (engine, _clock) = memory_engine(&relaxed());
    seed::import(&engine, open_market());
    seed::register(&engine, "alice", dec!(1000));
    seed::register(&engine, "bob", dec!(1000));

    engine.betting.place_bet(bet("alice", "o0", dec!(100))).unwrap();
    engine.betting.place_bet(bet("bob", "o1", dec!(300))).unwrap();

    let portfolio = engine.betting.portfolio(&UserId::new("alice")).unwrap();
    assert_eq!(portfolio.positions.len(), 1);
    let position = &portfolio.positions[0];
    assert_eq!(position.contracts, dec!(200));
    assert_eq!(position.average_price, dec!(50));
    assert_eq!(position.current_price, dec!(25));
    assert_eq!(position.current_value, dec!(50));
    assert_eq!(position.unrealized_pnl, dec!(-50));
    assert_eq!(portfolio.total_staked, dec!(100));
    assert_eq!(portfolio.wallets.len(), 1);
    assert_eq!(portfolio.wallets[0].balance, dec!(900));
}
