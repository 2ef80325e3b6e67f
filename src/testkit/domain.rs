//! Builders for domain primitives used across tests.
//!
//! Markets built here are open, priced in USD, use outcome keys `o0`, `o1`,
//! ... and close a week after the moment they were built.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::money::round_contracts;
use crate::domain::{
    Amount, Bet, BetId, BetStatus, CurrencyCode, Market, MarketId, MarketStatus, Outcome,
    OutcomeKey, Price, SafeguardConfig, UserId, UserProfile, Wallet, WalletId,
};

/// Market id used by every builder in this module.
pub const MARKET: &str = "m1";

/// Currency of every market built here.
pub fn usd() -> CurrencyCode {
    CurrencyCode::new("USD")
}

/// Open market `m1` with one outcome per pool entry.
pub fn market_with_pools(pools: &[Amount]) -> Market {
    let now = Utc::now();
    let outcomes: Vec<Outcome> = pools
        .iter()
        .enumerate()
        .map(|(i, pool)| Outcome {
            pool_amount: *pool,
            ..Outcome::new(format!("o{i}"), format!("Outcome {i}"))
        })
        .collect();
    Market {
        id: MarketId::new(MARKET),
        title: "Test market".to_string(),
        status: MarketStatus::Open,
        currency: usd(),
        total_pool_amount: pools.iter().sum(),
        outcomes,
        min_bet_amount: Decimal::ONE,
        max_bet_amount: Decimal::from(10_000),
        rake_percentage: Decimal::from(5),
        creator_revenue_share: Decimal::ZERO,
        safeguards: SafeguardConfig::default(),
        created_at: now - Duration::days(1),
        close_time: now + Duration::days(7),
        resolution_deadline: None,
        resolved_outcome: None,
        resolution_source: None,
        resolved_at: None,
        void_reason: None,
    }
}

/// Open two-outcome market with empty pools.
pub fn open_market() -> Market {
    market_with_pools(&[Decimal::ZERO, Decimal::ZERO])
}

/// Active bet bought at `price`.
pub fn active_bet(user: &str, market: &str, outcome: &str, amount: Amount, price: Price) -> Bet {
    Bet {
        id: BetId::new(),
        user_id: UserId::new(user),
        market_id: MarketId::new(market),
        outcome_key: OutcomeKey::new(outcome),
        amount,
        contracts: round_contracts(amount * Decimal::ONE_HUNDRED / price),
        price_per_contract: price,
        total_cost: amount,
        status: BetStatus::Active,
        transaction_id: None,
        settlement_amount: None,
        placed_at: Utc::now(),
        settled_at: None,
    }
}

/// USD wallet holding `balance`, nothing locked.
pub fn funded_wallet(user: &str, balance: Amount) -> Wallet {
    Wallet::restore(
        WalletId::new(),
        UserId::new(user),
        usd(),
        balance,
        Decimal::ZERO,
        false,
    )
}

/// Active, email- and KYC-verified user.
pub fn verified_user(id: &str) -> UserProfile {
    UserProfile::verified(id)
}
