use rust_decimal::Decimal;

use poolmarket::domain::{Market, OutcomePrice, Wallet};

pub fn assert_decimal_near(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "expected {} ± {}, got {}",
        expected,
        tolerance,
        actual
    );
}

/// The market total equals the outcome pools and no pool is negative.
pub fn assert_pools_consistent(market: &Market) {
    let sum: Decimal = market.outcomes.iter().map(|o| o.pool_amount).sum();
    assert_eq!(
        market.total_pool_amount, sum,
        "market {} total drifted from its outcome pools",
        market.id
    );
    for outcome in &market.outcomes {
        assert!(
            outcome.pool_amount >= Decimal::ZERO,
            "outcome {} has a negative pool",
            outcome.key
        );
    }
}

pub fn assert_wallet_sane(wallet: &Wallet) {
    assert!(wallet.locked_balance() >= Decimal::ZERO);
    assert!(
        wallet.balance() >= wallet.locked_balance(),
        "balance {} below locked {}",
        wallet.balance(),
        wallet.locked_balance()
    );
}

pub fn assert_prices_in_band(prices: &[OutcomePrice]) {
    for price in prices {
        assert!(
            price.price >= Decimal::ONE && price.price <= Decimal::from(99),
            "price {} of {} outside [1, 99]",
            price.price,
            price.key
        );
    }
}
