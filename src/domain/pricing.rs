//! Pool-ratio pricing.
//!
//! An outcome's price is its share of the market pool in percent, clamped to
//! `[PRICE_FLOOR, PRICE_CEILING]`. The clamp is load-bearing: contracts and
//! breakeven math divide by the price, so it must never reach zero, and a
//! price below 100 keeps leverage bounded.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use super::id::OutcomeKey;
use super::market::Market;
use super::money::{
    round_contracts, round_money, round_price, Amount, Price, PRICE_CEILING, PRICE_FLOOR,
};

/// Impact above this percentage is damped logarithmically.
const IMPACT_DAMPING_START: Decimal = Decimal::TEN;

/// Largest bankroll fraction the Kelly sizing will ever suggest.
const MAX_KELLY_FRACTION: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

/// Live price of one outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomePrice {
    pub key: OutcomeKey,
    pub label: String,
    pub pool_amount: Amount,
    pub price: Price,
    /// `price / 100`.
    pub probability: Decimal,
}

/// Pricing operations used by quotes and bet execution.
pub trait PricingModel: Send + Sync {
    /// Price of an outcome given its pool and the market pool.
    fn price(&self, outcome_pool: Amount, total_pool: Amount, outcome_count: usize) -> Price;

    /// Contracts an amount buys at a price.
    fn contracts_bought(&self, amount: Amount, price: Price) -> Decimal;

    /// Price after `bet_amount` lands on the outcome.
    fn new_price(
        &self,
        outcome_pool: Amount,
        total_pool: Amount,
        bet_amount: Amount,
        outcome_count: usize,
    ) -> Price {
        self.price(
            outcome_pool + bet_amount,
            total_pool + bet_amount,
            outcome_count,
        )
    }

    /// How far a bet moves a pool, in percent.
    fn price_impact(&self, current_pool: Amount, bet_amount: Amount) -> Decimal;

    /// Relative difference between expected and actual price, in percent.
    ///
    /// Returns `None` when the expected price is not positive.
    fn slippage(&self, expected: Price, actual: Price) -> Option<Decimal>;

    /// Price at which a position neither wins nor loses.
    fn breakeven_price(&self, amount: Amount, contracts: Decimal) -> Option<Price>;

    /// Kelly-criterion stake, capped at a quarter of the bankroll.
    fn optimal_bet_size(&self, bankroll: Amount, price: Price, true_probability: Decimal)
        -> Amount;

    /// Advisory 0–100 score of pool depth and balance.
    fn liquidity_score(&self, market: &Market) -> f64;

    /// Proportional share of the prize pool owed to a winning position.
    fn payout_share(&self, contracts: Decimal, total_winning: Decimal, prize_pool: Amount)
        -> Amount;

    /// Current price of every outcome in a market.
    fn market_prices(&self, market: &Market) -> Vec<OutcomePrice> {
        let count = market.outcomes.len();
        market
            .outcomes
            .iter()
            .map(|outcome| {
                let price = self.price(outcome.pool_amount, market.total_pool_amount, count);
                OutcomePrice {
                    key: outcome.key.clone(),
                    label: outcome.label.clone(),
                    pool_amount: outcome.pool_amount,
                    price,
                    probability: price / Decimal::ONE_HUNDRED,
                }
            })
            .collect()
    }
}

/// Parimutuel-style automated market maker.
#[derive(Debug, Clone)]
pub struct PoolPricing {
    /// Pool size treated as fully deep by the liquidity score.
    liquidity_reference: Amount,
}

impl PoolPricing {
    /// Create a pricing model with the given liquidity reference scale.
    #[must_use]
    pub fn new(liquidity_reference: Amount) -> Self {
        Self {
            liquidity_reference,
        }
    }
}

impl Default for PoolPricing {
    fn default() -> Self {
        Self::new(Decimal::from(10_000))
    }
}

/// Clamp a price into the tradable band.
#[must_use]
pub fn clamp_price(price: Decimal) -> Price {
    price.clamp(PRICE_FLOOR, PRICE_CEILING)
}

impl PricingModel for PoolPricing {
    fn price(&self, outcome_pool: Amount, total_pool: Amount, outcome_count: usize) -> Price {
        if total_pool <= Decimal::ZERO {
            if outcome_count == 0 {
                return Decimal::from(50);
            }
            let prior = Decimal::ONE_HUNDRED / Decimal::from(outcome_count);
            return round_price(clamp_price(prior));
        }
        let share = outcome_pool.max(Decimal::ZERO) / total_pool * Decimal::ONE_HUNDRED;
        clamp_price(round_price(share))
    }

    fn contracts_bought(&self, amount: Amount, price: Price) -> Decimal {
        if price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        round_contracts(amount * Decimal::ONE_HUNDRED / price)
    }

    fn price_impact(&self, current_pool: Amount, bet_amount: Amount) -> Decimal {
        if current_pool <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let impact = bet_amount / current_pool * Decimal::ONE_HUNDRED;
        let damped = if impact > IMPACT_DAMPING_START {
            IMPACT_DAMPING_START + (impact - Decimal::from(9)).ln()
        } else {
            impact
        };
        round_price(damped)
    }

    fn slippage(&self, expected: Price, actual: Price) -> Option<Decimal> {
        if expected <= Decimal::ZERO {
            return None;
        }
        Some(round_price(
            (actual - expected).abs() / expected * Decimal::ONE_HUNDRED,
        ))
    }

    fn breakeven_price(&self, amount: Amount, contracts: Decimal) -> Option<Price> {
        if contracts <= Decimal::ZERO {
            return None;
        }
        Some(round_price(amount / contracts * Decimal::ONE_HUNDRED))
    }

    fn optimal_bet_size(
        &self,
        bankroll: Amount,
        price: Price,
        true_probability: Decimal,
    ) -> Amount {
        let in_range = bankroll > Decimal::ZERO
            && price > Decimal::ZERO
            && price < Decimal::ONE_HUNDRED
            && true_probability > Decimal::ZERO
            && true_probability < Decimal::ONE;
        if !in_range {
            return Decimal::ZERO;
        }

        let implied = price / Decimal::ONE_HUNDRED;
        let edge = true_probability - implied;
        if edge <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        // With net odds b = (1 - p) / p, f* = (bq - (1 - q)) / b = (q - p) / (1 - p).
        let fraction = (edge / (Decimal::ONE - implied)).clamp(Decimal::ZERO, MAX_KELLY_FRACTION);
        round_money(bankroll * fraction)
    }

    fn liquidity_score(&self, market: &Market) -> f64 {
        let total = market.total_pool_amount.to_f64().unwrap_or(0.0).max(0.0);
        let reference = self.liquidity_reference.to_f64().unwrap_or(1.0).max(1.0);
        let depth = ((total + 1.0).ln() / (reference + 1.0).ln()).clamp(0.0, 1.0);

        let count = market.outcomes.len();
        let balance = if count < 2 || total <= 0.0 {
            0.0
        } else {
            let entropy: f64 = market
                .outcomes
                .iter()
                .filter_map(|o| o.pool_amount.to_f64())
                .map(|pool| pool / total)
                .filter(|share| *share > 0.0)
                .map(|share| -share * share.log2())
                .sum();
            (entropy / (count as f64).log2()).clamp(0.0, 1.0)
        };

        50.0 * depth + 50.0 * balance
    }

    fn payout_share(
        &self,
        contracts: Decimal,
        total_winning: Decimal,
        prize_pool: Amount,
    ) -> Amount {
        if total_winning <= Decimal::ZERO || contracts <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        round_money(contracts * prize_pool / total_winning)
    }
}
