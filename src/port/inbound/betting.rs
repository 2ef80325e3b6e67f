//! Bet placement and portfolio use cases for driving adapters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Amount, Bet, BetFilter, BetId, CurrencyCode, MarketId, OutcomeKey, Price, UserId,
};
use crate::error::Result;

/// Request to place a bet.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceBetRequest {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub outcome_key: OutcomeKey,
    pub amount: Amount,
    /// Price the caller saw when deciding to bet.
    pub expected_price: Option<Price>,
    /// Tolerated slippage in percent; the configured default applies when unset.
    pub max_slippage: Option<Decimal>,
}

impl PlaceBetRequest {
    pub fn new(
        user_id: impl Into<UserId>,
        market_id: impl Into<MarketId>,
        outcome_key: impl Into<OutcomeKey>,
        amount: Amount,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            market_id: market_id.into(),
            outcome_key: outcome_key.into(),
            amount,
            expected_price: None,
            max_slippage: None,
        }
    }

    /// Guard execution against price movement since `price` was quoted.
    #[must_use]
    pub fn with_expected_price(mut self, price: Price, max_slippage: Option<Decimal>) -> Self {
        self.expected_price = Some(price);
        self.max_slippage = max_slippage;
        self
    }
}

/// A successfully placed bet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedBet {
    pub bet: Bet,
    /// Outcome price after the bet landed.
    pub new_price: Price,
    pub wallet_balance: Amount,
    /// Advisory 0–100.
    pub risk_score: f64,
}

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T> Page<T> {
    /// Cut one page out of a full result list.
    #[must_use]
    pub fn slice(all: Vec<T>, page: Pagination) -> Self {
        let total = all.len();
        let items = all
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect();
        Self {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

/// A user's active stake on one outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub market_id: MarketId,
    pub market_title: String,
    pub currency: CurrencyCode,
    pub outcome_key: OutcomeKey,
    pub outcome_label: String,
    pub bet_count: u32,
    pub amount: Amount,
    pub contracts: Decimal,
    /// Amount-weighted entry price.
    pub average_price: Price,
    pub current_price: Price,
    /// Contracts valued at the current price.
    pub current_value: Amount,
    pub unrealized_pnl: Amount,
}

/// What a bet would do if placed now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BetQuote {
    pub market_id: MarketId,
    pub outcome_key: OutcomeKey,
    pub amount: Amount,
    pub current_price: Price,
    pub new_price: Price,
    pub contracts: Decimal,
    pub breakeven_price: Option<Price>,
    /// Contracts at face value.
    pub potential_payout: Amount,
    pub potential_profit: Amount,
    /// Percent of the outcome pool the bet adds.
    pub price_impact: Decimal,
    /// Percent movement between current and new price.
    pub slippage: Option<Decimal>,
    pub implied_probability: Decimal,
    pub quoted_at: DateTime<Utc>,
}

/// Effect of a bet size on an outcome price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceImpact {
    pub market_id: MarketId,
    pub outcome_key: OutcomeKey,
    pub amount: Amount,
    pub outcome_pool: Amount,
    pub current_price: Price,
    pub new_price: Price,
    pub price_impact: Decimal,
}

/// Balance of one wallet as shown in a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletSummary {
    pub currency: CurrencyCode,
    pub balance: Amount,
    pub locked_balance: Amount,
    pub available_balance: Amount,
    pub is_locked: bool,
}

/// Wallets plus live-valued positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    pub user_id: UserId,
    pub wallets: Vec<WalletSummary>,
    pub positions: Vec<Position>,
    pub total_staked: Amount,
    pub total_value: Amount,
    pub unrealized_pnl: Amount,
}

/// Lifetime betting figures of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BettingStats {
    pub total_bets: u32,
    pub active_bets: u32,
    pub won_bets: u32,
    pub lost_bets: u32,
    pub refunded_bets: u32,
    pub total_wagered: Amount,
    pub total_won: Amount,
    /// Payouts minus stakes of settled bets.
    pub net_profit: Amount,
    /// Won over settled, in percent.
    pub win_rate: f64,
    pub average_bet: Amount,
}

/// Bet use cases.
///
/// # Thread Safety
///
/// Implementations are shared across request handlers and must be
/// `Send + Sync`.
pub trait BettingService: Send + Sync {
    /// Validate, price and execute a bet in one atomic unit.
    fn place_bet(&self, request: PlaceBetRequest) -> Result<PlacedBet>;

    /// Refund an active bet of `user_id` within the cancellation window.
    fn cancel_bet(&self, user_id: &UserId, bet_id: &BetId) -> Result<Bet>;

    /// Fetch a bet owned by `user_id`.
    fn bet(&self, user_id: &UserId, bet_id: &BetId) -> Result<Bet>;

    /// A user's bets, newest first.
    fn user_bets(&self, user_id: &UserId, filter: &BetFilter, page: Pagination)
        -> Result<Page<Bet>>;

    /// Active stakes grouped by market and outcome.
    fn user_positions(&self, user_id: &UserId) -> Result<Vec<Position>>;

    /// Price a prospective bet without placing it.
    fn quote(&self, market_id: &MarketId, outcome_key: &OutcomeKey, amount: Amount)
        -> Result<BetQuote>;

    /// How far a bet of `amount` would move the outcome.
    fn price_impact(
        &self,
        market_id: &MarketId,
        outcome_key: &OutcomeKey,
        amount: Amount,
    ) -> Result<PriceImpact>;

    /// Wallets and positions of a user.
    fn portfolio(&self, user_id: &UserId) -> Result<Portfolio>;

    /// Aggregate betting history of a user.
    fn betting_stats(&self, user_id: &UserId) -> Result<BettingStats>;
}
