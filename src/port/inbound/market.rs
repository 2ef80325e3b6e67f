//! Market-side use cases: prices, health checks and lifecycle transitions.

use crate::domain::{Market, MarketId, MarketStatus, OutcomeKey, OutcomePrice, SafeguardStatus};
use crate::error::Result;

/// Market use cases for administrative adapters.
pub trait MarketService: Send + Sync {
    /// Fetch one market.
    fn market(&self, id: &MarketId) -> Result<Market>;

    /// List markets, optionally by status.
    fn markets(&self, status: Option<MarketStatus>) -> Result<Vec<Market>>;

    /// Validate and store a market created elsewhere.
    fn import_market(&self, market: Market) -> Result<Market>;

    /// Live price of every outcome.
    fn current_prices(&self, id: &MarketId) -> Result<Vec<OutcomePrice>>;

    /// Quorum, imbalance, house-bot and void-risk analysis.
    fn check_safeguards(&self, id: &MarketId) -> Result<SafeguardStatus>;

    /// Declare the winner and queue settlement.
    fn resolve_market(&self, id: &MarketId, winner: &OutcomeKey, source: &str) -> Result<Market>;

    /// Void the market and queue refunds.
    fn void_market(&self, id: &MarketId, reason: &str) -> Result<Market>;

    /// Move open markets past their close time to `closed`.
    fn close_expired_markets(&self) -> Result<Vec<MarketId>>;
}
