//! Market coordinator: prices, safeguards and lifecycle transitions.
//!
//! Resolving or voiding a market queues its settlement or refund in the
//! outbox within the same unit of work; the
//! [`SettlementWorker`](crate::application::settlement::SettlementWorker)
//! pays out later.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use super::coordinator::load_market;
use crate::domain::{
    DomainError, Market, MarketId, MarketStatus, OutboxEntry, OutboxKind, OutcomeKey,
    OutcomePrice, PricingModel, SafeguardEngine, SafeguardStatus,
};
use crate::error::{Error, Result};
use crate::port::inbound::market::MarketService;
use crate::port::outbound::clock::Clock;
use crate::port::outbound::store::Store;

/// Orchestrates market-side workflows over a [`Store`].
pub struct MarketCoordinator<S> {
    store: Arc<S>,
    pricing: Arc<dyn PricingModel>,
    safeguards: Arc<dyn SafeguardEngine>,
    clock: Arc<dyn Clock>,
}

impl<S: Store> MarketCoordinator<S> {
    pub fn new(
        store: Arc<S>,
        pricing: Arc<dyn PricingModel>,
        safeguards: Arc<dyn SafeguardEngine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            pricing,
            safeguards,
            clock,
        }
    }
}

impl<S: Store> MarketService for MarketCoordinator<S> {
    fn market(&self, id: &MarketId) -> Result<Market> {
        self.store.read(|repo| load_market(repo, id))
    }

    fn markets(&self, status: Option<MarketStatus>) -> Result<Vec<Market>> {
        self.store.read(|repo| repo.markets(status))
    }

    fn import_market(&self, market: Market) -> Result<Market> {
        validate_market(&market)?;
        self.store.atomically(|repo| {
            if repo.market(&market.id)?.is_some() && !repo.market_bets(&market.id, None)?.is_empty()
            {
                return Err(Error::InvalidState(format!(
                    "market {} already has bets and cannot be replaced",
                    market.id
                )));
            }
            repo.save_market(&market)
        })?;
        info!(market_id = %market.id, status = %market.status, "Market imported");
        Ok(market)
    }

    fn current_prices(&self, id: &MarketId) -> Result<Vec<OutcomePrice>> {
        let market = self.market(id)?;
        Ok(self.pricing.market_prices(&market))
    }

    fn check_safeguards(&self, id: &MarketId) -> Result<SafeguardStatus> {
        let market = self.market(id)?;
        Ok(self.safeguards.status(&market, self.clock.now()))
    }

    fn resolve_market(&self, id: &MarketId, winner: &OutcomeKey, source: &str) -> Result<Market> {
        if source.trim().is_empty() {
            return Err(Error::Validation("resolution source is required".into()));
        }
        let now = self.clock.now();
        let market = self.store.atomically(|repo| {
            let mut market = load_market(repo, id)?;
            if !market.is_resolvable(now) {
                return Err(Error::InvalidState(format!(
                    "market {id} is {} and cannot be resolved yet",
                    market.status
                )));
            }
            market.resolve(winner, source, now)?;
            repo.save_market(&market)?;
            repo.enqueue(&OutboxEntry::pending(
                OutboxKind::Settlement,
                market.id.clone(),
                now,
            ))?;
            Ok(market)
        })?;
        info!(market_id = %id, winner = %winner, source, "Market resolved");
        Ok(market)
    }

    fn void_market(&self, id: &MarketId, reason: &str) -> Result<Market> {
        if reason.trim().is_empty() {
            return Err(Error::Validation("void reason is required".into()));
        }
        let now = self.clock.now();
        let market = self.store.atomically(|repo| {
            let mut market = load_market(repo, id)?;
            if market.status.is_terminal() {
                return Err(Error::InvalidState(format!(
                    "market {id} is already {}",
                    market.status
                )));
            }
            market.void(reason, now);
            repo.save_market(&market)?;
            repo.enqueue(&OutboxEntry::pending(
                OutboxKind::Refund,
                market.id.clone(),
                now,
            ))?;
            Ok(market)
        })?;
        info!(market_id = %id, reason, "Market voided");
        Ok(market)
    }

    fn close_expired_markets(&self) -> Result<Vec<MarketId>> {
        let now = self.clock.now();
        let closed = self.store.atomically(|repo| {
            let mut closed = Vec::new();
            for mut market in repo.expired_markets(now)? {
                market.status = MarketStatus::Closed;
                repo.save_market(&market)?;
                closed.push(market.id);
            }
            Ok(closed)
        })?;
        if !closed.is_empty() {
            info!(count = closed.len(), "Closed expired markets");
        }
        Ok(closed)
    }
}

/// Structural checks for markets entering the system.
fn validate_market(market: &Market) -> Result<()> {
    if market.id.as_str().trim().is_empty() {
        return Err(Error::Validation("market id is required".into()));
    }
    if market.outcomes.is_empty() {
        return Err(DomainError::EmptyOutcomes.into());
    }
    let mut keys = HashSet::new();
    for outcome in &market.outcomes {
        if !keys.insert(&outcome.key) {
            return Err(Error::Validation(format!(
                "duplicate outcome key '{}'",
                outcome.key
            )));
        }
        if outcome.pool_amount < Decimal::ZERO {
            return Err(DomainError::NegativePool {
                key: outcome.key.to_string(),
            }
            .into());
        }
    }
    if !market.pool_drift().is_zero() {
        return Err(Error::Validation(format!(
            "total pool {} does not match outcome pools {}",
            market.total_pool_amount,
            market.outcome_pool_sum()
        )));
    }
    if market.min_bet_amount <= Decimal::ZERO || market.max_bet_amount < market.min_bet_amount {
        return Err(Error::Validation(format!(
            "bet bounds [{}, {}] are invalid",
            market.min_bet_amount, market.max_bet_amount
        )));
    }
    let percent = Decimal::ZERO..=Decimal::ONE_HUNDRED;
    if !percent.contains(&market.rake_percentage) {
        return Err(Error::Validation("rake percentage must be within 0-100".into()));
    }
    if !percent.contains(&market.creator_revenue_share) {
        return Err(Error::Validation(
            "creator revenue share must be within 0-100".into(),
        ));
    }
    let threshold = market.safeguards.imbalance_threshold;
    if threshold <= Decimal::ZERO || threshold > Decimal::ONE {
        return Err(Error::Validation(
            "imbalance threshold must be within (0, 1]".into(),
        ));
    }
    if market.close_time <= market.created_at {
        return Err(Error::Validation(
            "close time must be after creation time".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::{market_with_pools, open_market};
    use rust_decimal_macros::dec;

    #[test]
    fn well_formed_market_passes() {
        assert!(validate_market(&open_market()).is_ok());
    }

    #[test]
    fn pool_mismatch_is_rejected() {
        let mut market = market_with_pools(&[dec!(10), dec!(20)]);
        market.total_pool_amount = dec!(31);
        assert!(matches!(validate_market(&market), Err(Error::Validation(_))));
    }

    #[test]
    fn duplicate_outcomes_are_rejected() {
        let mut market = open_market();
        market.outcomes[1].key = OutcomeKey::new("o0");
        assert!(validate_market(&market).is_err());
    }

    #[test]
    fn empty_outcomes_are_rejected() {
        let mut market = open_market();
        market.outcomes.clear();
        assert!(matches!(
            validate_market(&market),
            Err(Error::Domain(DomainError::EmptyOutcomes))
        ));
    }

    #[test]
    fn inverted_bet_bounds_are_rejected() {
        let mut market = open_market();
        market.min_bet_amount = dec!(100);
        market.max_bet_amount = dec!(10);
        assert!(validate_market(&market).is_err());
    }
}
