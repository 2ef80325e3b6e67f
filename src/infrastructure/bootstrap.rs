//! Composition root: builds the services from configuration.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::sqlite::SqliteStore;
use crate::application::betting::{BetCoordinator, MarketCoordinator};
use crate::application::risk::RiskGatekeeper;
use crate::application::settlement::SettlementWorker;
use crate::application::wallet::WalletLedgerService;
use crate::domain::{PoolPricing, PoolSafeguards, PricingModel, SafeguardEngine};
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::port::inbound::risk::RiskGate;
use crate::port::outbound::clock::{Clock, SystemClock};
use crate::port::outbound::store::Store;

/// Every service of the engine, sharing one store.
pub struct Engine<S> {
    pub store: Arc<S>,
    pub betting: BetCoordinator<S>,
    pub markets: MarketCoordinator<S>,
    pub wallets: WalletLedgerService<S>,
    pub settlement: SettlementWorker<S>,
    /// Entries one settlement pass processes.
    pub settlement_batch: usize,
}

/// Wire the engine over an existing store.
pub fn build_engine<S: Store>(store: Arc<S>, config: &Config, clock: Arc<dyn Clock>) -> Engine<S> {
    let pricing: Arc<dyn PricingModel> =
        Arc::new(PoolPricing::new(config.safeguards.liquidity_reference));
    let gate: Arc<dyn RiskGate> = Arc::new(RiskGatekeeper::new(config.risk.clone().into()));
    let safeguards: Arc<dyn SafeguardEngine> = Arc::new(PoolSafeguards::new(
        config.safeguards.policy(),
        Arc::clone(&pricing),
    ));

    Engine {
        betting: BetCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&pricing),
            gate,
            Arc::clone(&clock),
            config.betting.clone().into(),
        ),
        markets: MarketCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&pricing),
            safeguards,
            Arc::clone(&clock),
        ),
        wallets: WalletLedgerService::new(Arc::clone(&store), Arc::clone(&clock)),
        settlement: SettlementWorker::new(
            Arc::clone(&store),
            pricing,
            clock,
            config.settlement.max_attempts,
        ),
        settlement_batch: config.settlement.batch_size,
        store,
    }
}

/// Open the configured SQLite database and wire the engine on top of it.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated.
pub fn open_engine(config: &Config) -> Result<Engine<SqliteStore>> {
    let store = SqliteStore::open(&config.database)?;
    info!(database = %config.database, "Database ready");
    Ok(build_engine(Arc::new(store), config, Arc::new(SystemClock)))
}
