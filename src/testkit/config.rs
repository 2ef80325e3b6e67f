//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use std::sync::Arc;

use crate::adapter::outbound::memory::MemoryStore;
use crate::application::risk::RiskLimits;
use crate::infrastructure::bootstrap::{build_engine, Engine};
use crate::infrastructure::config::Config;
use crate::testkit::clock::ManualClock;

/// Default limits with the per-minute rate limit lifted, so tests can place
/// many bets without moving the clock.
pub fn relaxed_limits() -> RiskLimits {
    RiskLimits {
        max_bets_per_minute: u32::MAX,
        ..RiskLimits::default()
    }
}

/// Default configuration with [`relaxed_limits`].
pub fn relaxed() -> Config {
    let mut config = Config::default();
    config.risk = relaxed_limits().into();
    config
}

/// An engine over a fresh [`MemoryStore`] driven by the returned clock.
pub fn memory_engine(config: &Config) -> (Engine<MemoryStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let engine = build_engine(Arc::new(MemoryStore::new()), config, clock.clone());
    (engine, clock)
}
