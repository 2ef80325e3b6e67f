//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//!
//! ```text
//!        ┌──────────┐                          ┌──────────────┐
//!        │   CLI    │──── inbound ports ──────▶│ Application  │
//!        └──────────┘                          │              │
//!                                              │ Domain + Port│
//!        ┌──────────┐                          │              │
//!        │  Store   │◀─── outbound ports ──────│              │
//!        │ Adapter  │                          └──────────────┘
//!        └──────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`inbound::betting::BettingService`], [`inbound::market::MarketService`],
//!   [`inbound::wallet::WalletService`] - Use cases exposed to adapters
//! - [`inbound::risk::RiskGate`] - Bet validation
//! - [`outbound::store::Store`] - Atomic persistence
//! - [`outbound::clock::Clock`] - Time source

pub mod inbound;
pub mod outbound;
