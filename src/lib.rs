//! Poolmarket - bet execution and risk engine for pool-priced prediction markets.
//!
//! Users stake money on one outcome of a market. Prices follow the share of
//! the pool each outcome holds, so every bet moves them. The engine prices
//! and places bets atomically, enforces per-user limits, keeps an audited
//! wallet ledger and settles markets once they resolve or are voided.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - Markets, bets, wallets, pricing and safeguard math
//! - [`port`] - Inbound use-case traits and outbound store/clock traits
//! - [`application`] - Bet coordinator, risk gatekeeper, wallet ledger and
//!   settlement worker
//! - [`adapter`] - The CLI plus in-memory and SQLite stores
//! - [`infrastructure`] - Configuration and wiring
//!
//! # Example
//!
//! ```no_run
//! use poolmarket::infrastructure::bootstrap::open_engine;
//! use poolmarket::infrastructure::config::Config;
//! use poolmarket::port::inbound::betting::{BettingService, PlaceBetRequest};
//! use rust_decimal::Decimal;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = open_engine(&Config::load("config.toml")?)?;
//!     let placed = engine
//!         .betting
//!         .place_bet(PlaceBetRequest::new("alice", "election", "yes", Decimal::TEN))?;
//!     println!("bought {} contracts", placed.bet.contracts);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
