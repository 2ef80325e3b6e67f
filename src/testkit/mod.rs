//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for markets, bets, wallets and users.
//! - [`clock`] - A [`Clock`](crate::port::outbound::clock::Clock) tests can move by hand.
//! - [`config`] - Canonical risk limits and a fully wired in-memory engine.

pub mod clock;
pub mod config;
pub mod domain;
