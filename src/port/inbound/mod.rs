//! Inbound (driving) ports consumed by inbound adapters.
//!
//! Inbound ports expose application capabilities to external drivers such as
//! the command-line interface.
//!
//! # Modules
//!
//! - [`betting`]: Bet placement, cancellation, quotes and portfolio views
//! - [`market`]: Market prices, safeguards and lifecycle transitions
//! - [`risk`]: Risk check result types and the risk gate
//! - [`wallet`]: Wallet ledger and account management

pub mod betting;
pub mod market;
pub mod risk;
pub mod wallet;
