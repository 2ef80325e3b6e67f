//! Risk management service module.
//!
//! Provides pre-execution validation of bets against deployment limits
//! and an advisory per-bet risk score.

pub mod gatekeeper;
pub mod limits;

pub use gatekeeper::RiskGatekeeper;
pub use limits::RiskLimits;
