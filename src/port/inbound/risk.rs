//! Risk check types for bet validation.
//!
//! Defines result types for risk decisions and the gate that produces them.
//! The production gate lives in `application::risk::RiskGatekeeper`.

use chrono::{DateTime, Utc};

use crate::domain::{Amount, Market, OutcomeKey, UserId};
use crate::error::{Result, RiskError};
use crate::port::outbound::store::Repository;

/// Result of a risk check for a proposed bet.
///
/// Indicates whether a bet should proceed or be rejected based on risk
/// management rules.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskCheckResult {
    /// Bet passes all risk checks and may proceed.
    Approved,

    /// Bet is rejected due to a risk limit violation.
    Rejected(RiskError),
}

impl RiskCheckResult {
    /// Return `true` if the bet is approved.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, RiskCheckResult::Approved)
    }

    /// Return the rejection error if the bet was rejected.
    ///
    /// Returns `None` if the bet was approved.
    #[must_use]
    pub const fn rejection_error(&self) -> Option<&RiskError> {
        match self {
            RiskCheckResult::Rejected(e) => Some(e),
            RiskCheckResult::Approved => None,
        }
    }
}

/// A bet as the risk gate sees it.
#[derive(Debug, Clone, Copy)]
pub struct BetIntent<'a> {
    pub user_id: &'a UserId,
    pub market: &'a Market,
    pub outcome_key: &'a OutcomeKey,
    pub amount: Amount,
    pub now: DateTime<Utc>,
}

/// Risk gate that validates bets before execution.
///
/// # Implementation Notes
///
/// - Checks run against the repository of the caller's unit of work, so an
///   approval and the writes that follow it see the same state.
/// - `Err` is reserved for infrastructure failures; limit violations are
///   reported as `RiskCheckResult::Rejected`.
pub trait RiskGate: Send + Sync {
    /// Check if a bet passes all risk checks.
    fn check(&self, repo: &dyn Repository, intent: &BetIntent<'_>) -> Result<RiskCheckResult>;

    /// Advisory 0–100 risk score of a bet. Never gates.
    fn risk_score(&self, repo: &dyn Repository, intent: &BetIntent<'_>) -> f64;
}
