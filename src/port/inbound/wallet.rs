//! Wallet and account use cases for operator-facing adapters.

use crate::domain::{Amount, CurrencyCode, LedgerTransaction, UserId, UserProfile, Wallet};
use crate::error::Result;

/// Ledger operations exposed to adapters.
///
/// Every balance-affecting call runs in its own unit of work and writes
/// exactly one ledger transaction.
pub trait WalletService: Send + Sync {
    /// Credit funds, opening the wallet on first use.
    fn deposit(
        &self,
        user_id: &UserId,
        currency: &CurrencyCode,
        amount: Amount,
        description: &str,
    ) -> Result<LedgerTransaction>;

    /// Debit available funds.
    fn withdraw(
        &self,
        user_id: &UserId,
        currency: &CurrencyCode,
        amount: Amount,
        description: &str,
    ) -> Result<LedgerTransaction>;

    /// Reserve part of the available balance.
    fn lock_funds(
        &self,
        user_id: &UserId,
        currency: &CurrencyCode,
        amount: Amount,
    ) -> Result<LedgerTransaction>;

    /// Release a reservation.
    fn unlock_funds(
        &self,
        user_id: &UserId,
        currency: &CurrencyCode,
        amount: Amount,
    ) -> Result<LedgerTransaction>;

    /// Freeze the wallet against outgoing movements.
    fn freeze(&self, user_id: &UserId, currency: &CurrencyCode) -> Result<Wallet>;

    /// Lift a freeze.
    fn unfreeze(&self, user_id: &UserId, currency: &CurrencyCode) -> Result<Wallet>;

    fn wallet(&self, user_id: &UserId, currency: &CurrencyCode) -> Result<Wallet>;

    fn wallets(&self, user_id: &UserId) -> Result<Vec<Wallet>>;

    /// Recent ledger history, newest first.
    fn transactions(
        &self,
        user_id: &UserId,
        currency: &CurrencyCode,
        limit: usize,
    ) -> Result<Vec<LedgerTransaction>>;

    /// Create or replace a user's eligibility profile.
    fn upsert_user(&self, profile: UserProfile) -> Result<()>;

    fn user(&self, user_id: &UserId) -> Result<UserProfile>;
}
