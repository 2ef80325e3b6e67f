//! Wallet ledger service.
//!
//! Each operation loads the wallet, applies one domain mutation and writes
//! the wallet together with its ledger transaction in one unit of work.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::{
    Amount, CurrencyCode, DomainError, LedgerTransaction, TransactionKind, UserId, UserProfile,
    Wallet,
};
use crate::error::{Error, Result};
use crate::port::inbound::wallet::WalletService;
use crate::port::outbound::clock::Clock;
use crate::port::outbound::store::{Repository, Store};

/// Ledger operations over a [`Store`].
pub struct WalletLedgerService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: Store> WalletLedgerService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Apply `op` to an existing wallet and persist the result.
    fn mutate<F>(&self, user_id: &UserId, currency: &CurrencyCode, op: F) -> Result<LedgerTransaction>
    where
        F: FnOnce(&mut Wallet, DateTime<Utc>) -> std::result::Result<LedgerTransaction, DomainError>,
    {
        let now = self.clock.now();
        self.store.atomically(|repo| {
            let mut wallet = load_wallet(repo, user_id, currency)?;
            let transaction = op(&mut wallet, now)?;
            repo.save_wallet(&wallet)?;
            repo.append_transaction(&transaction)?;
            Ok(transaction)
        })
    }

    fn set_frozen(&self, user_id: &UserId, currency: &CurrencyCode, frozen: bool) -> Result<Wallet> {
        let wallet = self.store.atomically(|repo| {
            let mut wallet = load_wallet(repo, user_id, currency)?;
            if frozen {
                wallet.lock();
            } else {
                wallet.unlock();
            }
            repo.save_wallet(&wallet)?;
            Ok(wallet)
        })?;
        info!(user_id = %user_id, currency = %currency, frozen, "Wallet freeze updated");
        Ok(wallet)
    }
}

impl<S: Store> WalletService for WalletLedgerService<S> {
    fn deposit(
        &self,
        user_id: &UserId,
        currency: &CurrencyCode,
        amount: Amount,
        description: &str,
    ) -> Result<LedgerTransaction> {
        validate_currency(currency)?;
        let now = self.clock.now();
        let transaction = self.store.atomically(|repo| {
            let mut wallet = repo
                .wallet(user_id, currency)?
                .unwrap_or_else(|| Wallet::new(user_id.clone(), currency.clone()));
            let transaction =
                wallet.credit(amount, TransactionKind::Deposit, description, now)?;
            repo.save_wallet(&wallet)?;
            repo.append_transaction(&transaction)?;
            Ok(transaction)
        })?;
        info!(
            user_id = %user_id,
            currency = %currency,
            amount = %amount,
            balance = %transaction.balance_after,
            "Deposit recorded"
        );
        Ok(transaction)
    }

    fn withdraw(
        &self,
        user_id: &UserId,
        currency: &CurrencyCode,
        amount: Amount,
        description: &str,
    ) -> Result<LedgerTransaction> {
        let transaction = self.mutate(user_id, currency, |wallet, now| {
            wallet.debit(amount, TransactionKind::Withdrawal, description, now)
        })?;
        info!(
            user_id = %user_id,
            currency = %currency,
            amount = %amount,
            balance = %transaction.balance_after,
            "Withdrawal recorded"
        );
        Ok(transaction)
    }

    fn lock_funds(
        &self,
        user_id: &UserId,
        currency: &CurrencyCode,
        amount: Amount,
    ) -> Result<LedgerTransaction> {
        self.mutate(user_id, currency, |wallet, now| {
            wallet.lock_funds(amount, format!("locked {amount}"), now)
        })
    }

    fn unlock_funds(
        &self,
        user_id: &UserId,
        currency: &CurrencyCode,
        amount: Amount,
    ) -> Result<LedgerTransaction> {
        self.mutate(user_id, currency, |wallet, now| {
            wallet.unlock_funds(amount, format!("unlocked {amount}"), now)
        })
    }

    fn freeze(&self, user_id: &UserId, currency: &CurrencyCode) -> Result<Wallet> {
        self.set_frozen(user_id, currency, true)
    }

    fn unfreeze(&self, user_id: &UserId, currency: &CurrencyCode) -> Result<Wallet> {
        self.set_frozen(user_id, currency, false)
    }

    fn wallet(&self, user_id: &UserId, currency: &CurrencyCode) -> Result<Wallet> {
        self.store
            .read(|repo| load_wallet(repo, user_id, currency))
    }

    fn wallets(&self, user_id: &UserId) -> Result<Vec<Wallet>> {
        self.store.read(|repo| repo.user_wallets(user_id))
    }

    fn transactions(
        &self,
        user_id: &UserId,
        currency: &CurrencyCode,
        limit: usize,
    ) -> Result<Vec<LedgerTransaction>> {
        self.store.read(|repo| {
            let wallet = load_wallet(repo, user_id, currency)?;
            repo.transactions(wallet.id(), limit)
        })
    }

    fn upsert_user(&self, profile: UserProfile) -> Result<()> {
        if profile.id.as_str().trim().is_empty() {
            return Err(Error::Validation("user id is required".into()));
        }
        self.store.atomically(|repo| repo.save_user(&profile))?;
        info!(user_id = %profile.id, active = profile.is_active, "User profile saved");
        Ok(())
    }

    fn user(&self, user_id: &UserId) -> Result<UserProfile> {
        self.store
            .read(|repo| repo.user(user_id))?
            .ok_or_else(|| Error::not_found("user", user_id))
    }
}

fn load_wallet(repo: &dyn Repository, user_id: &UserId, currency: &CurrencyCode) -> Result<Wallet> {
    repo.wallet(user_id, currency)?
        .ok_or_else(|| Error::not_found("wallet", format!("{user_id}/{currency}")))
}

fn validate_currency(currency: &CurrencyCode) -> Result<()> {
    let code = currency.as_str();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::Validation(format!("invalid currency code '{code}'")));
    }
    Ok(())
}
