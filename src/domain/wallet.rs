//! Currency-scoped wallets and their append-only ledger.
//!
//! A [`Wallet`] only changes through its operations, and every operation that
//! touches a balance returns exactly one [`LedgerTransaction`] describing the
//! change. Callers persist the wallet and the transaction together.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{BetId, TransactionId, UserId, WalletId};
use super::money::{Amount, CurrencyCode};

/// Why a ledger transaction was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    BetPlaced,
    BetRefund,
    Payout,
    FundsLocked,
    FundsUnlocked,
}

impl TransactionKind {
    /// Stable snake_case name used in storage and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::BetPlaced => "bet_placed",
            Self::BetRefund => "bet_refund",
            Self::Payout => "payout",
            Self::FundsLocked => "funds_locked",
            Self::FundsUnlocked => "funds_unlocked",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "bet_placed" => Ok(Self::BetPlaced),
            "bet_refund" => Ok(Self::BetRefund),
            "payout" => Ok(Self::Payout),
            "funds_locked" => Ok(Self::FundsLocked),
            "funds_unlocked" => Ok(Self::FundsUnlocked),
            other => Err(format!("unknown transaction kind '{other}'")),
        }
    }
}

/// Immutable audit record of one wallet operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    pub kind: TransactionKind,
    /// Signed balance delta; zero for funds lock/unlock.
    pub amount: Amount,
    pub balance_before: Amount,
    pub balance_after: Amount,
    /// Bet this transaction belongs to, attached once the bet exists.
    pub reference: Option<BetId>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Balance of one user in one currency.
///
/// Invariant: `balance >= locked_balance >= 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    id: WalletId,
    user_id: UserId,
    currency: CurrencyCode,
    balance: Amount,
    locked_balance: Amount,
    is_locked: bool,
}

impl Wallet {
    /// Create an empty wallet.
    #[must_use]
    pub fn new(user_id: UserId, currency: CurrencyCode) -> Self {
        Self {
            id: WalletId::new(),
            user_id,
            currency,
            balance: Decimal::ZERO,
            locked_balance: Decimal::ZERO,
            is_locked: false,
        }
    }

    /// Rebuild a wallet from persisted state.
    #[must_use]
    pub fn restore(
        id: WalletId,
        user_id: UserId,
        currency: CurrencyCode,
        balance: Amount,
        locked_balance: Amount,
        is_locked: bool,
    ) -> Self {
        Self {
            id,
            user_id,
            currency,
            balance,
            locked_balance,
            is_locked,
        }
    }

    #[must_use]
    pub fn id(&self) -> &WalletId {
        &self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    #[must_use]
    pub fn balance(&self) -> Amount {
        self.balance
    }

    #[must_use]
    pub fn locked_balance(&self) -> Amount {
        self.locked_balance
    }

    /// Balance not reserved by a funds lock.
    #[must_use]
    pub fn available_balance(&self) -> Amount {
        self.balance - self.locked_balance
    }

    /// Whether the account is frozen.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    /// Add funds.
    pub fn credit(
        &mut self,
        amount: Amount,
        kind: TransactionKind,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<LedgerTransaction, DomainError> {
        ensure_positive(amount)?;
        let before = self.balance;
        self.balance += amount;
        Ok(self.record(kind, amount, before, description, now))
    }

    /// Remove funds; only the available balance can be spent.
    pub fn debit(
        &mut self,
        amount: Amount,
        kind: TransactionKind,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<LedgerTransaction, DomainError> {
        ensure_positive(amount)?;
        self.ensure_unfrozen()?;
        self.ensure_available(amount)?;
        let before = self.balance;
        self.balance -= amount;
        Ok(self.record(kind, -amount, before, description, now))
    }

    /// Reserve part of the available balance without moving it.
    pub fn lock_funds(
        &mut self,
        amount: Amount,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<LedgerTransaction, DomainError> {
        ensure_positive(amount)?;
        self.ensure_unfrozen()?;
        self.ensure_available(amount)?;
        self.locked_balance += amount;
        Ok(self.record(
            TransactionKind::FundsLocked,
            Decimal::ZERO,
            self.balance,
            description,
            now,
        ))
    }

    /// Release a previous reservation.
    pub fn unlock_funds(
        &mut self,
        amount: Amount,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<LedgerTransaction, DomainError> {
        ensure_positive(amount)?;
        if amount > self.locked_balance {
            return Err(DomainError::UnlockExceedsLocked {
                locked: self.locked_balance,
                requested: amount,
            });
        }
        self.locked_balance -= amount;
        Ok(self.record(
            TransactionKind::FundsUnlocked,
            Decimal::ZERO,
            self.balance,
            description,
            now,
        ))
    }

    /// Freeze the account. Credits still land; debits and locks are refused.
    pub fn lock(&mut self) {
        self.is_locked = true;
    }

    /// Lift a freeze.
    pub fn unlock(&mut self) {
        self.is_locked = false;
    }

    fn ensure_unfrozen(&self) -> Result<(), DomainError> {
        if self.is_locked {
            return Err(DomainError::WalletFrozen {
                wallet_id: self.id.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_available(&self, amount: Amount) -> Result<(), DomainError> {
        let available = self.available_balance();
        if amount > available {
            return Err(DomainError::InsufficientFunds {
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    fn record(
        &self,
        kind: TransactionKind,
        amount: Amount,
        balance_before: Amount,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> LedgerTransaction {
        LedgerTransaction {
            id: TransactionId::new(),
            wallet_id: self.id.clone(),
            kind,
            amount,
            balance_before,
            balance_after: self.balance,
            reference: None,
            description: description.into(),
            created_at: now,
        }
    }
}

fn ensure_positive(amount: Amount) -> Result<(), DomainError> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::NonPositiveAmount { amount });
    }
    Ok(())
}
