//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated,
//! most of them raised by wallet ledger operations.
//!
//! # Examples
//!
//! ```
//! use poolmarket::domain::error::DomainError;
//! use poolmarket::domain::id::UserId;
//! use poolmarket::domain::money::CurrencyCode;
//! use poolmarket::domain::wallet::{TransactionKind, Wallet};
//! use rust_decimal_macros::dec;
//!
//! let mut wallet = Wallet::new(UserId::new("alice"), CurrencyCode::new("USD"));
//! let result = wallet.debit(
//!     dec!(10),
//!     TransactionKind::Withdrawal,
//!     "withdrawal",
//!     chrono::Utc::now(),
//! );
//!
//! assert!(matches!(result, Err(DomainError::InsufficientFunds { .. })));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Ledger amounts must be strictly positive.
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The invalid amount that was provided.
        amount: Decimal,
    },

    /// A debit or funds lock asked for more than the available balance.
    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Balance minus locked balance.
        available: Decimal,
        /// The amount that was asked for.
        requested: Decimal,
    },

    /// Unlocking more than is currently locked.
    #[error("cannot unlock {requested}, only {locked} is locked")]
    UnlockExceedsLocked {
        /// Currently locked balance.
        locked: Decimal,
        /// The amount that was asked for.
        requested: Decimal,
    },

    /// The wallet is frozen and refuses outgoing movements.
    #[error("wallet {wallet_id} is frozen")]
    WalletFrozen {
        /// The frozen wallet.
        wallet_id: String,
    },

    /// Markets must have at least one outcome.
    #[error("outcomes cannot be empty")]
    EmptyOutcomes,

    /// The referenced outcome is not part of the market.
    #[error("unknown outcome '{key}'")]
    UnknownOutcome {
        /// The outcome key that was not found.
        key: String,
    },

    /// Removing stake would drive a pool below zero.
    #[error("pool for outcome '{key}' would become negative")]
    NegativePool {
        /// The outcome whose pool underflowed.
        key: String,
    },
}

impl DomainError {
    /// Stable category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NonPositiveAmount { .. } | Self::EmptyOutcomes => ErrorKind::Validation,
            Self::InsufficientFunds { .. } | Self::UnlockExceedsLocked { .. } => {
                ErrorKind::Rejected
            }
            Self::WalletFrozen { .. } | Self::NegativePool { .. } => ErrorKind::Conflict,
            Self::UnknownOutcome { .. } => ErrorKind::NotFound,
        }
    }
}
