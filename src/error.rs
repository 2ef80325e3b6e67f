use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Named bet rejections.
///
/// Each variant is a stable, user-renderable reason a bet was refused.
/// None of them leave side effects behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("market {market_id} is not open for betting: {reason}")]
    MarketNotOpenForBetting { market_id: String, reason: String },

    #[error("user {user_id} is not allowed to bet: {reason}")]
    Unauthorized { user_id: String, reason: String },

    #[error("bet amount {amount} is below the minimum of {min}")]
    BetTooSmall { amount: Decimal, min: Decimal },

    #[error("bet amount {amount} exceeds the maximum of {max}")]
    BetTooLarge { amount: Decimal, max: Decimal },

    #[error("daily betting limit exceeded: {spent} + {amount} > {limit}")]
    DailyLimitExceeded {
        spent: Decimal,
        amount: Decimal,
        limit: Decimal,
    },

    #[error("position limit exceeded ({scope}): {current} + {amount} > {limit}")]
    PositionLimitExceeded {
        scope: PositionScope,
        current: Decimal,
        amount: Decimal,
        limit: Decimal,
    },

    #[error("rate limit exceeded: {count} bets in the last minute (limit {limit})")]
    RateLimitExceeded { count: u32, limit: u32 },

    #[error("bet cooldown active for another {remaining_secs}s")]
    BetCooldownActive { remaining_secs: i64 },

    #[error("slippage too high: {actual}% > {max}%")]
    SlippageExceeded { actual: Decimal, max: Decimal },

    #[error("insufficient wallet balance: available {available}, required {required}")]
    InsufficientWalletBalance {
        available: Decimal,
        required: Decimal,
    },
}

/// Which position cap a bet ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionScope {
    Market,
    User,
}

impl std::fmt::Display for PositionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Market => f.write_str("per market"),
            Self::User => f.write_str("per user"),
        }
    }
}

/// Coarse error category callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// A named domain rejection.
    Rejected,
    /// A referenced entity does not exist.
    NotFound,
    /// The acting user does not own the entity.
    Forbidden,
    /// The entity is in a state that forbids the operation.
    Conflict,
    /// Store, connection or I/O failure.
    Infrastructure,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Config(_) => ErrorKind::Validation,
            Self::Risk(_) => ErrorKind::Rejected,
            Self::Domain(e) => e.kind(),
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InvalidState(_) => ErrorKind::Conflict,
            Self::Json(_)
            | Self::Io(_)
            | Self::Connection(_)
            | Self::Database(_)
            | Self::Parse(_) => ErrorKind::Infrastructure,
        }
    }

    /// Return the risk rejection if this error is one.
    #[must_use]
    pub const fn as_risk(&self) -> Option<&RiskError> {
        match self {
            Self::Risk(e) => Some(e),
            _ => None,
        }
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl From<diesel::r2d2::PoolError> for Error {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        Error::Connection(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn risk_errors_are_rejections() {
        let err: Error = RiskError::BetTooSmall {
            amount: dec!(0.5),
            min: dec!(1),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert!(err.as_risk().is_some());
    }

    #[test]
    fn ledger_shortfall_is_rejection() {
        let err: Error = DomainError::InsufficientFunds {
            available: dec!(1),
            requested: dec!(2),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Rejected);
    }

    #[test]
    fn store_errors_are_infrastructure() {
        let err: Error = diesel::result::Error::NotFound.into();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert_eq!(Error::not_found("bet", "b-1").kind(), ErrorKind::NotFound);
    }

    #[test]
    fn position_scope_display() {
        let err = RiskError::PositionLimitExceeded {
            scope: PositionScope::Market,
            current: dec!(900),
            amount: dec!(200),
            limit: dec!(1000),
        };
        assert_eq!(
            err.to_string(),
            "position limit exceeded (per market): 900 + 200 > 1000"
        );
    }
}
