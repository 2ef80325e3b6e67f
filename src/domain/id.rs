//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares a string-backed identifier assigned by an external system.
macro_rules! external_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        ///
        /// The inner String is private to ensure all construction goes through
        /// the defined constructors.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Create a new `", stringify!($name), "` from a string.")]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice.")]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

/// Declares an identifier generated locally as a UUID v4.
macro_rules! generated_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        ///
        /// Generated as UUID v4 for new records, or constructed from an
        /// existing string for persistence.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Create a new `", stringify!($name), "` with a generated UUID.")]
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice.")]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

external_id!(
    /// Market identifier - newtype for type safety.
    MarketId
);

external_id!(
    /// Outcome key, unique within its market (e.g. `"yes"`, `"no"`).
    OutcomeKey
);

external_id!(
    /// User identifier issued by the user directory.
    UserId
);

generated_id!(
    /// Unique identifier for a bet.
    BetId
);

generated_id!(
    /// Unique identifier for a wallet.
    WalletId
);

generated_id!(
    /// Unique identifier for a ledger transaction.
    TransactionId
);

generated_id!(
    /// Unique identifier for an outbox entry.
    OutboxId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_id_new_and_as_str() {
        let id = MarketId::new("test-market");
        assert_eq!(id.as_str(), "test-market");
    }

    #[test]
    fn outcome_key_from_str() {
        let key = OutcomeKey::from("yes");
        assert_eq!(key, OutcomeKey::new("yes".to_string()));
    }

    #[test]
    fn user_id_display() {
        let id = UserId::new("display-test");
        assert_eq!(format!("{}", id), "display-test");
    }

    #[test]
    fn bet_id_generates_unique_ids() {
        let id1 = BetId::new();
        let id2 = BetId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn transaction_id_as_str_returns_uuid_format() {
        let id = TransactionId::new();
        // UUID v4 format: 8-4-4-4-12 hex chars
        assert_eq!(id.as_str().len(), 36);
        assert_eq!(id.as_str().chars().filter(|c| *c == '-').count(), 4);
    }

    #[test]
    fn wallet_id_from_string_keeps_value() {
        let id = WalletId::from("existing-id".to_string());
        assert_eq!(id.as_str(), "existing-id");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&OutboxId::from("o-1")).unwrap();
        assert_eq!(json, "\"o-1\"");
    }
}
