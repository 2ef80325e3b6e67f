//! Monetary types for amount and price representation.
//!
//! A winning contract pays [`CONTRACT_FACE_VALUE`], one currency unit.
//! Prices are quoted in percent of that face value, so a price of 45 means a
//! contract costs 0.45.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Amount of currency, represented as a Decimal for precision.
pub type Amount = Decimal;

/// Price per contract in percent, always within `[PRICE_FLOOR, PRICE_CEILING]`.
pub type Price = Decimal;

/// Lowest price any outcome can be quoted at.
pub const PRICE_FLOOR: Decimal = Decimal::ONE;

/// Highest price any outcome can be quoted at.
pub const PRICE_CEILING: Decimal = Decimal::from_parts(99, 0, 0, false, 0);

/// What a winning contract pays at a price of 100%, in currency units.
pub const CONTRACT_FACE_VALUE: Decimal = Decimal::ONE;

/// Decimal places kept on prices.
pub const PRICE_SCALE: u32 = 4;

/// Decimal places kept on contract quantities.
pub const CONTRACT_SCALE: u32 = 8;

/// Decimal places kept on money amounts produced by arithmetic.
pub const MONEY_SCALE: u32 = 8;

/// Round a computed price to [`PRICE_SCALE`] places.
#[must_use]
pub fn round_price(price: Decimal) -> Price {
    price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Round a contract quantity down to [`CONTRACT_SCALE`] places.
///
/// Rounding toward zero never hands out more contracts than were paid for.
#[must_use]
pub fn round_contracts(contracts: Decimal) -> Decimal {
    contracts.round_dp_with_strategy(CONTRACT_SCALE, RoundingStrategy::ToZero)
}

/// Round a money amount down to [`MONEY_SCALE`] places.
#[must_use]
pub fn round_money(amount: Decimal) -> Amount {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero)
}

/// ISO-style currency code scoping a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a currency code, normalised to upper case.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
