//! Deployment-wide betting limits.

use rust_decimal::Decimal;

use crate::domain::{Amount, Market};

/// Limits every bet is checked against, on top of the market's own bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    /// Global floor for a single bet.
    pub min_bet_amount: Amount,
    /// Global ceiling for a single bet.
    pub max_bet_amount: Amount,
    /// Cap on a user's active stake in one market.
    pub max_position_per_market: Amount,
    /// Cap on a user's active stake across all markets.
    pub max_position_per_user: Amount,
    /// Bets allowed in any trailing 60 seconds.
    pub max_bets_per_minute: u32,
    /// Minimum gap between two bets of one user. Zero disables the check.
    pub cooldown_secs: u64,
    /// Cap on the summed amount a user bets per UTC calendar day.
    pub daily_limit: Amount,
    /// Position caps are only checked when set.
    pub enforce_position_limits: bool,
    /// Require verified identity before betting.
    pub require_kyc: bool,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            min_bet_amount: Decimal::ONE,
            max_bet_amount: Decimal::from(10_000),
            max_position_per_market: Decimal::from(50_000),
            max_position_per_user: Decimal::from(100_000),
            max_bets_per_minute: 10,
            cooldown_secs: 0,
            daily_limit: Decimal::from(50_000),
            enforce_position_limits: true,
            require_kyc: false,
        }
    }
}

impl RiskLimits {
    /// Smallest bet allowed in `market`.
    #[must_use]
    pub fn effective_min(&self, market: &Market) -> Amount {
        market.min_bet_amount.max(self.min_bet_amount)
    }

    /// Largest bet allowed in `market`.
    #[must_use]
    pub fn effective_max(&self, market: &Market) -> Amount {
        market.max_bet_amount.min(self.max_bet_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::open_market;
    use rust_decimal_macros::dec;

    #[test]
    fn tighter_bound_wins() {
        let mut market = open_market();
        market.min_bet_amount = dec!(5);
        market.max_bet_amount = dec!(20000);
        let limits = RiskLimits::default();

        assert_eq!(limits.effective_min(&market), dec!(5));
        assert_eq!(limits.effective_max(&market), dec!(10000));
    }
}
