//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file in which every section is optional.
//! The `POOLMARKET_DATABASE` environment variable overrides the database path.
//!
//! # Example
//!
//! ```no_run
//! use poolmarket::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.logging.init();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::betting::{BettingConfig, SettlementConfig};
use super::logging::LoggingConfig;
use super::risk::RiskConfig;
use super::safeguard::SafeguardsConfig;
use crate::domain::money::{PRICE_CEILING, PRICE_FLOOR};
use crate::error::{ConfigError, Result};

/// Environment variable that overrides [`Config::database`].
pub const DATABASE_ENV: &str = "POOLMARKET_DATABASE";

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Path to SQLite database file.
    ///
    /// Defaults to "poolmarket.db" in the current directory.
    #[serde(default = "default_database_path")]
    pub database: String,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-user betting limits.
    #[serde(default)]
    pub risk: RiskConfig,

    /// Bet placement and cancellation tunables.
    #[serde(default)]
    pub betting: BettingConfig,

    /// Outbox worker tunables.
    #[serde(default)]
    pub settlement: SettlementConfig,

    /// Deployment-wide safeguard policy.
    #[serde(default)]
    pub safeguards: SafeguardsConfig,
}

fn default_database_path() -> String {
    "poolmarket.db".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            logging: LoggingConfig::default(),
            risk: RiskConfig::default(),
            betting: BettingConfig::default(),
            settlement: SettlementConfig::default(),
            safeguards: SafeguardsConfig::default(),
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let Ok(database) = std::env::var(DATABASE_ENV) {
            if !database.trim().is_empty() {
                config.database = database;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load `path` when it exists, otherwise start from defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file fails to load.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load(path);
        }
        Self::parse_toml("")
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }
        if !LoggingConfig::FORMATS.contains(&self.logging.format.as_str()) {
            return Err(invalid("logging.format", "must be 'pretty' or 'json'"));
        }

        let risk = &self.risk;
        if risk.min_bet_amount <= Decimal::ZERO {
            return Err(invalid("risk.min_bet_amount", "must be greater than 0"));
        }
        if risk.max_bet_amount < risk.min_bet_amount {
            return Err(invalid("risk.max_bet_amount", "must be >= min_bet_amount"));
        }
        if risk.max_position_per_market <= Decimal::ZERO {
            return Err(invalid(
                "risk.max_position_per_market",
                "must be greater than 0",
            ));
        }
        if risk.max_position_per_user < risk.max_position_per_market {
            return Err(invalid(
                "risk.max_position_per_user",
                "must be >= max_position_per_market",
            ));
        }
        if risk.max_bets_per_minute == 0 {
            return Err(invalid("risk.max_bets_per_minute", "must be greater than 0"));
        }
        if risk.daily_limit <= Decimal::ZERO {
            return Err(invalid("risk.daily_limit", "must be greater than 0"));
        }

        let slippage = self.betting.default_max_slippage;
        if slippage < Decimal::ZERO || slippage > Decimal::ONE_HUNDRED {
            return Err(invalid(
                "betting.default_max_slippage",
                "must be a percentage between 0 and 100",
            ));
        }

        if self.settlement.batch_size == 0 {
            return Err(invalid("settlement.batch_size", "must be greater than 0"));
        }
        if self.settlement.max_attempts == 0 {
            return Err(invalid("settlement.max_attempts", "must be greater than 0"));
        }

        let guards = &self.safeguards;
        let share = Decimal::ZERO..=Decimal::ONE;
        if !share.contains(&guards.severe_imbalance_threshold)
            || guards.severe_imbalance_threshold.is_zero()
        {
            return Err(invalid(
                "safeguards.severe_imbalance_threshold",
                "must be within (0, 1]",
            ));
        }
        if !share.contains(&guards.extreme_imbalance_threshold)
            || guards.extreme_imbalance_threshold < guards.severe_imbalance_threshold
        {
            return Err(invalid(
                "safeguards.extreme_imbalance_threshold",
                "must be within [severe_imbalance_threshold, 1]",
            ));
        }
        if !(PRICE_FLOOR..=PRICE_CEILING).contains(&guards.cheap_outcome_price) {
            return Err(invalid(
                "safeguards.cheap_outcome_price",
                "must lie within 1-99",
            ));
        }
        if guards
            .manipulation_threshold
            .map_or(false, |t| t <= Decimal::ZERO)
        {
            return Err(invalid(
                "safeguards.manipulation_threshold",
                "must be greater than 0",
            ));
        }
        if guards.pool_drift_epsilon < Decimal::ZERO {
            return Err(invalid("safeguards.pool_drift_epsilon", "must be 0 or greater"));
        }
        if guards.liquidity_reference <= Decimal::ZERO {
            return Err(invalid(
                "safeguards.liquidity_reference",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn field_of(err: crate::error::Error) -> &'static str {
        match err {
            crate::error::Error::Config(ConfigError::InvalidValue { field, .. }) => field,
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.risk.max_bets_per_minute, 10);
        assert_eq!(config.betting.cancellation_window_secs, 300);
        assert_eq!(config.settlement.max_attempts, 5);
    }

    #[test]
    fn sections_override_defaults() {
        let mut config: Config = toml::from_str(
            r#"
            database = "bets.db"

            [risk]
            min_bet_amount = 5
            cooldown_secs = 30

            [safeguards]
            manipulation_threshold = "2500"
            void_window_hours = 6
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.database, "bets.db");
        assert_eq!(config.risk.min_bet_amount, dec!(5));
        assert_eq!(config.risk.cooldown_secs, 30);
        assert_eq!(config.risk.max_bet_amount, dec!(10000));
        assert_eq!(
            config.safeguards.policy().manipulation_threshold,
            Some(dec!(2500))
        );
        assert_eq!(
            config.safeguards.policy().void_window,
            chrono::Duration::hours(6)
        );
        config.logging.format = "xml".into();
        assert_eq!(field_of(config.validate().unwrap_err()), "logging.format");
    }

    #[test]
    fn inverted_bet_bounds_are_rejected() {
        let mut config = Config::default();
        config.risk.max_bet_amount = dec!(0.5);
        assert_eq!(field_of(config.validate().unwrap_err()), "risk.max_bet_amount");
    }

    #[test]
    fn extreme_threshold_cannot_undercut_severe() {
        let mut config = Config::default();
        config.safeguards.extreme_imbalance_threshold = dec!(0.8);
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "safeguards.extreme_imbalance_threshold"
        );
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::parse_toml("[risk\nmin_bet_amount = 1").unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Config(ConfigError::Parse(_))
        ));
    }
}
