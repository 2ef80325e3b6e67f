//! Operator command-line interface.
//!
//! [`run`] loads configuration, starts logging, opens the database and
//! dispatches to one handler per command group. Handlers talk to the engine
//! only through the inbound ports.

pub mod bet;
pub mod command;
pub mod config;
pub mod diagnostic;
pub mod market;
pub mod output;
pub mod paths;
pub mod settle;
pub mod user;
pub mod wallet;

use std::io::IsTerminal;
use std::path::PathBuf;

use tracing::debug;

use crate::adapter::outbound::sqlite::SqliteStore;
use crate::error::Result;
use crate::infrastructure::bootstrap::open_engine;
use crate::infrastructure::config::Config;
use command::{Cli, ColorChoice, Commands};

/// Configuration file the command line points at.
#[must_use]
pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(paths::default_config)
}

/// Whether output should be colored.
#[must_use]
pub fn color_enabled(choice: &ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => {
            std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
        }
    }
}

/// Load the configuration the command line selects.
///
/// An explicit `--config` must exist; the default location falls back to
/// built-in defaults. `--db` wins over both.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let path = config_path(cli);
    let mut config = if cli.config.is_some() {
        Config::load(&path)?
    } else {
        Config::load_or_default(&path)?
    };
    if let Some(db) = &cli.db {
        config.database = db.clone();
    }
    if cli.verbose > 0 {
        config.logging.level = match cli.verbose {
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
        .to_string();
    }
    config.validate()?;
    Ok(config)
}

/// Run one parsed command line.
///
/// # Errors
///
/// Returns the first error the selected command hits.
pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    config.logging.init();
    debug!(database = %config.database, "Configuration loaded");

    let path = config_path(&cli);
    let command = match cli.command {
        Commands::Config(command) => return config::execute(&config, &path, command),
        Commands::Migrate => return migrate(&config),
        command => command,
    };

    paths::ensure_parent_dir(&config.database)?;
    let engine = open_engine(&config)?;
    match command {
        Commands::Market(command) => market::execute(&engine.markets, command),
        Commands::User(command) => user::execute(&engine.wallets, command),
        Commands::Wallet(command) => wallet::execute(&engine.wallets, command),
        Commands::Bet(command) => bet::execute(&engine.betting, command),
        Commands::Portfolio(args) => bet::portfolio(&engine.betting, &args.user),
        Commands::Settle(args) => settle::execute(
            &engine.settlement,
            args.limit.unwrap_or(engine.settlement_batch),
        ),
        Commands::Config(_) | Commands::Migrate => Ok(()),
    }
}

fn migrate(config: &Config) -> Result<()> {
    paths::ensure_parent_dir(&config.database)?;
    SqliteStore::open(&config.database)?;
    if output::is_json() {
        return output::json_result(
            "migrate",
            &serde_json::json!({ "database": config.database }),
        );
    }
    output::success("Database is up to date");
    output::field("Database", &config.database);
    Ok(())
}
