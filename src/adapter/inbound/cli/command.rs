//! Command-line interface definitions.
//!
//! Defines the CLI structure for the poolmarket operator tool using `clap`.
//! Every command opens the configured database, runs one use case and
//! prints the result as text or JSON.

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::domain::{BetStatus, MarketStatus};

/// Bet execution and risk engine for pool-priced prediction markets
#[derive(Parser, Debug)]
#[command(name = "poolmarket")]
#[command(version)]
pub struct Cli {
    /// Configuration file [default: ~/.poolmarket/config.toml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path, overriding the configuration
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands for the poolmarket CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or upgrade the database schema
    Migrate,

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Manage markets
    #[command(subcommand)]
    Market(MarketCommand),

    /// Manage user eligibility profiles
    #[command(subcommand)]
    User(UserCommand),

    /// Move funds and inspect wallets
    #[command(subcommand)]
    Wallet(WalletCommand),

    /// Place, cancel and inspect bets
    #[command(subcommand)]
    Bet(BetCommand),

    /// Show wallets and live-valued positions of a user
    Portfolio(UserArg),

    /// Process pending settlements and refunds
    Settle(SettleArgs),
}

/// Subcommands for `poolmarket config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied.
    Show,
    /// Validate the configuration for correctness.
    Validate,
}

/// Subcommands for `poolmarket market`.
#[derive(Subcommand, Debug)]
pub enum MarketCommand {
    /// Import a market definition from a JSON file.
    Import(MarketImportArgs),
    /// List markets.
    List(MarketListArgs),
    /// Show one market with its outcomes.
    Show(MarketArg),
    /// Show the live price of every outcome.
    Prices(MarketArg),
    /// Run quorum, imbalance and void-risk checks.
    Check(MarketArg),
    /// Declare the winning outcome and queue settlement.
    Resolve(MarketResolveArgs),
    /// Void the market and queue refunds.
    Void(MarketVoidArgs),
    /// Close open markets whose betting window has passed.
    CloseExpired,
}

/// Subcommands for `poolmarket user`.
#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create or replace a user profile.
    Upsert(UserUpsertArgs),
    /// Show a user profile.
    Show(UserArg),
}

/// Subcommands for `poolmarket wallet`.
#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    /// Credit funds, opening the wallet on first use.
    Deposit(WalletMoveArgs),
    /// Debit available funds.
    Withdraw(WalletMoveArgs),
    /// Show a user's wallets.
    Show(UserArg),
    /// Show recent ledger transactions of a wallet.
    History(WalletHistoryArgs),
    /// Freeze a wallet against outgoing movements.
    Freeze(WalletArgs),
    /// Lift a freeze.
    Unfreeze(WalletArgs),
}

/// Subcommands for `poolmarket bet`.
#[derive(Subcommand, Debug)]
pub enum BetCommand {
    /// Place a bet on an outcome.
    Place(BetPlaceArgs),
    /// Cancel an active bet within the cancellation window.
    Cancel(BetRefArgs),
    /// Show one bet.
    Show(BetRefArgs),
    /// List a user's bets, newest first.
    List(BetListArgs),
    /// Price a prospective bet without placing it.
    Quote(BetQuoteArgs),
    /// Show lifetime betting statistics of a user.
    Stats(UserArg),
}

/// A single user id.
#[derive(Args, Debug)]
pub struct UserArg {
    /// User id
    pub user: String,
}

/// A single market id.
#[derive(Args, Debug)]
pub struct MarketArg {
    /// Market id
    pub market: String,
}

/// Arguments for `market import`.
#[derive(Args, Debug)]
pub struct MarketImportArgs {
    /// JSON file holding the market definition
    pub file: PathBuf,
}

/// Arguments for `market list`.
#[derive(Args, Debug)]
pub struct MarketListArgs {
    /// Only markets in this status
    #[arg(long)]
    pub status: Option<MarketStatus>,
}

/// Arguments for `market resolve`.
#[derive(Args, Debug)]
pub struct MarketResolveArgs {
    /// Market id
    pub market: String,

    /// Winning outcome key
    #[arg(long)]
    pub winner: String,

    /// Where the result comes from
    #[arg(long)]
    pub source: String,
}

/// Arguments for `market void`.
#[derive(Args, Debug)]
pub struct MarketVoidArgs {
    /// Market id
    pub market: String,

    /// Why the market is voided
    #[arg(long)]
    pub reason: String,
}

/// Arguments for `user upsert`.
#[derive(Args, Debug)]
pub struct UserUpsertArgs {
    /// User id
    pub user: String,

    /// Mark the account inactive
    #[arg(long)]
    pub inactive: bool,

    /// Mark the email address unverified
    #[arg(long)]
    pub unverified_email: bool,

    /// KYC status [none, pending, verified, rejected]
    #[arg(long, default_value = "verified")]
    pub kyc: String,

    /// Lock the account for this many minutes
    #[arg(long)]
    pub lock_minutes: Option<u32>,
}

/// A user's wallet in one currency.
#[derive(Args, Debug)]
pub struct WalletArgs {
    /// User id
    pub user: String,

    /// Wallet currency
    #[arg(long, default_value = "USD")]
    pub currency: String,
}

/// Arguments for `wallet deposit` and `wallet withdraw`.
#[derive(Args, Debug)]
pub struct WalletMoveArgs {
    /// User id
    pub user: String,

    /// Amount to move
    pub amount: Decimal,

    /// Wallet currency
    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Ledger description
    #[arg(long)]
    pub description: Option<String>,
}

/// Arguments for `wallet history`.
#[derive(Args, Debug)]
pub struct WalletHistoryArgs {
    /// User id
    pub user: String,

    /// Wallet currency
    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Maximum number of transactions
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

/// Arguments for `bet place`.
#[derive(Args, Debug)]
pub struct BetPlaceArgs {
    /// User id
    pub user: String,

    /// Market id
    pub market: String,

    /// Outcome key
    pub outcome: String,

    /// Stake
    pub amount: Decimal,

    /// Price the bet was decided on, in percent
    #[arg(long)]
    pub expected_price: Option<Decimal>,

    /// Tolerated slippage in percent
    #[arg(long, requires = "expected_price")]
    pub max_slippage: Option<Decimal>,
}

/// A bet owned by a user.
#[derive(Args, Debug)]
pub struct BetRefArgs {
    /// User id
    pub user: String,

    /// Bet id
    pub bet: String,
}

/// Arguments for `bet list`.
#[derive(Args, Debug)]
pub struct BetListArgs {
    /// User id
    pub user: String,

    /// Only bets in this status
    #[arg(long)]
    pub status: Option<BetStatus>,

    /// Only bets on this market
    #[arg(long)]
    pub market: Option<String>,

    /// Page size
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Bets to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

/// Arguments for `bet quote`.
#[derive(Args, Debug)]
pub struct BetQuoteArgs {
    /// Market id
    pub market: String,

    /// Outcome key
    pub outcome: String,

    /// Prospective stake
    pub amount: Decimal,
}

/// Arguments for `settle`.
#[derive(Args, Debug)]
pub struct SettleArgs {
    /// Maximum outbox entries to process [default: settlement.batch_size]
    #[arg(long)]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bet_place_with_slippage_guard() {
        let cli = Cli::try_parse_from([
            "poolmarket",
            "bet",
            "place",
            "alice",
            "m1",
            "yes",
            "25.50",
            "--expected-price",
            "60",
            "--max-slippage",
            "2",
        ])
        .unwrap();

        let Commands::Bet(BetCommand::Place(args)) = cli.command else {
            panic!("expected bet place");
        };
        assert_eq!(args.amount, Decimal::new(2550, 2));
        assert_eq!(args.expected_price, Some(Decimal::from(60)));
        assert_eq!(args.max_slippage, Some(Decimal::from(2)));
    }

    #[test]
    fn slippage_requires_expected_price() {
        let result = Cli::try_parse_from([
            "poolmarket",
            "bet",
            "place",
            "alice",
            "m1",
            "yes",
            "10",
            "--max-slippage",
            "2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_status_filters() {
        let cli = Cli::try_parse_from(["poolmarket", "market", "list", "--status", "open"]).unwrap();
        let Commands::Market(MarketCommand::List(args)) = cli.command else {
            panic!("expected market list");
        };
        assert_eq!(args.status, Some(MarketStatus::Open));

        let cli = Cli::try_parse_from(["poolmarket", "bet", "list", "bob", "--status", "refunded"])
            .unwrap();
        let Commands::Bet(BetCommand::List(args)) = cli.command else {
            panic!("expected bet list");
        };
        assert_eq!(args.status, Some(BetStatus::Refunded));
        assert_eq!(args.limit, 20);
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["poolmarket", "settle", "--json", "--db", "x.db"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.db.as_deref(), Some("x.db"));
    }
}
