//! Handlers for the `wallet` command group.

use rust_decimal::Decimal;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::{WalletCommand, WalletMoveArgs};
use crate::adapter::inbound::cli::output;
use crate::domain::{CurrencyCode, LedgerTransaction, TransactionKind, UserId, Wallet};
use crate::error::Result;
use crate::port::inbound::wallet::WalletService;

#[derive(Tabled)]
struct WalletRow {
    #[tabled(rename = "Currency")]
    currency: String,
    #[tabled(rename = "Balance")]
    balance: Decimal,
    #[tabled(rename = "Locked")]
    locked: Decimal,
    #[tabled(rename = "Available")]
    available: Decimal,
    #[tabled(rename = "Frozen")]
    frozen: bool,
}

impl From<&Wallet> for WalletRow {
    fn from(wallet: &Wallet) -> Self {
        Self {
            currency: wallet.currency().to_string(),
            balance: wallet.balance(),
            locked: wallet.locked_balance(),
            available: wallet.available_balance(),
            frozen: wallet.is_locked(),
        }
    }
}

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Kind")]
    kind: TransactionKind,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Balance")]
    balance: Decimal,
    #[tabled(rename = "Bet")]
    reference: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&LedgerTransaction> for TransactionRow {
    fn from(tx: &LedgerTransaction) -> Self {
        Self {
            time: tx.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: tx.kind,
            amount: output::signed(tx.amount),
            balance: tx.balance_after,
            reference: tx
                .reference
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            description: tx.description.clone(),
        }
    }
}

/// Execute a `wallet` subcommand.
pub fn execute(wallets: &dyn WalletService, command: WalletCommand) -> Result<()> {
    match command {
        WalletCommand::Deposit(args) => {
            let tx = move_funds(wallets, &args, true)?;
            report_transaction("wallet.deposit", "Deposited", &tx)
        }
        WalletCommand::Withdraw(args) => {
            let tx = move_funds(wallets, &args, false)?;
            report_transaction("wallet.withdraw", "Withdrew", &tx)
        }
        WalletCommand::Show(args) => {
            let wallets = wallets.wallets(&UserId::new(args.user))?;
            if output::is_json() {
                return output::json_result("wallet.show", &wallets);
            }
            output::table(wallets.iter().map(WalletRow::from).collect(), "No wallets");
            Ok(())
        }
        WalletCommand::History(args) => {
            let transactions = wallets.transactions(
                &UserId::new(args.user),
                &CurrencyCode::new(&args.currency),
                args.limit,
            )?;
            if output::is_json() {
                return output::json_result("wallet.history", &transactions);
            }
            output::table(
                transactions.iter().map(TransactionRow::from).collect(),
                "No transactions",
            );
            Ok(())
        }
        WalletCommand::Freeze(args) => {
            let wallet =
                wallets.freeze(&UserId::new(args.user), &CurrencyCode::new(&args.currency))?;
            if output::is_json() {
                return output::json_result("wallet.freeze", &wallet);
            }
            output::success(&format!(
                "Froze {} wallet of {}",
                wallet.currency(),
                wallet.user_id()
            ));
            Ok(())
        }
        WalletCommand::Unfreeze(args) => {
            let wallet =
                wallets.unfreeze(&UserId::new(args.user), &CurrencyCode::new(&args.currency))?;
            if output::is_json() {
                return output::json_result("wallet.unfreeze", &wallet);
            }
            output::success(&format!(
                "Unfroze {} wallet of {}",
                wallet.currency(),
                wallet.user_id()
            ));
            Ok(())
        }
    }
}

fn move_funds(
    wallets: &dyn WalletService,
    args: &WalletMoveArgs,
    deposit: bool,
) -> Result<LedgerTransaction> {
    let user = UserId::new(args.user.as_str());
    let currency = CurrencyCode::new(&args.currency);
    if deposit {
        let description = args.description.as_deref().unwrap_or("Deposit");
        wallets.deposit(&user, &currency, args.amount, description)
    } else {
        let description = args.description.as_deref().unwrap_or("Withdrawal");
        wallets.withdraw(&user, &currency, args.amount, description)
    }
}

fn report_transaction(command: &str, verb: &str, tx: &LedgerTransaction) -> Result<()> {
    if output::is_json() {
        return output::json_result(command, tx);
    }
    output::success(&format!("{verb} {}", tx.amount.abs()));
    output::field("Balance", tx.balance_after);
    output::field("Transaction", &tx.id);
    Ok(())
}
