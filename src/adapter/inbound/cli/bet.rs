//! Handlers for the `bet` and `portfolio` commands.

use rust_decimal::Decimal;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::{BetCommand, BetListArgs, BetPlaceArgs};
use crate::adapter::inbound::cli::output;
use crate::domain::{Bet, BetFilter, BetId, BetStatus, MarketId, OutcomeKey, UserId};
use crate::error::Result;
use crate::port::inbound::betting::{BettingService, Pagination, PlaceBetRequest, Position};

#[derive(Tabled)]
struct BetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Amount")]
    amount: Decimal,
    #[tabled(rename = "Price")]
    price: Decimal,
    #[tabled(rename = "Contracts")]
    contracts: Decimal,
    #[tabled(rename = "Status")]
    status: BetStatus,
    #[tabled(rename = "Settled")]
    settled: String,
    #[tabled(rename = "Placed")]
    placed: String,
}

impl From<&Bet> for BetRow {
    fn from(bet: &Bet) -> Self {
        Self {
            id: bet.id.to_string(),
            market: bet.market_id.to_string(),
            outcome: bet.outcome_key.to_string(),
            amount: bet.amount,
            price: bet.price_per_contract,
            contracts: bet.contracts.round_dp(4),
            status: bet.status,
            settled: bet
                .settlement_amount
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string()),
            placed: bet.placed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Tabled)]
struct PositionRow {
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Bets")]
    bets: u32,
    #[tabled(rename = "Staked")]
    staked: Decimal,
    #[tabled(rename = "Avg price")]
    average_price: Decimal,
    #[tabled(rename = "Price")]
    current_price: Decimal,
    #[tabled(rename = "Value")]
    value: Decimal,
    #[tabled(rename = "P&L")]
    pnl: String,
}

impl From<&Position> for PositionRow {
    fn from(position: &Position) -> Self {
        Self {
            market: position.market_title.clone(),
            outcome: position.outcome_label.clone(),
            bets: position.bet_count,
            staked: position.amount,
            average_price: position.average_price.round_dp(2),
            current_price: position.current_price.round_dp(2),
            value: position.current_value.round_dp(2),
            pnl: output::signed(position.unrealized_pnl.round_dp(2)),
        }
    }
}

/// Execute a `bet` subcommand.
pub fn execute(betting: &dyn BettingService, command: BetCommand) -> Result<()> {
    match command {
        BetCommand::Place(args) => place(betting, args),
        BetCommand::Cancel(args) => {
            let bet = betting.cancel_bet(&UserId::new(args.user), &BetId::from(args.bet))?;
            if output::is_json() {
                return output::json_result("bet.cancel", &bet);
            }
            output::success(&format!("Cancelled bet {}", bet.id));
            output::field("Refunded", bet.amount);
            Ok(())
        }
        BetCommand::Show(args) => {
            let bet = betting.bet(&UserId::new(args.user), &BetId::from(args.bet))?;
            if output::is_json() {
                return output::json_result("bet.show", &bet);
            }
            print_bet(&bet);
            Ok(())
        }
        BetCommand::List(args) => list(betting, args),
        BetCommand::Quote(args) => {
            let quote = betting.quote(
                &MarketId::new(args.market),
                &OutcomeKey::new(args.outcome),
                args.amount,
            )?;
            if output::is_json() {
                return output::json_result("bet.quote", &quote);
            }
            output::section("Quote");
            output::field("Amount", quote.amount);
            output::field("Price", format!("{}%", quote.current_price));
            output::field("New price", format!("{}%", quote.new_price));
            output::field("Contracts", quote.contracts.round_dp(4));
            output::field("Payout", quote.potential_payout.round_dp(2));
            output::field("Profit", output::signed(quote.potential_profit.round_dp(2)));
            output::field("Impact", format!("{}%", quote.price_impact.round_dp(2)));
            if let Some(slippage) = quote.slippage {
                output::field("Slippage", format!("{}%", slippage.round_dp(2)));
            }
            if let Some(breakeven) = quote.breakeven_price {
                output::field("Breakeven", format!("{}%", breakeven.round_dp(2)));
            }
            Ok(())
        }
        BetCommand::Stats(args) => {
            let stats = betting.betting_stats(&UserId::new(args.user))?;
            if output::is_json() {
                return output::json_result("bet.stats", &stats);
            }
            output::section("Betting statistics");
            output::field("Bets", stats.total_bets);
            output::field("Active", stats.active_bets);
            output::field("Won", output::positive(stats.won_bets));
            output::field("Lost", output::negative(stats.lost_bets));
            output::field("Refunded", stats.refunded_bets);
            output::field("Wagered", stats.total_wagered);
            output::field("Won amount", stats.total_won);
            output::field("Net profit", output::signed(stats.net_profit));
            output::field("Win rate", format!("{:.1}%", stats.win_rate));
            output::field("Average bet", stats.average_bet.round_dp(2));
            Ok(())
        }
    }
}

fn place(betting: &dyn BettingService, args: BetPlaceArgs) -> Result<()> {
    let mut request = PlaceBetRequest::new(args.user, args.market, args.outcome, args.amount);
    if let Some(price) = args.expected_price {
        request = request.with_expected_price(price, args.max_slippage);
    }
    let placed = betting.place_bet(request)?;

    if output::is_json() {
        return output::json_result("bet.place", &placed);
    }
    output::success(&format!("Placed bet {}", placed.bet.id));
    output::field("Amount", placed.bet.amount);
    output::field("Price", format!("{}%", placed.bet.price_per_contract));
    output::field("Contracts", placed.bet.contracts.round_dp(4));
    output::field("New price", format!("{}%", placed.new_price));
    output::field("Balance", placed.wallet_balance);
    if output::verbosity() > 0 {
        output::field("Risk score", format!("{:.1}", placed.risk_score));
    }
    Ok(())
}

fn list(betting: &dyn BettingService, args: BetListArgs) -> Result<()> {
    let filter = BetFilter {
        status: args.status,
        market_id: args.market.map(MarketId::new),
    };
    let page = betting.user_bets(
        &UserId::new(args.user),
        &filter,
        Pagination {
            limit: args.limit,
            offset: args.offset,
        },
    )?;

    if output::is_json() {
        return output::json_result("bet.list", &page);
    }
    let shown = page.items.len();
    output::table(page.items.iter().map(BetRow::from).collect(), "No bets found");
    if shown < page.total {
        output::note(&format!(
            "showing {}-{} of {}",
            page.offset + 1,
            page.offset + shown,
            page.total
        ));
    }
    Ok(())
}

fn print_bet(bet: &Bet) {
    output::section("Bet");
    output::field("ID", &bet.id);
    output::field("Market", &bet.market_id);
    output::field("Outcome", &bet.outcome_key);
    output::field("Amount", bet.amount);
    output::field("Price", format!("{}%", bet.price_per_contract));
    output::field("Contracts", bet.contracts);
    output::field("Status", output::highlight(bet.status));
    output::field("Placed", bet.placed_at);
    if let Some(amount) = bet.settlement_amount {
        output::field("Settled for", amount);
    }
    if let Some(at) = bet.settled_at {
        output::field("Settled at", at);
    }
}

/// Execute `portfolio`.
pub fn portfolio(betting: &dyn BettingService, user: &str) -> Result<()> {
    let portfolio = betting.portfolio(&UserId::new(user))?;
    if output::is_json() {
        return output::json_result("portfolio", &portfolio);
    }

    output::section("Wallets");
    if portfolio.wallets.is_empty() {
        output::note("No wallets");
    }
    for wallet in &portfolio.wallets {
        let frozen = if wallet.is_locked { " (frozen)" } else { "" };
        output::field(
            wallet.currency.as_str(),
            format!(
                "{} available, {} locked{frozen}",
                wallet.available_balance, wallet.locked_balance
            ),
        );
    }

    output::section("Positions");
    output::table(
        portfolio.positions.iter().map(PositionRow::from).collect(),
        "No open positions",
    );

    output::section("Totals");
    output::field("Staked", portfolio.total_staked);
    output::field("Value", portfolio.total_value.round_dp(2));
    output::field("P&L", output::signed(portfolio.unrealized_pnl.round_dp(2)));
    Ok(())
}
