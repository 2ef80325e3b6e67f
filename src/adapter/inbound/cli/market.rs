//! Handlers for the `market` command group.

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::MarketCommand;
use crate::adapter::inbound::cli::output;
use crate::domain::{
    Amount, CurrencyCode, Market, MarketId, MarketStatus, Outcome, OutcomeKey, OutcomePrice,
    SafeguardConfig,
};
use crate::error::Result;
use crate::port::inbound::market::MarketService;

/// Market as operators write it: pools start empty and the market opens now.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketDefinition {
    pub id: MarketId,
    pub title: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub outcomes: Vec<OutcomeDefinition>,
    #[serde(default = "default_min_bet")]
    pub min_bet_amount: Amount,
    #[serde(default = "default_max_bet")]
    pub max_bet_amount: Amount,
    #[serde(default = "default_rake")]
    pub rake_percentage: Decimal,
    #[serde(default)]
    pub creator_revenue_share: Decimal,
    #[serde(default)]
    pub safeguards: SafeguardConfig,
    pub close_time: DateTime<Utc>,
    #[serde(default)]
    pub resolution_deadline: Option<DateTime<Utc>>,
}

/// One outcome of a [`MarketDefinition`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutcomeDefinition {
    pub key: OutcomeKey,
    pub label: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_min_bet() -> Amount {
    Decimal::ONE
}

fn default_max_bet() -> Amount {
    Decimal::from(10_000)
}

fn default_rake() -> Decimal {
    Decimal::from(5)
}

impl MarketDefinition {
    /// Open market created at `now` with empty pools.
    #[must_use]
    pub fn into_market(self, now: DateTime<Utc>) -> Market {
        Market {
            id: self.id,
            title: self.title,
            status: MarketStatus::Open,
            currency: CurrencyCode::new(&self.currency),
            outcomes: self
                .outcomes
                .into_iter()
                .map(|o| Outcome::new(o.key, o.label))
                .collect(),
            total_pool_amount: Decimal::ZERO,
            min_bet_amount: self.min_bet_amount,
            max_bet_amount: self.max_bet_amount,
            rake_percentage: self.rake_percentage,
            creator_revenue_share: self.creator_revenue_share,
            safeguards: self.safeguards,
            created_at: now,
            close_time: self.close_time,
            resolution_deadline: self.resolution_deadline,
            resolved_outcome: None,
            resolution_source: None,
            resolved_at: None,
            void_reason: None,
        }
    }
}

#[derive(Tabled)]
struct MarketRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: MarketStatus,
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Outcomes")]
    outcomes: usize,
    #[tabled(rename = "Closes")]
    closes: String,
}

impl From<&Market> for MarketRow {
    fn from(market: &Market) -> Self {
        Self {
            id: market.id.to_string(),
            title: market.title.clone(),
            status: market.status,
            pool: format!("{} {}", market.total_pool_amount, market.currency),
            outcomes: market.outcomes.len(),
            closes: market.close_time.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Tabled)]
struct PriceRow {
    #[tabled(rename = "Outcome")]
    key: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Pool")]
    pool: Amount,
    #[tabled(rename = "Price")]
    price: Decimal,
    #[tabled(rename = "Probability")]
    probability: Decimal,
}

impl From<&OutcomePrice> for PriceRow {
    fn from(price: &OutcomePrice) -> Self {
        Self {
            key: price.key.to_string(),
            label: price.label.clone(),
            pool: price.pool_amount,
            price: price.price,
            probability: price.probability.round_dp(4),
        }
    }
}

/// Execute a `market` subcommand.
pub fn execute(markets: &dyn MarketService, command: MarketCommand) -> Result<()> {
    match command {
        MarketCommand::Import(args) => import(markets, &args.file),
        MarketCommand::List(args) => list(markets, args.status),
        MarketCommand::Show(args) => show(markets, &MarketId::new(args.market)),
        MarketCommand::Prices(args) => prices(markets, &MarketId::new(args.market)),
        MarketCommand::Check(args) => check(markets, &MarketId::new(args.market)),
        MarketCommand::Resolve(args) => {
            let market = markets.resolve_market(
                &MarketId::new(args.market),
                &OutcomeKey::new(args.winner),
                &args.source,
            )?;
            if output::is_json() {
                return output::json_result("market.resolve", &market);
            }
            output::success(&format!("Resolved market {}", market.id));
            output::field("Winner", output::highlight(winner_of(&market)));
            output::hint("run `poolmarket settle` to pay out winners");
            Ok(())
        }
        MarketCommand::Void(args) => {
            let market = markets.void_market(&MarketId::new(args.market), &args.reason)?;
            if output::is_json() {
                return output::json_result("market.void", &market);
            }
            output::success(&format!("Voided market {}", market.id));
            output::field("Reason", &args.reason);
            output::hint("run `poolmarket settle` to refund every bet");
            Ok(())
        }
        MarketCommand::CloseExpired => {
            let closed = markets.close_expired_markets()?;
            if output::is_json() {
                return output::json_result("market.close_expired", &closed);
            }
            if closed.is_empty() {
                output::note("No open markets past their close time");
            }
            for id in &closed {
                output::success(&format!("Closed market {id}"));
            }
            Ok(())
        }
    }
}

fn winner_of(market: &Market) -> String {
    market
        .resolved_outcome
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn import(markets: &dyn MarketService, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let definition: MarketDefinition = serde_json::from_str(&content)?;
    let market = markets.import_market(definition.into_market(Utc::now()))?;

    if output::is_json() {
        return output::json_result("market.import", &market);
    }
    output::success(&format!("Imported market {}", market.id));
    output::field("Title", &market.title);
    output::field("Outcomes", market.outcomes.len());
    output::field("Closes", market.close_time);
    Ok(())
}

fn list(markets: &dyn MarketService, status: Option<MarketStatus>) -> Result<()> {
    let markets = markets.markets(status)?;
    if output::is_json() {
        return output::json_result("market.list", &markets);
    }
    output::table(
        markets.iter().map(MarketRow::from).collect(),
        "No markets found",
    );
    Ok(())
}

fn show(markets: &dyn MarketService, id: &MarketId) -> Result<()> {
    let market = markets.market(id)?;
    let prices = markets.current_prices(id)?;
    if output::is_json() {
        return output::json_result(
            "market.show",
            &serde_json::json!({ "market": market, "prices": prices }),
        );
    }

    output::section(&market.title);
    output::field("ID", &market.id);
    output::field("Status", output::highlight(market.status));
    output::field(
        "Pool",
        format!("{} {}", market.total_pool_amount, market.currency),
    );
    output::field(
        "Bet range",
        format!("{} - {}", market.min_bet_amount, market.max_bet_amount),
    );
    output::field("Rake", format!("{}%", market.rake_percentage));
    output::field("Closes", market.close_time);
    if let Some(winner) = &market.resolved_outcome {
        output::field("Winner", output::positive(winner));
    }
    if let Some(reason) = &market.void_reason {
        output::field("Void reason", output::negative(reason));
    }

    output::section("Outcomes");
    output::table(prices.iter().map(PriceRow::from).collect(), "No outcomes");
    Ok(())
}

fn prices(markets: &dyn MarketService, id: &MarketId) -> Result<()> {
    let prices = markets.current_prices(id)?;
    if output::is_json() {
        return output::json_result("market.prices", &prices);
    }
    output::table(prices.iter().map(PriceRow::from).collect(), "No outcomes");
    Ok(())
}

fn check(markets: &dyn MarketService, id: &MarketId) -> Result<()> {
    let status = markets.check_safeguards(id)?;
    if output::is_json() {
        return output::json_result("market.check", &status);
    }

    output::section("Quorum");
    let quorum = &status.quorum;
    output::field(
        "Met",
        if quorum.met {
            output::positive("yes")
        } else {
            output::negative("no")
        },
    );
    output::field(
        "Pool",
        format!("{} / {}", quorum.total_pool, quorum.required_pool),
    );
    output::field(
        "Outcomes",
        format!("{} / {}", quorum.backed_outcomes, quorum.required_outcomes),
    );

    output::section("Imbalance");
    let imbalance = &status.imbalance;
    output::field(
        "Balanced",
        if imbalance.balanced {
            output::positive("yes")
        } else {
            output::negative("no")
        },
    );
    output::field("Largest share", imbalance.max_share.round_dp(4));
    if let Some(dominant) = &imbalance.dominant_outcome {
        output::field("Dominant", dominant);
    }
    output::field("Threshold", imbalance.threshold);

    output::section("Void risk");
    if status.void.reasons.is_empty() {
        output::note("No void reasons");
    }
    for reason in &status.void.reasons {
        output::warning(&serde_json::to_string(reason)?);
    }
    if status.void.should_void {
        output::hint("consider `poolmarket market void`");
    }

    if let Some(plan) = &status.house_bot {
        output::section("House bot");
        output::field("Strategy", format!("{:?}", plan.strategy));
        output::field("Budget", plan.budget);
        for position in &plan.positions {
            output::field(position.outcome_key.as_str(), position.amount);
        }
    }

    output::section("Scores");
    output::field("Risk", format!("{:.1}", status.risk_score));
    output::field("Liquidity", format!("{:.1}", status.liquidity_score));
    Ok(())
}
