//! Handler for the `settle` command.

use rust_decimal::Decimal;
use tabled::Tabled;

use crate::adapter::inbound::cli::output;
use crate::application::settlement::{SettlementOutcome, SettlementWorker};
use crate::domain::OutboxKind;
use crate::error::Result;
use crate::port::outbound::store::Store;

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Kind")]
    kind: OutboxKind,
    #[tabled(rename = "Paid")]
    paid: u32,
    #[tabled(rename = "Lost")]
    lost: u32,
    #[tabled(rename = "Refunded")]
    refunded: u32,
    #[tabled(rename = "Total")]
    total: Decimal,
}

impl From<&SettlementOutcome> for OutcomeRow {
    fn from(outcome: &SettlementOutcome) -> Self {
        Self {
            market: outcome.market_id.to_string(),
            kind: outcome.kind,
            paid: outcome.bets_paid,
            lost: outcome.bets_lost,
            refunded: outcome.bets_refunded,
            total: outcome.total_paid,
        }
    }
}

/// Execute `settle`: one pass over the outbox.
pub fn execute<S: Store>(worker: &SettlementWorker<S>, limit: usize) -> Result<()> {
    let report = worker.run_once(limit)?;
    if output::is_json() {
        return output::json_result("settle", &report);
    }

    output::table(
        report.processed.iter().map(OutcomeRow::from).collect(),
        "Nothing to settle",
    );
    for (market_id, error) in &report.failed {
        output::warning(&format!("{market_id}: {error}"));
    }
    if !report.failed.is_empty() {
        output::hint("failed entries are retried on the next run");
    }
    Ok(())
}
