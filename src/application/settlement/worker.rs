//! Outbox consumer that pays out resolved markets and refunds voided ones.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::application::betting::coordinator::load_market;
use crate::domain::money::round_money;
use crate::domain::{
    Amount, Bet, BetStatus, Market, MarketId, MarketStatus, OutboxEntry, OutboxKind,
    PricingModel, TransactionKind,
};
use crate::error::{Error, Result};
use crate::port::outbound::clock::Clock;
use crate::port::outbound::store::{Repository, Store};

/// What processing one outbox entry did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementOutcome {
    pub market_id: MarketId,
    pub kind: OutboxKind,
    pub bets_paid: u32,
    pub bets_lost: u32,
    pub bets_refunded: u32,
    pub total_paid: Amount,
}

impl SettlementOutcome {
    fn new(market_id: MarketId, kind: OutboxKind) -> Self {
        Self {
            market_id,
            kind,
            bets_paid: 0,
            bets_lost: 0,
            bets_refunded: 0,
            total_paid: Decimal::ZERO,
        }
    }
}

/// Summary of one worker pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettlementReport {
    pub processed: Vec<SettlementOutcome>,
    pub failed: Vec<(MarketId, String)>,
}

/// Consumes settlement and refund entries, one unit of work per entry.
pub struct SettlementWorker<S> {
    store: Arc<S>,
    pricing: Arc<dyn PricingModel>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl<S: Store> SettlementWorker<S> {
    pub fn new(
        store: Arc<S>,
        pricing: Arc<dyn PricingModel>,
        clock: Arc<dyn Clock>,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            pricing,
            clock,
            max_attempts,
        }
    }

    /// Process up to `limit` due entries.
    ///
    /// A failing entry is marked `failed` with its error and retried on a
    /// later pass until it runs out of attempts. Only store failures while
    /// recording that status abort the pass.
    pub fn run_once(&self, limit: usize) -> Result<SettlementReport> {
        let due = self
            .store
            .read(|repo| repo.due_entries(limit, self.max_attempts))?;
        let mut report = SettlementReport::default();

        for entry in due {
            let now = self.clock.now();
            let result = self.store.atomically(|repo| {
                let outcome = self.process(repo, &entry, now)?;
                let mut done = entry.clone();
                done.complete(now);
                repo.save_entry(&done)?;
                Ok(outcome)
            });

            match result {
                Ok(outcome) => {
                    info!(
                        market_id = %outcome.market_id,
                        kind = %outcome.kind,
                        paid = outcome.bets_paid,
                        lost = outcome.bets_lost,
                        refunded = outcome.bets_refunded,
                        total_paid = %outcome.total_paid,
                        "Outbox entry processed"
                    );
                    report.processed.push(outcome);
                }
                Err(e) => {
                    warn!(
                        entry_id = %entry.id,
                        market_id = %entry.market_id,
                        kind = %entry.kind,
                        attempt = entry.attempts + 1,
                        error = %e,
                        "Outbox entry failed"
                    );
                    let mut failed = entry.clone();
                    failed.fail(e.to_string(), now);
                    self.store.atomically(|repo| repo.save_entry(&failed))?;
                    report.failed.push((entry.market_id.clone(), e.to_string()));
                }
            }
        }
        Ok(report)
    }

    fn process(
        &self,
        repo: &dyn Repository,
        entry: &OutboxEntry,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        let market = load_market(repo, &entry.market_id)?;
        let bets = repo.market_bets(&market.id, Some(BetStatus::Active))?;
        match entry.kind {
            OutboxKind::Refund => {
                expect_status(&market, MarketStatus::Voided)?;
                refund_all(repo, &market, bets, now)
            }
            OutboxKind::Settlement => {
                expect_status(&market, MarketStatus::Resolved)?;
                self.settle(repo, &market, bets, now)
            }
        }
    }

    fn settle(
        &self,
        repo: &dyn Repository,
        market: &Market,
        bets: Vec<Bet>,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        let winner = market
            .resolved_outcome
            .as_ref()
            .ok_or_else(|| Error::InvalidState(format!("market {} has no winner", market.id)))?;
        let total_winning: Decimal = bets
            .iter()
            .filter(|b| &b.outcome_key == winner)
            .map(|b| b.contracts)
            .sum();
        if total_winning.is_zero() {
            let mut outcome = refund_all(repo, market, bets, now)?;
            outcome.kind = OutboxKind::Settlement;
            return Ok(outcome);
        }

        let rake = market.rake_percentage / Decimal::ONE_HUNDRED;
        let prize_pool = round_money(market.total_pool_amount * (Decimal::ONE - rake));
        let mut outcome = SettlementOutcome::new(market.id.clone(), OutboxKind::Settlement);

        for mut bet in bets {
            if &bet.outcome_key != winner {
                bet.settle(Decimal::ZERO, now);
                repo.save_bet(&bet)?;
                outcome.bets_lost += 1;
                continue;
            }
            let payout = self
                .pricing
                .payout_share(bet.contracts, total_winning, prize_pool);
            if payout > Decimal::ZERO {
                credit(
                    repo,
                    market,
                    &bet,
                    payout,
                    TransactionKind::Payout,
                    format!("payout for bet {}", bet.id),
                    now,
                )?;
            }
            bet.settle(payout, now);
            repo.save_bet(&bet)?;
            outcome.bets_paid += 1;
            outcome.total_paid += payout;
        }
        Ok(outcome)
    }
}

/// Refund every active bet at its full stake. Pools keep their history.
fn refund_all(
    repo: &dyn Repository,
    market: &Market,
    bets: Vec<Bet>,
    now: DateTime<Utc>,
) -> Result<SettlementOutcome> {
    let mut outcome = SettlementOutcome::new(market.id.clone(), OutboxKind::Refund);
    for mut bet in bets {
        credit(
            repo,
            market,
            &bet,
            bet.amount,
            TransactionKind::BetRefund,
            format!("refund for bet {}", bet.id),
            now,
        )?;
        bet.refund(now);
        repo.save_bet(&bet)?;
        outcome.bets_refunded += 1;
        outcome.total_paid += bet.amount;
    }
    Ok(outcome)
}

fn credit(
    repo: &dyn Repository,
    market: &Market,
    bet: &Bet,
    amount: Amount,
    kind: TransactionKind,
    description: String,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut wallet = repo
        .wallet(&bet.user_id, &market.currency)?
        .ok_or_else(|| Error::not_found("wallet", &bet.user_id))?;
    let mut transaction = wallet.credit(amount, kind, description, now)?;
    transaction.reference = Some(bet.id.clone());
    repo.save_wallet(&wallet)?;
    repo.append_transaction(&transaction)
}

fn expect_status(market: &Market, status: MarketStatus) -> Result<()> {
    if market.status != status {
        return Err(Error::InvalidState(format!(
            "market {} is {}, expected {status}",
            market.id, market.status
        )));
    }
    Ok(())
}
