//! Bet coordinator: place, cancel and inspect bets.
//!
//! Placement and cancellation each run as one unit of work. The risk gate,
//! the price read and every write share that unit, so a rejected or failed
//! bet leaves no trace in wallets, the ledger or the pools.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use super::BettingSettings;
use crate::application::seconds;
use crate::domain::money::{round_money, CONTRACT_FACE_VALUE, CONTRACT_SCALE};
use crate::domain::{
    Amount, Bet, BetFilter, BetId, BetStatus, Market, MarketId, OutcomeKey, PricingModel,
    TransactionKind, UserId,
};
use crate::error::{Error, Result, RiskError};
use crate::port::inbound::betting::{
    BetQuote, BettingService, BettingStats, Page, Pagination, PlaceBetRequest, PlacedBet,
    Portfolio, Position, PriceImpact, WalletSummary,
};
use crate::port::inbound::risk::{BetIntent, RiskCheckResult, RiskGate};
use crate::port::outbound::clock::Clock;
use crate::port::outbound::store::{Repository, Store};

/// Orchestrates bet workflows over a [`Store`].
pub struct BetCoordinator<S> {
    store: Arc<S>,
    pricing: Arc<dyn PricingModel>,
    gate: Arc<dyn RiskGate>,
    clock: Arc<dyn Clock>,
    settings: BettingSettings,
}

impl<S: Store> BetCoordinator<S> {
    pub fn new(
        store: Arc<S>,
        pricing: Arc<dyn PricingModel>,
        gate: Arc<dyn RiskGate>,
        clock: Arc<dyn Clock>,
        settings: BettingSettings,
    ) -> Self {
        Self {
            store,
            pricing,
            gate,
            clock,
            settings,
        }
    }

    fn execute(
        &self,
        repo: &dyn Repository,
        request: &PlaceBetRequest,
        now: DateTime<Utc>,
    ) -> Result<PlacedBet> {
        let mut market = load_market(repo, &request.market_id)?;
        let intent = BetIntent {
            user_id: &request.user_id,
            market: &market,
            outcome_key: &request.outcome_key,
            amount: request.amount,
            now,
        };
        if let RiskCheckResult::Rejected(e) = self.gate.check(repo, &intent)? {
            return Err(e.into());
        }
        let risk_score = self.gate.risk_score(repo, &intent);

        let outcome = market
            .outcome(&request.outcome_key)
            .ok_or_else(|| Error::not_found("outcome", &request.outcome_key))?;
        let count = market.outcomes.len();
        let price = self
            .pricing
            .price(outcome.pool_amount, market.total_pool_amount, count);

        if let Some(expected) = request.expected_price {
            let max = request
                .max_slippage
                .unwrap_or(self.settings.default_max_slippage);
            if let Some(actual) = self.pricing.slippage(expected, price) {
                if actual > max {
                    return Err(RiskError::SlippageExceeded { actual, max }.into());
                }
            }
        }

        let contracts = self.pricing.contracts_bought(request.amount, price);
        if contracts <= Decimal::ZERO {
            let smallest_contract = Decimal::new(1, CONTRACT_SCALE);
            return Err(RiskError::BetTooSmall {
                amount: request.amount,
                min: smallest_contract * price / Decimal::ONE_HUNDRED,
            }
            .into());
        }

        let mut wallet = repo
            .wallet(&request.user_id, &market.currency)?
            .ok_or_else(|| Error::not_found("wallet", &request.user_id))?;
        let bet_id = BetId::new();
        let description = format!("bet on {} / {}", market.id, request.outcome_key);
        let mut transaction =
            wallet.debit(request.amount, TransactionKind::BetPlaced, description, now)?;
        transaction.reference = Some(bet_id.clone());

        let bet = Bet {
            id: bet_id,
            user_id: request.user_id.clone(),
            market_id: market.id.clone(),
            outcome_key: request.outcome_key.clone(),
            amount: request.amount,
            contracts,
            price_per_contract: price,
            total_cost: request.amount,
            status: BetStatus::Active,
            transaction_id: Some(transaction.id.clone()),
            settlement_amount: None,
            placed_at: now,
            settled_at: None,
        };

        market.add_stake(&request.outcome_key, request.amount)?;
        let new_pool = market
            .outcome(&request.outcome_key)
            .map_or(Decimal::ZERO, |o| o.pool_amount);
        let new_price = self
            .pricing
            .price(new_pool, market.total_pool_amount, count);

        repo.save_wallet(&wallet)?;
        repo.append_transaction(&transaction)?;
        repo.save_bet(&bet)?;
        repo.save_market(&market)?;

        Ok(PlacedBet {
            bet,
            new_price,
            wallet_balance: wallet.balance(),
            risk_score,
        })
    }

    fn refund(
        &self,
        repo: &dyn Repository,
        user_id: &UserId,
        bet_id: &BetId,
        now: DateTime<Utc>,
    ) -> Result<Bet> {
        let mut bet = load_owned_bet(repo, user_id, bet_id)?;
        if !bet.is_active() {
            return Err(Error::InvalidState(format!("bet {bet_id} is {}", bet.status)));
        }
        if now - bet.placed_at > seconds(self.settings.cancellation_window_secs) {
            return Err(Error::InvalidState(format!(
                "bet {bet_id} can no longer be cancelled: the {}s window has passed",
                self.settings.cancellation_window_secs
            )));
        }

        let mut market = load_market(repo, &bet.market_id)?;
        if market.status.is_terminal() {
            return Err(Error::InvalidState(format!(
                "market {} is already {}",
                market.id, market.status
            )));
        }
        let mut wallet = repo
            .wallet(user_id, &market.currency)?
            .ok_or_else(|| Error::not_found("wallet", user_id))?;

        let mut transaction = wallet.credit(
            bet.amount,
            TransactionKind::BetRefund,
            format!("cancelled bet {bet_id}"),
            now,
        )?;
        transaction.reference = Some(bet.id.clone());
        bet.refund(now);
        market.remove_stake(&bet.outcome_key, bet.amount)?;

        repo.save_wallet(&wallet)?;
        repo.append_transaction(&transaction)?;
        repo.save_bet(&bet)?;
        repo.save_market(&market)?;
        Ok(bet)
    }

    fn positions(&self, repo: &dyn Repository, user_id: &UserId) -> Result<Vec<Position>> {
        let filter = BetFilter {
            status: Some(BetStatus::Active),
            market_id: None,
        };
        let mut grouped: BTreeMap<(MarketId, OutcomeKey), Vec<Bet>> = BTreeMap::new();
        for bet in repo.user_bets(user_id, &filter)? {
            grouped
                .entry((bet.market_id.clone(), bet.outcome_key.clone()))
                .or_default()
                .push(bet);
        }

        let mut markets: BTreeMap<MarketId, Market> = BTreeMap::new();
        let mut positions = Vec::with_capacity(grouped.len());
        for ((market_id, outcome_key), bets) in grouped {
            let market = match markets.entry(market_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let market = load_market(repo, entry.key())?;
                    entry.insert(market)
                }
            };
            positions.push(self.position(market, &outcome_key, &bets)?);
        }
        Ok(positions)
    }

    fn position(&self, market: &Market, outcome_key: &OutcomeKey, bets: &[Bet]) -> Result<Position> {
        let outcome = market
            .outcome(outcome_key)
            .ok_or_else(|| Error::not_found("outcome", outcome_key))?;
        let amount: Amount = bets.iter().map(|b| b.amount).sum();
        let contracts: Decimal = bets.iter().map(|b| b.contracts).sum();
        let average_price = self
            .pricing
            .breakeven_price(amount, contracts)
            .unwrap_or(Decimal::ZERO);
        let current_price = self.pricing.price(
            outcome.pool_amount,
            market.total_pool_amount,
            market.outcomes.len(),
        );
        let current_value = round_money(contracts * current_price / Decimal::ONE_HUNDRED);
        Ok(Position {
            market_id: market.id.clone(),
            market_title: market.title.clone(),
            currency: market.currency.clone(),
            outcome_key: outcome_key.clone(),
            outcome_label: outcome.label.clone(),
            bet_count: u32::try_from(bets.len()).unwrap_or(u32::MAX),
            amount,
            contracts,
            average_price,
            current_price,
            current_value,
            unrealized_pnl: current_value - amount,
        })
    }
}

impl<S: Store> BettingService for BetCoordinator<S> {
    fn place_bet(&self, request: PlaceBetRequest) -> Result<PlacedBet> {
        validate_request(&request)?;
        let now = self.clock.now();
        let placed = self
            .store
            .atomically(|repo| self.execute(repo, &request, now))?;
        info!(
            bet_id = %placed.bet.id,
            user_id = %placed.bet.user_id,
            market_id = %placed.bet.market_id,
            outcome = %placed.bet.outcome_key,
            amount = %placed.bet.amount,
            price = %placed.bet.price_per_contract,
            contracts = %placed.bet.contracts,
            "Bet placed"
        );
        Ok(placed)
    }

    fn cancel_bet(&self, user_id: &UserId, bet_id: &BetId) -> Result<Bet> {
        let now = self.clock.now();
        let bet = self
            .store
            .atomically(|repo| self.refund(repo, user_id, bet_id, now))?;
        info!(
            bet_id = %bet.id,
            user_id = %bet.user_id,
            market_id = %bet.market_id,
            amount = %bet.amount,
            "Bet cancelled"
        );
        Ok(bet)
    }

    fn bet(&self, user_id: &UserId, bet_id: &BetId) -> Result<Bet> {
        self.store
            .read(|repo| load_owned_bet(repo, user_id, bet_id))
    }

    fn user_bets(
        &self,
        user_id: &UserId,
        filter: &BetFilter,
        page: Pagination,
    ) -> Result<Page<Bet>> {
        if page.limit == 0 {
            return Err(Error::Validation("page limit must be positive".into()));
        }
        let bets = self.store.read(|repo| repo.user_bets(user_id, filter))?;
        Ok(Page::slice(bets, page))
    }

    fn user_positions(&self, user_id: &UserId) -> Result<Vec<Position>> {
        self.store.read(|repo| self.positions(repo, user_id))
    }

    fn quote(
        &self,
        market_id: &MarketId,
        outcome_key: &OutcomeKey,
        amount: Amount,
    ) -> Result<BetQuote> {
        ensure_positive(amount)?;
        let market = self.store.read(|repo| load_market(repo, market_id))?;
        let outcome = market
            .outcome(outcome_key)
            .ok_or_else(|| Error::not_found("outcome", outcome_key))?;
        let count = market.outcomes.len();
        let current_price = self
            .pricing
            .price(outcome.pool_amount, market.total_pool_amount, count);
        let new_price =
            self.pricing
                .new_price(outcome.pool_amount, market.total_pool_amount, amount, count);
        let contracts = self.pricing.contracts_bought(amount, current_price);
        let potential_payout = contracts * CONTRACT_FACE_VALUE;

        Ok(BetQuote {
            market_id: market.id.clone(),
            outcome_key: outcome_key.clone(),
            amount,
            current_price,
            new_price,
            contracts,
            breakeven_price: self.pricing.breakeven_price(amount, contracts),
            potential_payout,
            potential_profit: potential_payout - amount,
            price_impact: self.pricing.price_impact(outcome.pool_amount, amount),
            slippage: self.pricing.slippage(current_price, new_price),
            implied_probability: current_price / Decimal::ONE_HUNDRED,
            quoted_at: self.clock.now(),
        })
    }

    fn price_impact(
        &self,
        market_id: &MarketId,
        outcome_key: &OutcomeKey,
        amount: Amount,
    ) -> Result<PriceImpact> {
        ensure_positive(amount)?;
        let market = self.store.read(|repo| load_market(repo, market_id))?;
        let outcome = market
            .outcome(outcome_key)
            .ok_or_else(|| Error::not_found("outcome", outcome_key))?;
        let count = market.outcomes.len();
        Ok(PriceImpact {
            market_id: market.id.clone(),
            outcome_key: outcome_key.clone(),
            amount,
            outcome_pool: outcome.pool_amount,
            current_price: self
                .pricing
                .price(outcome.pool_amount, market.total_pool_amount, count),
            new_price: self.pricing.new_price(
                outcome.pool_amount,
                market.total_pool_amount,
                amount,
                count,
            ),
            price_impact: self.pricing.price_impact(outcome.pool_amount, amount),
        })
    }

    fn portfolio(&self, user_id: &UserId) -> Result<Portfolio> {
        let (wallets, positions) = self.store.read(|repo| {
            let wallets = repo.user_wallets(user_id)?;
            let positions = self.positions(repo, user_id)?;
            Ok((wallets, positions))
        })?;

        let wallets = wallets
            .iter()
            .map(|w| WalletSummary {
                currency: w.currency().clone(),
                balance: w.balance(),
                locked_balance: w.locked_balance(),
                available_balance: w.available_balance(),
                is_locked: w.is_locked(),
            })
            .collect();
        let total_staked = positions.iter().map(|p| p.amount).sum();
        let total_value = positions.iter().map(|p| p.current_value).sum();
        let unrealized_pnl = positions.iter().map(|p| p.unrealized_pnl).sum();

        Ok(Portfolio {
            user_id: user_id.clone(),
            wallets,
            positions,
            total_staked,
            total_value,
            unrealized_pnl,
        })
    }

    fn betting_stats(&self, user_id: &UserId) -> Result<BettingStats> {
        let bets = self
            .store
            .read(|repo| repo.user_bets(user_id, &BetFilter::default()))?;
        Ok(stats_for(&bets))
    }
}

fn stats_for(bets: &[Bet]) -> BettingStats {
    let mut stats = BettingStats::default();
    let mut settled_stake = Decimal::ZERO;
    for bet in bets {
        stats.total_bets += 1;
        match bet.status {
            BetStatus::Active => stats.active_bets += 1,
            BetStatus::Refunded => {
                stats.refunded_bets += 1;
                continue;
            }
            BetStatus::Settled => {
                let payout = bet.settlement_amount.unwrap_or_default();
                if payout > Decimal::ZERO {
                    stats.won_bets += 1;
                } else {
                    stats.lost_bets += 1;
                }
                stats.total_won += payout;
                settled_stake += bet.amount;
            }
        }
        stats.total_wagered += bet.amount;
    }

    stats.net_profit = stats.total_won - settled_stake;
    let decided = stats.won_bets + stats.lost_bets;
    if decided > 0 {
        stats.win_rate = f64::from(stats.won_bets) / f64::from(decided) * 100.0;
    }
    let counted = stats.total_bets - stats.refunded_bets;
    if counted > 0 {
        stats.average_bet = round_money(stats.total_wagered / Decimal::from(counted));
    }
    stats
}

fn validate_request(request: &PlaceBetRequest) -> Result<()> {
    if request.user_id.as_str().trim().is_empty() {
        return Err(Error::Validation("user id is required".into()));
    }
    if request.market_id.as_str().trim().is_empty() {
        return Err(Error::Validation("market id is required".into()));
    }
    if request.outcome_key.as_str().trim().is_empty() {
        return Err(Error::Validation("outcome key is required".into()));
    }
    ensure_positive(request.amount)?;
    if let Some(price) = request.expected_price {
        if price <= Decimal::ZERO || price >= Decimal::ONE_HUNDRED {
            return Err(Error::Validation(format!(
                "expected price must be between 0 and 100, got {price}"
            )));
        }
    }
    if request.max_slippage.is_some_and(|s| s < Decimal::ZERO) {
        return Err(Error::Validation("max slippage cannot be negative".into()));
    }
    Ok(())
}

fn ensure_positive(amount: Amount) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::Validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

pub(crate) fn load_market(repo: &dyn Repository, id: &MarketId) -> Result<Market> {
    repo.market(id)?.ok_or_else(|| Error::not_found("market", id))
}

fn load_owned_bet(repo: &dyn Repository, user_id: &UserId, bet_id: &BetId) -> Result<Bet> {
    let bet = repo
        .bet(bet_id)?
        .ok_or_else(|| Error::not_found("bet", bet_id))?;
    if &bet.user_id != user_id {
        return Err(Error::Forbidden(format!(
            "bet {bet_id} does not belong to user {user_id}"
        )));
    }
    Ok(bet)
}
