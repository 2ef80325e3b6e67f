//! Storage-agnostic betting domain: markets, bets, wallets and the math over them.

pub mod bet;
pub mod error;
pub mod id;
pub mod market;
pub mod money;
pub mod outbox;
pub mod pricing;
pub mod safeguard;
pub mod user;
pub mod wallet;

// Identifiers
pub use id::{BetId, MarketId, OutboxId, OutcomeKey, TransactionId, UserId, WalletId};

// Money
pub use money::{Amount, CurrencyCode, Price};

// Core entities
pub use bet::{Bet, BetFilter, BetStatus};
pub use market::{Market, MarketStatus, Outcome, SafeguardConfig};
pub use outbox::{OutboxEntry, OutboxKind, OutboxStatus};
pub use user::{KycStatus, UserProfile};
pub use wallet::{LedgerTransaction, TransactionKind, Wallet};

// Pricing and safeguards
pub use pricing::{OutcomePrice, PoolPricing, PricingModel};
pub use safeguard::{
    HouseBotPlan, HouseBotPosition, HouseBotStrategy, ImbalanceCheck, PoolSafeguards,
    QuorumCheck, SafeguardEngine, SafeguardPolicy, SafeguardStatus, VoidAssessment, VoidReason,
};

pub use error::DomainError;
