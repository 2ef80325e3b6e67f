//! Settlement and refund fan-out driven by the outbox.

pub mod worker;

pub use worker::{SettlementOutcome, SettlementReport, SettlementWorker};
