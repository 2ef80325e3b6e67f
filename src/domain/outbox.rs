//! Durable work items written by resolve/void and drained by the settlement worker.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MarketId, OutboxId};

/// What the worker has to do for a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxKind {
    /// Pay out a resolved market.
    Settlement,
    /// Refund every active bet of a voided market.
    Refund,
}

impl OutboxKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Settlement => "settlement",
            Self::Refund => "refund",
        }
    }
}

impl fmt::Display for OutboxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutboxKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "settlement" => Ok(Self::Settlement),
            "refund" => Ok(Self::Refund),
            other => Err(format!("unknown outbox kind '{other}'")),
        }
    }
}

/// Processing state of an outbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Done,
    Failed,
}

impl OutboxStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for OutboxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown outbox status '{other}'")),
        }
    }
}

/// A pending settlement or refund for one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: OutboxId,
    pub kind: OutboxKind,
    pub market_id: MarketId,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl OutboxEntry {
    /// A fresh pending entry.
    #[must_use]
    pub fn pending(kind: OutboxKind, market_id: MarketId, now: DateTime<Utc>) -> Self {
        Self {
            id: OutboxId::new(),
            kind,
            market_id,
            status: OutboxStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: now,
            processed_at: None,
        }
    }

    /// Record a successful run.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = OutboxStatus::Done;
        self.attempts += 1;
        self.last_error = None;
        self.processed_at = Some(now);
    }

    /// Record a failed run; the entry stays visible for inspection.
    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.status = OutboxStatus::Failed;
        self.attempts += 1;
        self.last_error = Some(error.into());
        self.processed_at = Some(now);
    }
}
