//! Miette-based error diagnostics for CLI error presentation.
//!
//! Turns engine errors into diagnostics with a stable code per error
//! category and, where one exists, a hint on how to recover.

use std::fmt::Display;
use std::path::Path;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::error::{ConfigError as ConfigFailure, Error, ErrorKind, RiskError};

/// Configuration error with source location context.
///
/// Displays the configuration file content with a labeled span pointing
/// to the problematic location, along with an optional help message.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(poolmarket::config))]
pub struct ConfigError {
    /// Human-readable error message.
    pub message: String,

    /// Source content (typically the configuration file).
    #[source_code]
    pub src: String,

    /// Byte offset and length of the problematic region.
    #[label("here")]
    pub span: SourceSpan,

    /// Optional help text with suggestions for fixing the error.
    #[help]
    pub help: Option<String>,
}

impl ConfigError {
    /// Create a new configuration error with source location.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        src: impl Into<String>,
        offset: usize,
        len: usize,
    ) -> Self {
        Self {
            message: message.into(),
            src: src.into(),
            span: (offset, len).into(),
            help: None,
        }
    }

    /// Add a help suggestion to the error.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Any other command failure.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CommandError {
    /// Human-readable error message.
    pub message: String,

    /// Stable error category, e.g. `poolmarket::rejected`.
    pub code: String,

    /// Optional help text with suggestions for fixing the error.
    pub help: Option<String>,
}

impl Diagnostic for CommandError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(&self.code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.help
            .as_ref()
            .map(|help| Box::new(help) as Box<dyn Display + 'a>)
    }
}

impl CommandError {
    /// Wrap an engine error.
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        let category = match err.kind() {
            ErrorKind::Validation => "validation",
            ErrorKind::Rejected => "rejected",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Infrastructure => "infrastructure",
        };
        Self {
            message: err.to_string(),
            code: format!("poolmarket::{category}"),
            help: help_for(err),
        }
    }
}

fn help_for(err: &Error) -> Option<String> {
    let help = match err {
        Error::Risk(RiskError::InsufficientWalletBalance { .. }) => {
            "deposit funds with `poolmarket wallet deposit`"
        }
        Error::Risk(RiskError::SlippageExceeded { .. }) => {
            "quote the bet again with `poolmarket bet quote` and retry"
        }
        Error::Risk(RiskError::RateLimitExceeded { .. } | RiskError::BetCooldownActive { .. }) => {
            "wait a moment before placing another bet"
        }
        Error::Risk(RiskError::Unauthorized { .. }) => {
            "check the profile with `poolmarket user show`"
        }
        Error::NotFound { entity: "user", .. } => {
            "create the profile with `poolmarket user upsert`"
        }
        Error::NotFound { entity: "wallet", .. } => {
            "wallets open on the first `poolmarket wallet deposit`"
        }
        Error::Config(_) => "check the file with `poolmarket config validate`",
        Error::Connection(_) | Error::Database(_) => {
            "check the database path or pass one with --db"
        }
        _ => return None,
    };
    Some(help.to_string())
}

/// Render an engine error as a miette report.
///
/// TOML syntax errors point into the configuration file when it can be
/// read back.
#[must_use]
pub fn report(err: Error, config_path: Option<&Path>) -> miette::Report {
    if let Error::Config(ConfigFailure::Parse(parse)) = &err {
        let source = config_path.and_then(|p| std::fs::read_to_string(p).ok());
        if let (Some(src), Some(span)) = (source, parse.span()) {
            let diagnostic = ConfigError::new(parse.message(), src, span.start, span.len())
                .with_help("see `poolmarket config show` for the expected layout");
            return miette::Report::new(diagnostic);
        }
    }
    miette::Report::new(CommandError::from_error(&err))
}
