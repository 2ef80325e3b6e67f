//! Path utilities for poolmarket.
//!
//! Operator files live under `~/.poolmarket/`:
//! - `~/.poolmarket/config.toml` - main configuration

use std::path::PathBuf;

/// Returns the poolmarket home directory (`~/.poolmarket/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".poolmarket")
}

/// Returns the default config file path (`~/.poolmarket/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Ensures the parent directory of a database file exists.
pub fn ensure_parent_dir(database: &str) -> std::io::Result<()> {
    match PathBuf::from(database).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
