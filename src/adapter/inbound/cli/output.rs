//! Astral-style CLI output formatting.
//!
//! Provides consistent terminal output with support for JSON mode (for
//! scripting), quiet mode, color control and verbosity levels. Human output
//! goes to stdout; errors go to stderr.

use std::fmt::Display;
use std::sync::{OnceLock, RwLock};

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::error::Result;

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Verbosity level (0 = normal, 1+ = increasingly verbose).
    pub verbose: u8,
    /// Emit ANSI colors.
    pub color: bool,
}

impl OutputConfig {
    /// Create a new output configuration.
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8, color: bool) -> Self {
        Self {
            json,
            quiet,
            verbose,
            color,
        }
    }
}

/// Global output configuration singleton.
static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    match config_cell().read() {
        Ok(config) => *config,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn write_config(config: OutputConfig) {
    match config_cell().write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Check if regular (non-JSON) output should be suppressed.
fn regular_output_suppressed(config: OutputConfig) -> bool {
    !config.json && config.quiet
}

/// Emit a JSON line with type and payload structure.
fn emit_json_line(kind: &str, payload: serde_json::Value) {
    println!(
        "{}",
        json!({
            "type": kind,
            "payload": payload,
        })
    );
}

/// Apply `style` only when colors are enabled.
fn paint(config: OutputConfig, text: &str, style: impl Fn(&str) -> String) -> String {
    if config.color && !config.json {
        style(text)
    } else {
        text.to_string()
    }
}

/// Apply output settings from global CLI flags.
///
/// Call this early in the CLI entry point.
pub fn configure(config: OutputConfig) {
    write_config(config);
}

/// Return whether machine-readable JSON output is enabled.
#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

/// Return the global verbosity level from `-v` flags.
#[must_use]
pub fn verbosity() -> u8 {
    read_config().verbose
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let config = read_config();
    let value = value.to_string();

    if config.json {
        emit_json_line(
            "field",
            json!({
                "label": label,
                "value": value,
            }),
        );
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    let label = format!("{label:<14}");
    println!("  {} {}", paint(config, &label, |s| s.dimmed().to_string()), value);
}

/// Print a success line.
pub fn success(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("success", json!({ "message": message }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {} {}", paint(config, "✓", |s| s.green().to_string()), message);
}

/// Print a warning line.
pub fn warning(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("warning", json!({ "message": message }));
        return;
    }

    println!("  {} {}", paint(config, "⚠", |s| s.yellow().to_string()), message);
}

/// Print an error line.
pub fn error(message: &str) {
    let config = read_config();

    if config.json {
        eprintln!(
            "{}",
            json!({
                "type": "error",
                "payload": { "message": message },
            })
        );
        return;
    }

    eprintln!("  {} {}", paint(config, "×", |s| s.red().to_string()), message);
}

/// Print a section header.
pub fn section(title: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("section", json!({ "title": title }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!();
    println!("{}", paint(config, title, |s| s.bold().to_string()));
}

/// Print a note.
pub fn note(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("note", json!({ "message": message }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {}", paint(config, message, |s| s.dimmed().to_string()));
}

/// Print a hint with "hint:" prefix.
pub fn hint(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("hint", json!({ "message": message }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!(
        "  {}: {}",
        paint(config, "hint", |s| s.cyan().to_string()),
        paint(config, message, |s| s.dimmed().to_string())
    );
}

/// Print multiple lines of content, each indented.
pub fn lines(content: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("lines", json!({ "content": content }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    for line in content.lines() {
        println!("  {line}");
    }
}

/// Print rows as a table, or a note when there are none.
pub fn table<T: Tabled>(rows: Vec<T>, empty: &str) {
    if rows.is_empty() {
        note(empty);
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    lines(&table.to_string());
}

/// Emit a JSON value directly (for commands that need custom JSON output).
pub fn json_output(value: serde_json::Value) {
    println!("{value}");
}

/// Emit the result of a command as one JSON document.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn json_result(command: &str, value: &impl Serialize) -> Result<()> {
    json_output(json!({
        "command": command,
        "result": serde_json::to_value(value)?,
    }));
    Ok(())
}

/// Format a positive value in green.
pub fn positive(value: impl Display) -> String {
    paint(read_config(), &value.to_string(), |s| s.green().to_string())
}

/// Format a negative value in red.
pub fn negative(value: impl Display) -> String {
    paint(read_config(), &value.to_string(), |s| s.red().to_string())
}

/// Green when above zero, red when below.
pub fn signed(value: rust_decimal::Decimal) -> String {
    if value.is_sign_negative() && !value.is_zero() {
        negative(value)
    } else if value.is_zero() {
        value.to_string()
    } else {
        positive(format!("+{value}"))
    }
}

/// Format a highlighted value in cyan.
pub fn highlight(value: impl Display) -> String {
    paint(read_config(), &value.to_string(), |s| s.cyan().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn paint_respects_color_flag() {
        let plain = OutputConfig::new(false, false, 0, false);
        assert_eq!(paint(plain, "ok", |s| s.green().to_string()), "ok");

        let colored = OutputConfig::new(false, false, 0, true);
        assert_ne!(paint(colored, "ok", |s| s.green().to_string()), "ok");

        let json = OutputConfig::new(true, false, 0, true);
        assert_eq!(paint(json, "ok", |s| s.green().to_string()), "ok");
    }

    #[test]
    fn quiet_suppresses_only_human_output() {
        assert!(regular_output_suppressed(OutputConfig::new(false, true, 0, false)));
        assert!(!regular_output_suppressed(OutputConfig::new(true, true, 0, false)));
        assert!(!regular_output_suppressed(OutputConfig::default()));
    }

    #[test]
    fn signed_marks_direction_without_color() {
        assert_eq!(signed(dec!(0)), "0");
        assert_eq!(signed(dec!(-2.5)), "-2.5");
        assert_eq!(signed(dec!(3)), "+3");
    }
}
