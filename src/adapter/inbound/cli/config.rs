//! Handler for the `config` command group.

use std::path::Path;

use crate::adapter::inbound::cli::command::ConfigCommand;
use crate::adapter::inbound::cli::output;
use crate::error::{Error, Result};
use crate::infrastructure::config::Config;

/// Execute a `config` subcommand against the already loaded configuration.
pub fn execute(config: &Config, path: &Path, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => show(config, path),
        ConfigCommand::Validate => validate(config, path),
    }
}

fn show(config: &Config, path: &Path) -> Result<()> {
    if output::is_json() {
        return output::json_result("config.show", config);
    }
    let rendered = toml::to_string_pretty(config).map_err(|e| Error::Parse(e.to_string()))?;

    output::section("Effective Configuration");
    output::field("File", source_label(path));
    output::field("Database", &config.database);
    output::section("Settings");
    output::lines(&rendered);
    Ok(())
}

fn validate(config: &Config, path: &Path) -> Result<()> {
    config.validate()?;
    if output::is_json() {
        return output::json_result(
            "config.validate",
            &serde_json::json!({ "valid": true, "file": path.display().to_string() }),
        );
    }
    output::success("Configuration is valid");
    output::field("File", source_label(path));
    Ok(())
}

fn source_label(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    }
}
