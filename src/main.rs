use clap::Parser;

use poolmarket::adapter::inbound::cli::command::Cli;
use poolmarket::adapter::inbound::cli::output::{self, OutputConfig};
use poolmarket::adapter::inbound::cli::{color_enabled, config_path, diagnostic, run};

fn main() -> miette::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::configure(OutputConfig::new(
        cli.json,
        cli.quiet,
        cli.verbose,
        color_enabled(&cli.color),
    ));

    let path = config_path(&cli);
    run(cli).map_err(|e| diagnostic::report(e, Some(&path)))
}
