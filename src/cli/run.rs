//! CLI entry point and dispatch
//!
//! `run()` owns all terminal output, including errors. It parses arguments,
//! loads configuration, installs tracing and hands off to a command.

use clap::Parser;
use marginalia_config::Config;
use marginalia_utils::logging::{init_tracing, init_tracing_json};

use super::args::{Cli, Commands};
use super::commands;
use crate::error_report::report_anyhow;
use crate::exit_codes::ExitCode;

/// Main CLI execution function. main.rs maps the `Err` to a process exit.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    let cli_args = cli.to_cli_args();

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", report_anyhow(&err, "config"));
            return Err(ExitCode::CONFIG);
        }
    };

    init_logging(&config);

    match cli.command {
        Commands::Interview(args) => commands::interview::execute(&config, args),
        Commands::Discover { binary } => commands::discover::execute(&config, binary.as_deref()),
        Commands::Config => commands::config::execute(&config),
    }
}

fn init_logging(config: &Config) {
    let result = if config.log_format() == "json" {
        init_tracing_json(config.verbose())
    } else {
        init_tracing(config.verbose())
    };
    if let Err(err) = result {
        eprintln!("warning: logging unavailable: {err}");
    }
}
