use bugboard::cli::commands;
use bugboard::cli::{Cli, Commands};
use bugboard::config::Settings;
use bugboard::logging::{LogFormat, init_logging};
use bugboard::{StructuredError, TrackerError};
use clap::Parser;
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    if let Err(e) = init_logging(cli.verbose, cli.quiet, format) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = cli.overrides();
    let settings = match Settings::load(cli.config.as_deref(), &overrides) {
        Ok(settings) => settings,
        Err(e) => handle_error(&e, cli.json),
    };

    let mode = cli.output_mode();
    let result = match &cli.command {
        Commands::Serve(_) => commands::serve::execute(&settings),
        Commands::Stats(args) => commands::stats::execute(args, mode, &settings),
        Commands::Seed(args) => commands::seed::execute(args, mode, &settings),
        Commands::Projects => commands::projects::execute(mode, &settings),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Render an error and exit with its category's code.
///
/// JSON goes to stderr when `--json` is set or stdout is not a terminal;
/// otherwise a human-readable message with an optional hint.
fn handle_error(err: &TrackerError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    if json_mode || !io::stdout().is_terminal() {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}
