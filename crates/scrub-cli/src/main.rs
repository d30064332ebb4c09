//! Scrub CLI - rule-driven data cleaning tool.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Apply {
            file,
            rules,
            output_dir,
            output_filename,
            log_filename,
            format,
            with_audit,
            min_confidence,
            show_summary,
        } => commands::apply::run(commands::apply::ApplyArgs {
            file,
            rules,
            output_dir,
            output_filename,
            log_filename,
            format,
            with_audit,
            min_confidence,
            show_summary,
        }),

        Commands::Validate { rules, json } => commands::validate::run(rules, json, cli.verbose),

        Commands::Inspect { file, json } => commands::inspect::run(file, json, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` overrides the level chosen by `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
