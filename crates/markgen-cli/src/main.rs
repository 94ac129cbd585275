//! # markgen CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use markgen_cli::commands::{run_check, run_generate, GlobalOptions, PipelineArgs};
use markgen_cli::help::{run_markers, MarkersArgs};

/// markgen: compile comment markers into resource definitions, access
/// rules, webhook configurations and metrics configuration.
#[derive(Parser, Debug)]
#[command(name = "markgen", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Exit with status 2 when any diagnostic is reported.
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every enabled generator and write the results.
    Generate(PipelineArgs),

    /// Run every enabled generator and print diagnostics only.
    Check(PipelineArgs),

    /// Print the marker catalog.
    Markers(MarkersArgs),
}

fn filter_for(verbose: u8) -> EnvFilter {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return EnvFilter::from_default_env();
    }
    match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = filter_for(cli.verbose);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "markgen starting");

    let global = GlobalOptions {
        config: cli.config.clone(),
        strict: cli.strict,
    };

    let result = match &cli.command {
        Commands::Generate(args) => run_generate(args, &global),
        Commands::Check(args) => run_check(args, &global),
        Commands::Markers(args) => run_markers(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
