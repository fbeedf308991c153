//! # aid-validate entry point
//!
//! Parses arguments, installs logging, runs the validation and maps the
//! outcome to an exit code: 0 passed, 1 failed, 2 operational error.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use aid_cli::{run_validate, Outcome, ValidateArgs};

/// Validate Agent Interface Discovery manifests and TXT advertisement records.
#[derive(Parser, Debug)]
#[command(name = "aid-validate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    args: ValidateArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "aid-validate starting");

    match run_validate(&cli.args) {
        Ok(outcome) => {
            match &outcome {
                Outcome::Passed { advertisement } => {
                    if !cli.args.quiet {
                        println!("✓ validation passed");
                    }
                    if let Some(line) = advertisement {
                        println!("{line}");
                    }
                }
                Outcome::Failed(message) => {
                    if !cli.args.quiet {
                        eprintln!("❌ {message}");
                    }
                }
            }
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
