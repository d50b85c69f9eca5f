//! Composer Layer - buildpack entry point
//!
//! CLI entry point that dispatches to `detect` or `build`.

use clap::Parser;
use composer_layer::cli::{Cli, Commands};
use composer_layer::config::BuildConfig;
use composer_layer::detect::DETECT_FAIL_EXIT_CODE;
use composer_layer::error::{ComposerError, ComposerResult};
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ComposerError::DetectFailed(reason)) => {
            eprintln!("{} {}", style("Detect failed:").yellow(), reason);
            ExitCode::from(DETECT_FAIL_EXIT_CODE)
        }
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ComposerResult<()> {
    let cli = Cli::parse();

    // Configuration comes from the environment exactly once
    let config = BuildConfig::from_env();

    // 0 = warn, 1 = info, 2+ or BP_LOG_LEVEL=DEBUG = debug
    let filter = match (cli.verbose, config.is_debug()) {
        (_, true) | (2.., _) => EnvFilter::new("composer_layer=debug"),
        (1, _) => EnvFilter::new("composer_layer=info"),
        _ => EnvFilter::new("composer_layer=warn"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Detect(args) => composer_layer::cli::commands::detect(args, &config).await,
        Commands::Build(args) => composer_layer::cli::commands::build(args, &config).await,
    }
}
