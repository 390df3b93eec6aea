//! reelgap - find missing movies and TV episodes
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use reelgap::cli::args::ConfigAction;
use reelgap::cli::{Cli, Commands};
use reelgap::config::{Config, ConfigManager};
use reelgap::error::ReelgapResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ReelgapResult<()> {
    let cli = Cli::parse();
    let globals = cli.globals();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // These must work even when the file does not parse
    let needs_config = !matches!(
        &cli.command,
        Commands::Config(args) if matches!(
            args.action,
            Some(ConfigAction::Path | ConfigAction::Init { .. } | ConfigAction::Set { .. })
        )
    );
    let config = if needs_config {
        config_manager.load().await?
    } else {
        Config::default()
    };

    init_logging(cli.verbose, &config.general.log_format);
    debug!("Using config file {}", config_manager.path().display());

    reelgap::ui::init_theme();

    match cli.command {
        Commands::Movies(args) => reelgap::cli::commands::movies(args, &config, globals).await,
        Commands::Episodes(args) => reelgap::cli::commands::episodes(args, &config, globals).await,
        Commands::Scan(args) => reelgap::cli::commands::combined(args, &config, globals).await,
        Commands::Config(args) => {
            reelgap::cli::commands::config(args, &config, &config_manager).await
        }
        Commands::Cache(args) => reelgap::cli::commands::cache(args, &config).await,
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug; `RUST_LOG` wins when set
fn init_logging(verbose: u8, log_format: &str) {
    let default = match verbose {
        0 => "reelgap=warn",
        1 => "reelgap=info",
        _ => "reelgap=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
