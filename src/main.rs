//! rbxsync - Content-addressed asset sync for Roblox
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use rbxsync::cli::{Cli, Commands};
use rbxsync::config::ConfigManager;
use rbxsync::error::SyncResult;
use std::process::ExitCode;
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

async fn run() -> SyncResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("rbxsync=warn"),
        1 => EnvFilter::new("rbxsync=info"),
        _ => EnvFilter::new("rbxsync=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let base = manager.load().await?;

    match cli.command {
        Commands::Sync(args) => {
            let mut config = base;
            config.apply_overrides(&args.overrides);
            rbxsync::cli::commands::sync(&config).await
        }
        Commands::Watch(args) => {
            let mut config = base;
            config.apply_overrides(&args.overrides);
            rbxsync::cli::commands::watch(&args, &config).await
        }
        Commands::Clean(args) => {
            let mut config = base;
            config.apply_overrides(&args.overrides);
            rbxsync::cli::commands::clean(&config).await
        }
        Commands::Add(args) => {
            let mut config = base;
            config.apply_overrides(&args.overrides);
            rbxsync::cli::commands::add(&args, &config).await
        }
        Commands::Install(args) => {
            let mut config = base;
            config.apply_overrides(&args.overrides);
            rbxsync::cli::commands::install(&args, &config).await
        }
        Commands::Publish(args) => {
            let mut config = base;
            config.apply_overrides(&args.overrides);
            rbxsync::cli::commands::publish(&args, &config).await
        }
        Commands::Config(args) => rbxsync::cli::commands::config(&args, &base, &manager).await,
    }
}
