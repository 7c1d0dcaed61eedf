//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// rbxsync - Content-addressed asset sync for Roblox
///
/// Uploads local asset files to the Roblox content store, deduplicated by
/// content fingerprint, and generates a typed asset map module for game code.
#[derive(Parser, Debug)]
#[command(name = "rbxsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RBXSYNC_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync all assets under the search path once
    Sync(SyncArgs),

    /// Watch the search path and sync continuously
    Watch(WatchArgs),

    /// Remove cache entries no path references
    Clean(SyncArgs),

    /// Map a file to an already-uploaded asset id
    Add(AddArgs),

    /// Install a published asset library
    Install(LibraryArgs),

    /// Publish local assets as a namespaced library
    Publish(LibraryArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Config file overrides shared by the sync-flavored commands
#[derive(Args, Debug)]
pub struct OverrideArgs {
    /// Directory to scan for asset files
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Cache file location
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Generated asset map location
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Alpha-bleed images before upload
    #[arg(long)]
    pub bleed: bool,

    /// Shared map repository (owner/repo)
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Shared map branch
    #[arg(long)]
    pub branch: Option<String>,
}

/// Arguments for the sync and clean commands
#[derive(Parser, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for the watch command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Quiet period before reconciliation, milliseconds
    #[arg(long)]
    pub debounce: Option<u64>,
}

/// Arguments for the add command
#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Local file to map
    pub file: PathBuf,

    /// Asset id the file is already uploaded as (numeric)
    pub asset_id: String,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for the install and publish commands
#[derive(Parser, Debug)]
pub struct LibraryArgs {
    /// Library namespace (without the leading @)
    pub namespace: String,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
