//! Install and publish commands for namespaced asset libraries

use crate::cli::args::LibraryArgs;
use crate::cli::commands::{build_engine, shared_store};
use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::library;
use crate::remote::SharedMapStore;

fn require_shared(config: &Config) -> SyncResult<Box<dyn SharedMapStore>> {
    shared_store(config).ok_or_else(|| {
        SyncError::User(
            "no shared map repository configured: set shared.repo in rbxsync.toml or pass --repo"
                .to_string(),
        )
    })
}

/// Execute the install command
pub async fn install(args: &LibraryArgs, config: &Config) -> SyncResult<()> {
    let shared = require_shared(config)?;
    let mut engine = build_engine(config).await;
    library::install(&mut engine, shared.as_ref(), &args.namespace).await
}

/// Execute the publish command
pub async fn publish(args: &LibraryArgs, config: &Config) -> SyncResult<()> {
    let shared = require_shared(config)?;
    let engine = build_engine(config).await;
    library::publish(&engine, shared.as_ref(), &args.namespace).await
}
