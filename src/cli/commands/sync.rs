//! Sync command - one full pass over the search path

use crate::cli::commands::{build_engine, shared_store};
use crate::config::Config;
use crate::error::SyncResult;
use crate::reconcile;

/// Execute the sync command
pub async fn execute(config: &Config) -> SyncResult<()> {
    let mut engine = build_engine(config).await;
    let shared = shared_store(config);

    if let Some(ref shared) = shared {
        reconcile::pull(&mut engine, shared.as_ref()).await;
    }

    engine.sync_all().await?;

    if let Some(ref shared) = shared {
        reconcile::push(&engine, shared.as_ref()).await;
    }

    Ok(())
}
