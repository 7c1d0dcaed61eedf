//! Clean command - drop unreferenced cache entries

use crate::cli::commands::build_engine;
use crate::config::Config;
use crate::error::SyncResult;

/// Execute the clean command
pub async fn execute(config: &Config) -> SyncResult<()> {
    let mut engine = build_engine(config).await;
    engine.clean_cache();
    engine.save().await
}
