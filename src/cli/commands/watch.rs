//! Watch command - continuous sync until interrupted

use crate::cli::args::WatchArgs;
use crate::cli::commands::{build_engine, shared_store};
use crate::config::Config;
use crate::error::SyncResult;
use crate::watch;

/// Execute the watch command
pub async fn execute(args: &WatchArgs, config: &Config) -> SyncResult<()> {
    let mut watch_config = config.watch.clone();
    if let Some(debounce) = args.debounce {
        watch_config.debounce_ms = debounce;
    }

    let mut engine = build_engine(config).await;
    let shared = shared_store(config);

    watch::run(&mut engine, shared.as_deref(), &watch_config).await
}
