//! CLI command implementations

pub mod add;
pub mod clean;
pub mod config;
pub mod library;
pub mod sync;
pub mod watch;

pub use add::execute as add;
pub use clean::execute as clean;
pub use config::execute as config;
pub use library::{install, publish};
pub use sync::execute as sync;
pub use watch::execute as watch;

use crate::config::Config;
use crate::remote::{GitHubSharedMap, RobloxContentStore, SharedMapStore};
use crate::store::AssetDb;
use crate::sync::SyncEngine;

/// Build the engine every sync-flavored command runs on
pub(crate) async fn build_engine(config: &Config) -> SyncEngine {
    let db = AssetDb::load(
        config.sync.cache_path.clone(),
        config.sync.output_path.clone(),
    )
    .await;
    let store = RobloxContentStore::new(&config.store);
    SyncEngine::new(db, Box::new(store), config)
}

/// Shared map client when a repository is configured
pub(crate) fn shared_store(config: &Config) -> Option<Box<dyn SharedMapStore>> {
    config.shared.repo.as_ref().map(|repo| {
        Box::new(GitHubSharedMap::new(
            repo.clone(),
            config.shared.branch.clone(),
            config.shared.map_path.clone(),
        )) as Box<dyn SharedMapStore>
    })
}
