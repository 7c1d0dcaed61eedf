//! Add command - map a file to an already-uploaded asset id

use crate::cli::args::AddArgs;
use crate::cli::commands::build_engine;
use crate::config::Config;
use crate::error::SyncResult;

/// Execute the add command
pub async fn execute(args: &AddArgs, config: &Config) -> SyncResult<()> {
    let mut engine = build_engine(config).await;
    engine.add_manual(&args.file, &args.asset_id).await
}
