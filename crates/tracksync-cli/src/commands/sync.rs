use std::path::Path;

use tracksync_core::config::TrackerConfig;
use tracksync_core::tracker::{MatchSource, TrackerClient};
use tracksync_core::{SyncRequest, SyncSummary};

use crate::commands::common::open_owner;
use crate::error::CliError;

pub async fn run_sync(
    request: &SyncRequest,
    as_json: bool,
    owner: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let config = TrackerConfig::from_env()?;
    config.require_api_key()?;
    let client = TrackerClient::new(config)?;

    let summary = sync_with_source(&client, request, owner, db_path).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Synced {} match(es) for {}#{}: {} imported, {} updated",
            summary.total(),
            request.query.handle,
            request.query.tag,
            summary.imported,
            summary.updated
        );
    }

    Ok(())
}

pub async fn sync_with_source<S: MatchSource>(
    source: &S,
    request: &SyncRequest,
    owner: &str,
    db_path: &Path,
) -> Result<SyncSummary, CliError> {
    let (db, user) = open_owner(db_path, owner).await?;
    Ok(db.sync_matches(source, &user, request).await?)
}
