use std::path::Path;

use crate::commands::common::{format_match_lines, match_to_list_item, open_owner, MatchListItem};
use crate::error::CliError;

pub async fn run_list(
    limit: usize,
    include_archived: bool,
    as_json: bool,
    owner: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let (db, user) = open_owner(db_path, owner).await?;
    let matches = db.list_matches(&user, include_archived, limit, 0).await?;

    if as_json {
        let json_items = matches
            .iter()
            .map(match_to_list_item)
            .collect::<Vec<MatchListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if matches.is_empty() {
        println!("No matches synced yet.");
    } else {
        for line in format_match_lines(&matches) {
            println!("{line}");
        }
    }

    Ok(())
}
