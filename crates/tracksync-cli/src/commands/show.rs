use std::path::Path;

use tracksync_core::export::match_to_export_item;

use crate::commands::common::{
    format_match_detail, normalize_match_identifier, open_owner, resolve_match,
};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool, owner: &str, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_match_identifier(id)?;
    let (db, user) = open_owner(db_path, owner).await?;
    let record = resolve_match(&normalized_id, &db, &user).await?;

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&match_to_export_item(&record))?
        );
    } else {
        for line in format_match_detail(&record) {
            println!("{line}");
        }
    }

    Ok(())
}
