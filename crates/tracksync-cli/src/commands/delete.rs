use std::path::Path;

use crate::commands::common::{normalize_match_identifier, open_owner, resolve_match};
use crate::error::CliError;

pub async fn run_delete(id: &str, owner: &str, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_match_identifier(id)?;
    let (db, user) = open_owner(db_path, owner).await?;
    let record = resolve_match(&normalized_id, &db, &user).await?;

    db.delete_match(&user, &record.id).await?;
    println!("{}", record.id);
    Ok(())
}
