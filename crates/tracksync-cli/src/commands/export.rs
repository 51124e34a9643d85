use std::path::Path;

use chrono::Utc;
use tracksync_core::export::{render_matches_export, suggested_export_file_name};

use crate::cli::ExportFormat;
use crate::commands::common::{list_all_matches, open_owner};
use crate::error::CliError;

pub async fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    include_archived: bool,
    owner: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let (db, user) = open_owner(db_path, owner).await?;
    let matches = list_all_matches(&db, &user, include_archived).await?;
    let rendered = render_matches_export(&matches, format.into())?;

    if let Some(path) = output_path {
        // A directory target gets a timestamped file name
        let path = if path.is_dir() {
            path.join(suggested_export_file_name(
                format.into(),
                Utc::now().timestamp_millis(),
            ))
        } else {
            path.to_path_buf()
        };
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}
