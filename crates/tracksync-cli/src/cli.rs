use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tracksync")]
#[command(about = "Sync Tracker.gg Valorant match history into a local database")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file (or TRACKSYNC_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Local owner account the matches belong to (or TRACKSYNC_OWNER)
    #[arg(long, global = true, value_name = "NAME")]
    pub owner: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a player's match history and upsert it
    Sync {
        /// Riot handle (the part before `#`)
        #[arg(long)]
        handle: String,
        /// Riot tag (the part after `#`)
        #[arg(long)]
        tag: String,
        /// Region override (defaults to TRACKER_GG_REGION)
        #[arg(long)]
        region: Option<String>,
        /// Only sync the match with this Tracker.gg id
        #[arg(long, value_name = "ID")]
        match_id: Option<String>,
        /// Output the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List synced matches
    List {
        /// Number of matches to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Include archived matches
        #[arg(long)]
        archived: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a match scoreboard
    Show {
        /// Match ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Archive a match (a later sync revives it)
    Archive {
        /// Match ID or unique ID prefix
        id: String,
    },
    /// Permanently delete a match
    Delete {
        /// Match ID or unique ID prefix
        id: String,
    },
    /// Export matches
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Include archived matches
        #[arg(long)]
        archived: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl From<ExportFormat> for tracksync_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}
