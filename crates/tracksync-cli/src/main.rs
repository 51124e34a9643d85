//! tracksync CLI - sync Tracker.gg Valorant match history into a local database
//!
//! Every command works on the matches of one local owner (`--owner`).

mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracksync_core::tracker::PlayerQuery;
use tracksync_core::SyncRequest;

use crate::cli::{Cli, Commands};
use crate::commands::archive::run_archive;
use crate::commands::common::{resolve_db_path, resolve_owner};
use crate::commands::delete::run_delete;
use crate::commands::export::run_export;
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let owner = resolve_owner(cli.owner);

    match cli.command {
        Commands::Sync {
            handle,
            tag,
            region,
            match_id,
            json,
        } => {
            let request = SyncRequest::new(PlayerQuery::new(handle, tag).with_region(region))
                .with_match_id(match_id);
            run_sync(&request, json, &owner, &db_path).await?;
        }
        Commands::List {
            limit,
            archived,
            json,
        } => run_list(limit, archived, json, &owner, &db_path).await?,
        Commands::Show { id, json } => run_show(&id, json, &owner, &db_path).await?,
        Commands::Archive { id } => run_archive(&id, &owner, &db_path).await?,
        Commands::Delete { id } => run_delete(&id, &owner, &db_path).await?,
        Commands::Export {
            format,
            output,
            archived,
        } => run_export(format, output.as_deref(), archived, &owner, &db_path).await?,
    }

    Ok(())
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "tracksync=info".parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
