use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracksync_core::models::{MatchState, User};
use tracksync_core::services::DatabaseService;
use tracksync_core::{Match, MatchId};

use crate::error::CliError;

pub const DEFAULT_OWNER: &str = "default";

#[derive(Debug, Serialize)]
pub struct MatchListItem {
    pub id: String,
    pub tracker_match_id: String,
    pub map_name: Option<String>,
    pub mode: Option<String>,
    pub scoreline: String,
    pub played_at: Option<i64>,
    pub played_at_iso: Option<String>,
    pub relative_time: String,
    pub state: MatchState,
    pub players: usize,
}

pub async fn open_database(path: &Path) -> Result<DatabaseService, CliError> {
    Ok(DatabaseService::open_path(path).await?)
}

/// Open the database and resolve the owner account in one step.
pub async fn open_owner(path: &Path, owner: &str) -> Result<(DatabaseService, User), CliError> {
    let db = open_database(path).await?;
    let user = db.get_or_create_user(owner).await?;
    Ok((db, user))
}

pub async fn list_all_matches(
    db: &DatabaseService,
    owner: &User,
    include_archived: bool,
) -> Result<Vec<Match>, CliError> {
    const PAGE_SIZE: usize = 200;

    let mut matches = Vec::new();
    let mut offset = 0usize;

    loop {
        let batch = db
            .list_matches(owner, include_archived, PAGE_SIZE, offset)
            .await?;
        let count = batch.len();
        matches.extend(batch);

        if count < PAGE_SIZE {
            break;
        }
        offset += count;
    }

    Ok(matches)
}

pub async fn resolve_match(
    match_query: &str,
    db: &DatabaseService,
    owner: &User,
) -> Result<Match, CliError> {
    if let Ok(match_id) = match_query.parse::<MatchId>() {
        if let Some(record) = db.get_match(owner, &match_id).await? {
            return Ok(record);
        }
    }

    let matching_ids = db.list_match_ids_by_prefix(owner, match_query, 3).await?;

    match matching_ids.as_slice() {
        [] => Err(CliError::MatchNotFound(match_query.to_string())),
        [only] => {
            let resolved_id = only
                .parse::<MatchId>()
                .map_err(|_| CliError::MatchNotFound(match_query.to_string()))?;
            db.get_match(owner, &resolved_id)
                .await?
                .ok_or_else(|| CliError::MatchNotFound(match_query.to_string()))
        }
        _ => {
            let options = matching_ids
                .iter()
                .map(|id| short_id(id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousMatchId(format!(
                "ID prefix '{match_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn format_match_lines(matches: &[Match]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    matches
        .iter()
        .map(|record| {
            let id = short_id(&record.id.to_string());
            let map = record.map_name.as_deref().unwrap_or("?");
            let mode = record.mode.as_deref().unwrap_or("?");
            let scoreline = record.scoreline();
            let relative_time =
                format_relative_time(record.played_at.unwrap_or(record.created_at), now_ms);

            if record.is_archived() {
                format!("{id:<13}  {map:<10}  {mode:<12}  {scoreline:<7}  {relative_time:<10}  [archived]")
            } else {
                format!("{id:<13}  {map:<10}  {mode:<12}  {scoreline:<7}  {relative_time}")
            }
        })
        .collect()
}

pub fn match_to_list_item(record: &Match) -> MatchListItem {
    let now_ms = Utc::now().timestamp_millis();

    MatchListItem {
        id: record.id.to_string(),
        tracker_match_id: record.tracker_match_id.clone(),
        map_name: record.map_name.clone(),
        mode: record.mode.clone(),
        scoreline: record.scoreline(),
        played_at: record.played_at,
        played_at_iso: record.played_at.map(format_timestamp),
        relative_time: format_relative_time(record.played_at.unwrap_or(record.created_at), now_ms),
        state: record.state(),
        players: record.players.len(),
    }
}

/// Scoreboard lines for a single match, grouped by team.
pub fn format_match_detail(record: &Match) -> Vec<String> {
    let mut lines = vec![
        format!("Match     {}", record.id),
        format!("Tracker   {}", record.tracker_match_id),
        format!(
            "Map       {} ({})",
            record.map_name.as_deref().unwrap_or("unknown"),
            record.mode.as_deref().unwrap_or("unknown mode")
        ),
        format!("Score     {}", record.scoreline()),
        format!(
            "Played    {}",
            record
                .played_at
                .map_or_else(|| "unknown".to_string(), format_timestamp)
        ),
    ];
    if let Some(archived_at) = record.archived_at {
        lines.push(format!("Archived  {}", format_timestamp(archived_at)));
    }

    for team in &record.teams {
        lines.push(String::new());
        let name = if team.name.is_empty() {
            "Unnamed team"
        } else {
            team.name.as_str()
        };
        lines.push(match team.score {
            Some(score) => format!("{name} ({score})"),
            None => name.to_string(),
        });
        lines.extend(record.players_of(team.id).map(format_player_line));
    }

    let teamless = record
        .players
        .iter()
        .filter(|player| !player.team_id.is_some_and(|id| record.team(id).is_some()))
        .map(format_player_line)
        .collect::<Vec<_>>();
    if !teamless.is_empty() {
        lines.push(String::new());
        lines.push("No team".to_string());
        lines.extend(teamless);
    }

    lines
}

fn format_player_line(player: &tracksync_core::models::MatchPlayer) -> String {
    let riot_id = player.riot_id().unwrap_or_else(|| "?".to_string());
    let agent = player.agent.as_deref().unwrap_or("-");
    format!(
        "  {riot_id:<24}  {agent:<10}  {}/{}/{}  {:.2}",
        player.stat.kills,
        player.stat.deaths,
        player.stat.assists,
        player.stat.kd_ratio()
    )
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_match_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyMatchId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("TRACKSYNC_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tracksync")
        .join("tracksync.db")
}

pub fn resolve_owner(cli_owner: Option<String>) -> String {
    pick_owner(cli_owner, env::var("TRACKSYNC_OWNER").ok())
}

/// First non-blank candidate, falling back to [`DEFAULT_OWNER`].
pub fn pick_owner(cli_owner: Option<String>, env_owner: Option<String>) -> String {
    [cli_owner, env_owner]
        .into_iter()
        .flatten()
        .map(|owner| owner.trim().to_string())
        .find(|owner| !owner.is_empty())
        .unwrap_or_else(|| DEFAULT_OWNER.to_string())
}
