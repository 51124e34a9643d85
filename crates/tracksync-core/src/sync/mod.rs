//! Match sync: fetch, merge and persist a player's match history.
//!
//! A sync is keyed by `(owner, tracker match id)`. Re-syncing a match keeps
//! its row and creation time, overwrites the scalar fields and rebuilds its
//! teams, players and stats from the latest provider record. All staged
//! matches are committed together; a failure leaves the store untouched.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::MatchRepository;
use crate::models::{Match, MatchId, MatchPlayer, MatchTeam, PlayerStat, User, UserId};
use crate::tracker::{MatchSource, NormalizedMatch, NormalizedPlayer, PlayerQuery};
use crate::Result;

/// Naive timestamp layouts accepted for `played_at`, read as UTC
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parameters of one sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub query: PlayerQuery,
    /// Restrict the run to a single provider match id
    pub match_id: Option<String>,
}

impl SyncRequest {
    pub const fn new(query: PlayerQuery) -> Self {
        Self {
            query,
            match_id: None,
        }
    }

    #[must_use]
    pub fn with_match_id(mut self, match_id: Option<String>) -> Self {
        self.match_id = match_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        self
    }
}

/// Outcome counters of a sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Matches seen for the first time
    pub imported: usize,
    /// Matches that already existed for the owner
    pub updated: usize,
}

impl SyncSummary {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.imported + self.updated
    }
}

/// Sync service over a match repository; the match source is passed per call
pub struct MatchSyncService<'a, R> {
    repo: &'a R,
}

impl<'a, R: MatchRepository> MatchSyncService<'a, R> {
    pub const fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Fetch the owner's match history from `source` and upsert every record.
    pub async fn sync<S: MatchSource>(
        &self,
        source: &S,
        owner: &User,
        request: &SyncRequest,
    ) -> Result<SyncSummary> {
        let records = source.fetch_matches(&request.query).await?;
        let records = filter_records(records, request.match_id.as_deref());
        let now = Utc::now().timestamp_millis();

        let mut staged: Vec<Match> = Vec::with_capacity(records.len());
        let mut staged_index: HashMap<String, usize> = HashMap::new();
        let mut summary = SyncSummary::default();

        for record in &records {
            if let Some(slot) = staged_index
                .get(&record.external_id)
                .and_then(|&index| staged.get_mut(index))
            {
                // Repeated id in one response: the later record wins
                *slot = merge_record(Some(slot.clone()), record, owner.id, now);
                continue;
            }

            let existing = self
                .repo
                .find_by_tracker_id(&owner.id, &record.external_id)
                .await?;
            if existing.is_some() {
                summary.updated += 1;
            } else {
                summary.imported += 1;
            }

            staged_index.insert(record.external_id.clone(), staged.len());
            staged.push(merge_record(existing, record, owner.id, now));
        }

        self.repo.save_all(&staged).await?;

        tracing::info!(
            imported = summary.imported,
            updated = summary.updated,
            "Synced matches for {}#{} (owner {})",
            request.query.handle,
            request.query.tag,
            owner.username
        );
        Ok(summary)
    }

    /// Soft-archive one of the owner's matches. Children are left untouched.
    pub async fn archive(&self, owner: &User, id: &MatchId) -> Result<Match> {
        let archived = self.repo.archive(&owner.id, id).await?;
        tracing::info!("Archived match {} for {}", id, owner.username);
        Ok(archived)
    }

    /// Permanently delete one of the owner's matches with its children.
    pub async fn delete(&self, owner: &User, id: &MatchId) -> Result<()> {
        self.repo.delete(&owner.id, id).await?;
        tracing::info!("Deleted match {} for {}", id, owner.username);
        Ok(())
    }
}

fn filter_records(records: Vec<NormalizedMatch>, match_id: Option<&str>) -> Vec<NormalizedMatch> {
    match match_id {
        Some(wanted) => records
            .into_iter()
            .filter(|record| record.external_id == wanted)
            .collect(),
        None => records,
    }
}

/// Merge a normalized record into the owner's existing match, or a new shell.
///
/// Scalars are overwritten, the archive flag is cleared and the team/player
/// graph is rebuilt with fresh row ids. The first two teams in provider order
/// supply `score_team_a` and `score_team_b`.
#[must_use]
pub fn merge_record(
    existing: Option<Match>,
    record: &NormalizedMatch,
    owner_id: UserId,
    now: i64,
) -> Match {
    let mut target =
        existing.unwrap_or_else(|| Match::new(owner_id, record.external_id.clone(), now));

    target.map_name = record.map_name.clone();
    target.mode = record.mode.clone();
    target.played_at = record.played_at.as_deref().and_then(parse_played_at);
    target.duration = record.duration;
    target.raw_payload = record.raw.clone();
    target.updated_at = now;
    target.archived_at = None;

    let teams: Vec<MatchTeam> = record
        .teams
        .iter()
        .map(|team| {
            MatchTeam::new(
                team.name.clone().unwrap_or_default(),
                team.side.clone(),
                team.score,
            )
        })
        .collect();
    target.score_team_a = teams.first().and_then(|team| team.score);
    target.score_team_b = teams.get(1).and_then(|team| team.score);

    // Unnamed teams are stored but never linked to players.
    let team_ids: HashMap<&str, Uuid> = record
        .teams
        .iter()
        .zip(&teams)
        .filter_map(|(source, team)| source.name.as_deref().map(|name| (name, team.id)))
        .collect();
    target.players = record
        .players
        .iter()
        .map(|player| build_player(player, &team_ids))
        .collect();
    target.teams = teams;

    target
}

fn build_player(player: &NormalizedPlayer, team_ids: &HashMap<&str, Uuid>) -> MatchPlayer {
    MatchPlayer {
        id: Uuid::now_v7(),
        team_id: player
            .team_name
            .as_deref()
            .and_then(|name| team_ids.get(name).copied()),
        tracker_player_id: player.external_id.clone(),
        handle: player.handle.clone(),
        tag: player.tag.clone(),
        agent: player.agent.clone(),
        stat: PlayerStat {
            kills: player.stats.kills.unwrap_or(0),
            deaths: player.stats.deaths.unwrap_or(0),
            assists: player.stats.assists.unwrap_or(0),
            headshots: player.stats.headshots,
            damage: player.stats.damage,
            weapons: player.weapons.clone(),
            timing: player.timing.clone(),
            extra: player.extra.clone(),
        },
    }
}

/// Parse a provider start time into Unix milliseconds.
///
/// Accepts RFC 3339, naive date-times (read as UTC), bare dates and integer
/// epochs in seconds or milliseconds. Anything else yields `None`.
pub fn parse_played_at(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp_millis());
    }

    if let Some(parsed) = NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(parsed.and_utc().timestamp_millis());
    }

    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Some(midnight.and_utc().timestamp_millis());
    }

    if let Ok(epoch) = raw.parse::<i64>() {
        // Ten-digit values are seconds, thirteen-digit values milliseconds
        return Some(if epoch.abs() < 100_000_000_000 {
            epoch.saturating_mul(1000)
        } else {
            epoch
        });
    }

    tracing::debug!("Ignoring unparseable played-at value {raw:?}");
    None
}
