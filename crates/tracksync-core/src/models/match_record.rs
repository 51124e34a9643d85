//! Synced match graph: match, teams, players and per-player stats

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::UserId;

/// A unique identifier for a stored match, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Create a new unique match ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle state derived from `archived_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    Active,
    Archived,
}

/// A match imported from the external provider for one owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub owner_id: UserId,
    /// Provider match identifier, unique per owner
    pub tracker_match_id: String,
    pub map_name: Option<String>,
    pub mode: Option<String>,
    /// Start time (Unix ms); `None` when the provider value did not parse
    pub played_at: Option<i64>,
    pub duration: Option<i64>,
    /// Score of the first team in provider order
    pub score_team_a: Option<i64>,
    /// Score of the second team in provider order
    pub score_team_b: Option<i64>,
    /// Original provider record, kept for audit
    pub raw_payload: serde_json::Value,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
    /// Soft-archive timestamp (Unix ms)
    pub archived_at: Option<i64>,
    pub teams: Vec<MatchTeam>,
    pub players: Vec<MatchPlayer>,
}

impl Match {
    /// Create an empty match shell for a first-time import
    #[must_use]
    pub fn new(owner_id: UserId, tracker_match_id: impl Into<String>, now: i64) -> Self {
        Self {
            id: MatchId::new(),
            owner_id,
            tracker_match_id: tracker_match_id.into(),
            map_name: None,
            mode: None,
            played_at: None,
            duration: None,
            score_team_a: None,
            score_team_b: None,
            raw_payload: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
            archived_at: None,
            teams: Vec::new(),
            players: Vec::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> MatchState {
        if self.archived_at.is_some() {
            MatchState::Archived
        } else {
            MatchState::Active
        }
    }

    #[must_use]
    pub const fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Find a team by its row id
    #[must_use]
    pub fn team(&self, id: Uuid) -> Option<&MatchTeam> {
        self.teams.iter().find(|team| team.id == id)
    }

    /// Players linked to the given team
    pub fn players_of(&self, team_id: Uuid) -> impl Iterator<Item = &MatchPlayer> {
        self.players
            .iter()
            .filter(move |player| player.team_id == Some(team_id))
    }

    /// Short scoreline such as `13-11`, or `-` when unknown
    #[must_use]
    pub fn scoreline(&self) -> String {
        match (self.score_team_a, self.score_team_b) {
            (Some(a), Some(b)) => format!("{a}-{b}"),
            (Some(a), None) => format!("{a}-?"),
            (None, Some(b)) => format!("?-{b}"),
            (None, None) => "-".to_string(),
        }
    }
}

/// A team side of a match; rebuilt on every sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTeam {
    pub id: Uuid,
    pub name: String,
    pub side: Option<String>,
    pub score: Option<i64>,
}

impl MatchTeam {
    #[must_use]
    pub fn new(name: impl Into<String>, side: Option<String>, score: Option<i64>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            side,
            score,
        }
    }
}

/// A participant of a match; rebuilt on every sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPlayer {
    pub id: Uuid,
    pub team_id: Option<Uuid>,
    pub tracker_player_id: Option<String>,
    pub handle: Option<String>,
    pub tag: Option<String>,
    pub agent: Option<String>,
    pub stat: PlayerStat,
}

impl MatchPlayer {
    /// `handle#tag` when both are known
    #[must_use]
    pub fn riot_id(&self) -> Option<String> {
        match (self.handle.as_deref(), self.tag.as_deref()) {
            (Some(handle), Some(tag)) => Some(format!("{handle}#{tag}")),
            (Some(handle), None) => Some(handle.to_string()),
            _ => None,
        }
    }
}

/// One-to-one stat line of a player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub headshots: Option<i64>,
    pub damage: Option<i64>,
    pub weapons: Option<serde_json::Value>,
    pub timing: Option<serde_json::Value>,
    pub extra: Option<serde_json::Value>,
}

impl PlayerStat {
    /// Kill/death ratio, with deaths floored at one
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn kd_ratio(&self) -> f64 {
        self.kills as f64 / self.deaths.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_id_unique() {
        assert_ne!(MatchId::new(), MatchId::new());
    }

    #[test]
    fn test_match_id_parse() {
        let id = MatchId::new();
        let parsed: MatchId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_match_new_is_active_shell() {
        let owner = UserId::new();
        let record = Match::new(owner, "abc123", 1_000);
        assert_eq!(record.owner_id, owner);
        assert_eq!(record.tracker_match_id, "abc123");
        assert_eq!(record.state(), MatchState::Active);
        assert_eq!(record.created_at, record.updated_at);
        assert!(record.teams.is_empty());
        assert!(record.players.is_empty());
    }

    #[test]
    fn test_state_follows_archived_at() {
        let mut record = Match::new(UserId::new(), "abc123", 1_000);
        record.archived_at = Some(2_000);
        assert!(record.is_archived());
        assert_eq!(record.state(), MatchState::Archived);
    }

    #[test]
    fn test_scoreline() {
        let mut record = Match::new(UserId::new(), "abc123", 1_000);
        assert_eq!(record.scoreline(), "-");
        record.score_team_a = Some(13);
        record.score_team_b = Some(11);
        assert_eq!(record.scoreline(), "13-11");
    }

    #[test]
    fn test_players_of_team() {
        let mut record = Match::new(UserId::new(), "abc123", 1_000);
        let alpha = MatchTeam::new("Alpha", None, Some(13));
        let alpha_id = alpha.id;
        record.teams.push(alpha);
        record.players.push(MatchPlayer {
            id: Uuid::now_v7(),
            team_id: Some(alpha_id),
            tracker_player_id: None,
            handle: Some("Jett".to_string()),
            tag: Some("EUW".to_string()),
            agent: None,
            stat: PlayerStat::default(),
        });
        record.players.push(MatchPlayer {
            id: Uuid::now_v7(),
            team_id: None,
            tracker_player_id: None,
            handle: None,
            tag: None,
            agent: None,
            stat: PlayerStat::default(),
        });

        assert_eq!(record.players_of(alpha_id).count(), 1);
        assert_eq!(record.team(alpha_id).map(|team| team.name.as_str()), Some("Alpha"));
        assert_eq!(record.players[0].riot_id().as_deref(), Some("Jett#EUW"));
        assert_eq!(record.players[1].riot_id(), None);
    }

    #[test]
    fn test_kd_ratio_floors_deaths() {
        let stat = PlayerStat {
            kills: 10,
            deaths: 0,
            ..PlayerStat::default()
        };
        assert!((stat.kd_ratio() - 10.0).abs() < f64::EPSILON);
    }
}
