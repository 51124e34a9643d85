//! Match repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::error::{Error, Result};
use crate::models::{Match, MatchId, MatchPlayer, MatchTeam, PlayerStat, UserId};
use libsql::{Connection, Row, Value};
use uuid::Uuid;

const MATCH_COLUMNS: &str = "id, owner_id, tracker_match_id, map_name, mode, played_at, duration, \
     score_team_a, score_team_b, raw_payload, created_at, updated_at, archived_at";

/// Trait for match storage operations (async)
#[allow(async_fn_in_trait)]
pub trait MatchRepository {
    /// Find an owner's match by provider match id
    async fn find_by_tracker_id(
        &self,
        owner_id: &UserId,
        tracker_match_id: &str,
    ) -> Result<Option<Match>>;

    /// Get an owner's match by ID
    async fn get(&self, owner_id: &UserId, id: &MatchId) -> Result<Option<Match>>;

    /// List an owner's matches, most recently played first
    async fn list(
        &self,
        owner_id: &UserId,
        include_archived: bool,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Match>>;

    /// List match IDs starting with the given prefix
    async fn list_ids_by_prefix(
        &self,
        owner_id: &UserId,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>>;

    /// Persist staged matches with their children in a single transaction.
    ///
    /// Existing children of every staged match are replaced.
    async fn save_all(&self, matches: &[Match]) -> Result<()>;

    /// Soft-archive a match
    async fn archive(&self, owner_id: &UserId, id: &MatchId) -> Result<Match>;

    /// Permanently delete a match together with its teams, players and stats
    async fn delete(&self, owner_id: &UserId, id: &MatchId) -> Result<()>;
}

/// libSQL implementation of `MatchRepository`
pub struct LibSqlMatchRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlMatchRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn query_matches(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Match>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut matches = Vec::new();
        while let Some(row) = rows.next().await? {
            matches.push(Self::parse_match(&row)?);
        }

        for record in &mut matches {
            self.load_children(record).await?;
        }
        Ok(matches)
    }

    async fn load_children(&self, record: &mut Match) -> Result<()> {
        let match_id = record.id.as_str();

        let mut rows = self
            .conn
            .query(
                "SELECT id, name, side, score FROM match_teams
                 WHERE match_id = ?
                 ORDER BY position",
                [match_id.clone()],
            )
            .await?;
        let mut teams = Vec::new();
        while let Some(row) = rows.next().await? {
            teams.push(MatchTeam {
                id: parse_uuid(&row.get::<String>(0)?)?,
                name: row.get(1)?,
                side: text_at(&row, 2)?,
                score: int_at(&row, 3)?,
            });
        }

        let mut rows = self
            .conn
            .query(
                "SELECT p.id, p.team_id, p.tracker_player_id, p.handle, p.tag, p.agent,
                        s.kills, s.deaths, s.assists, s.headshots, s.damage,
                        s.weapons, s.timing, s.extra
                 FROM match_players p
                 LEFT JOIN player_stats s ON s.player_id = p.id
                 WHERE p.match_id = ?
                 ORDER BY p.position",
                [match_id],
            )
            .await?;
        let mut players = Vec::new();
        while let Some(row) = rows.next().await? {
            players.push(MatchPlayer {
                id: parse_uuid(&row.get::<String>(0)?)?,
                team_id: text_at(&row, 1)?.as_deref().map(parse_uuid).transpose()?,
                tracker_player_id: text_at(&row, 2)?,
                handle: text_at(&row, 3)?,
                tag: text_at(&row, 4)?,
                agent: text_at(&row, 5)?,
                stat: PlayerStat {
                    kills: int_at(&row, 6)?.unwrap_or(0),
                    deaths: int_at(&row, 7)?.unwrap_or(0),
                    assists: int_at(&row, 8)?.unwrap_or(0),
                    headshots: int_at(&row, 9)?,
                    damage: int_at(&row, 10)?,
                    weapons: json_at(&row, 11)?,
                    timing: json_at(&row, 12)?,
                    extra: json_at(&row, 13)?,
                },
            });
        }

        record.teams = teams;
        record.players = players;
        Ok(())
    }

    async fn write_match(&self, record: &Match) -> Result<()> {
        let match_id = record.id.as_str();

        self.conn
            .execute(
                "INSERT INTO matches (id, owner_id, tracker_match_id, map_name, mode, played_at,
                     duration, score_team_a, score_team_b, raw_payload, created_at, updated_at,
                     archived_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     map_name = excluded.map_name,
                     mode = excluded.mode,
                     played_at = excluded.played_at,
                     duration = excluded.duration,
                     score_team_a = excluded.score_team_a,
                     score_team_b = excluded.score_team_b,
                     raw_payload = excluded.raw_payload,
                     updated_at = excluded.updated_at,
                     archived_at = excluded.archived_at",
                vec![
                    Value::Text(match_id.clone()),
                    Value::Text(record.owner_id.as_str()),
                    Value::Text(record.tracker_match_id.clone()),
                    opt_text(record.map_name.as_deref()),
                    opt_text(record.mode.as_deref()),
                    opt_int(record.played_at),
                    opt_int(record.duration),
                    opt_int(record.score_team_a),
                    opt_int(record.score_team_b),
                    Value::Text(serde_json::to_string(&record.raw_payload)?),
                    Value::Integer(record.created_at),
                    Value::Integer(record.updated_at),
                    opt_int(record.archived_at),
                ],
            )
            .await?;

        // Stats go with their players through ON DELETE CASCADE
        self.conn
            .execute(
                "DELETE FROM match_players WHERE match_id = ?",
                [match_id.clone()],
            )
            .await?;
        self.conn
            .execute("DELETE FROM match_teams WHERE match_id = ?", [match_id.clone()])
            .await?;

        for (position, team) in record.teams.iter().enumerate() {
            self.conn
                .execute(
                    "INSERT INTO match_teams (id, match_id, position, name, side, score)
                     VALUES (?, ?, ?, ?, ?, ?)",
                    vec![
                        Value::Text(team.id.to_string()),
                        Value::Text(match_id.clone()),
                        Value::Integer(position as i64),
                        Value::Text(team.name.clone()),
                        opt_text(team.side.as_deref()),
                        opt_int(team.score),
                    ],
                )
                .await?;
        }

        for (position, player) in record.players.iter().enumerate() {
            let player_id = player.id.to_string();
            self.conn
                .execute(
                    "INSERT INTO match_players (id, match_id, team_id, position, tracker_player_id,
                         handle, tag, agent)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                    vec![
                        Value::Text(player_id.clone()),
                        Value::Text(match_id.clone()),
                        player
                            .team_id
                            .map_or(Value::Null, |id| Value::Text(id.to_string())),
                        Value::Integer(position as i64),
                        opt_text(player.tracker_player_id.as_deref()),
                        opt_text(player.handle.as_deref()),
                        opt_text(player.tag.as_deref()),
                        opt_text(player.agent.as_deref()),
                    ],
                )
                .await?;

            let stat = &player.stat;
            self.conn
                .execute(
                    "INSERT INTO player_stats (player_id, kills, deaths, assists, headshots,
                         damage, weapons, timing, extra)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    vec![
                        Value::Text(player_id),
                        Value::Integer(stat.kills),
                        Value::Integer(stat.deaths),
                        Value::Integer(stat.assists),
                        opt_int(stat.headshots),
                        opt_int(stat.damage),
                        opt_json(stat.weapons.as_ref())?,
                        opt_json(stat.timing.as_ref())?,
                        opt_json(stat.extra.as_ref())?,
                    ],
                )
                .await?;
        }

        Ok(())
    }

    /// Parse a match header from a database row; children are loaded separately
    fn parse_match(row: &Row) -> Result<Match> {
        let id: String = row.get(0)?;
        let owner_id: String = row.get(1)?;
        let raw_payload = text_at(row, 9)?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()?
            .unwrap_or(serde_json::Value::Null);

        Ok(Match {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("Invalid match ID: {id}")))?,
            owner_id: owner_id
                .parse()
                .map_err(|_| Error::Database(format!("Invalid owner ID: {owner_id}")))?,
            tracker_match_id: row.get(2)?,
            map_name: text_at(row, 3)?,
            mode: text_at(row, 4)?,
            played_at: int_at(row, 5)?,
            duration: int_at(row, 6)?,
            score_team_a: int_at(row, 7)?,
            score_team_b: int_at(row, 8)?,
            raw_payload,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
            archived_at: int_at(row, 12)?,
            teams: Vec::new(),
            players: Vec::new(),
        })
    }
}

impl MatchRepository for LibSqlMatchRepository<'_> {
    async fn find_by_tracker_id(
        &self,
        owner_id: &UserId,
        tracker_match_id: &str,
    ) -> Result<Option<Match>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE owner_id = ? AND tracker_match_id = ?"
        );
        let matches = self
            .query_matches(
                &sql,
                vec![
                    Value::Text(owner_id.as_str()),
                    Value::Text(tracker_match_id.to_string()),
                ],
            )
            .await?;
        Ok(matches.into_iter().next())
    }

    async fn get(&self, owner_id: &UserId, id: &MatchId) -> Result<Option<Match>> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE owner_id = ? AND id = ?");
        let matches = self
            .query_matches(
                &sql,
                vec![Value::Text(owner_id.as_str()), Value::Text(id.as_str())],
            )
            .await?;
        Ok(matches.into_iter().next())
    }

    async fn list(
        &self,
        owner_id: &UserId,
        include_archived: bool,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Match>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM matches
             WHERE owner_id = ? AND (? OR archived_at IS NULL)
             ORDER BY COALESCE(played_at, created_at) DESC, created_at DESC
             LIMIT ? OFFSET ?"
        );
        self.query_matches(
            &sql,
            vec![
                Value::Text(owner_id.as_str()),
                Value::Integer(i64::from(include_archived)),
                Value::Integer(limit as i64),
                Value::Integer(offset as i64),
            ],
        )
        .await
    }

    async fn list_ids_by_prefix(
        &self,
        owner_id: &UserId,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() || !prefix.chars().all(|ch| ch.is_ascii_hexdigit() || ch == '-') {
            return Ok(Vec::new());
        }

        let mut rows = self
            .conn
            .query(
                "SELECT id FROM matches
                 WHERE owner_id = ? AND id LIKE ? || '%'
                 ORDER BY created_at DESC
                 LIMIT ?",
                vec![
                    Value::Text(owner_id.as_str()),
                    Value::Text(prefix),
                    Value::Integer(limit as i64),
                ],
            )
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }

    async fn save_all(&self, matches: &[Match]) -> Result<()> {
        if matches.is_empty() {
            return Ok(());
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        for record in matches {
            if let Err(e) = self.write_match(record).await {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        }

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        Ok(())
    }

    async fn archive(&self, owner_id: &UserId, id: &MatchId) -> Result<Match> {
        let now = chrono::Utc::now().timestamp_millis();

        let rows = self
            .conn
            .execute(
                "UPDATE matches SET archived_at = ?, updated_at = ? WHERE id = ? AND owner_id = ?",
                vec![
                    Value::Integer(now),
                    Value::Integer(now),
                    Value::Text(id.as_str()),
                    Value::Text(owner_id.as_str()),
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        self.get(owner_id, id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn delete(&self, owner_id: &UserId, id: &MatchId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM matches WHERE id = ? AND owner_id = ?",
                [id.as_str(), owner_id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(())
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::Database(format!("Invalid row ID: {raw}")))
}

fn opt_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

fn opt_int(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

fn opt_json(value: Option<&serde_json::Value>) -> Result<Value> {
    match value {
        Some(json) => Ok(Value::Text(serde_json::to_string(json)?)),
        None => Ok(Value::Null),
    }
}

fn text_at(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        other => Err(Error::Database(format!(
            "Expected text in column {idx}, found {other:?}"
        ))),
    }
}

fn int_at(row: &Row, idx: i32) -> Result<Option<i64>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Integer(value) => Ok(Some(value)),
        other => Err(Error::Database(format!(
            "Expected integer in column {idx}, found {other:?}"
        ))),
    }
}

fn json_at(row: &Row, idx: i32) -> Result<Option<serde_json::Value>> {
    text_at(row, idx)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(Error::from)
}
