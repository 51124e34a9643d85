//! Match history export helpers for the CLI.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::{Match, MatchPlayer, MatchState};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Flattened match representation used in exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMatch {
    pub id: String,
    pub tracker_match_id: String,
    pub state: MatchState,
    pub map_name: Option<String>,
    pub mode: Option<String>,
    pub played_at: Option<i64>,
    pub duration: Option<i64>,
    pub score_team_a: Option<i64>,
    pub score_team_b: Option<i64>,
    pub teams: Vec<ExportTeam>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTeam {
    pub name: String,
    pub side: Option<String>,
    pub score: Option<i64>,
    pub players: Vec<ExportPlayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPlayer {
    pub riot_id: Option<String>,
    pub agent: Option<String>,
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub headshots: Option<i64>,
    pub damage: Option<i64>,
}

/// Convert a match into an export record.
///
/// Teamless players are grouped under a trailing `Unassigned` team.
#[must_use]
pub fn match_to_export_item(record: &Match) -> ExportMatch {
    let mut teams: Vec<ExportTeam> = record
        .teams
        .iter()
        .map(|team| ExportTeam {
            name: team.name.clone(),
            side: team.side.clone(),
            score: team.score,
            players: record.players_of(team.id).map(player_to_export).collect(),
        })
        .collect();

    let unassigned: Vec<ExportPlayer> = record
        .players
        .iter()
        .filter(|player| !player.team_id.is_some_and(|id| record.team(id).is_some()))
        .map(player_to_export)
        .collect();
    if !unassigned.is_empty() {
        teams.push(ExportTeam {
            name: "Unassigned".to_string(),
            side: None,
            score: None,
            players: unassigned,
        });
    }

    ExportMatch {
        id: record.id.to_string(),
        tracker_match_id: record.tracker_match_id.clone(),
        state: record.state(),
        map_name: record.map_name.clone(),
        mode: record.mode.clone(),
        played_at: record.played_at,
        duration: record.duration,
        score_team_a: record.score_team_a,
        score_team_b: record.score_team_b,
        teams,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn player_to_export(player: &MatchPlayer) -> ExportPlayer {
    ExportPlayer {
        riot_id: player.riot_id(),
        agent: player.agent.clone(),
        kills: player.stat.kills,
        deaths: player.stat.deaths,
        assists: player.stat.assists,
        headshots: player.stat.headshots,
        damage: player.stat.damage,
    }
}

/// Render matches as pretty-printed JSON.
pub fn render_json_export(matches: &[Match]) -> serde_json::Result<String> {
    let items = matches
        .iter()
        .map(match_to_export_item)
        .collect::<Vec<ExportMatch>>();
    serde_json::to_string_pretty(&items)
}

/// Render matches as Markdown: a frontmatter block and a scoreboard per match.
#[must_use]
pub fn render_markdown_export(matches: &[Match]) -> String {
    let mut output = String::new();

    for (index, record) in matches.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let item = match_to_export_item(record);
        let _ = writeln!(output, "---");
        let _ = writeln!(output, "id: {}", item.id);
        let _ = writeln!(output, "tracker_match_id: {}", item.tracker_match_id);
        let _ = writeln!(output, "state: {}", state_label(item.state));
        if let Some(played_at) = item.played_at {
            let _ = writeln!(output, "played_at: {played_at}");
        }
        let _ = writeln!(output, "---");
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "## {} ({}) {}",
            item.map_name.as_deref().unwrap_or("Unknown map"),
            item.mode.as_deref().unwrap_or("unknown mode"),
            record.scoreline()
        );

        for team in &item.teams {
            let _ = writeln!(output);
            let name = if team.name.is_empty() {
                "Unnamed team"
            } else {
                team.name.as_str()
            };
            match team.score {
                Some(score) => {
                    let _ = writeln!(output, "### {name} ({score})");
                }
                None => {
                    let _ = writeln!(output, "### {name}");
                }
            }
            let _ = writeln!(output);
            let _ = writeln!(output, "| Player | Agent | K | D | A |");
            let _ = writeln!(output, "| --- | --- | --- | --- | --- |");
            for player in &team.players {
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | {} | {} |",
                    player.riot_id.as_deref().unwrap_or("?"),
                    player.agent.as_deref().unwrap_or("-"),
                    player.kills,
                    player.deaths,
                    player.assists
                );
            }
        }
    }

    output
}

/// Render matches based on selected export format.
pub fn render_matches_export(
    matches: &[Match],
    format: ExportFormat,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(matches),
        ExportFormat::Markdown => Ok(render_markdown_export(matches)),
    }
}

/// Build a deterministic default file name for exports.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("tracksync-export-{timestamp_ms}.{}", format.extension())
}

const fn state_label(state: MatchState) -> &'static str {
    match state {
        MatchState::Active => "active",
        MatchState::Archived => "archived",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchTeam, PlayerStat, UserId};
    use uuid::Uuid;

    fn sample_match() -> Match {
        let mut record = Match::new(UserId::new(), "abc123", 123);
        record.map_name = Some("Ascent".to_string());
        record.mode = Some("Competitive".to_string());
        record.score_team_a = Some(13);
        record.score_team_b = Some(7);

        let alpha = MatchTeam::new("Alpha", None, Some(13));
        let bravo = MatchTeam::new("Bravo", None, Some(7));
        record.players = vec![
            MatchPlayer {
                id: Uuid::now_v7(),
                team_id: Some(alpha.id),
                tracker_player_id: None,
                handle: Some("Tenz".to_string()),
                tag: Some("0505".to_string()),
                agent: Some("Jett".to_string()),
                stat: PlayerStat {
                    kills: 24,
                    deaths: 12,
                    assists: 5,
                    ..PlayerStat::default()
                },
            },
            MatchPlayer {
                id: Uuid::now_v7(),
                team_id: None,
                tracker_player_id: None,
                handle: Some("Ghost".to_string()),
                tag: None,
                agent: None,
                stat: PlayerStat::default(),
            },
        ];
        record.teams = vec![alpha, bravo];
        record
    }

    #[test]
    fn match_to_export_item_groups_players_by_team() {
        let export = match_to_export_item(&sample_match());

        let names: Vec<&str> = export.teams.iter().map(|team| team.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Bravo", "Unassigned"]);
        assert_eq!(export.teams[0].players.len(), 1);
        assert_eq!(export.teams[0].players[0].riot_id.as_deref(), Some("Tenz#0505"));
        assert!(export.teams[1].players.is_empty());
        assert_eq!(export.teams[2].players[0].riot_id.as_deref(), Some("Ghost"));
    }

    #[test]
    fn render_markdown_export_includes_frontmatter_and_scoreboard() {
        let rendered = render_markdown_export(&[sample_match()]);

        assert!(rendered.contains("tracker_match_id: abc123"));
        assert!(rendered.contains("state: active"));
        assert!(rendered.contains("## Ascent (Competitive) 13-7"));
        assert!(rendered.contains("### Alpha (13)"));
        assert!(rendered.contains("| Tenz#0505 | Jett | 24 | 12 | 5 |"));
    }

    #[test]
    fn render_markdown_export_labels_unnamed_team() {
        let mut record = sample_match();
        record.teams[1].name = String::new();

        let rendered = render_markdown_export(&[record]);
        assert!(rendered.contains("### Unnamed team (7)"));
        assert!(!rendered.contains("### (7)"));
    }

    #[test]
    fn render_json_export_is_an_array() {
        let rendered = render_json_export(&[sample_match()]).unwrap();
        let parsed: Vec<ExportMatch> = serde_json::from_str(&rendered).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].tracker_match_id, "abc123");
        assert_eq!(parsed[0].state, MatchState::Active);
    }

    #[test]
    fn suggested_export_file_name_uses_format_extension() {
        assert_eq!(
            suggested_export_file_name(ExportFormat::Json, 123),
            "tracksync-export-123.json"
        );
        assert_eq!(
            suggested_export_file_name(ExportFormat::Markdown, 456),
            "tracksync-export-456.md"
        );
    }
}
