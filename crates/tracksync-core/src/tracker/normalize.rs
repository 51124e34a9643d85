//! Projection of loosely-typed Tracker.gg payloads into normalized records.
//!
//! The provider returns nested `metadata`/`attributes`/`segments` trees whose
//! shape varies between endpoints and API revisions. Everything here walks a
//! borrowed `serde_json::Value` and never mutates it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A match record in provider-independent shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMatch {
    pub external_id: String,
    pub map_name: Option<String>,
    pub mode: Option<String>,
    pub played_at: Option<String>,
    pub duration: Option<i64>,
    pub teams: Vec<NormalizedTeam>,
    pub players: Vec<NormalizedPlayer>,
    /// Untouched provider record
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTeam {
    /// `None` for unnamed teams; they keep their position but match no players
    pub name: Option<String>,
    pub side: Option<String>,
    pub score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPlayer {
    pub external_id: Option<String>,
    pub handle: Option<String>,
    pub tag: Option<String>,
    pub team_name: Option<String>,
    pub agent: Option<String>,
    pub stats: NormalizedStats,
    pub weapons: Option<Value>,
    pub timing: Option<Value>,
    pub extra: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedStats {
    pub kills: Option<i64>,
    pub deaths: Option<i64>,
    pub assists: Option<i64>,
    pub headshots: Option<i64>,
    pub damage: Option<i64>,
}

/// Locate the match list in a response body.
///
/// The first key present among `data.matches`, `data` and `matches` wins; a
/// winning key that is not an array yields an empty list.
pub fn extract_match_list(body: &Value) -> &[Value] {
    let list = body
        .pointer("/data/matches")
        .or_else(|| body.get("data"))
        .or_else(|| body.get("matches"));

    list.and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Normalize every match record in a response body, dropping records without
/// an external id.
pub fn normalize_matches(body: &Value) -> Vec<NormalizedMatch> {
    extract_match_list(body)
        .iter()
        .filter_map(normalize_match)
        .collect()
}

/// Normalize one provider record; `None` when it carries no usable id.
pub fn normalize_match(record: &Value) -> Option<NormalizedMatch> {
    let external_id = first_text(
        record,
        &["/attributes/id", "/id", "/matchId", "/metadata/matchId"],
    )?;

    let teams = collection(record, "teams", "team")
        .into_iter()
        .map(normalize_team)
        .collect();
    let players = collection(record, "players", "player")
        .into_iter()
        .map(normalize_player)
        .collect();

    Some(NormalizedMatch {
        external_id,
        map_name: first_text(record, &["/metadata/mapName", "/metadata/map", "/map"]),
        mode: first_text(record, &["/metadata/modeName", "/metadata/mode", "/mode"]),
        played_at: first_text(
            record,
            &["/metadata/timestamp", "/metadata/dateStarted", "/playedAt"],
        ),
        duration: first_stat(record, &["/metadata/duration", "/duration"]),
        teams,
        players,
        raw: record.clone(),
    })
}

/// Extract a single integer from a stat field.
///
/// Accepts bare numbers, numeric strings, and `{value, displayValue}` objects.
/// Absent, null and empty values yield `None`.
pub fn stat_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| number.as_f64().map(round_float)),
        Value::String(raw) => parse_numeric_text(raw),
        Value::Object(object) => object
            .get("value")
            .and_then(stat_value)
            .or_else(|| object.get("displayValue").and_then(stat_value)),
        Value::Null | Value::Bool(_) | Value::Array(_) => None,
    }
}

fn normalize_team(segment: &Value) -> NormalizedTeam {
    NormalizedTeam {
        name: first_text(
            segment,
            &["/metadata/name", "/attributes/teamId", "/name", "/teamId"],
        ),
        side: first_text(segment, &["/metadata/side", "/attributes/side", "/side"]),
        score: first_stat(
            segment,
            &["/stats/roundsWon", "/stats/score", "/score", "/roundsWon"],
        ),
    }
}

fn normalize_player(segment: &Value) -> NormalizedPlayer {
    let full_handle = first_text(
        segment,
        &["/metadata/platformInfo/platformUserHandle", "/handle"],
    );
    let (handle, embedded_tag) = split_riot_id(full_handle.as_deref());
    let tag = first_text(segment, &["/tag", "/metadata/tag"]).or(embedded_tag);

    let stats_object = segment.get("stats").and_then(Value::as_object);

    NormalizedPlayer {
        external_id: first_text(
            segment,
            &[
                "/attributes/platformUserIdentifier",
                "/attributes/playerId",
                "/metadata/platformInfo/platformUserIdentifier",
                "/id",
                "/playerId",
            ],
        ),
        handle,
        tag,
        team_name: first_text(
            segment,
            &["/metadata/teamId", "/attributes/teamId", "/teamName", "/team"],
        ),
        agent: first_text(
            segment,
            &["/metadata/agentName", "/metadata/agent/name", "/agent"],
        ),
        stats: NormalizedStats {
            kills: stat_field(stats_object, &["kills"]),
            deaths: stat_field(stats_object, &["deaths"]),
            assists: stat_field(stats_object, &["assists"]),
            headshots: stat_field(stats_object, &["headshots"]),
            damage: stat_field(stats_object, &["damage", "damageDealt"]),
        },
        weapons: first_present(segment, &["/stats/weapons", "/weapons"]),
        timing: first_present(segment, &["/metadata/timing", "/timing"]),
        extra: stats_object
            .filter(|stats| !stats.is_empty())
            .map(|stats| Value::Object(stats.clone())),
    }
}

fn stat_field(stats: Option<&Map<String, Value>>, keys: &[&str]) -> Option<i64> {
    let stats = stats?;
    keys.iter()
        .find_map(|key| stats.get(*key).and_then(stat_value))
}

/// Object children listed under `plural`, or segments tagged with `segment_type`.
fn collection<'a>(record: &'a Value, plural: &str, segment_type: &str) -> Vec<&'a Value> {
    if let Some(items) = record.get(plural).and_then(Value::as_array) {
        return items.iter().filter(|item| item.is_object()).collect();
    }

    record
        .get("segments")
        .and_then(Value::as_array)
        .map(|segments| {
            segments
                .iter()
                .filter(|segment| {
                    segment
                        .get("type")
                        .and_then(Value::as_str)
                        .is_some_and(|kind| kind.eq_ignore_ascii_case(segment_type))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn split_riot_id(full: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(full) = full else {
        return (None, None);
    };
    match full.rsplit_once('#') {
        Some((handle, tag)) => (non_empty(handle), non_empty(tag)),
        None => (non_empty(full), None),
    }
}

fn first_text(value: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .find_map(|pointer| value.pointer(pointer).and_then(text_value))
}

fn first_stat(value: &Value, pointers: &[&str]) -> Option<i64> {
    pointers
        .iter()
        .find_map(|pointer| value.pointer(pointer).and_then(stat_value))
}

fn first_present(value: &Value, pointers: &[&str]) -> Option<Value> {
    pointers
        .iter()
        .find_map(|pointer| value.pointer(pointer).filter(|found| !found.is_null()))
        .cloned()
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => non_empty(raw),
        Value::Number(number) => Some(number.to_string()),
        Value::Object(object) => object_text(object),
        _ => None,
    }
}

fn object_text(object: &Map<String, Value>) -> Option<String> {
    object
        .get("value")
        .and_then(text_value)
        .or_else(|| object.get("displayValue").and_then(text_value))
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_numeric_text(raw: &str) -> Option<i64> {
    let trimmed = raw.trim().replace(',', "");
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.is_finite()).map(round_float))
}

#[allow(clippy::cast_possible_truncation)]
fn round_float(value: f64) -> i64 {
    value.round() as i64
}
