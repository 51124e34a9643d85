//! Tracker.gg Valorant match history client.
//!
//! Fetches one page of match history for a Riot id and hands the body to the
//! normalizer. Non-success responses are classified into [`TrackerError`]
//! variants; nothing is retried.

mod normalize;

use reqwest::header::{HeaderMap, ACCEPT, SERVER};
use serde_json::Value;
use thiserror::Error;

use crate::config::{ConfigError, TrackerConfig};

pub use normalize::{
    extract_match_list, normalize_match, normalize_matches, stat_value, NormalizedMatch,
    NormalizedPlayer, NormalizedStats, NormalizedTeam,
};

const API_KEY_HEADER: &str = "TRN-Api-Key";
const TRACE_HEADER: &str = "cf-ray";
const ERROR_EXCERPT_CHARS: usize = 180;

/// Lowercase body fragments served by the provider's WAF instead of API JSON.
const BOT_PROTECTION_MARKERS: &[&str] = &[
    "cloudflare",
    "cf-ray",
    "cf-chl",
    "attention required",
    "just a moment",
    "captcha",
    "bot protection",
];

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Tracker.gg is not configured: {0}")]
    Configuration(#[from] ConfigError),
    #[error("Failed to build Tracker.gg HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Tracker.gg blocked the request (bot protection){}", trace_suffix(.trace_id.as_deref()))]
    Blocked { trace_id: Option<String> },
    #[error("Tracker.gg rejected the request (HTTP 403): {0}")]
    Unauthorized(String),
    #[error("Tracker.gg service unavailable (HTTP {status}): {message}")]
    ServiceUnavailable { status: u16, message: String },
    #[error("Tracker.gg is unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Invalid Tracker.gg response: {0}")]
    InvalidResponse(String),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Riot id and region to fetch history for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerQuery {
    pub handle: String,
    pub tag: String,
    /// Falls back to the configured default region when `None`
    pub region: Option<String>,
}

impl PlayerQuery {
    pub fn new(handle: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            tag: tag.into(),
            region: None,
        }
    }

    /// Blank regions fall back to the configured default.
    #[must_use]
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region
            .map(|region| region.trim().to_ascii_lowercase())
            .filter(|region| !region.is_empty());
        self
    }
}

/// Source of normalized match records
#[allow(async_fn_in_trait)]
pub trait MatchSource {
    async fn fetch_matches(&self, query: &PlayerQuery) -> TrackerResult<Vec<NormalizedMatch>>;
}

/// HTTP client for the Tracker.gg public API
#[derive(Debug, Clone)]
pub struct TrackerClient {
    config: TrackerConfig,
    client: reqwest::Client,
}

impl TrackerClient {
    pub fn new(config: TrackerConfig) -> TrackerResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(TrackerError::Client)?;
        Ok(Self { config, client })
    }

    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Fetch the raw response body for a player's match history.
    pub async fn fetch_raw(&self, query: &PlayerQuery) -> TrackerResult<Value> {
        let api_key = self.config.require_api_key()?;
        let region = query
            .region
            .as_deref()
            .unwrap_or(&self.config.default_region);
        let url = matches_url(&self.config.base_url, &query.handle, &query.tag, region);

        tracing::debug!(%url, "Requesting Tracker.gg match history");
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(TrackerError::Transport)?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            let error = classify_failure(status.as_u16(), &headers, &body);
            tracing::warn!(status = status.as_u16(), "Tracker.gg request failed: {error}");
            return Err(error);
        }

        let body = response.text().await.map_err(TrackerError::Transport)?;
        serde_json::from_str(&body).map_err(|error| {
            TrackerError::InvalidResponse(format!("{error}: {}", body_excerpt(&body)))
        })
    }
}

impl MatchSource for TrackerClient {
    async fn fetch_matches(&self, query: &PlayerQuery) -> TrackerResult<Vec<NormalizedMatch>> {
        let payload = self.fetch_raw(query).await?;
        let matches = normalize_matches(&payload);
        tracing::debug!(
            count = matches.len(),
            "Normalized Tracker.gg match records for {}#{}",
            query.handle,
            query.tag
        );
        Ok(matches)
    }
}

/// Build the match history URL with URL-encoded Riot id segments.
pub fn matches_url(base_url: &str, handle: &str, tag: &str, region: &str) -> String {
    format!(
        "{}/valorant/standard/matches/riot/{}/{}?region={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(handle),
        urlencoding::encode(tag),
        urlencoding::encode(region)
    )
}

/// Map a failed response to a [`TrackerError`].
pub fn classify_failure(status: u16, headers: &HeaderMap, body: &str) -> TrackerError {
    if status == 403 {
        let trace_id = header_text(headers, TRACE_HEADER);
        if trace_id.is_some() || is_bot_protection(headers, body) {
            return TrackerError::Blocked { trace_id };
        }
        return TrackerError::Unauthorized(error_message(body, status));
    }

    TrackerError::ServiceUnavailable {
        status,
        message: error_message(body, status),
    }
}

fn is_bot_protection(headers: &HeaderMap, body: &str) -> bool {
    let served_by_waf = header_text(headers, SERVER.as_str())
        .is_some_and(|server| server.to_ascii_lowercase().contains("cloudflare"));
    if served_by_waf {
        return true;
    }

    let body = body.to_ascii_lowercase();
    BOT_PROTECTION_MARKERS
        .iter()
        .any(|marker| body.contains(marker))
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// Prefer the provider's `errors[0].message`, then the raw body.
fn error_message(body: &str, status: u16) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|payload| {
        payload
            .pointer("/errors/0/message")
            .or_else(|| payload.get("message"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
    });

    let message = from_json.unwrap_or_else(|| body_excerpt(body));
    if message.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        message
    }
}

/// Whitespace-collapsed head of a response body, for error messages.
fn body_excerpt(body: &str) -> String {
    body.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(ERROR_EXCERPT_CHARS)
        .collect()
}

fn trace_suffix(trace_id: Option<&str>) -> String {
    trace_id.map_or_else(String::new, |id| format!(" [trace id: {id}]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::task::JoinHandle;

    /// Answers a single request with a canned response and yields the raw request text.
    async fn spawn_one_shot_server(
        status_line: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> (String, JoinHandle<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let address = listener.local_addr().expect("local address");

        let mut response = format!("HTTP/1.1 {status_line}\r\n");
        for (name, value) in headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        response.push_str(&format!(
            "content-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        ));

        let handle = tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return String::new();
            };
            let mut request = Vec::new();
            let mut chunk = [0_u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(read) => request.extend_from_slice(&chunk[..read]),
                }
            }
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{address}"), handle)
    }

    fn client_for(base_url: String) -> TrackerClient {
        let config = TrackerConfig {
            base_url,
            user_agent: "tracksync-test/1.0".to_string(),
            ..TrackerConfig::default()
        }
        .with_api_key("test-key");
        TrackerClient::new(config).unwrap()
    }

    fn query() -> PlayerQuery {
        PlayerQuery::new("Tenz", "0505").with_region(Some("NA".to_string()))
    }

    #[test]
    fn matches_url_encodes_riot_id() {
        let url = matches_url("https://public-api.tracker.gg/v2/", "Tenz Fan", "#EU1", "eu");
        assert_eq!(
            url,
            "https://public-api.tracker.gg/v2/valorant/standard/matches/riot/Tenz%20Fan/%23EU1?region=eu"
        );
    }

    #[test]
    fn forbidden_with_waf_body_is_blocked() {
        let body = "<html><title>Attention Required! | Cloudflare</title></html>";
        let error = classify_failure(403, &HeaderMap::new(), body);
        assert!(matches!(error, TrackerError::Blocked { trace_id: None }));
    }

    #[test]
    fn forbidden_with_trace_header_is_blocked_with_trace_id() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-ray", HeaderValue::from_static("8a1b2c3d4e5f-CDG"));
        headers.insert(SERVER, HeaderValue::from_static("cloudflare"));

        let error = classify_failure(403, &headers, "");
        match &error {
            TrackerError::Blocked { trace_id } => {
                assert_eq!(trace_id.as_deref(), Some("8a1b2c3d4e5f-CDG"));
            }
            other => panic!("expected blocked error, got {other:?}"),
        }
        assert!(error.to_string().contains("8a1b2c3d4e5f-CDG"));
    }

    #[test]
    fn forbidden_from_waf_server_is_blocked() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER, HeaderValue::from_static("Cloudflare"));
        let error = classify_failure(403, &headers, "{}");
        assert!(matches!(error, TrackerError::Blocked { .. }));
    }

    #[test]
    fn forbidden_without_markers_is_unauthorized() {
        let body = r#"{"errors":[{"code":"InvalidApiKey","message":"Invalid authentication credentials"}]}"#;
        let error = classify_failure(403, &HeaderMap::new(), body);
        match error {
            TrackerError::Unauthorized(message) => {
                assert_eq!(message, "Invalid authentication credentials");
            }
            other => panic!("expected unauthorized error, got {other:?}"),
        }
    }

    #[test]
    fn server_error_is_service_unavailable_with_status() {
        let error = classify_failure(500, &HeaderMap::new(), "");
        assert!(matches!(
            error,
            TrackerError::ServiceUnavailable { status: 500, .. }
        ));
        assert!(error.to_string().contains("500"));
    }

    #[test]
    fn not_found_is_service_unavailable() {
        let error = classify_failure(404, &HeaderMap::new(), "player not found");
        assert!(error.to_string().contains("404"));
        assert!(error.to_string().contains("player not found"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_without_api_key_fails_before_network() {
        let config = TrackerConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..TrackerConfig::default()
        };
        let client = TrackerClient::new(config).unwrap();

        let error = client
            .fetch_matches(&PlayerQuery::new("Tenz", "0505"))
            .await
            .unwrap_err();
        assert!(matches!(error, TrackerError::Configuration(_)));
    }

    #[test]
    fn player_query_ignores_blank_region() {
        let query = PlayerQuery::new("Tenz", "0505").with_region(Some("  ".to_string()));
        assert_eq!(query.region, None);

        let query = PlayerQuery::new("Tenz", "0505").with_region(Some(" NA ".to_string()));
        assert_eq!(query.region.as_deref(), Some("na"));
    }

    #[test]
    fn body_excerpt_collapses_and_truncates() {
        assert_eq!(body_excerpt("  <h1>\n  Bad\tGateway </h1>\n"), "<h1> Bad Gateway </h1>");
        assert_eq!(body_excerpt(&"x".repeat(500)).len(), ERROR_EXCERPT_CHARS);
    }

    #[test]
    fn invalid_user_agent_is_a_client_error() {
        let config = TrackerConfig {
            user_agent: "tracksync\n1.0".to_string(),
            ..TrackerConfig::default()
        };
        let error = TrackerClient::new(config).unwrap_err();
        assert!(matches!(error, TrackerError::Client(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_sends_riot_id_region_and_headers() {
        let body = json!({
            "data": {
                "matches": [
                    {
                        "attributes": { "id": "abc123" },
                        "metadata": { "mapName": "Ascent" },
                        "teams": [{ "name": "Alpha", "score": 13 }, { "name": "Bravo", "score": 7 }]
                    },
                    { "metadata": { "mapName": "Bind" } }
                ]
            }
        })
        .to_string();
        let (base_url, server) = spawn_one_shot_server(
            "200 OK",
            &[("content-type", "application/json")],
            &body,
        )
        .await;

        let matches = client_for(base_url).fetch_matches(&query()).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].external_id, "abc123");
        assert_eq!(matches[0].map_name.as_deref(), Some("Ascent"));
        assert_eq!(matches[0].teams[1].score, Some(7));

        let request = server.await.unwrap();
        assert!(
            request.starts_with("GET /valorant/standard/matches/riot/Tenz/0505?region=na HTTP/1.1"),
            "unexpected request line: {request}"
        );
        let request = request.to_ascii_lowercase();
        assert!(request.contains("trn-api-key: test-key"));
        assert!(request.contains("accept: application/json"));
        assert!(request.contains("user-agent: tracksync-test/1.0"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_uses_default_region_when_query_has_none() {
        let (base_url, server) = spawn_one_shot_server("200 OK", &[], "{\"data\":[]}").await;

        let matches = client_for(base_url)
            .fetch_matches(&PlayerQuery::new("Tenz Fan", "EU1"))
            .await
            .unwrap();
        assert!(matches.is_empty());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /valorant/standard/matches/riot/Tenz%20Fan/EU1?region=eu "));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_reports_waf_block_with_trace_id() {
        let (base_url, _server) = spawn_one_shot_server(
            "403 Forbidden",
            &[
                ("content-type", "text/html"),
                ("server", "cloudflare"),
                ("cf-ray", "8a1b2c3d4e5f-CDG"),
            ],
            "<html><title>Attention Required! | Cloudflare</title></html>",
        )
        .await;

        let error = client_for(base_url).fetch_raw(&query()).await.unwrap_err();
        match error {
            TrackerError::Blocked { trace_id } => {
                assert_eq!(trace_id.as_deref(), Some("8a1b2c3d4e5f-CDG"));
            }
            other => panic!("expected blocked error, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_reports_invalid_key_as_unauthorized() {
        let (base_url, _server) = spawn_one_shot_server(
            "403 Forbidden",
            &[("content-type", "application/json")],
            r#"{"errors":[{"message":"Invalid authentication credentials"}]}"#,
        )
        .await;

        let error = client_for(base_url).fetch_raw(&query()).await.unwrap_err();
        match error {
            TrackerError::Unauthorized(message) => {
                assert_eq!(message, "Invalid authentication credentials");
            }
            other => panic!("expected unauthorized error, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_reports_server_error_status() {
        let (base_url, _server) =
            spawn_one_shot_server("500 Internal Server Error", &[], "upstream exploded").await;

        let error = client_for(base_url).fetch_raw(&query()).await.unwrap_err();
        assert!(matches!(
            error,
            TrackerError::ServiceUnavailable { status: 500, .. }
        ));
        assert!(error.to_string().contains("upstream exploded"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_rejects_non_json_success_body() {
        let (base_url, _server) = spawn_one_shot_server(
            "200 OK",
            &[("content-type", "text/html")],
            "<html><body>Just a moment...</body></html>",
        )
        .await;

        let error = client_for(base_url).fetch_raw(&query()).await.unwrap_err();
        match error {
            TrackerError::InvalidResponse(message) => assert!(message.contains("<html>")),
            other => panic!("expected invalid response error, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_wraps_connection_failure_as_transport() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let error = client_for(format!("http://{address}"))
            .fetch_raw(&query())
            .await
            .unwrap_err();
        assert!(matches!(error, TrackerError::Transport(_)));
        assert!(std::error::Error::source(&error).is_some());
    }
}
