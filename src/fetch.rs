use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;

use crate::http_client::http_client;
use crate::source::ScoreSource;
use crate::state::{MatchSnapshot, MatchStatus};

const PLAYERS_PATH: &str = "/api/players";
const MATCH_STATUS_PATH: &str = "/api/match_status";

/// Reads the scoring backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn players_url(&self) -> String {
        format!("{}{PLAYERS_PATH}", self.base_url)
    }

    pub fn status_url(&self) -> String {
        format!("{}{MATCH_STATUS_PATH}", self.base_url)
    }
}

impl ScoreSource for HttpSource {
    async fn fetch_snapshot(&self) -> Result<MatchSnapshot> {
        let client = http_client()?;
        let body = fetch_body(client, &self.players_url(), self.timeout)
            .await
            .context("players request failed")?;
        parse_players_json(&body)
    }

    async fn fetch_status(&self) -> Result<MatchStatus> {
        let client = http_client()?;
        let body = fetch_body(client, &self.status_url(), self.timeout)
            .await
            .context("match status request failed")?;
        parse_match_status_json(&body)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

async fn fetch_body(client: &Client, url: &str, timeout: Duration) -> Result<String> {
    let resp = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .context("connection failed")?;
    let status = resp.status();
    let body = resp.text().await.context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {}: {}", status, truncate(&body, 120)));
    }
    Ok(body)
}

/// Parses the `/api/players` payload. Both team arrays must be present; an empty or `null`
/// body is an error rather than an empty board, so a half-broken backend never wipes the
/// rendered state.
pub fn parse_players_json(raw: &str) -> Result<MatchSnapshot> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow!("empty players payload"));
    }
    serde_json::from_str(trimmed).context("invalid players json")
}

pub fn parse_match_status_json(raw: &str) -> Result<MatchStatus> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow!("empty match status payload"));
    }
    serde_json::from_str(trimmed).context("invalid match status json")
}

fn truncate(raw: &str, max: usize) -> &str {
    match raw.char_indices().nth(max) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}
