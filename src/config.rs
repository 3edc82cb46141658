use std::env;
use std::time::Duration;

use crate::state::{DEFAULT_TEAM1_NAME, DEFAULT_TEAM2_NAME};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Http,
    Sim,
}

#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub api_url: String,
    pub source: SourceKind,
    pub snapshot_period: Duration,
    pub status_period: Duration,
    pub inflight_max: usize,
    pub request_timeout: Duration,
    pub team1_name: String,
    pub team2_name: String,
    pub sim_duration: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            source: SourceKind::Http,
            snapshot_period: Duration::from_millis(2000),
            status_period: Duration::from_millis(3000),
            inflight_max: 8,
            request_timeout: Duration::from_secs(10),
            team1_name: DEFAULT_TEAM1_NAME.to_string(),
            team2_name: DEFAULT_TEAM2_NAME.to_string(),
            sim_duration: Duration::from_secs(60),
        }
    }
}

impl BoardConfig {
    /// Reads `BLAZE_*` variables. Anything missing or unparsable keeps its default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| {
            lookup(key)
                .map(|val| val.trim().to_string())
                .filter(|val| !val.is_empty())
        };
        let number = |key: &str| text(key).and_then(|val| val.parse::<u64>().ok());

        let api_url = text("BLAZE_API_URL")
            .map(|val| val.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        let source = match text("BLAZE_SOURCE")
            .unwrap_or_else(|| "http".to_string())
            .to_lowercase()
            .as_str()
        {
            "sim" | "simulated" => SourceKind::Sim,
            _ => SourceKind::Http,
        };
        let snapshot_period =
            Duration::from_millis(number("BLAZE_POLL_MS").unwrap_or(2000).max(250));
        let status_period =
            Duration::from_millis(number("BLAZE_STATUS_POLL_MS").unwrap_or(3000).max(250));
        let inflight_max = number("BLAZE_INFLIGHT_MAX")
            .map(|val| val.clamp(1, 64) as usize)
            .unwrap_or(defaults.inflight_max);
        let request_timeout =
            Duration::from_secs(number("BLAZE_REQUEST_TIMEOUT_SECS").unwrap_or(10).clamp(1, 60));
        let sim_duration = Duration::from_secs(number("BLAZE_SIM_SECS").unwrap_or(60).max(5));

        Self {
            api_url,
            source,
            snapshot_period,
            status_period,
            inflight_max,
            request_timeout,
            team1_name: text("BLAZE_TEAM1_NAME").unwrap_or(defaults.team1_name),
            team2_name: text("BLAZE_TEAM2_NAME").unwrap_or(defaults.team2_name),
            sim_duration,
        }
    }
}
