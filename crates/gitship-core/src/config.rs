use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::history::HistoryOptions;
use crate::submit::{RateLimit, RetryPolicy};

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries after the first attempt (0 = exactly one attempt).
    pub max_retries: u32,
    /// Delay in milliseconds before the first retry.
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_delay_ms: u64,
    /// Geometric growth factor between consecutive delays.
    pub backoff_multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Admission control parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Requests admitted per window.
    pub max_requests: u32,
    /// Trailing window length in milliseconds.
    pub window_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_ms: 60_000,
        }
    }
}

/// Global configuration loaded from `~/.config/gitship/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitshipConfig {
    /// Base URL of the tracker ingest endpoint.
    pub endpoint: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Tracker project to file submitted issues under.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Walk at most this many commits from HEAD.
    pub max_commits: usize,
    /// Keep only these branches (empty = all local branches).
    #[serde(default)]
    pub include_branches: Vec<String>,
    /// Drop these branches.
    #[serde(default)]
    pub exclude_branches: Vec<String>,
    /// Keep only commits at or after this RFC 3339 time, e.g. "2024-01-01T00:00:00Z".
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    /// Keep only commits at or before this RFC 3339 time.
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetrySettings>,
    /// Optional admission control; if missing, built-in defaults are used.
    #[serde(default)]
    pub rate_limit: Option<RateLimitSettings>,
}

impl Default for GitshipConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://tracker.example.com/api".to_string(),
            api_key: None,
            project_id: None,
            max_commits: 100_000,
            include_branches: Vec::new(),
            exclude_branches: Vec::new(),
            since: None,
            until: None,
            retry: None,
            rate_limit: None,
        }
    }
}

impl GitshipConfig {
    /// Validated retry policy from the optional `[retry]` section.
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        match &self.retry {
            Some(r) => RetryPolicy::new(
                r.max_retries,
                Duration::from_millis(r.base_delay_ms),
                Duration::from_millis(r.max_delay_ms),
                r.backoff_multiplier,
            ),
            None => Ok(RetryPolicy::default()),
        }
    }

    /// Validated admission limit from the optional `[rate_limit]` section.
    pub fn rate_limit(&self) -> Result<RateLimit> {
        match &self.rate_limit {
            Some(r) => RateLimit::new(r.max_requests, Duration::from_millis(r.window_ms)),
            None => Ok(RateLimit::default()),
        }
    }

    pub fn history_options(&self) -> HistoryOptions {
        HistoryOptions {
            max_commits: self.max_commits,
            include_branches: self.include_branches.clone(),
            exclude_branches: self.exclude_branches.clone(),
            since: self.since,
            until: self.until,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("gitship")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<GitshipConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = GitshipConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: GitshipConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = GitshipConfig::default();
        assert_eq!(cfg.endpoint, "https://tracker.example.com/api");
        assert_eq!(cfg.max_commits, 100_000);
        assert!(cfg.api_key.is_none());
        assert!(cfg.include_branches.is_empty());
        assert!(cfg.retry.is_none());
        assert!(cfg.rate_limit.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = GitshipConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: GitshipConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.endpoint, cfg.endpoint);
        assert_eq!(parsed.max_commits, cfg.max_commits);
        assert!(parsed.retry.is_none());
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            endpoint = "http://127.0.0.1:8080/api"
            api_key = "secret"
            project_id = "PROJ-7"
            max_commits = 500
            include_branches = ["main", "develop"]
            since = "2024-01-01T00:00:00Z"
        "#;
        let cfg: GitshipConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.endpoint, "http://127.0.0.1:8080/api");
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.project_id.as_deref(), Some("PROJ-7"));
        assert_eq!(cfg.max_commits, 500);
        assert_eq!(cfg.include_branches, vec!["main", "develop"]);
        assert!(cfg.since.is_some());
        assert!(cfg.until.is_none());
    }

    #[test]
    fn config_toml_retry_and_rate_limit_sections() {
        let toml = r#"
            endpoint = "http://127.0.0.1:8080/api"
            max_commits = 1000

            [retry]
            max_retries = 5
            base_delay_ms = 250
            max_delay_ms = 10000
            backoff_multiplier = 1.5

            [rate_limit]
            max_requests = 4
            window_ms = 1000
        "#;
        let cfg: GitshipConfig = toml::from_str(toml).unwrap();

        let policy = cfg.retry_policy().unwrap();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_millis(10_000));
        assert!((policy.multiplier - 1.5).abs() < f64::EPSILON);

        let limit = cfg.rate_limit().unwrap();
        assert_eq!(limit.max_requests, 4);
        assert_eq!(limit.window, Duration::from_millis(1000));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg = GitshipConfig::default();
        let policy = cfg.retry_policy().unwrap();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
        let limit = cfg.rate_limit().unwrap();
        assert_eq!(limit.max_requests, 10);
        assert_eq!(limit.window, Duration::from_millis(60_000));
    }

    #[test]
    fn degenerate_sections_are_rejected() {
        let toml = r#"
            endpoint = "http://127.0.0.1:8080/api"
            max_commits = 1000

            [retry]
            max_retries = 3
            base_delay_ms = 60000
            max_delay_ms = 30000
            backoff_multiplier = 2.0
        "#;
        let cfg: GitshipConfig = toml::from_str(toml).unwrap();
        assert!(cfg.retry_policy().is_err());
    }
}
