//! Fetcher configuration for shortvid
//!
//! All values default to the built-in constants. A JSON file at
//! `~/.shortvid/config.json` (or an explicit path) may override any field,
//! and `SHORTVID_*` environment variables override the numeric knobs on top
//! of that.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::endpoints::{default_endpoints, is_http_url, Endpoint};
use crate::error::{Result, ShortvidError};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 5;
pub const DEFAULT_MAX_CONNECTIONS_PER_HOST: usize = 5;
pub const DEFAULT_USER_AGENT: &str = concat!(
    "shortvid/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/cloudcranesss/astrbot_plugin_game_videos)"
);

const ENV_TIMEOUT_SECS: &str = "SHORTVID_TIMEOUT_SECS";
const ENV_CONNECT_TIMEOUT_SECS: &str = "SHORTVID_CONNECT_TIMEOUT_SECS";
const ENV_MAX_RETRIES: &str = "SHORTVID_MAX_RETRIES";
const ENV_RETRY_DELAY_MS: &str = "SHORTVID_RETRY_DELAY_MS";

/// Settings for the fallback fetcher and its HTTP session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Upstream endpoints, tried in shuffled order.
    pub endpoints: Vec<Endpoint>,
    /// Total per-request timeout.
    pub timeout_secs: u64,
    /// Connection establishment timeout.
    pub connect_timeout_secs: u64,
    /// Attempts per endpoint before moving on.
    pub max_retries: u32,
    /// Base backoff; attempt `n` is followed by a sleep of `n * retry_delay_ms`.
    pub retry_delay_ms: u64,
    /// Idle connections kept per upstream host.
    pub pool_max_idle_per_host: usize,
    /// Requests allowed in flight at once against one upstream host.
    pub max_connections_per_host: usize,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            max_connections_per_host: DEFAULT_MAX_CONNECTIONS_PER_HOST,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetcherConfig {
    /// Default config file location (`~/.shortvid/config.json`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".shortvid").join("config.json"))
    }

    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            ShortvidError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Apply `SHORTVID_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are
    /// ignored with a warning.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_override(&lookup, ENV_TIMEOUT_SECS) {
            self.timeout_secs = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_CONNECT_TIMEOUT_SECS) {
            self.connect_timeout_secs = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_MAX_RETRIES) {
            self.max_retries = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_RETRY_DELAY_MS) {
            self.retry_delay_ms = v;
        }
    }

    /// Reject settings the fetcher cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(ShortvidError::Config(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(ShortvidError::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.max_connections_per_host == 0 {
            return Err(ShortvidError::Config(
                "max_connections_per_host must be at least 1".to_string(),
            ));
        }
        if let Some(bad) = self.endpoints.iter().find(|e| !is_http_url(&e.url)) {
            return Err(ShortvidError::Config(format!(
                "endpoint '{}' is not an absolute http(s) URL",
                bad.url
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn parse_override<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring invalid config override");
            None
        }
    }
}
