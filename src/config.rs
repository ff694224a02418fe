use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::deserialize_duration;

fn default_feed_url() -> String {
    crate::assets::DEFAULT_FEED_URL.to_string()
}

/// Default feed request timeout (5 seconds).
fn default_fetch_timeout() -> Duration {
    crate::assets::DEFAULT_FETCH_TIMEOUT
}

/// Default snapshot staleness (5 minutes).
fn default_staleness() -> Duration {
    crate::assets::DEFAULT_STALENESS
}

fn default_search_limit() -> usize {
    crate::assets::DEFAULT_SEARCH_LIMIT
}

/// External price feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Root URL of the asset price feed.
    pub url: String,

    /// Upper bound on a single feed request.
    #[serde(
        default = "default_fetch_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub fetch_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

/// Asset snapshot cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How old the asset snapshot can get before the next read refreshes it.
    #[serde(
        default = "default_staleness",
        deserialize_with = "deserialize_duration"
    )]
    pub staleness: Duration,

    /// Cap on results returned for an empty search query.
    pub search_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            staleness: default_staleness(),
            search_limit: default_search_limit(),
        }
    }
}

/// Library configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
