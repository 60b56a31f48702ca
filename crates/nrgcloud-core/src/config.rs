//! Application configuration management.
//!
//! `Config` is the user-editable file stored at
//! `~/.config/nrgcloud/config.json`. Every field is optional; `cloud_config`
//! resolves it into the `CloudConfig` handed to the session manager.

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "nrgcloud";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Token cache file name in cache directory
const TOKEN_CACHE_FILE: &str = "cloud_token.json";

/// Base URL for the NRG Cloud customer API
pub const DEFAULT_BASE_URL: &str = "https://cloud-api.nrgsystems.com/nrgcloudcustomerapi/";

/// Hours a token is treated as valid after it is issued.
/// The API documents a 24 hour lifetime; refreshing at 22 hours leaves a margin.
pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 22;

/// Documented lifetime of a token on the server side.
pub const API_TOKEN_LIFETIME_HOURS: i64 = 24;

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub base_url: Option<String>,
    pub token_cache_path: Option<PathBuf>,
    pub token_lifetime_hours: Option<i64>,
    pub request_timeout_secs: Option<u64>,
    pub last_client_id: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Directory holding the config file and the log folder
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }

    pub fn default_token_cache_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(TOKEN_CACHE_FILE))
    }

    /// Resolve the optional fields into a complete `CloudConfig`
    pub fn cloud_config(&self) -> Result<CloudConfig> {
        let token_cache_path = match self.token_cache_path {
            Some(ref path) => path.clone(),
            None => Self::default_token_cache_path()?,
        };

        let mut cloud = CloudConfig::new(token_cache_path);
        if let Some(ref base_url) = self.base_url {
            cloud.base_url = base_url.clone();
        }
        if let Some(hours) = self.token_lifetime_hours {
            cloud.token_lifetime = token_lifetime_from_hours(hours)?;
        }
        if let Some(secs) = self.request_timeout_secs {
            cloud.request_timeout = StdDuration::from_secs(secs);
        }
        Ok(cloud)
    }
}

fn token_lifetime_from_hours(hours: i64) -> Result<Duration> {
    if hours <= 0 {
        anyhow::bail!("token_lifetime_hours must be positive, got {}", hours);
    }
    let lifetime = Duration::try_hours(hours)
        .ok_or_else(|| anyhow::anyhow!("token_lifetime_hours is out of range: {}", hours))?;
    if hours > API_TOKEN_LIFETIME_HOURS {
        warn!(
            hours,
            api_lifetime_hours = API_TOKEN_LIFETIME_HOURS,
            "Configured token lifetime exceeds the server-side lifetime"
        );
    }
    Ok(lifetime)
}

/// Settings the session manager runs with. Passed in explicitly at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudConfig {
    pub base_url: String,
    pub token_cache_path: PathBuf,
    /// How long after `issued_at` a token is still used.
    /// Tunable; see `DEFAULT_TOKEN_LIFETIME_HOURS`.
    pub token_lifetime: Duration,
    pub request_timeout: StdDuration,
}

impl CloudConfig {
    pub fn new(token_cache_path: PathBuf) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_cache_path,
            token_lifetime: Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS),
            request_timeout: StdDuration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cloud_config_defaults() {
        let cloud = CloudConfig::new(PathBuf::from("/tmp/token.json"));
        assert_eq!(cloud.base_url, DEFAULT_BASE_URL);
        assert_eq!(cloud.token_lifetime, Duration::hours(22));
        assert!(cloud.token_lifetime < Duration::hours(API_TOKEN_LIFETIME_HOURS));
        assert_eq!(cloud.request_timeout, StdDuration::from_secs(30));
    }

    #[test]
    fn test_cloud_config_applies_overrides() {
        let config = Config {
            base_url: Some("http://localhost:1234/".to_string()),
            token_cache_path: Some(PathBuf::from("/tmp/elsewhere.json")),
            token_lifetime_hours: Some(12),
            request_timeout_secs: Some(5),
            last_client_id: None,
        };
        let cloud = config.cloud_config().unwrap();
        assert_eq!(cloud.base_url, "http://localhost:1234/");
        assert_eq!(cloud.token_cache_path, PathBuf::from("/tmp/elsewhere.json"));
        assert_eq!(cloud.token_lifetime, Duration::hours(12));
        assert_eq!(cloud.request_timeout, StdDuration::from_secs(5));
    }

    #[test]
    fn test_cloud_config_rejects_non_positive_lifetime() {
        for hours in [0, -5] {
            let config = Config {
                token_cache_path: Some(PathBuf::from("/tmp/token.json")),
                token_lifetime_hours: Some(hours),
                ..Config::default()
            };
            assert!(config.cloud_config().is_err(), "{} hours accepted", hours);
        }
    }

    #[test]
    fn test_cloud_config_rejects_overflowing_lifetime() {
        let config = Config {
            token_cache_path: Some(PathBuf::from("/tmp/token.json")),
            token_lifetime_hours: Some(i64::MAX),
            ..Config::default()
        };
        let err = config.cloud_config().unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_config_parses_partial_file() {
        let config: Config = serde_json::from_str(r#"{"token_lifetime_hours": 20}"#).unwrap();
        assert_eq!(config.token_lifetime_hours, Some(20));
        assert_eq!(config.base_url, None);
    }
}
