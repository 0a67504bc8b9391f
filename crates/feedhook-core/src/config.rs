use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::feed::Feed;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub startup: StartupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// JSON file mapping subreddit names to webhook URLs
    #[serde(default = "default_feed_list")]
    pub feed_list: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            feed_list: default_feed_list(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Delay between two polls of the same feed, in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP proxy URL (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_timeout(),
            proxy_url: None,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        // tokio::time::interval panics on a zero period
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL the listing and about endpoints are resolved against
    #[serde(default = "default_source_base_url")]
    pub base_url: String,
    /// Prefix for item permalinks in rendered notifications
    #[serde(default = "default_permalink_base")]
    pub permalink_base: String,
    /// User-Agent sent with every outbound request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Number of items to request per listing (source default when unset)
    #[serde(default)]
    pub listing_limit: Option<u32>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_source_base_url(),
            permalink_base: default_permalink_base(),
            user_agent: default_user_agent(),
            listing_limit: None,
        }
    }
}

/// What to do when a feed's first fetch fails during startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitFailurePolicy {
    /// Fail startup as a whole
    #[default]
    Abort,
    /// Leave the feed unscheduled and continue with the rest
    Skip,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartupConfig {
    #[serde(default)]
    pub on_init_failure: InitFailurePolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_feed_list() -> PathBuf {
    PathBuf::from("list.json")
}

fn default_poll_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    30
}

fn default_source_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_permalink_base() -> String {
    "https://reddit.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let path = expand_tilde(path);

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Get the configuration file path
    /// Always uses ~/.config/feedhook/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("feedhook")
            .join("config.toml")
    }

    /// Get the feed list path (with tilde expansion)
    pub fn feed_list_path(&self) -> PathBuf {
        expand_tilde(&self.general.feed_list)
    }
}

/// Load the feed list: a flat JSON object of subreddit name to webhook URL.
///
/// Unlike the TOML config, a missing feed list is an error. Feeds come back
/// sorted by name.
pub fn load_feed_list(path: &Path) -> Result<Vec<Feed>> {
    let path = expand_tilde(path);
    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("Cannot read feed list {}: {}", path.display(), e))
    })?;

    parse_feed_list(&content)
        .map_err(|e| Error::Config(format!("Invalid feed list {}: {}", path.display(), e)))
}

fn parse_feed_list(content: &str) -> Result<Vec<Feed>> {
    let entries: BTreeMap<String, String> = serde_json::from_str(content)?;

    entries
        .into_iter()
        .map(|(name, endpoint)| {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(Error::Config("empty feed name".to_string()));
            }

            let url = Url::parse(&endpoint)?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(Error::Config(format!(
                    "endpoint for r/{} must be http(s), got '{}'",
                    name, endpoint
                )));
            }

            Ok(Feed::new(name, endpoint))
        })
        .collect()
}
