//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so a session can start with zero configuration
//! against a backend on localhost.

use std::path::PathBuf;
use std::time::Duration;

use artac_shared::constants::{
    DEFAULT_API_URL, DEFAULT_CEO_CHANNEL_ID, DEFAULT_CEO_RESPONSE_DELAY_MS,
    DEFAULT_HEALTH_INTERVAL_SECS, DEFAULT_OFFLINE_RESPONSE_DELAY_MS, DEFAULT_STARTUP_TIMEOUT_MS,
    DEFAULT_USER_ID, DEFAULT_USER_NAME,
};
use artac_shared::types::{ChannelId, UserId};

/// Session configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend REST API.
    /// Env: `ARTAC_API_URL`
    pub api_url: String,

    /// Identity of the local user.
    /// Env: `ARTAC_USER_ID`, `ARTAC_USER_NAME`
    pub user_id: UserId,
    pub user_name: String,

    /// Location of the message cache database. `None` uses the platform
    /// cache directory.
    /// Env: `ARTAC_CACHE_PATH`
    pub cache_path: Option<PathBuf>,

    /// Channel whose messages are answered by the CEO agent.
    /// Env: `ARTAC_CEO_CHANNEL_ID`
    pub ceo_channel_id: ChannelId,

    /// Bound on the startup fetch and on each health ping.
    /// Env: `ARTAC_STARTUP_TIMEOUT_MS`
    pub startup_timeout: Duration,

    /// Period of the health reconciliation loop.
    /// Env: `ARTAC_HEALTH_INTERVAL_SECS`
    pub health_interval: Duration,

    /// Delay before the CEO chat endpoint is called after a send.
    /// Env: `ARTAC_CEO_RESPONSE_DELAY_MS`
    pub ceo_response_delay: Duration,

    /// Delay before a canned response replaces an unavailable agent.
    /// Env: `ARTAC_OFFLINE_RESPONSE_DELAY_MS`
    pub offline_response_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_id: UserId::from(DEFAULT_USER_ID),
            user_name: DEFAULT_USER_NAME.to_string(),
            cache_path: None,
            ceo_channel_id: ChannelId::from(DEFAULT_CEO_CHANNEL_ID),
            startup_timeout: Duration::from_millis(DEFAULT_STARTUP_TIMEOUT_MS),
            health_interval: Duration::from_secs(DEFAULT_HEALTH_INTERVAL_SECS),
            ceo_response_delay: Duration::from_millis(DEFAULT_CEO_RESPONSE_DELAY_MS),
            offline_response_delay: Duration::from_millis(DEFAULT_OFFLINE_RESPONSE_DELAY_MS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("ARTAC_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(id) = lookup("ARTAC_USER_ID").filter(|v| !v.trim().is_empty()) {
            config.user_id = UserId::new(id.trim());
        }

        if let Some(name) = lookup("ARTAC_USER_NAME").filter(|v| !v.trim().is_empty()) {
            config.user_name = name;
        }

        if let Some(path) = lookup("ARTAC_CACHE_PATH").filter(|v| !v.is_empty()) {
            config.cache_path = Some(PathBuf::from(path));
        }

        if let Some(id) = lookup("ARTAC_CEO_CHANNEL_ID").filter(|v| !v.trim().is_empty()) {
            config.ceo_channel_id = ChannelId::new(id.trim());
        }

        if let Some(ms) = parse_u64(&lookup, "ARTAC_STARTUP_TIMEOUT_MS") {
            config.startup_timeout = Duration::from_millis(ms);
        }

        if let Some(secs) = parse_u64(&lookup, "ARTAC_HEALTH_INTERVAL_SECS") {
            if secs == 0 {
                tracing::warn!("ARTAC_HEALTH_INTERVAL_SECS must be positive, using default");
            } else {
                config.health_interval = Duration::from_secs(secs);
            }
        }

        if let Some(ms) = parse_u64(&lookup, "ARTAC_CEO_RESPONSE_DELAY_MS") {
            config.ceo_response_delay = Duration::from_millis(ms);
        }

        if let Some(ms) = parse_u64(&lookup, "ARTAC_OFFLINE_RESPONSE_DELAY_MS") {
            config.offline_response_delay = Duration::from_millis(ms);
        }

        config
    }
}

fn parse_u64<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid number, using default");
            None
        }
    }
}
