//! Endpoint configuration for the catalog service.

use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

pub const ENV_API_URL: &str = "SHELFWATCH_API_URL";
pub const ENV_WS_URL: &str = "SHELFWATCH_WS_URL";
pub const ENV_AUTH_TOKEN: &str = "SHELFWATCH_AUTH_TOKEN";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "SHELFWATCH_REQUEST_TIMEOUT_MS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid request timeout {0:?}: expected milliseconds")]
    InvalidTimeout(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Where the catalog lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST surface, without trailing slash.
    pub api_url: String,
    /// Full URL of the real-time WebSocket endpoint.
    pub realtime_url: String,
    /// Bearer token sent with every REST request.
    pub token: Option<String>,
    /// Per-request timeout; `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Real-time URL is derived from the API URL (see [`realtime_url_for`]).
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            realtime_url: realtime_url_for(&api_url),
            api_url,
            token: None,
            request_timeout: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_realtime_url(mut self, url: impl Into<String>) -> Self {
        self.realtime_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Read configuration from `SHELFWATCH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = non_empty(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_url);

        if let Some(ws) = non_empty(ENV_WS_URL) {
            config.realtime_url = ws;
        }
        config.token = non_empty(ENV_AUTH_TOKEN);
        if let Some(raw) = non_empty(ENV_REQUEST_TIMEOUT_MS) {
            let ms: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config.request_timeout = Some(Duration::from_millis(ms));
        }

        config.validate()?;
        Ok(config)
    }

    /// Both URLs must parse and use the expected schemes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_scheme(&self.api_url, &["http", "https"])?;
        check_scheme(&self.realtime_url, &["ws", "wss"])?;
        Ok(())
    }
}

fn check_scheme(url: &str, allowed: &[&str]) -> Result<(), ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !allowed.contains(&parsed.scheme()) {
        return Err(ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: format!("scheme must be one of {}", allowed.join(", ")),
        });
    }
    Ok(())
}

/// Map a REST base URL onto the real-time endpoint served next to it.
pub fn realtime_url_for(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    match base {
        u if u.starts_with("ws://") || u.starts_with("wss://") => format!("{}/ws", u),
        u if u.starts_with("http://") => format!("ws://{}/ws", &u[7..]),
        u if u.starts_with("https://") => format!("wss://{}/ws", &u[8..]),
        u => format!("ws://{}/ws", u),
    }
}
