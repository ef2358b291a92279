//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use api_client::ApiClientConfig;
use thiserror::Error;
use tracker::TrackerConfig;

/// Errors raised while loading or using configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Checkout and tracking cannot run without the API base URL.
    #[error("Configuration error: API URL not set")]
    MissingApiUrl,

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Storefront configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `API_BASE_URL`: order/payment API root (no default)
/// - `SITE_CODE`: tenant code sent on order reads (no default)
/// - `SITE_BRAND`: affiliation in conversion events (default: `"Tickets"`)
/// - `CURRENCY`: conversion currency (default: `"USD"`)
/// - `STOREFRONT_STATE_DIR`: storage directory (default: `".storefront"`)
/// - `POLL_INTERVAL_MS`: status poll period, non-zero (default: `2000`)
/// - `POLL_MAX_ATTEMPTS`: status poll budget (default: `15`)
/// - `HTTP_TIMEOUT_SECS`: per-request timeout (default: `10`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON lines, anything else for text
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub site_code: Option<String>,
    pub site_brand: String,
    pub currency: String,
    pub state_dir: PathBuf,
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
    pub http_timeout: Duration,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            api_base_url: var("API_BASE_URL"),
            site_code: var("SITE_CODE"),
            site_brand: var("SITE_BRAND").unwrap_or(defaults.site_brand),
            currency: var("CURRENCY").unwrap_or(defaults.currency),
            state_dir: var("STOREFRONT_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_dir),
            poll_interval: match var("POLL_INTERVAL_MS") {
                Some(v) => Duration::from_millis(parse_positive("POLL_INTERVAL_MS", v)?),
                None => defaults.poll_interval,
            },
            poll_max_attempts: match var("POLL_MAX_ATTEMPTS") {
                Some(v) => parse("POLL_MAX_ATTEMPTS", v)?,
                None => defaults.poll_max_attempts,
            },
            http_timeout: match var("HTTP_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(parse("HTTP_TIMEOUT_SECS", v)?),
                None => defaults.http_timeout,
            },
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match var("LOG_FORMAT").as_deref() {
                Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        })
    }

    /// Returns the API base URL, or the configuration gate error.
    pub fn require_api_base_url(&self) -> Result<&str, ConfigError> {
        self.api_base_url
            .as_deref()
            .ok_or(ConfigError::MissingApiUrl)
    }

    /// Builds the HTTP client settings.
    pub fn api_client_config(&self) -> Result<ApiClientConfig, ConfigError> {
        let mut config =
            ApiClientConfig::new(self.require_api_base_url()?).with_timeout(self.http_timeout);
        if let Some(site_code) = &self.site_code {
            config = config.with_site_code(site_code.clone());
        }
        Ok(config)
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            poll_interval: self.poll_interval,
            max_attempts: self.poll_max_attempts,
            affiliation: self.site_brand.clone(),
            currency: self.currency.clone(),
        }
    }

    /// Path of the durable (cross-session) storage file.
    pub fn local_store_path(&self) -> PathBuf {
        self.state_dir.join("local.json")
    }

    /// Path of the session-scoped storage file.
    pub fn session_store_path(&self) -> PathBuf {
        self.state_dir.join("session.json")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            site_code: None,
            site_brand: "Tickets".to_string(),
            currency: "USD".to_string(),
            state_dir: PathBuf::from(".storefront"),
            poll_interval: Duration::from_millis(2000),
            poll_max_attempts: 15,
            http_timeout: Duration::from_secs(10),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}

fn parse_positive(name: &'static str, value: String) -> Result<u64, ConfigError> {
    match parse::<u64>(name, value.clone())? {
        0 => Err(ConfigError::InvalidValue { name, value }),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[]).unwrap();
        assert!(config.api_base_url.is_none());
        assert_eq!(config.site_brand, "Tickets");
        assert_eq!(config.currency, "USD");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.poll_max_attempts, 15);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.local_store_path(), PathBuf::from(".storefront/local.json"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("API_BASE_URL", "https://api.example.com"),
            ("SITE_CODE", "tennis"),
            ("SITE_BRAND", "Dubai Tennis Tickets"),
            ("POLL_INTERVAL_MS", "500"),
            ("POLL_MAX_ATTEMPTS", "3"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.require_api_base_url().unwrap(), "https://api.example.com");
        let client = config.api_client_config().unwrap();
        assert_eq!(client.site_code.as_deref(), Some("tennis"));

        let tracker = config.tracker_config();
        assert_eq!(tracker.poll_interval, Duration::from_millis(500));
        assert_eq!(tracker.max_attempts, 3);
        assert_eq!(tracker.affiliation, "Dubai Tennis Tickets");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_api_url_gate() {
        let config = load(&[("API_BASE_URL", "  ")]).unwrap();
        let err = config.api_client_config().unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiUrl));
        assert_eq!(err.to_string(), "Configuration error: API URL not set");
    }

    #[test]
    fn test_invalid_number() {
        let err = load(&[("POLL_MAX_ATTEMPTS", "many")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { name: "POLL_MAX_ATTEMPTS", .. }
        ));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = load(&[("POLL_INTERVAL_MS", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { name: "POLL_INTERVAL_MS", ref value } if value == "0"
        ));
    }
}
