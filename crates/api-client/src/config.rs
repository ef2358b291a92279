//! Client configuration.

use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the order and payment services.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Service root, e.g. `"https://api.example.com"`. A trailing slash is ignored.
    pub base_url: String,

    /// Site discriminator appended to order reads when set.
    pub site_code: Option<String>,

    pub timeout: Duration,
}

impl ApiClientConfig {
    /// Creates a config with no site code and the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            site_code: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_site_code(mut self, site_code: impl Into<String>) -> Self {
        self.site_code = Some(site_code.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins `path` onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
