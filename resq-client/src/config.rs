use std::time::Duration;

use serde::Deserialize;

/// Client-side settings. Parameter names must mirror the server's
/// compiler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix joined in front of relative actions.
    pub base_url: Option<String>,
    /// Root key filters are nested under; `None` sends them as top-level keys.
    pub filter_parameter: Option<String>,
    pub order_parameter: String,
    pub page_parameter: String,
    pub page_size_parameter: String,
    /// Request timeout in seconds, passed to the HTTP client.
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            filter_parameter: Some("filters".to_string()),
            order_parameter: "order_by".to_string(),
            page_parameter: "page".to_string(),
            page_size_parameter: "per_page".to_string(),
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Resolve `action` against `base_url`. Absolute URLs pass through.
    pub fn resolve_url(&self, action: &str) -> String {
        match &self.base_url {
            Some(base) if !action.contains("://") => {
                let base = base.trim_end_matches('/');
                let action = action.trim_start_matches('/');
                if action.is_empty() {
                    base.to_string()
                } else {
                    format!("{base}/{action}")
                }
            }
            _ => action.to_string(),
        }
    }
}
