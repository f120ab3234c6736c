use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error type for compiler configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O or YAML parsing error occurred while loading config.
    Load(String),
    /// A value was present but could not be interpreted.
    Invalid { key: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid { key, message } => {
                write!(f, "Invalid config value for '{key}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ── Page size policy ────────────────────────────────────────────────────

/// How the effective page size is chosen.
///
/// In YAML: `null` disables pagination, a number is a fixed size, and a list
/// is the set of sizes a client may pick from (the first is the fallback).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSizePolicy {
    /// No pagination: the full result set is returned.
    Disabled,
    /// Always this size; requested sizes are ignored.
    Fixed(u64),
    /// A requested size is honored only when it is a member.
    Allowed(Vec<u64>),
}

impl Default for PageSizePolicy {
    fn default() -> Self {
        PageSizePolicy::Fixed(DEFAULT_PAGE_SIZE)
    }
}

impl PageSizePolicy {
    /// Resolve the effective page size, or `None` when pagination is off.
    pub fn resolve(&self, requested: Option<u64>) -> Option<u64> {
        match self {
            PageSizePolicy::Disabled => None,
            PageSizePolicy::Fixed(size) => Some(*size),
            PageSizePolicy::Allowed(sizes) => {
                let first = *sizes.first()?;
                match requested {
                    Some(size) if sizes.contains(&size) => Some(size),
                    Some(size) => {
                        tracing::debug!(requested = size, fallback = first, "page size not allowed");
                        Some(first)
                    }
                    None => Some(first),
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.resolve(None).is_some()
    }

    /// Parse the compact textual form used by environment variables:
    /// `none`, `25`, or `10,25,50`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("none") || raw.eq_ignore_ascii_case("null") {
            return Ok(PageSizePolicy::Disabled);
        }
        let sizes = raw
            .split(',')
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .map_err(|e| format!("'{}': {e}", s.trim()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if raw.contains(',') {
            Ok(PageSizePolicy::Allowed(sizes))
        } else {
            Ok(PageSizePolicy::Fixed(sizes[0]))
        }
    }
}

/// Page size used when no policy is configured.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Deserialize)]
#[serde(untagged)]
enum PolicyRepr {
    Size(u64),
    Sizes(Vec<u64>),
}

impl<'de> Deserialize<'de> for PageSizePolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<PolicyRepr>::deserialize(deserializer)? {
            None => PageSizePolicy::Disabled,
            Some(PolicyRepr::Size(size)) => PageSizePolicy::Fixed(size),
            Some(PolicyRepr::Sizes(sizes)) => PageSizePolicy::Allowed(sizes),
        })
    }
}

impl Serialize for PageSizePolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageSizePolicy::Disabled => serializer.serialize_none(),
            PageSizePolicy::Fixed(size) => serializer.serialize_u64(*size),
            PageSizePolicy::Allowed(sizes) => sizes.serialize(serializer),
        }
    }
}

// ── Compiler config ─────────────────────────────────────────────────────

/// Parameter names and pagination policy of a [`QueryCompiler`](crate::QueryCompiler).
///
/// Every field has a default, so an empty YAML document is a valid config:
///
/// ```yaml
/// filter_parameter: filters   # null = filters are top-level keys
/// order_parameter: order_by
/// page_parameter: page
/// page_size_parameter: per_page
/// pagination: [10, 25, 50]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub filter_parameter: Option<String>,
    pub order_parameter: String,
    pub page_parameter: String,
    pub page_size_parameter: String,
    pub pagination: PageSizePolicy,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            filter_parameter: Some("filters".to_string()),
            order_parameter: "order_by".to_string(),
            page_parameter: "page".to_string(),
            page_size_parameter: "per_page".to_string(),
            pagination: PageSizePolicy::default(),
        }
    }
}

impl CompilerConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))
    }

    /// Load from a YAML file. A missing file yields the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "compiler config file not found, using defaults");
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
        Self::from_yaml_str(&content)
    }

    /// Load from a dot-separated section of a larger YAML document, e.g.
    /// `app.query` in an `application.yaml`. A missing section yields the defaults.
    pub fn from_yaml_section(content: &str, section: &str) -> Result<Self, ConfigError> {
        let root: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
        let mut node = &root;
        for segment in section.split('.').filter(|s| !s.is_empty()) {
            match node.get(segment) {
                Some(child) => node = child,
                None => return Ok(Self::default()),
            }
        }
        if node.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(node.clone()).map_err(|e| ConfigError::Invalid {
            key: section.to_string(),
            message: e.to_string(),
        })
    }

    /// Overlay `RESQ_*` environment variables.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary lookup using the `RESQ_*` names.
    ///
    /// `RESQ_FILTER_PARAMETER` set to an empty string switches to flat input.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup("RESQ_FILTER_PARAMETER") {
            self.filter_parameter = if v.trim().is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("RESQ_ORDER_PARAMETER") {
            self.order_parameter = v;
        }
        if let Some(v) = lookup("RESQ_PAGE_PARAMETER") {
            self.page_parameter = v;
        }
        if let Some(v) = lookup("RESQ_PAGE_SIZE_PARAMETER") {
            self.page_size_parameter = v;
        }
        if let Some(v) = lookup("RESQ_PAGINATION") {
            self.pagination = PageSizePolicy::parse(&v).map_err(|message| ConfigError::Invalid {
                key: "RESQ_PAGINATION".to_string(),
                message,
            })?;
        }
        Ok(self)
    }
}
