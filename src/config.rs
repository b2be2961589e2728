//! Data source configuration.
//!
//! Replaces hard-coded endpoint constants with one explicit object handed to
//! the registry at construction. Loadable from YAML or from `ADS_GRID_*`
//! environment variables.
//!
//! ```yaml
//! base_url: "https://backend.example/"
//! root_url: "api/campaigns?ssrm=1"
//! level_endpoints:
//!   - url: "api/adsets"
//!     parent_key: campaign_id
//!   - url: "api/ads"
//!     parent_key: adset_id
//! period: TODAY
//! stale_responses: deliver
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_PERIOD: &str = "TODAY";
pub const DEFAULT_ADSET_PARENT_KEY: &str = "campaign_id";
pub const DEFAULT_AD_PARENT_KEY: &str = "adset_id";

/// What to do with a response whose node was re-fetched while it was in flight.
///
/// Responses for nodes released through the registry are always discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleResponsePolicy {
    /// Every fetch delivers, in resolution order (last to resolve wins)
    #[default]
    Deliver,
    /// A newer fetch of the same node supersedes older in-flight ones
    DiscardSuperseded,
}

impl std::str::FromStr for StaleResponsePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deliver" => Ok(StaleResponsePolicy::Deliver),
            "discard_superseded" | "discard" => Ok(StaleResponsePolicy::DiscardSuperseded),
            other => Err(ConfigError::invalid(
                "stale_responses",
                format!("unknown policy '{}'", other),
            )),
        }
    }
}

/// Endpoint for one drill-down level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEndpoint {
    pub url: String,
    /// Query parameter carrying the parent row id
    pub parent_key: String,
}

impl LevelEndpoint {
    pub fn new(url: impl Into<String>, parent_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parent_key: parent_key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSourceConfig {
    /// Base for relative endpoint URLs
    #[serde(default)]
    pub base_url: Option<String>,

    /// Root (campaign) listing endpoint
    pub root_url: String,

    /// Drill-down endpoints: index 0 → ad-sets, index 1 → ads
    pub level_endpoints: Vec<LevelEndpoint>,

    /// Reporting period sent with drill-down requests
    #[serde(default = "default_period")]
    pub period: String,

    #[serde(default)]
    pub stale_responses: StaleResponsePolicy,

    /// Per-request timeout; no timeout when unset
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_period() -> String {
    DEFAULT_PERIOD.to_string()
}

impl GridSourceConfig {
    /// Configuration with the default parent keys and period.
    pub fn new(
        root_url: impl Into<String>,
        adsets_url: impl Into<String>,
        ads_url: impl Into<String>,
    ) -> Self {
        Self {
            base_url: None,
            root_url: root_url.into(),
            level_endpoints: vec![
                LevelEndpoint::new(adsets_url, DEFAULT_ADSET_PARENT_KEY),
                LevelEndpoint::new(ads_url, DEFAULT_AD_PARENT_KEY),
            ],
            period: default_period(),
            stale_responses: StaleResponsePolicy::default(),
            request_timeout_ms: None,
        }
    }

    /// Set the reporting period.
    pub fn period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }

    /// Set the base URL for relative endpoints.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn stale_responses(mut self, policy: StaleResponsePolicy) -> Self {
        self.stale_responses = policy;
        self
    }

    pub fn request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Load and validate a YAML configuration file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup using the `ADS_GRID_*` variable names.
    ///
    /// `ADS_GRID_ROOT_URL`, `ADS_GRID_ADSETS_URL` and `ADS_GRID_ADS_URL` are
    /// required; `ADS_GRID_BASE_URL`, `ADS_GRID_PERIOD`,
    /// `ADS_GRID_STALE_POLICY` and `ADS_GRID_TIMEOUT_MS` are optional.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::Missing {
                    key: key.to_string(),
                })
        };

        let mut config = Self::new(
            required("ADS_GRID_ROOT_URL")?,
            required("ADS_GRID_ADSETS_URL")?,
            required("ADS_GRID_ADS_URL")?,
        );
        config.base_url = lookup("ADS_GRID_BASE_URL").filter(|v| !v.trim().is_empty());
        if let Some(period) = lookup("ADS_GRID_PERIOD") {
            config.period = period;
        }
        if let Some(policy) = lookup("ADS_GRID_STALE_POLICY") {
            config.stale_responses = policy.parse()?;
        }
        if let Some(timeout) = lookup("ADS_GRID_TIMEOUT_MS") {
            let ms = timeout.trim().parse::<u64>().map_err(|e| {
                ConfigError::invalid("ADS_GRID_TIMEOUT_MS", e.to_string())
            })?;
            config.request_timeout_ms = Some(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check structural requirements; endpoint URLs are resolved by the registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_url.trim().is_empty() {
            return Err(ConfigError::invalid("root_url", "must not be empty"));
        }
        if self.level_endpoints.len() != 2 {
            return Err(ConfigError::invalid(
                "level_endpoints",
                format!(
                    "expected 2 drill-down endpoints (ad-sets, ads), got {}",
                    self.level_endpoints.len()
                ),
            ));
        }
        for (i, endpoint) in self.level_endpoints.iter().enumerate() {
            if endpoint.url.trim().is_empty() {
                return Err(ConfigError::invalid(
                    &format!("level_endpoints[{}].url", i),
                    "must not be empty",
                ));
            }
            if endpoint.parent_key.trim().is_empty() {
                return Err(ConfigError::invalid(
                    &format!("level_endpoints[{}].parent_key", i),
                    "must not be empty",
                ));
            }
        }
        if self.period.trim().is_empty() {
            return Err(ConfigError::invalid("period", "must not be empty"));
        }
        if let Some(base) = &self.base_url {
            Url::parse(base).map_err(|e| ConfigError::invalid("base_url", e.to_string()))?;
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::invalid(
                "request_timeout_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    pub(crate) fn parsed_base_url(&self) -> Result<Option<Url>, ConfigError> {
        self.base_url
            .as_deref()
            .map(|base| Url::parse(base).map_err(|e| ConfigError::invalid("base_url", e.to_string())))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = GridSourceConfig::new("http://b/c", "http://b/as", "http://b/a");
        assert_eq!(config.period, "TODAY");
        assert_eq!(config.level_endpoints[0].parent_key, "campaign_id");
        assert_eq!(config.level_endpoints[1].parent_key, "adset_id");
        assert_eq!(config.stale_responses, StaleResponsePolicy::Deliver);
        assert_eq!(config.request_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
base_url: "http://backend.test/"
root_url: "api/campaigns?ssrm=1"
level_endpoints:
  - url: "api/adsets"
    parent_key: campaign_id
  - url: "api/ads"
    parent_key: adset_id
period: LAST_7D
stale_responses: discard_superseded
request_timeout_ms: 15000
"#
        )
        .unwrap();

        let config = GridSourceConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://backend.test/"));
        assert_eq!(config.period, "LAST_7D");
        assert_eq!(
            config.stale_responses,
            StaleResponsePolicy::DiscardSuperseded
        );
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_yaml_defaults_period() {
        let yaml = r#"
root_url: "http://b/c"
level_endpoints:
  - { url: "http://b/as", parent_key: campaign_id }
  - { url: "http://b/a", parent_key: adset_id }
"#;
        let config: GridSourceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.period, DEFAULT_PERIOD);
        assert_eq!(config.stale_responses, StaleResponsePolicy::Deliver);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GridSourceConfig::load_from_file(Path::new("/nonexistent/grid.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_from_lookup() {
        let config = GridSourceConfig::from_lookup(lookup_from(&[
            ("ADS_GRID_ROOT_URL", "http://b/campaigns"),
            ("ADS_GRID_ADSETS_URL", "http://b/adsets"),
            ("ADS_GRID_ADS_URL", "http://b/ads"),
            ("ADS_GRID_PERIOD", "YESTERDAY"),
            ("ADS_GRID_STALE_POLICY", "discard"),
            ("ADS_GRID_TIMEOUT_MS", "2500"),
        ]))
        .unwrap();
        assert_eq!(config.period, "YESTERDAY");
        assert_eq!(
            config.stale_responses,
            StaleResponsePolicy::DiscardSuperseded
        );
        assert_eq!(config.request_timeout_ms, Some(2500));
    }

    #[test]
    fn test_from_lookup_requires_endpoints() {
        let err = GridSourceConfig::from_lookup(lookup_from(&[
            ("ADS_GRID_ROOT_URL", "http://b/campaigns"),
            ("ADS_GRID_ADSETS_URL", "http://b/adsets"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key } if key == "ADS_GRID_ADS_URL"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GridSourceConfig::new("http://b/c", "http://b/as", "http://b/a");
        config.level_endpoints.pop();
        assert!(config.validate().is_err());

        let config = GridSourceConfig::new("http://b/c", "http://b/as", "http://b/a").period(" ");
        assert!(config.validate().is_err());

        let config =
            GridSourceConfig::new("http://b/c", "http://b/as", "http://b/a").base_url("not a url");
        assert!(config.validate().is_err());

        let err = "sometimes".parse::<StaleResponsePolicy>().unwrap_err();
        assert!(err.to_string().contains("unknown policy"));
    }
}
