use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Errors from loading a client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Client tuning. Omitted fields take their defaults.
///
/// ```yaml
/// request_interval_ms: 250
/// stale_after_ms: 3000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Minimum spacing between outgoing requests, across all sensors.
    pub request_interval_ms: u64,
    /// Age after which a cached report reads as empty.
    pub stale_after_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_interval_ms: 250,
            stale_after_ms: 3000,
        }
    }
}

impl ClientConfig {
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), ?config, "client config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_interval_ms must be positive".into(),
            ));
        }
        if self.stale_after_ms == 0 {
            return Err(ConfigError::Invalid("stale_after_ms must be positive".into()));
        }
        Ok(())
    }
}
