//! Router configuration with validation.

use crate::domain::envelope::is_base_type;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Router configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Per-call timeout in milliseconds. `None` keeps calls pending until
    /// answered.
    pub call_timeout_ms: Option<u64>,
    /// Command sent to ask the peer to start pushing an event
    pub subscribe_command: String,
    /// Command sent to ask the peer to stop pushing an event
    pub unsubscribe_command: String,
    /// Send `unsubscribe_command` when the last handler of an event is removed
    pub notify_unsubscribe: bool,
    /// Bootstrap command used by `initialize`
    pub init_command: String,
    /// Events the peer pushes without a prior subscribe request
    pub passive_events: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: None,
            subscribe_command: "SUBSCRIBE".to_string(),
            unsubscribe_command: "UNSUBSCRIBE".to_string(),
            notify_unsubscribe: false,
            init_command: "INIT".to_string(),
            passive_events: vec![
                "load".to_string(),
                "loading".to_string(),
                "no-data".to_string(),
            ],
        }
    }
}

impl RouterConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.call_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidTimeout(
                "call_timeout_ms cannot be 0".into(),
            ));
        }

        for (field, value) in [
            ("subscribe_command", &self.subscribe_command),
            ("unsubscribe_command", &self.unsubscribe_command),
            ("init_command", &self.init_command),
        ] {
            if !is_base_type(value) {
                return Err(ConfigError::InvalidCommand {
                    field,
                    value: value.clone(),
                });
            }
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Call timeout, if enabled
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("{field} must be a non-empty base type without an outcome suffix, got {value:?}")]
    InvalidCommand { field: &'static str, value: String },
    #[error("parse error: {0}")]
    Parse(String),
}
