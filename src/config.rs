//! Broker configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BrokerError, BrokerResult};

/// Broker-wide settings. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Max nested publishes (a callback publishing from inside a fanout) on one thread.
    pub max_publish_depth: usize,
    /// Name of the worker thread behind the default timer service.
    pub timer_thread_name: String,
    /// Max queued schedule/cancel requests for the default timer service.
    pub timer_queue_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            max_publish_depth: 32,
            timer_thread_name: "attrbus-timer".to_string(),
            timer_queue_capacity: 1024,
        }
    }
}

impl BrokerConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> BrokerResult<Self> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| BrokerError::Config {
            message: format!("invalid broker config: {e}"),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> BrokerResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| BrokerError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_json_str(&raw)
    }

    fn validate(&self) -> BrokerResult<()> {
        if self.max_publish_depth == 0 {
            return Err(BrokerError::Config {
                message: "max_publish_depth must be at least 1".to_string(),
            });
        }
        if self.timer_thread_name.trim().is_empty() {
            return Err(BrokerError::Config {
                message: "timer_thread_name cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}
