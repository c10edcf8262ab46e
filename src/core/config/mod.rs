use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Serialize, Deserialize};
use thiserror::Error;

pub const DEFAULT_CAPACITY: usize = 2;
pub const DEFAULT_INSERT_LIMIT: usize = 10;
pub const DEFAULT_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_PRODUCER_CODE: i32 = 100;
pub const DEFAULT_CONSUMER_CODE: i32 = 200;

/// Error loading or validating a [`QueueConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Config text is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A queue must hold at least one item.
    #[error("queue capacity must be greater than zero")]
    ZeroCapacity,
}

/// Settings for a queue and the producer/consumer pair driving it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub capacity: usize,
    /// `None` lets the producer insert without a budget
    pub insert_limit: Option<usize>,
    /// Per-call wait; `None` blocks indefinitely
    pub timeout_ms: Option<u64>,
    pub producer_code: i32,
    pub consumer_code: i32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            insert_limit: Some(DEFAULT_INSERT_LIMIT),
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            producer_code: DEFAULT_PRODUCER_CODE,
            consumer_code: DEFAULT_CONSUMER_CODE,
        }
    }
}

impl QueueConfig {
    /// Parse and validate a JSON document; missing fields take their defaults
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
