#![forbid(unsafe_code)]

//! Editor configuration.
//!
//! The history engine takes two numbers: how many undo states to keep and
//! how long typing must pause before a snapshot is taken. They are grouped in
//! [`HistoryConfig`] under the top-level [`EditorConfig`], which can be loaded
//! from TOML or JSON (feature `config-files`) and overridden from the
//! environment.
//!
//! # Loading
//!
//! ```toml
//! # scribe.toml
//! [history]
//! max_stack_size = 250
//! snapshot_delay_ms = 300
//! ```
//!
//! ```rust,ignore
//! let config = EditorConfig::from_toml_file("scribe.toml")?.apply_env();
//! config.validate()?;
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Type | Default | Description |
//! |----------|------|---------|-------------|
//! | `SCRIBE_MAX_STACK_SIZE` | usize | 100 | Undo stack bound |
//! | `SCRIBE_SNAPSHOT_DELAY_MS` | u64 | 500 | Debounce quiet period |
//!
//! Unparseable values are ignored.

#[cfg(feature = "config-files")]
use std::path::Path;

#[cfg(feature = "config-files")]
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Duration;

/// Default undo stack bound.
pub const DEFAULT_MAX_STACK_SIZE: usize = 100;

/// Default debounce quiet period in milliseconds.
pub const DEFAULT_SNAPSHOT_DELAY_MS: u64 = 500;

/// Longest accepted debounce quiet period (one hour).
pub const MAX_SNAPSHOT_DELAY_MS: u64 = 60 * 60 * 1000;

/// Configuration rejected before the engine is built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{format} parse error: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// History tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct HistoryConfig {
    /// Maximum entries on the undo stack; oldest are evicted first.
    pub max_stack_size: usize,
    /// Quiet period after the last mutation before a snapshot is recorded.
    pub snapshot_delay_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
            snapshot_delay_ms: DEFAULT_SNAPSHOT_DELAY_MS,
        }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn new(max_stack_size: usize, snapshot_delay_ms: u64) -> Self {
        Self {
            max_stack_size,
            snapshot_delay_ms,
        }
    }

    #[must_use]
    pub fn with_max_stack_size(mut self, max_stack_size: usize) -> Self {
        self.max_stack_size = max_stack_size;
        self
    }

    #[must_use]
    pub fn with_snapshot_delay(mut self, delay: Duration) -> Self {
        self.snapshot_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The debounce quiet period.
    #[must_use]
    pub fn snapshot_delay(&self) -> Duration {
        Duration::from_millis(self.snapshot_delay_ms)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stack_size == 0 {
            return Err(ConfigError::Invalid {
                field: "history.max_stack_size",
                reason: "must be > 0".into(),
            });
        }
        if self.snapshot_delay_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "history.snapshot_delay_ms",
                reason: "must be > 0".into(),
            });
        }
        if self.snapshot_delay_ms > MAX_SNAPSHOT_DELAY_MS {
            return Err(ConfigError::Invalid {
                field: "history.snapshot_delay_ms",
                reason: format!("must be <= {MAX_SNAPSHOT_DELAY_MS}"),
            });
        }
        Ok(())
    }
}

/// Top-level configuration for one editing surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct EditorConfig {
    pub history: HistoryConfig,
}

impl EditorConfig {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Apply `SCRIBE_*` overrides from the process environment on top of
    /// `self`, e.g. after loading a file.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Split out from [`from_env`](Self::from_env) so overrides can be tested
    /// without touching the process environment.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("SCRIBE_MAX_STACK_SIZE")
            && let Ok(n) = val.trim().parse::<usize>()
        {
            self.history.max_stack_size = n;
        }

        if let Some(val) = lookup("SCRIBE_SNAPSHOT_DELAY_MS")
            && let Ok(ms) = val.trim().parse::<u64>()
        {
            self.history.snapshot_delay_ms = ms;
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.history.validate()
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse {
            format: "TOML",
            message: e.to_string(),
        })
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::Parse {
            format: "JSON",
            message: e.to_string(),
        })
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Serialize to TOML.
    #[cfg(feature = "config-files")]
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
