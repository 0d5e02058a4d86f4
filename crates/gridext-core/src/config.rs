//! gridext.toml configuration parser.
//!
//! The configuration is parsed once at process start and handed to the
//! pipeline constructor by reference. The decision core reads it but
//! never mutates it; reconfiguration means building a new registry and
//! pipeline from a fresh config.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown predicate: {0}")]
    UnknownPredicate(String),

    #[error("unknown priority function: {0}")]
    UnknownPriority(String),
}

/// Whether this extender performs binds itself.
///
/// The caller learns this out-of-band (via `/version`); in declining
/// mode it must never issue bind calls, and any that arrive anyway get
/// a structured "unsupported" outcome.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BindMode {
    /// Commit the placement against the cluster-state collaborator.
    Delegating,
    /// Always answer "bind unsupported"; the caller binds itself.
    #[default]
    Declining,
}

/// Top-level extender configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtenderConfig {
    /// Port the wire adapter listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// tracing env-filter directive, e.g. "info,gridext=debug".
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub bind_mode: BindMode,
    /// Per-call deadline in milliseconds for filter/prioritize/preempt.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// Predicates to register, in evaluation order.
    #[serde(default = "default_predicates")]
    pub predicates: Vec<String>,
    /// Priority functions to register with their weights.
    #[serde(default = "default_priorities")]
    pub priorities: Vec<PriorityConfig>,
}

/// One registered priority function and its non-negative weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriorityConfig {
    pub name: String,
    pub weight: u64,
}

fn default_port() -> u16 {
    8880
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_deadline_ms() -> u64 {
    5_000
}

fn default_predicates() -> Vec<String> {
    vec![
        "resource-fit".to_string(),
        "node-label-selector".to_string(),
        "taint-toleration".to_string(),
    ]
}

fn default_priorities() -> Vec<PriorityConfig> {
    vec![
        PriorityConfig {
            name: "least-allocated".to_string(),
            weight: 1,
        },
        PriorityConfig {
            name: "preferred-label-affinity".to_string(),
            weight: 1,
        },
        PriorityConfig {
            name: "owner-spread".to_string(),
            weight: 1,
        },
    ]
}

impl Default for ExtenderConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_filter: default_log_filter(),
            bind_mode: BindMode::default(),
            deadline_ms: default_deadline_ms(),
            predicates: default_predicates(),
            priorities: default_priorities(),
        }
    }
}

impl ExtenderConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ExtenderConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
