//! Configuration (audit.toml)
//!
//! Controls which checks the core runs and how the resulting issue list is
//! post-processed into a report. Every field has a default, so an empty file
//! (or no file at all) is valid.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::issue::{IssueCode, Severity};

/// Switches consumed by the validator core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Decode accessor data and run data-level checks (default: true)
    #[serde(default = "default_true")]
    pub validate_accessor_data: bool,
    /// Report unused animation samplers at the pointer of the first channel
    /// without a `sampler` property (default: false)
    #[serde(default)]
    pub legacy_sampler_pointer: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            validate_accessor_data: true,
            legacy_sampler_pointer: false,
        }
    }
}

/// Full configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReportConfig {
    /// Core switches
    #[serde(default)]
    pub validation: ValidationOptions,
    /// Report shaping
    #[serde(default)]
    pub report: ReportOptions,
}

/// Post-processing applied to the issue list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Maximum number of issues kept after filtering (default: unlimited)
    #[serde(default)]
    pub max_issues: Option<usize>,
    /// Codes dropped from the report
    #[serde(default)]
    pub ignored: Vec<IssueCode>,
    /// Per-code severity replacements
    #[serde(default)]
    pub severity_overrides: HashMap<IssueCode, Severity>,
    /// Sort issues by pointer before truncation (default: true)
    #[serde(default = "default_true")]
    pub sort: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            max_issues: None,
            ignored: Vec::new(),
            severity_overrides: HashMap::new(),
            sort: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Failure to load a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ReportConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }
}
