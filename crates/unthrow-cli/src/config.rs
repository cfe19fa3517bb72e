//! CLI configuration file support (`.unthrow.toml`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use unthrow_engine::{AnalyzerOptions, DEFAULT_OVERRIDE_SEARCH_BUDGET};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".unthrow.toml";

/// Analyzer settings read from `.unthrow.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    /// Skip methods the snapshot marks as entry points.
    #[serde(default)]
    pub ignore_entry_points: bool,

    /// Maximum override count enumerated per method before the
    /// analyzer leaves its declarations untouched.
    #[serde(default = "default_budget")]
    pub override_search_budget: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            ignore_entry_points: false,
            override_search_budget: default_budget(),
        }
    }
}

fn default_budget() -> usize {
    DEFAULT_OVERRIDE_SEARCH_BUDGET
}

impl CliConfig {
    /// Loads an explicit config file; the path must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads `.unthrow.toml` from the working directory when present,
    /// falling back to defaults.
    pub fn load_default() -> Result<Self> {
        let path = Path::new(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_options(&self) -> AnalyzerOptions {
        AnalyzerOptions {
            ignore_entry_points: self.ignore_entry_points,
            override_search_budget: self.override_search_budget,
        }
    }
}
