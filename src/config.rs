//! Configuration file support for ferro-kb.
//!
//! This module loads `.ferro-kb.toml` files that set query defaults, the
//! schema snapshot to query against, output format and log level.
//!
//! # Example Configuration
//!
//! ```toml
//! [query]
//! active-only = true
//! fuzzy-depth = 5
//! limit = 100
//!
//! [schema]
//! path = "schema.json"
//!
//! [output]
//! format = "json"
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! # Config File Locations
//!
//! Configuration is searched in this order (first found wins):
//! 1. the path given with `--config`
//! 2. `.ferro-kb.toml` in current directory
//! 3. `~/.config/ferro/kb.toml`
//!
//! CLI flags take precedence over config file settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FerroError;
use crate::query::constants::MAX_TRAVEL_DEPTH;
use crate::query::QueryOptions;

/// Parsed configuration from a .ferro-kb.toml file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct KbConfig {
    pub query: QueryConfig,
    pub schema: SchemaConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// `[query]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct QueryConfig {
    pub active_only: bool,
    /// Largest accepted `fuzzyMatch`
    pub fuzzy_depth: u32,
    /// Limit applied when a query sets none
    pub limit: Option<u64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            active_only: true,
            fuzzy_depth: MAX_TRAVEL_DEPTH,
            limit: None,
        }
    }
}

/// `[schema]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SchemaConfig {
    pub path: Option<PathBuf>,
}

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// `[output]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl KbConfig {
    /// Load configuration, preferring an explicit path over the default
    /// locations.
    ///
    /// An explicit path must exist and parse. Files found in the default
    /// locations are skipped with a warning when they fail to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, FerroError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        for candidate in Self::default_locations() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_path(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => log::warn!("ignoring {}: {}", candidate.display(), e),
            }
        }
        Ok(Self::default())
    }

    /// Candidate files in search order
    pub fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(".ferro-kb.toml")];
        if let Some(home) = dirs_home() {
            locations.push(home.join(".config").join("ferro").join("kb.toml"));
        }
        locations
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, FerroError> {
        let content = fs::read_to_string(path).map_err(|e| FerroError::Config {
            msg: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config = Self::parse(&content)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML content.
    pub fn parse(content: &str) -> Result<Self, FerroError> {
        let config: Self = toml::from_str(content)?;
        if config.query.fuzzy_depth > MAX_TRAVEL_DEPTH {
            return Err(FerroError::Config {
                msg: format!(
                    "fuzzy-depth ({}) must be less than or equal to {}",
                    config.query.fuzzy_depth, MAX_TRAVEL_DEPTH
                ),
            });
        }
        Ok(config)
    }

    /// Query defaults described by the `[query]` section
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            active_only: self.query.active_only,
            limit: self.query.limit,
            fuzzy_depth: self.query.fuzzy_depth,
            ..QueryOptions::default()
        }
    }

    /// Merge this config with CLI arguments.
    /// CLI arguments take precedence.
    pub fn merge_with_cli(
        &self,
        no_active_only: bool,
        format: Option<OutputFormat>,
        log_level: Option<&str>,
    ) -> Self {
        let mut config = self.clone();
        if no_active_only {
            config.query.active_only = false;
        }
        if let Some(format) = format {
            config.output.format = format;
        }
        if let Some(level) = log_level {
            config.logging.level = level.to_string();
        }
        config
    }
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
