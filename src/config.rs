/// Configuration module for codegenius.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::indexer::file_tree::IgnoreRules;

pub const DEFAULT_CONFIG_PATH: &str = "codegenius.json";

// ── Default value functions ──────────────────────────────────────────

fn default_output_dir() -> PathBuf {
    PathBuf::from("./docs")
}

fn default_max_depth() -> usize {
    10
}

fn default_clone_timeout_secs() -> u64 {
    60
}

fn default_readme_summary_lines() -> usize {
    20
}

fn default_key_entity_limit() -> usize {
    10
}

fn default_entry_point_limit() -> usize {
    5
}

fn default_structure_depth() -> usize {
    3
}

// ── Config struct ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Directory generated documents are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Deepest level the repository walk descends to (root is 0).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_clone_timeout_secs")]
    pub clone_timeout_secs: u64,

    /// Parent directory for temporary clones. System temp dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_root: Option<PathBuf>,

    #[serde(default = "default_readme_summary_lines")]
    pub readme_summary_lines: usize,

    #[serde(default = "default_key_entity_limit")]
    pub key_entity_limit: usize,

    #[serde(default = "default_entry_point_limit")]
    pub entry_point_limit: usize,

    /// Levels of the file tree drawn in the structure section.
    #[serde(default = "default_structure_depth")]
    pub structure_depth: usize,

    /// Extra entry-name globs skipped on top of the built-in ignore set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_ignore_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_depth: default_max_depth(),
            clone_timeout_secs: default_clone_timeout_secs(),
            clone_root: None,
            readme_summary_lines: default_readme_summary_lines(),
            key_entity_limit: default_key_entity_limit(),
            entry_point_limit: default_entry_point_limit(),
            structure_depth: default_structure_depth(),
            extra_ignore_patterns: Vec::new(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to [`DEFAULT_CONFIG_PATH`].
    /// If the file does not exist, returns a default config and, for the
    /// default path only, writes a template file.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            DEFAULT_CONFIG_PATH
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            if path == DEFAULT_CONFIG_PATH {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.output_dir.as_os_str().is_empty(),
            "output_dir must not be empty"
        );
        anyhow::ensure!(
            self.clone_timeout_secs > 0,
            "clone_timeout_secs must be positive"
        );
        anyhow::ensure!(
            self.readme_summary_lines > 0,
            "readme_summary_lines must be positive"
        );
        anyhow::ensure!(
            self.key_entity_limit > 0,
            "key_entity_limit must be positive"
        );
        anyhow::ensure!(
            self.entry_point_limit > 0,
            "entry_point_limit must be positive"
        );
        anyhow::ensure!(
            self.structure_depth > 0,
            "structure_depth must be positive"
        );
        self.ignore_rules()?;
        Ok(())
    }

    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }

    /// Built-in ignore set extended with `extra_ignore_patterns`.
    pub fn ignore_rules(&self) -> Result<IgnoreRules> {
        IgnoreRules::with_extra(self.extra_ignore_patterns.as_slice())
            .context("invalid pattern in extra_ignore_patterns")
    }
}

// ── Tests ────────────────────────────────────────────────────────────
