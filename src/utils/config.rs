//! Configuration management for pzip
//!
//! Configuration is layered from several TOML sources, later ones taking
//! precedence key by key:
//! defaults -> user config -> project config -> explicit `--config` file.
//! CLI flags are applied on top by the caller.

use crate::error::{PzipError, Result};
use crate::threading::PipelineConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the per-directory configuration
pub const PROJECT_CONFIG_NAME: &str = ".pzip.toml";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Pipeline tuning
    pub pipeline: PipelineSection,
    /// Output settings
    pub output: OutputConfig,
}

/// Pipeline settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSection {
    /// Page size in bytes (unset = platform memory page size)
    pub page_size: Option<usize>,
    /// Work queue capacity
    pub queue_capacity: usize,
    /// Number of compression workers (0 = auto-detect)
    pub threads: u16,
}

/// Output configuration settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Log format, "human" or "json"
    pub log_format: String,
    /// Default log level
    pub verbose_level: String,
    /// Color log output when stderr is a terminal
    pub color_output: bool,
    /// Show a progress bar by default
    pub progress: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            page_size: None,
            queue_capacity: crate::threading::config::DEFAULT_QUEUE_CAPACITY,
            threads: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_format: "human".to_string(),
            verbose_level: "warn".to_string(),
            color_output: true,
            progress: false,
        }
    }
}

impl Config {
    /// Pipeline configuration described by this config
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new()
            .with_queue_capacity(self.pipeline.queue_capacity)
            .with_worker_count(self.pipeline.threads as usize);
        if let Some(page_size) = self.pipeline.page_size {
            config = config.with_page_size(page_size);
        }
        config
    }
}

/// Configuration builder that loads from multiple sources
pub struct ConfigBuilder {
    layers: toml::Table,
}

impl ConfigBuilder {
    /// Create a new configuration builder with defaults
    pub fn new() -> Self {
        Self {
            layers: toml::Table::new(),
        }
    }

    /// Load user configuration, if present
    pub fn load_user_config(self) -> Result<Self> {
        match get_user_config_path() {
            Some(path) if path.exists() => self.load_file(path),
            _ => Ok(self),
        }
    }

    /// Load project-specific configuration, if present
    pub fn load_project_config(self) -> Result<Self> {
        match get_project_config_path() {
            Some(path) if path.exists() => self.load_file(path),
            _ => Ok(self),
        }
    }

    /// Load an explicitly named configuration file, which must exist
    pub fn load_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PzipError::config_error(
                format!("Config file not found: {}", path.display()),
                Some(path.to_path_buf()),
            ));
        }

        let table = load_config_table(path)?;
        merge_tables(&mut self.layers, table);
        tracing::debug!("Loaded config from: {}", path.display());
        Ok(self)
    }

    /// Build the final configuration
    pub fn build(self) -> Result<Config> {
        let config: Config = toml::Value::Table(self.layers)
            .try_into()
            .map_err(|e| PzipError::config_error(format!("Invalid configuration: {}", e), None))?;
        validate_config(&config)?;
        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_config(config: &Config) -> Result<()> {
    config
        .pipeline_config()
        .validate()
        .map_err(|e| PzipError::config_error(e, None))?;

    let valid_formats = ["human", "json"];
    if !valid_formats.contains(&config.output.log_format.as_str()) {
        return Err(PzipError::config_error(
            format!(
                "Invalid log format: {} (must be one of: {})",
                config.output.log_format,
                valid_formats.join(", ")
            ),
            None,
        ));
    }

    let valid_levels = ["error", "warn", "info", "debug", "trace"];
    if !valid_levels.contains(&config.output.verbose_level.as_str()) {
        return Err(PzipError::config_error(
            format!(
                "Invalid verbose level: {} (must be one of: {})",
                config.output.verbose_level,
                valid_levels.join(", ")
            ),
            None,
        ));
    }

    Ok(())
}

/// Read a TOML file into a table
fn load_config_table(path: &Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PzipError::io_error(format!("Failed to read config file: {}", path.display()), e)
    })?;

    content.parse::<toml::Table>().map_err(|e| {
        PzipError::config_error(
            format!("Failed to parse config file: {}", e),
            Some(path.to_path_buf()),
        )
    })
}

/// Merge `overlay` into `base`, recursing into nested tables
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Get user-specific configuration path
fn get_user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pzip").join("config.toml"))
}

/// Get project-specific configuration path
fn get_project_config_path() -> Option<PathBuf> {
    let current_dir = std::env::current_dir().ok()?;
    Some(current_dir.join(PROJECT_CONFIG_NAME))
}
