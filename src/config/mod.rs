//! Configuration management module
//!
//! Handles loading, saving, and validation of the benchmark settings
//! remembered between sessions (last used size, count and unit).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bench::pattern::AccessPattern;
use crate::util::units::UnitMode;
use crate::{DiskIoError, Result, APP_NAME, CONFIG_FILE};

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Largest test file accepted
pub const MAX_FILE_SIZE: u64 = 64 * GIB;

/// Highest repetition count accepted from the command line
pub const MAX_REPETITIONS_MENU: u32 = 10;

/// Default delay between two pattern invocations
pub const DEFAULT_PACING_MS: u64 = 1000;

/// Benchmark configuration structure containing all run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Last selected volume directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_path: Option<PathBuf>,
    /// Ordered access patterns of the suite
    pub patterns: Vec<AccessPattern>,
    /// Test file size (in bytes)
    pub file_size: u64,
    /// Number of passes over the whole suite
    pub repetitions: u32,
    /// Display unit
    pub unit: UnitMode,
    /// Delay between pattern invocations (in milliseconds)
    pub pacing_ms: u64,
    /// Whether to keep the test file after each measurement
    pub keep_test_file: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            disk_path: None,
            patterns: AccessPattern::standard_suite(),
            file_size: 2 * GIB,
            repetitions: 1,
            unit: UnitMode::MegabytesPerSec,
            pacing_ms: DEFAULT_PACING_MS,
            keep_test_file: false,
        }
    }
}

impl BenchmarkConfig {
    /// Create a new benchmark configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.patterns.is_empty() {
            return Err(DiskIoError::ConfigError(
                "At least one access pattern is required".to_string(),
            ));
        }

        if self.repetitions == 0 {
            return Err(DiskIoError::ConfigError(
                "Repetition count must be at least 1".to_string(),
            ));
        }

        if self.file_size == 0 {
            return Err(DiskIoError::ConfigError(
                "File size must be greater than 0".to_string(),
            ));
        }

        if self.file_size > MAX_FILE_SIZE {
            return Err(DiskIoError::ConfigError(format!(
                "File size too large: {} bytes (max: {} bytes)",
                self.file_size, MAX_FILE_SIZE
            )));
        }

        Ok(())
    }

    /// Delay enforced between two consecutive pattern invocations
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    /// Total number of sampler invocations of a run
    pub fn invocation_count(&self) -> usize {
        self.patterns.len() * self.repetitions as usize
    }

    /// Set the remembered volume directory
    pub fn with_disk_path(mut self, path: PathBuf) -> Self {
        self.disk_path = Some(path);
        self
    }

    /// Set the ordered pattern list
    pub fn with_patterns(mut self, patterns: Vec<AccessPattern>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Set the file size for testing
    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = size;
        self
    }

    /// Set the repetition count
    pub fn with_repetitions(mut self, count: u32) -> Self {
        self.repetitions = count;
        self
    }

    /// Set the display unit
    pub fn with_unit(mut self, unit: UnitMode) -> Self {
        self.unit = unit;
        self
    }

    /// Set the delay between pattern invocations
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing_ms = pacing.as_millis() as u64;
        self
    }

    /// Set whether to keep the test file
    pub fn with_keep_test_file(mut self, keep: bool) -> Self {
        self.keep_test_file = keep;
        self
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load configuration from `path`, defaults if the file is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DiskIoError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the standard config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DiskIoError::ConfigError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(path, content).map_err(|e| {
            DiskIoError::ConfigError(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/diskio/diskio.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            DiskIoError::ConfigError("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
