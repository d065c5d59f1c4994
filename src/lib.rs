//! diskio - Disk I/O benchmark engine
//!
//! Runs an ordered suite of access-pattern tests against a writable volume,
//! streams live write/read throughput to an observer and collects a
//! per-pattern result table.

use thiserror::Error;

pub mod bench;
pub mod config;
pub mod console;
pub mod io;
pub mod models;
pub mod util;

/// Errors surfaced by the benchmark engine
#[derive(Debug, Error)]
pub enum DiskIoError {
    /// `start` was called without a target volume
    #[error("No volume selected")]
    NoVolumeSelected,

    /// The writability probe failed on the target volume
    #[error("Volume is not writable: {0}")]
    NoWritableTarget(String),

    /// A sampler invocation failed mid-run
    #[error("Write failed during {pattern}: {reason}")]
    WriteFailed {
        /// Pattern that was being measured
        pattern: String,
        /// Underlying failure
        reason: String,
    },

    /// Operation rejected because a run is active
    #[error("A benchmark run is already in progress")]
    RunInProgress,

    /// Run was cancelled before finishing
    #[error("Benchmark cancelled")]
    Cancelled,

    /// Access pattern identifier could not be parsed
    #[error("Invalid access pattern: {0}")]
    InvalidPattern(String),

    /// Configuration validation or parsing error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for DiskIoError {
    fn from(err: toml::de::Error) -> Self {
        DiskIoError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_json::Error> for DiskIoError {
    fn from(err: serde_json::Error) -> Self {
        DiskIoError::ConfigError(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::ser::Error> for DiskIoError {
    fn from(err: toml::ser::Error) -> Self {
        DiskIoError::ConfigError(format!("TOML serialization error: {}", err))
    }
}

/// Result type alias for diskio operations
pub type Result<T> = std::result::Result<T, DiskIoError>;

/// Error presentation helpers
pub mod error {
    use super::DiskIoError;

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &DiskIoError) -> String {
        match error {
            DiskIoError::NoVolumeSelected => {
                "No disk selected. Please select a disk to test.".to_string()
            }
            DiskIoError::NoWritableTarget(_) | DiskIoError::WriteFailed { .. } => {
                "Unable to write to the selected disk. Please ensure the disk is writable and try again."
                    .to_string()
            }
            DiskIoError::RunInProgress => {
                "A test is already running. Wait for it to finish or cancel it first.".to_string()
            }
            DiskIoError::Cancelled => "Test was cancelled by user.".to_string(),
            DiskIoError::ConfigError(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            _ => error.to_string(),
        }
    }

    /// Whether the error ended a run that had already started
    pub fn is_terminal_run_error(error: &DiskIoError) -> bool {
        matches!(error, DiskIoError::WriteFailed { .. } | DiskIoError::Cancelled)
    }
}

pub const APP_NAME: &str = "diskio";
pub const CONFIG_FILE: &str = "diskio.toml";
pub const TEST_FILE_PREFIX: &str = "diskio_testfile_";
pub const PROBE_FILE_PREFIX: &str = ".diskio_probe_";
/// Section key the result table is published under
pub const RESULTS_SECTION: &str = "Disk IO Tests";
