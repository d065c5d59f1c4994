//! Units formatting and conversion utilities
//!
//! Converts throughput values between the display units and provides
//! human-readable formatting of sizes, durations and speeds.
//!
//! The three byte-rate units are linear rescalings of each other (MB/s is the
//! base). IOPS counts operations, so no byte rate can be turned into IOPS or
//! back without knowing the block size of every operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Display unit for throughput values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitMode {
    #[serde(rename = "KB/s")]
    KilobytesPerSec,
    #[default]
    #[serde(rename = "MB/s")]
    MegabytesPerSec,
    #[serde(rename = "GB/s")]
    GigabytesPerSec,
    #[serde(rename = "IOPS")]
    Iops,
}

impl UnitMode {
    /// All units in menu order
    pub const ALL: [UnitMode; 4] = [
        UnitMode::MegabytesPerSec,
        UnitMode::GigabytesPerSec,
        UnitMode::KilobytesPerSec,
        UnitMode::Iops,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            UnitMode::KilobytesPerSec => "KB/s",
            UnitMode::MegabytesPerSec => "MB/s",
            UnitMode::GigabytesPerSec => "GB/s",
            UnitMode::Iops => "IOPS",
        }
    }

    /// True for the operation-rate unit
    pub fn is_operation_rate(&self) -> bool {
        matches!(self, UnitMode::Iops)
    }

    /// Unit a sampler reports in when this unit is requested
    ///
    /// Byte-rate runs are measured in MB/s and rescaled for display.
    pub fn native(&self) -> UnitMode {
        if self.is_operation_rate() {
            UnitMode::Iops
        } else {
            UnitMode::MegabytesPerSec
        }
    }

    /// Whether values can be converted between the two units
    pub fn is_compatible_with(&self, other: UnitMode) -> bool {
        self.is_operation_rate() == other.is_operation_rate()
    }

    /// Upper bound of a gauge showing this unit
    pub fn gauge_max(&self) -> f64 {
        match self {
            UnitMode::KilobytesPerSec => 4_000_000.0,
            UnitMode::MegabytesPerSec => 4_000.0,
            UnitMode::GigabytesPerSec => 4.0,
            UnitMode::Iops => 10_000_000.0,
        }
    }

    fn scale_from_megabytes(&self) -> Option<f64> {
        match self {
            UnitMode::KilobytesPerSec => Some(1024.0),
            UnitMode::MegabytesPerSec => Some(1.0),
            UnitMode::GigabytesPerSec => Some(1.0 / 1024.0),
            UnitMode::Iops => None,
        }
    }
}

impl fmt::Display for UnitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for UnitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "KB/S" | "KB" => Ok(UnitMode::KilobytesPerSec),
            "MB/S" | "MB" => Ok(UnitMode::MegabytesPerSec),
            "GB/S" | "GB" => Ok(UnitMode::GigabytesPerSec),
            "IOPS" => Ok(UnitMode::Iops),
            _ => {
                let known: Vec<&str> = UnitMode::ALL.iter().map(|u| u.label()).collect();
                Err(format!("Unknown unit: {} (expected one of {})", s.trim(), known.join(", ")))
            }
        }
    }
}

/// Convert a throughput value between units
///
/// Returns `None` when exactly one side is IOPS: there is no derivable value
/// in that case, which is different from zero.
///
/// # Examples
/// ```
/// use diskio::util::units::{convert, UnitMode};
///
/// assert_eq!(convert(2048.0, UnitMode::MegabytesPerSec, UnitMode::GigabytesPerSec), Some(2.0));
/// assert_eq!(convert(1.0, UnitMode::MegabytesPerSec, UnitMode::KilobytesPerSec), Some(1024.0));
/// assert_eq!(convert(500.0, UnitMode::Iops, UnitMode::Iops), Some(500.0));
/// assert_eq!(convert(500.0, UnitMode::Iops, UnitMode::MegabytesPerSec), None);
/// ```
pub fn convert(value: f64, from: UnitMode, to: UnitMode) -> Option<f64> {
    match (from.scale_from_megabytes(), to.scale_from_megabytes()) {
        (Some(from_scale), Some(to_scale)) => Some(value / from_scale * to_scale),
        (None, None) => Some(value),
        _ => None,
    }
}

/// Format bytes into human-readable size with appropriate units
///
/// # Examples
/// ```
/// use diskio::util::units::format_bytes;
///
/// assert_eq!(format_bytes(1024), "1.0 KiB");
/// assert_eq!(format_bytes(1048576), "1.0 MiB");
/// assert_eq!(format_bytes(1073741824), "1.0 GiB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Parse human-readable size string into bytes
///
/// Supports units: B, KB, MB, GB, TB, KiB, MiB, GiB, TiB
///
/// # Examples
/// ```
/// use diskio::util::units::parse_bytes;
///
/// assert_eq!(parse_bytes("16 MiB").unwrap(), 16 * 1024 * 1024);
/// assert_eq!(parse_bytes("2GiB").unwrap(), 2 * 1024 * 1024 * 1024);
/// ```
pub fn parse_bytes(input: &str) -> Result<u64, String> {
    let input = input.trim();

    let (number_part, unit_part) = if let Some(space_pos) = input.rfind(' ') {
        (&input[..space_pos], &input[space_pos + 1..])
    } else {
        let split_pos = input
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| i)
            .unwrap_or(input.len());
        (&input[..split_pos], &input[split_pos..])
    };

    let number: f64 = number_part
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", number_part))?;

    if number < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    let multiplier = match unit_part.to_uppercase().as_str() {
        "" | "B" => 1u64,
        "KB" => 1_000u64,
        "MB" => 1_000_000u64,
        "GB" => 1_000_000_000u64,
        "TB" => 1_000_000_000_000u64,
        "K" | "KIB" => 1_024u64,
        "M" | "MIB" => 1_048_576u64,
        "G" | "GIB" => 1_073_741_824u64,
        "T" | "TIB" => 1_099_511_627_776u64,
        _ => return Err(format!("Unknown unit: {}", unit_part)),
    };

    Ok((number * multiplier as f64) as u64)
}

/// Format duration into human-readable string
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use diskio::util::units::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 3600 {
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if total_secs >= 60 {
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    } else if total_secs > 0 {
        if millis > 0 {
            format!("{}.{:02}s", total_secs, millis / 10)
        } else {
            format!("{}s", total_secs)
        }
    } else {
        format!("{}ms", millis)
    }
}

/// Parse duration string into Duration
///
/// Supports formats like: "1s", "250ms", "1m 30s"
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim().to_lowercase();
    let mut total_millis = 0u64;

    for part in input.split_whitespace() {
        if let Some(num_str) = part.strip_suffix("ms") {
            let millis: u64 = num_str
                .parse()
                .map_err(|_| format!("Invalid milliseconds: {}", num_str))?;
            total_millis += millis;
        } else if let Some(num_str) = part.strip_suffix('s') {
            let secs: f64 = num_str
                .parse()
                .map_err(|_| format!("Invalid seconds: {}", num_str))?;
            total_millis += (secs * 1000.0) as u64;
        } else if let Some(num_str) = part.strip_suffix('m') {
            let mins: u64 = num_str
                .parse()
                .map_err(|_| format!("Invalid minutes: {}", num_str))?;
            total_millis += mins * 60_000;
        } else {
            return Err(format!("Unknown duration format: {}", part));
        }
    }

    Ok(Duration::from_millis(total_millis))
}

/// Calculate throughput in MB/s (1 MB = 1 MiB) from bytes and duration
pub fn calculate_speed_mbps(bytes: u64, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }
    bytes as f64 / BYTES_PER_MIB / duration.as_secs_f64()
}

/// Calculate IOPS (Input/Output Operations Per Second)
pub fn calculate_iops(operations: u64, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }
    operations as f64 / duration.as_secs_f64()
}

/// Format a speed value in the given unit
///
/// # Examples
/// ```
/// use diskio::util::units::{format_speed, UnitMode};
///
/// assert_eq!(format_speed(512.5, UnitMode::MegabytesPerSec), "512.50 MB/s");
/// assert_eq!(format_speed(1500.0, UnitMode::Iops), "1.5K IOPS");
/// ```
pub fn format_speed(value: f64, unit: UnitMode) -> String {
    match unit {
        UnitMode::Iops => format_iops(value),
        _ => format!("{:.2} {}", value, unit.label()),
    }
}

fn format_iops(iops: f64) -> String {
    if iops >= 1_000_000.0 {
        format!("{:.1}M IOPS", iops / 1_000_000.0)
    } else if iops >= 1_000.0 {
        format!("{:.1}K IOPS", iops / 1_000.0)
    } else {
        format!("{:.0} IOPS", iops)
    }
}
