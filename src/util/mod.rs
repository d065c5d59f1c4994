//! Utility functions module
//!
//! Unit conversion between throughput modes plus helpers for formatting
//! sizes, durations and speeds.

pub mod units;

pub use units::{
    calculate_iops, calculate_speed_mbps, convert, format_bytes, format_duration, format_speed,
    parse_bytes, parse_duration, UnitMode,
};
