//! Data models module
//!
//! Result history, per-pattern aggregates and volume descriptions.

pub mod result;
pub mod volume;

pub use result::{History, LiveGauge, ResultAggregate, ResultEntry, Sample, SpeedPair};
pub use volume::{HardwareInfo, SystemVolumes, Volume, VolumeProvider};
