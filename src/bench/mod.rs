//! Benchmark module
//!
//! Access patterns, the sampler and observer seams, and the runner that
//! sequences patterns × repetitions on a background worker.

pub mod observer;
pub mod pattern;
pub mod runner;
pub mod sampler;

pub use observer::{NoopObserver, RunEvent, RunObserver};
pub use pattern::{AccessKind, AccessPattern, STANDARD_SUITE};
pub use runner::{BenchmarkRunner, RunState, UnitSwitch};
pub use sampler::{FileSpeedSampler, SpeedSampler};
