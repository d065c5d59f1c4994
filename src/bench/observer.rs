//! Run observer interface
//!
//! The worker never calls an observer directly. It sends [`RunEvent`]s over a
//! channel and the runner dispatches them on the foreground, in production
//! order, so observers need no locking of their own.

use crate::models::{ResultAggregate, SpeedPair};
use crate::DiskIoError;

/// Receiver of run progress, implemented by the presentation layer
///
/// All values are in the runner's current display unit.
pub trait RunObserver {
    /// Live gauge values changed
    fn on_live_update(&mut self, write: f64, read: f64);

    /// A finalized measurement was appended to the history
    fn on_sample_appended(&mut self, write: f64, read: f64, label: &str);

    /// The run ended; `error` is `None` on success
    fn on_run_finished(&mut self, aggregate: &ResultAggregate, error: Option<&DiskIoError>);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn on_live_update(&mut self, _write: f64, _read: f64) {}

    fn on_sample_appended(&mut self, _write: f64, _read: f64, _label: &str) {}

    fn on_run_finished(&mut self, _aggregate: &ResultAggregate, _error: Option<&DiskIoError>) {}
}

/// Worker to foreground message, values in the sampler's native unit
#[derive(Debug)]
pub enum RunEvent {
    /// Intermediate reading from the progress sink
    Live(SpeedPair),
    /// Finalized pair for one (repetition, pattern) invocation
    Sample { label: String, raw: SpeedPair },
    /// Terminal event, sent exactly once per run
    Finished(Option<DiskIoError>),
}
