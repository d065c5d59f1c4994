//! Benchmark run orchestration
//!
//! `BenchmarkRunner` owns the run state machine. A run is a single spawned
//! task that walks repetitions × patterns in order, calling the sampler on a
//! blocking thread, one invocation at a time. Everything observer-visible
//! (history, aggregate, live gauges, run state) lives on the runner and is
//! only mutated from `pump` / `wait`, i.e. on the caller's side.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task;
use tracing::{debug, info, warn};

use crate::bench::observer::{RunEvent, RunObserver};
use crate::bench::pattern::AccessPattern;
use crate::bench::sampler::SpeedSampler;
use crate::config::BenchmarkConfig;
use crate::io::probe_writable;
use crate::models::{History, LiveGauge, ResultAggregate, Sample, SpeedPair, Volume};
use crate::util::units::UnitMode;
use crate::{DiskIoError, Result};

/// Externally observable run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// Outcome of a unit switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSwitch {
    /// Displayed data was rescaled into the new unit
    Rescaled,
    /// The new unit cannot express the measured data; display was reset
    Cleared,
}

/// Immutable parameters of one run, moved into the worker
struct RunPlan {
    path: PathBuf,
    patterns: Vec<AccessPattern>,
    file_size: u64,
    repetitions: u32,
    native: UnitMode,
    pacing: Duration,
}

/// Orchestrates benchmark runs against one sampler
pub struct BenchmarkRunner {
    sampler: Arc<dyn SpeedSampler>,
    state: RunState,
    /// Current display unit
    unit: UnitMode,
    /// Unit requested by the last started run
    run_unit: Option<UnitMode>,
    history: History,
    aggregate: ResultAggregate,
    raw_aggregate: ResultAggregate,
    live: LiveGauge,
    raw_live: LiveGauge,
    events: Option<UnboundedReceiver<RunEvent>>,
    cancel_tx: Option<oneshot::Sender<()>>,
    last_error: Option<DiskIoError>,
}

impl BenchmarkRunner {
    pub fn new(sampler: Arc<dyn SpeedSampler>) -> Self {
        Self {
            sampler,
            state: RunState::Idle,
            unit: UnitMode::default(),
            run_unit: None,
            history: History::new(),
            aggregate: ResultAggregate::new(),
            raw_aggregate: ResultAggregate::new(),
            live: LiveGauge::default(),
            raw_live: LiveGauge::default(),
            events: None,
            cancel_tx: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Current display unit
    pub fn unit(&self) -> UnitMode {
        self.unit
    }

    /// Sample history in the display unit
    pub fn history(&self) -> &[Sample] {
        self.history.samples()
    }

    /// Sample history as measured, in the last run's native unit
    pub fn raw_history(&self) -> &[Sample] {
        self.history.raw()
    }

    /// Per-pattern results in the display unit
    pub fn aggregate(&self) -> &ResultAggregate {
        &self.aggregate
    }

    /// Live gauge values in the display unit
    pub fn live(&self) -> SpeedPair {
        self.live.speeds()
    }

    /// Error that ended the last run, if any
    pub fn last_error(&self) -> Option<&DiskIoError> {
        self.last_error.as_ref()
    }

    /// Start a run over `config.patterns` × `config.repetitions`
    ///
    /// Must be called within a tokio runtime. Precondition failures are
    /// returned here, leave the runner idle and produce no events.
    pub fn start(&mut self, volume: Option<&Volume>, config: &BenchmarkConfig) -> Result<()> {
        if self.is_running() {
            return Err(DiskIoError::RunInProgress);
        }
        let volume = volume.ok_or(DiskIoError::NoVolumeSelected)?;
        config.validate()?;

        if !probe_writable(&volume.path) {
            warn!(path = %volume.path.display(), "writability probe failed");
            return Err(DiskIoError::NoWritableTarget(volume.path.display().to_string()));
        }

        self.history.clear();
        self.aggregate.clear();
        self.raw_aggregate.clear();
        self.live.reset();
        self.raw_live.reset();
        self.last_error = None;
        self.unit = config.unit;
        self.run_unit = Some(config.unit);

        let plan = RunPlan {
            path: volume.path.clone(),
            patterns: config.patterns.clone(),
            file_size: config.file_size,
            repetitions: config.repetitions,
            native: config.unit.native(),
            pacing: config.pacing(),
        };

        info!(
            volume = %volume.display_name(),
            patterns = plan.patterns.len(),
            repetitions = plan.repetitions,
            file_size = plan.file_size,
            unit = %config.unit,
            "starting benchmark run"
        );

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let sampler = Arc::clone(&self.sampler);

        tokio::spawn(run_worker(sampler, plan, event_tx, cancel_rx));
        self.events = Some(event_rx);
        self.cancel_tx = Some(cancel_tx);
        self.state = RunState::Running;

        Ok(())
    }

    /// Ask the active run to stop before its next pattern invocation
    ///
    /// Returns false if no run is active. The run still ends through the
    /// regular terminal event, reporting `Cancelled`.
    pub fn cancel(&mut self) -> bool {
        match self.cancel_tx.take() {
            Some(cancel_tx) => {
                info!("cancelling benchmark run");
                cancel_tx.send(()).is_ok()
            }
            None => false,
        }
    }

    /// Dispatch every event already produced, without waiting
    ///
    /// Returns the number of events handled.
    pub fn pump(&mut self, observer: &mut dyn RunObserver) -> usize {
        let mut handled = 0;
        while let Some(events) = self.events.as_mut() {
            match events.try_recv() {
                Ok(event) => {
                    self.dispatch(event, observer);
                    handled += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.dispatch(RunEvent::Finished(Some(DiskIoError::Cancelled)), observer);
                    handled += 1;
                }
            }
        }
        handled
    }

    /// Dispatch events until the active run has finished
    pub async fn wait(&mut self, observer: &mut dyn RunObserver) {
        while let Some(events) = self.events.as_mut() {
            let event = events
                .recv()
                .await
                .unwrap_or(RunEvent::Finished(Some(DiskIoError::Cancelled)));
            self.dispatch(event, observer);
        }
    }

    /// Change the display unit while idle
    ///
    /// Data is rebuilt from the raw measurements of the last run. When the
    /// new unit cannot express them (the IOPS boundary is crossed) the
    /// displayed history, aggregate and gauges are reset instead; the raw
    /// data is kept, so switching back restores the display.
    pub fn switch_unit(&mut self, new_unit: UnitMode) -> Result<UnitSwitch> {
        if self.is_running() {
            return Err(DiskIoError::RunInProgress);
        }

        self.unit = new_unit;
        let Some(run_unit) = self.run_unit else {
            return Ok(UnitSwitch::Rescaled);
        };
        let native = run_unit.native();

        if !native.is_compatible_with(new_unit) {
            self.history.rebuild(native, new_unit);
            self.aggregate.clear();
            self.live.reset();
            info!(from = %native, to = %new_unit, "results not convertible, display reset");
            return Ok(UnitSwitch::Cleared);
        }

        let rebuilt = self.history.rebuild(native, new_unit);
        let aggregate = self.raw_aggregate.converted(native, new_unit);
        let live = self.raw_live.speeds().convert(native, new_unit);

        match (rebuilt, aggregate, live) {
            (true, Some(aggregate), Some(live)) => {
                self.aggregate = aggregate;
                self.live = LiveGauge {
                    write: live.write,
                    read: live.read,
                };
                debug!(from = %native, to = %new_unit, "rescaled results");
                Ok(UnitSwitch::Rescaled)
            }
            _ => {
                self.aggregate.clear();
                self.live.reset();
                info!(from = %native, to = %new_unit, "results not convertible, display reset");
                Ok(UnitSwitch::Cleared)
            }
        }
    }

    /// Unit the active (or last) run measures in
    fn native(&self) -> UnitMode {
        self.run_unit.unwrap_or(self.unit).native()
    }

    fn update_live(&mut self, raw: SpeedPair, observer: &mut dyn RunObserver) {
        if !self.raw_live.apply(raw) {
            return;
        }
        if let Some(display) = self.raw_live.speeds().convert(self.native(), self.unit) {
            self.live.write = display.write;
            self.live.read = display.read;
            observer.on_live_update(display.write, display.read);
        }
    }

    fn dispatch(&mut self, event: RunEvent, observer: &mut dyn RunObserver) {
        match event {
            RunEvent::Live(raw) => self.update_live(raw, observer),
            RunEvent::Sample { label, raw } => {
                let Some(display) = raw.convert(self.native(), self.unit) else {
                    return;
                };
                // the finalized pair is the last gauge reading of the pattern
                self.update_live(raw, observer);
                self.history
                    .push(Sample::new(display, label.as_str()), Sample::new(raw, label.as_str()));
                self.raw_aggregate.record(&label, raw);
                self.aggregate.record(&label, display);
                observer.on_sample_appended(display.write, display.read, &label);
            }
            RunEvent::Finished(error) => {
                self.state = RunState::Idle;
                self.events = None;
                self.cancel_tx = None;

                match &error {
                    None => info!(entries = self.aggregate.len(), "benchmark run finished"),
                    Some(err) => warn!(error = %err, samples = self.history.len(), "benchmark run ended early"),
                }

                observer.on_run_finished(&self.aggregate, error.as_ref());
                self.last_error = error;
            }
        }
    }
}

impl Drop for BenchmarkRunner {
    fn drop(&mut self) {
        // stop at the next pattern boundary instead of running on unobserved
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
        }
    }
}

async fn run_worker(
    sampler: Arc<dyn SpeedSampler>,
    plan: RunPlan,
    events: UnboundedSender<RunEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let outcome = drive(sampler, &plan, &events, &mut cancel_rx).await;
    let _ = events.send(RunEvent::Finished(outcome.err()));
}

async fn drive(
    sampler: Arc<dyn SpeedSampler>,
    plan: &RunPlan,
    events: &UnboundedSender<RunEvent>,
    cancel_rx: &mut oneshot::Receiver<()>,
) -> Result<()> {
    let mut first = true;

    for repetition in 0..plan.repetitions {
        for pattern in &plan.patterns {
            if !first {
                tokio::select! {
                    biased;
                    _ = &mut *cancel_rx => return Err(DiskIoError::Cancelled),
                    _ = tokio::time::sleep(plan.pacing) => {}
                }
            }
            first = false;

            if !matches!(cancel_rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)) {
                return Err(DiskIoError::Cancelled);
            }

            debug!(repetition, pattern = %pattern, "measuring");
            let raw = measure(Arc::clone(&sampler), plan, pattern, events.clone()).await?;
            let _ = events.send(RunEvent::Sample {
                label: pattern.id().to_string(),
                raw,
            });
        }
    }

    Ok(())
}

async fn measure(
    sampler: Arc<dyn SpeedSampler>,
    plan: &RunPlan,
    pattern: &AccessPattern,
    events: UnboundedSender<RunEvent>,
) -> Result<SpeedPair> {
    let path = plan.path.clone();
    let file_size = plan.file_size;
    let native = plan.native;
    let job_pattern = pattern.clone();

    let measured = task::spawn_blocking(move || {
        let mut progress = |write: f64, read: f64| {
            let _ = events.send(RunEvent::Live(SpeedPair::new(write, read)));
        };
        sampler.measure(&path, &job_pattern, file_size, native, &mut progress)
    })
    .await;

    let write_failed = |reason: String| DiskIoError::WriteFailed {
        pattern: pattern.id().to_string(),
        reason,
    };

    match measured {
        Ok(Ok(speeds)) => Ok(speeds),
        Ok(Err(err)) => Err(write_failed(err.to_string())),
        Err(join_err) => Err(write_failed(join_err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Sampler replaying a fixed script of results
    struct ScriptedSampler {
        script: Mutex<Vec<Result<SpeedPair>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSampler {
        fn new(script: Vec<Result<SpeedPair>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into_iter().rev().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl SpeedSampler for ScriptedSampler {
        fn measure(
            &self,
            _path: &Path,
            pattern: &AccessPattern,
            _file_size: u64,
            _native: UnitMode,
            progress: &mut dyn FnMut(f64, f64),
        ) -> Result<SpeedPair> {
            self.calls.lock().unwrap().push(pattern.id().to_string());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(SpeedPair::new(1.0, 1.0)));
            if let Ok(speeds) = &next {
                progress(speeds.write, 0.0);
                progress(0.0, speeds.read);
            }
            next
        }
    }

    #[derive(Default)]
    struct Recorder {
        live: Vec<(f64, f64)>,
        samples: Vec<(f64, f64, String)>,
        finished: Vec<(usize, Option<String>)>,
    }

    impl RunObserver for Recorder {
        fn on_live_update(&mut self, write: f64, read: f64) {
            self.live.push((write, read));
        }

        fn on_sample_appended(&mut self, write: f64, read: f64, label: &str) {
            self.samples.push((write, read, label.to_string()));
        }

        fn on_run_finished(&mut self, aggregate: &ResultAggregate, error: Option<&DiskIoError>) {
            self.finished.push((aggregate.len(), error.map(|e| e.to_string())));
        }
    }

    fn config(patterns: &[&str], repetitions: u32) -> BenchmarkConfig {
        BenchmarkConfig::new()
            .with_patterns(patterns.iter().map(|p| p.parse().unwrap()).collect())
            .with_repetitions(repetitions)
            .with_file_size(1 << 20)
            .with_pacing(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_two_pattern_scenario() {
        let temp_dir = tempdir().unwrap();
        let volume = Volume::at_path(temp_dir.path());
        let sampler = ScriptedSampler::new(vec![
            Ok(SpeedPair::new(500.0, 300.0)),
            Ok(SpeedPair::new(50.0, 20.0)),
        ]);
        let mut runner = BenchmarkRunner::new(sampler);
        let mut recorder = Recorder::default();

        runner
            .start(Some(&volume), &config(&["SEQ1M QD8", "RND4K QD1"], 1))
            .unwrap();
        assert_eq!(runner.state(), RunState::Running);
        runner.wait(&mut recorder).await;

        assert_eq!(runner.state(), RunState::Idle);
        assert!(runner.last_error().is_none());
        let labels: Vec<&str> = runner.history().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["SEQ1M QD8", "RND4K QD1"]);
        assert_eq!(runner.aggregate().latest("SEQ1M QD8"), Some(SpeedPair::new(500.0, 300.0)));
        assert_eq!(runner.aggregate().latest("RND4K QD1"), Some(SpeedPair::new(50.0, 20.0)));
        assert_eq!(recorder.samples.len(), 2);
        assert_eq!(recorder.finished, vec![(2, None)]);
    }

    #[tokio::test]
    async fn test_repetitions_interleave_and_last_wins() {
        let temp_dir = tempdir().unwrap();
        let volume = Volume::at_path(temp_dir.path());
        let sampler = ScriptedSampler::new(vec![
            Ok(SpeedPair::new(1.0, 2.0)),
            Ok(SpeedPair::new(3.0, 4.0)),
            Ok(SpeedPair::new(5.0, 6.0)),
            Ok(SpeedPair::new(7.0, 8.0)),
        ]);
        let mut runner = BenchmarkRunner::new(sampler.clone());

        runner.start(Some(&volume), &config(&["SEQ1M QD1", "RND4K QD64"], 2)).unwrap();
        runner.wait(&mut Recorder::default()).await;

        assert_eq!(
            *sampler.calls.lock().unwrap(),
            vec!["SEQ1M QD1", "RND4K QD64", "SEQ1M QD1", "RND4K QD64"]
        );
        assert_eq!(runner.aggregate().len(), 2);
        assert_eq!(runner.aggregate().latest("SEQ1M QD1"), Some(SpeedPair::new(5.0, 6.0)));
        assert_eq!(runner.aggregate().latest("RND4K QD64"), Some(SpeedPair::new(7.0, 8.0)));
        assert_eq!(runner.aggregate().get("SEQ1M QD1").unwrap().mean, SpeedPair::new(3.0, 4.0));
    }

    #[tokio::test]
    async fn test_failure_aborts_and_keeps_partial_history() {
        let temp_dir = tempdir().unwrap();
        let volume = Volume::at_path(temp_dir.path());
        let sampler = ScriptedSampler::new(vec![
            Ok(SpeedPair::new(100.0, 90.0)),
            Ok(SpeedPair::new(80.0, 70.0)),
            Err(DiskIoError::Io(std::io::Error::other("disk full"))),
        ]);
        let mut runner = BenchmarkRunner::new(sampler.clone());
        let mut recorder = Recorder::default();

        runner
            .start(
                Some(&volume),
                &config(&["SEQ1M QD8", "SEQ1M QD1", "RND4K QD64", "RND4K QD1"], 2),
            )
            .unwrap();
        runner.wait(&mut recorder).await;

        assert_eq!(sampler.calls.lock().unwrap().len(), 3);
        assert_eq!(runner.history().len(), 2);
        assert_eq!(runner.raw_history().len(), 2);
        assert!(matches!(
            runner.last_error(),
            Some(DiskIoError::WriteFailed { pattern, .. }) if pattern == "RND4K QD64"
        ));
        assert_eq!(recorder.finished.len(), 1);
        assert_eq!(recorder.finished[0].0, 2);
        assert_eq!(runner.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_unset_or_unwritable_volume_stays_idle() {
        let temp_dir = tempdir().unwrap();
        let sampler = ScriptedSampler::new(Vec::new());
        let mut runner = BenchmarkRunner::new(sampler.clone());
        let config = config(&["SEQ1M QD8"], 1);

        assert!(matches!(
            runner.start(None, &config),
            Err(DiskIoError::NoVolumeSelected)
        ));

        let missing = Volume::at_path(temp_dir.path().join("missing"));
        assert!(matches!(
            runner.start(Some(&missing), &config),
            Err(DiskIoError::NoWritableTarget(_))
        ));

        let mut recorder = Recorder::default();
        assert_eq!(runner.pump(&mut recorder), 0);
        assert_eq!(runner.state(), RunState::Idle);
        assert!(recorder.live.is_empty() && recorder.finished.is_empty());
        assert!(sampler.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_and_switch_rejected_while_running() {
        let temp_dir = tempdir().unwrap();
        let volume = Volume::at_path(temp_dir.path());
        let mut runner = BenchmarkRunner::new(ScriptedSampler::new(Vec::new()));
        let config = config(&["SEQ1M QD8"], 1);

        runner.start(Some(&volume), &config).unwrap();
        assert!(matches!(
            runner.start(Some(&volume), &config),
            Err(DiskIoError::RunInProgress)
        ));
        assert!(matches!(
            runner.switch_unit(UnitMode::GigabytesPerSec),
            Err(DiskIoError::RunInProgress)
        ));
        assert_eq!(runner.unit(), UnitMode::MegabytesPerSec);

        runner.wait(&mut Recorder::default()).await;
        assert!(runner.start(Some(&volume), &config).is_ok());
        runner.wait(&mut Recorder::default()).await;
    }

    #[tokio::test]
    async fn test_switch_unit_rescales_and_clears() {
        let temp_dir = tempdir().unwrap();
        let volume = Volume::at_path(temp_dir.path());
        let sampler = ScriptedSampler::new(vec![
            Ok(SpeedPair::new(2048.0, 1024.0)),
            Ok(SpeedPair::new(512.0, 256.0)),
        ]);
        let mut runner = BenchmarkRunner::new(sampler);

        runner.start(Some(&volume), &config(&["SEQ1M QD8", "RND4K QD1"], 1)).unwrap();
        runner.wait(&mut Recorder::default()).await;

        assert_eq!(
            runner.switch_unit(UnitMode::GigabytesPerSec).unwrap(),
            UnitSwitch::Rescaled
        );
        assert_eq!(runner.history()[0].speeds(), SpeedPair::new(2.0, 1.0));
        assert_eq!(runner.history()[1].speeds(), SpeedPair::new(0.5, 0.25));
        assert_eq!(runner.aggregate().latest("SEQ1M QD8"), Some(SpeedPair::new(2.0, 1.0)));
        assert_eq!(runner.live(), SpeedPair::new(0.5, 0.25));

        assert_eq!(runner.switch_unit(UnitMode::Iops).unwrap(), UnitSwitch::Cleared);
        assert!(runner.history().is_empty());
        assert!(runner.aggregate().is_empty());
        assert_eq!(runner.live(), SpeedPair::default());
        assert_eq!(runner.raw_history().len(), 2);

        assert_eq!(
            runner.switch_unit(UnitMode::KilobytesPerSec).unwrap(),
            UnitSwitch::Rescaled
        );
        assert_eq!(runner.history()[0].speeds(), SpeedPair::new(2048.0 * 1024.0, 1024.0 * 1024.0));
    }

    #[tokio::test]
    async fn test_iops_run_leaving_operation_rate_clears() {
        let temp_dir = tempdir().unwrap();
        let volume = Volume::at_path(temp_dir.path());
        let sampler = ScriptedSampler::new(vec![Ok(SpeedPair::new(9000.0, 12000.0))]);
        let mut runner = BenchmarkRunner::new(sampler);

        runner
            .start(Some(&volume), &config(&["RND4K QD64"], 1).with_unit(UnitMode::Iops))
            .unwrap();
        runner.wait(&mut Recorder::default()).await;
        assert_eq!(runner.aggregate().latest("RND4K QD64"), Some(SpeedPair::new(9000.0, 12000.0)));

        assert_eq!(
            runner.switch_unit(UnitMode::MegabytesPerSec).unwrap(),
            UnitSwitch::Cleared
        );
        assert!(runner.history().is_empty());
        assert!(runner.aggregate().is_empty());
    }

    #[tokio::test]
    async fn test_live_updates_skip_zero() {
        let temp_dir = tempdir().unwrap();
        let volume = Volume::at_path(temp_dir.path());
        let sampler = ScriptedSampler::new(vec![Ok(SpeedPair::new(300.0, 200.0))]);
        let mut runner = BenchmarkRunner::new(sampler);
        let mut recorder = Recorder::default();

        runner.start(Some(&volume), &config(&["SEQ1M QD8"], 1)).unwrap();
        runner.wait(&mut recorder).await;

        assert_eq!(recorder.live, vec![(300.0, 0.0), (300.0, 200.0), (300.0, 200.0)]);
        assert_eq!(runner.live(), SpeedPair::new(300.0, 200.0));
    }

    /// Progress readings at half the finalized rate
    struct RampingSampler;

    impl SpeedSampler for RampingSampler {
        fn measure(
            &self,
            _path: &Path,
            _pattern: &AccessPattern,
            _file_size: u64,
            _native: UnitMode,
            progress: &mut dyn FnMut(f64, f64),
        ) -> Result<SpeedPair> {
            progress(400.0, 0.0);
            progress(0.0, 250.0);
            Ok(SpeedPair::new(800.0, 500.0))
        }
    }

    #[tokio::test]
    async fn test_finalized_pair_reaches_live_gauge() {
        let temp_dir = tempdir().unwrap();
        let volume = Volume::at_path(temp_dir.path());
        let mut runner = BenchmarkRunner::new(Arc::new(RampingSampler));
        let mut recorder = Recorder::default();

        runner.start(Some(&volume), &config(&["SEQ1M QD8"], 1)).unwrap();
        runner.wait(&mut recorder).await;

        assert_eq!(
            recorder.live,
            vec![(400.0, 0.0), (400.0, 250.0), (800.0, 500.0)]
        );
        assert_eq!(runner.live(), SpeedPair::new(800.0, 500.0));

        runner.switch_unit(UnitMode::GigabytesPerSec).unwrap();
        assert_eq!(runner.live(), SpeedPair::new(800.0 / 1024.0, 500.0 / 1024.0));
    }

    #[tokio::test]
    async fn test_cancel_during_pacing() {
        let temp_dir = tempdir().unwrap();
        let volume = Volume::at_path(temp_dir.path());
        let sampler = ScriptedSampler::new(Vec::new());
        let mut runner = BenchmarkRunner::new(sampler.clone());
        let mut recorder = Recorder::default();

        let config = config(&["SEQ1M QD8", "SEQ1M QD1"], 5).with_pacing(Duration::from_secs(3600));
        runner.start(Some(&volume), &config).unwrap();
        assert!(runner.cancel());
        runner.wait(&mut recorder).await;

        assert!(matches!(runner.last_error(), Some(DiskIoError::Cancelled)));
        assert!(sampler.calls.lock().unwrap().len() <= 1);
        assert_eq!(recorder.finished.len(), 1);
        assert!(!runner.cancel());
    }

    #[tokio::test]
    async fn test_pump_drains_without_blocking() {
        let temp_dir = tempdir().unwrap();
        let volume = Volume::at_path(temp_dir.path());
        let mut runner = BenchmarkRunner::new(ScriptedSampler::new(Vec::new()));
        let mut recorder = Recorder::default();

        runner.start(Some(&volume), &config(&["SEQ1M QD8"], 1)).unwrap();
        while runner.is_running() {
            runner.pump(&mut recorder);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(recorder.samples.len(), 1);
        assert_eq!(recorder.finished.len(), 1);
    }
}
