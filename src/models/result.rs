//! Benchmark result data models
//!
//! Speed pairs, the dual (display/raw) sample history, live gauge values
//! and the per-pattern result aggregate.

use crate::util::units::{convert, UnitMode};
use crate::RESULTS_SECTION;
use serde::{Deserialize, Serialize};

/// A write/read throughput pair in a single unit
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeedPair {
    pub write: f64,
    pub read: f64,
}

impl SpeedPair {
    pub fn new(write: f64, read: f64) -> Self {
        Self { write, read }
    }

    /// Convert both values, `None` if the units are not convertible
    pub fn convert(&self, from: UnitMode, to: UnitMode) -> Option<Self> {
        Some(Self {
            write: convert(self.write, from, to)?,
            read: convert(self.read, from, to)?,
        })
    }
}

/// One finalized measurement on the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub write: f64,
    pub read: f64,
    /// Access pattern identifier the sample came from
    pub label: String,
}

impl Sample {
    pub fn new(speeds: SpeedPair, label: impl Into<String>) -> Self {
        Self {
            write: speeds.write,
            read: speeds.read,
            label: label.into(),
        }
    }

    pub fn speeds(&self) -> SpeedPair {
        SpeedPair::new(self.write, self.read)
    }
}

/// Append-only sample history kept in two forms
///
/// `samples` holds the values in the display unit, `raw` the same samples in
/// the native unit they were measured in. Both grow together during a run;
/// a unit switch only ever rebuilds `samples`.
#[derive(Debug, Clone, Default)]
pub struct History {
    samples: Vec<Sample>,
    raw: Vec<Sample>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample, raw: Sample) {
        self.samples.push(sample);
        self.raw.push(raw);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn raw(&self) -> &[Sample] {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.raw.clear();
    }

    /// Rebuild the display samples from raw values measured in `native`
    ///
    /// Returns false (and leaves the display history empty) when `native`
    /// cannot be expressed in `display`.
    pub fn rebuild(&mut self, native: UnitMode, display: UnitMode) -> bool {
        let rebuilt: Option<Vec<Sample>> = self
            .raw
            .iter()
            .map(|raw| {
                raw.speeds()
                    .convert(native, display)
                    .map(|speeds| Sample::new(speeds, raw.label.clone()))
            })
            .collect();

        match rebuilt {
            Some(samples) => {
                self.samples = samples;
                true
            }
            None => {
                self.samples.clear();
                false
            }
        }
    }
}

/// Last meaningful live readings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LiveGauge {
    pub write: f64,
    pub read: f64,
}

impl LiveGauge {
    /// Take the positive, finite parts of a reading
    ///
    /// A zero never overwrites an earlier value. Returns true if either side
    /// changed.
    pub fn apply(&mut self, reading: SpeedPair) -> bool {
        let mut changed = false;
        if is_meaningful(reading.write) {
            self.write = reading.write;
            changed = true;
        }
        if is_meaningful(reading.read) {
            self.read = reading.read;
            changed = true;
        }
        changed
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn speeds(&self) -> SpeedPair {
        SpeedPair::new(self.write, self.read)
    }
}

fn is_meaningful(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Result row for one access pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub pattern: String,
    /// Value from the most recent repetition (the displayed result)
    pub latest: SpeedPair,
    /// Mean across all repetitions so far
    pub mean: SpeedPair,
    pub repetitions: u32,
}

/// Finalized per-pattern results of one run
///
/// Entries keep the order in which patterns were first recorded, which is the
/// run's pattern order. Recording a pattern again replaces its `latest` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultAggregate {
    section: String,
    entries: Vec<ResultEntry>,
}

impl Default for ResultAggregate {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultAggregate {
    pub fn new() -> Self {
        Self {
            section: RESULTS_SECTION.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// Record a finalized pair for `pattern`
    pub fn record(&mut self, pattern: &str, speeds: SpeedPair) {
        match self.entries.iter_mut().find(|e| e.pattern == pattern) {
            Some(entry) => {
                entry.repetitions += 1;
                let n = entry.repetitions as f64;
                entry.mean.write += (speeds.write - entry.mean.write) / n;
                entry.mean.read += (speeds.read - entry.mean.read) / n;
                entry.latest = speeds;
            }
            None => self.entries.push(ResultEntry {
                pattern: pattern.to_string(),
                latest: speeds,
                mean: speeds,
                repetitions: 1,
            }),
        }
    }

    pub fn get(&self, pattern: &str) -> Option<&ResultEntry> {
        self.entries.iter().find(|e| e.pattern == pattern)
    }

    /// Displayed value for `pattern`
    pub fn latest(&self, pattern: &str) -> Option<SpeedPair> {
        self.get(pattern).map(|e| e.latest)
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copy of this aggregate expressed in another unit
    pub fn converted(&self, from: UnitMode, to: UnitMode) -> Option<Self> {
        let entries = self
            .entries
            .iter()
            .map(|e| {
                Some(ResultEntry {
                    pattern: e.pattern.clone(),
                    latest: e.latest.convert(from, to)?,
                    mean: e.mean.convert(from, to)?,
                    repetitions: e.repetitions,
                })
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            section: self.section.clone(),
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_last_repetition_wins() {
        let mut aggregate = ResultAggregate::new();
        aggregate.record("SEQ1M QD8", SpeedPair::new(100.0, 200.0));
        aggregate.record("RND4K QD1", SpeedPair::new(10.0, 20.0));
        aggregate.record("SEQ1M QD8", SpeedPair::new(300.0, 400.0));

        assert_eq!(aggregate.len(), 2);
        assert_eq!(aggregate.section(), RESULTS_SECTION);
        assert_eq!(aggregate.latest("SEQ1M QD8"), Some(SpeedPair::new(300.0, 400.0)));

        let entry = aggregate.get("SEQ1M QD8").unwrap();
        assert_eq!(entry.repetitions, 2);
        assert_eq!(entry.mean, SpeedPair::new(200.0, 300.0));

        let order: Vec<&str> = aggregate.entries().iter().map(|e| e.pattern.as_str()).collect();
        assert_eq!(order, vec!["SEQ1M QD8", "RND4K QD1"]);
    }

    #[test]
    fn test_aggregate_conversion() {
        let mut aggregate = ResultAggregate::new();
        aggregate.record("SEQ1M QD1", SpeedPair::new(2048.0, 1024.0));

        let gb = aggregate
            .converted(UnitMode::MegabytesPerSec, UnitMode::GigabytesPerSec)
            .unwrap();
        assert_eq!(gb.latest("SEQ1M QD1"), Some(SpeedPair::new(2.0, 1.0)));

        assert!(aggregate
            .converted(UnitMode::MegabytesPerSec, UnitMode::Iops)
            .is_none());
    }

    #[test]
    fn test_live_gauge_ignores_zero() {
        let mut gauge = LiveGauge::default();
        assert!(gauge.apply(SpeedPair::new(120.0, 0.0)));
        assert!(gauge.apply(SpeedPair::new(0.0, 80.0)));
        assert_eq!(gauge.speeds(), SpeedPair::new(120.0, 80.0));

        assert!(!gauge.apply(SpeedPair::new(0.0, 0.0)));
        assert!(!gauge.apply(SpeedPair::new(f64::NAN, f64::INFINITY)));
        assert_eq!(gauge.speeds(), SpeedPair::new(120.0, 80.0));
    }

    #[test]
    fn test_history_rebuild() {
        let mut history = History::new();
        let raw = Sample::new(SpeedPair::new(1024.0, 512.0), "SEQ1M QD8");
        history.push(raw.clone(), raw);

        assert!(history.rebuild(UnitMode::MegabytesPerSec, UnitMode::GigabytesPerSec));
        assert_eq!(history.samples()[0].speeds(), SpeedPair::new(1.0, 0.5));
        assert_eq!(history.raw()[0].speeds(), SpeedPair::new(1024.0, 512.0));

        assert!(!history.rebuild(UnitMode::MegabytesPerSec, UnitMode::Iops));
        assert!(history.is_empty());
        assert_eq!(history.raw().len(), 1);
    }

    #[test]
    fn test_aggregate_serializes_in_order() {
        let mut aggregate = ResultAggregate::new();
        aggregate.record("SEQ1M QD8", SpeedPair::new(500.0, 300.0));
        let json = serde_json::to_string(&aggregate).unwrap();
        assert!(json.contains("\"section\":\"Disk IO Tests\""));
        assert!(json.contains("\"pattern\":\"SEQ1M QD8\""));
    }
}
