//! Terminal presentation
//!
//! A [`RunObserver`] that renders live throughput on an `indicatif` progress
//! bar, plus plain-text formatting of the result table.

use indicatif::{ProgressBar, ProgressStyle};

use crate::bench::observer::RunObserver;
use crate::models::ResultAggregate;
use crate::util::units::{format_speed, UnitMode};
use crate::{error, DiskIoError};

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}";
const GAUGE_WIDTH: usize = 10;

/// Console observer used by the binary
pub struct ConsoleObserver {
    bar: ProgressBar,
    unit: UnitMode,
    samples: usize,
}

impl ConsoleObserver {
    /// Observer showing a bar over `invocations` pattern measurements
    pub fn new(invocations: usize, unit: UnitMode) -> Self {
        let bar = ProgressBar::new(invocations as u64);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self::with_bar(bar, unit)
    }

    /// Observer that draws nothing (for `--json` output)
    pub fn hidden(unit: UnitMode) -> Self {
        Self::with_bar(ProgressBar::hidden(), unit)
    }

    fn with_bar(bar: ProgressBar, unit: UnitMode) -> Self {
        Self {
            bar,
            unit,
            samples: 0,
        }
    }

    /// Number of samples appended so far
    pub fn samples(&self) -> usize {
        self.samples
    }
}

impl RunObserver for ConsoleObserver {
    fn on_live_update(&mut self, write: f64, read: f64) {
        self.bar.set_message(format!(
            "W {} {}  R {} {}",
            gauge(write, self.unit),
            format_speed(write, self.unit),
            gauge(read, self.unit),
            format_speed(read, self.unit)
        ));
    }

    fn on_sample_appended(&mut self, write: f64, read: f64, label: &str) {
        self.samples += 1;
        self.bar.inc(1);
        self.bar.println(format!(
            "{:<12} write {:>16}  read {:>16}",
            label,
            format_speed(write, self.unit),
            format_speed(read, self.unit)
        ));
    }

    fn on_run_finished(&mut self, _aggregate: &ResultAggregate, error: Option<&DiskIoError>) {
        match error {
            None => self.bar.finish_with_message("done"),
            Some(err) => self
                .bar
                .abandon_with_message(error::user_friendly_message(err)),
        }
    }
}

/// Fixed-width meter of `value` against the unit's gauge ceiling
fn gauge(value: f64, unit: UnitMode) -> String {
    let fraction = (value / unit.gauge_max()).clamp(0.0, 1.0);
    let filled = if fraction.is_finite() {
        (fraction * GAUGE_WIDTH as f64).round() as usize
    } else {
        0
    };
    format!("[{}{}]", "#".repeat(filled), ".".repeat(GAUGE_WIDTH - filled))
}

/// Render the per-pattern result table
///
/// Rows keep the run's pattern order. The mean column only appears when some
/// pattern was measured more than once.
pub fn format_results_table(aggregate: &ResultAggregate, unit: UnitMode) -> String {
    if aggregate.is_empty() {
        return format!("{}: no results\n", aggregate.section());
    }

    let with_mean = aggregate.entries().iter().any(|e| e.repetitions > 1);
    let mut out = format!("{}\n", aggregate.section());
    out.push_str(&format!("{:<12} {:>16} {:>16}", "Pattern", "Write", "Read"));
    if with_mean {
        out.push_str(&format!(" {:>16} {:>16}", "Mean write", "Mean read"));
    }
    out.push('\n');

    for entry in aggregate.entries() {
        out.push_str(&format!(
            "{:<12} {:>16} {:>16}",
            entry.pattern,
            format_speed(entry.latest.write, unit),
            format_speed(entry.latest.read, unit)
        ));
        if with_mean {
            out.push_str(&format!(
                " {:>16} {:>16}",
                format_speed(entry.mean.write, unit),
                format_speed(entry.mean.read, unit)
            ));
        }
        out.push('\n');
    }

    out
}
