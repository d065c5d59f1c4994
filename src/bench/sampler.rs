//! Speed samplers
//!
//! A sampler performs one measurement of one access pattern against a volume
//! and returns the finalized write/read pair. Intermediate readings go to the
//! progress sink handed in for that single invocation.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use rand::{rngs::SmallRng, Rng, SeedableRng};
use tracing::debug;

use crate::bench::pattern::{AccessKind, AccessPattern};
use crate::io::disk::{drop_cached_pages, TempFile};
use crate::models::SpeedPair;
use crate::util::units::{calculate_iops, calculate_speed_mbps, UnitMode};
use crate::Result;

/// Interval between progress readings
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Performs a single pattern measurement
///
/// Implementations are called from a blocking worker thread. `native` is the
/// unit the returned values (and every progress reading) must be expressed
/// in: MB/s for byte-rate runs, IOPS for operation-rate runs.
pub trait SpeedSampler: Send + Sync {
    fn measure(
        &self,
        path: &Path,
        pattern: &AccessPattern,
        file_size: u64,
        native: UnitMode,
        progress: &mut dyn FnMut(f64, f64),
    ) -> Result<SpeedPair>;
}

/// Sampler backed by a real test file on the target volume
#[derive(Debug, Clone, Default)]
pub struct FileSpeedSampler {
    keep_test_file: bool,
}

impl FileSpeedSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave the test file on disk after the measurement (for debugging)
    pub fn keep_test_file(mut self, keep: bool) -> Self {
        self.keep_test_file = keep;
        self
    }
}

impl SpeedSampler for FileSpeedSampler {
    fn measure(
        &self,
        path: &Path,
        pattern: &AccessPattern,
        file_size: u64,
        native: UnitMode,
        progress: &mut dyn FnMut(f64, f64),
    ) -> Result<SpeedPair> {
        let mut temp_file = TempFile::for_volume(path);
        if self.keep_test_file {
            temp_file.keep_on_drop();
        }

        let layout = BlockLayout::new(pattern, file_size);
        let mut rng = SmallRng::from_entropy();
        let mut buffer = vec![0u8; layout.block as usize];
        rng.fill(&mut buffer[..]);

        debug!(
            pattern = %pattern,
            file = %temp_file.path().display(),
            file_size,
            "starting measurement"
        );

        let write = {
            let mut file = temp_file.open_write()?;
            let mut meter = PassMeter::new(native);
            match pattern.kind() {
                AccessKind::Sequential => {
                    write_sequential(&mut file, &layout, &buffer, &mut meter, &mut |v| progress(v, 0.0))?
                }
                AccessKind::Random => {
                    file.set_len(file_size)?;
                    write_random(&mut file, &layout, &buffer, &mut rng, &mut meter, &mut |v| {
                        progress(v, 0.0)
                    })?
                }
            }
            // flushing to the device is part of the write pass
            file.sync_all()?;
            meter.finish()
        };

        let read = {
            let mut file = temp_file.open_read()?;
            drop_cached_pages(&file);
            let mut meter = PassMeter::new(native);
            match pattern.kind() {
                AccessKind::Sequential => {
                    read_sequential(&mut file, &layout, &mut buffer, &mut meter, &mut |v| progress(0.0, v))?
                }
                AccessKind::Random => read_random(&mut file, &layout, &mut buffer, &mut rng, &mut meter, &mut |v| {
                    progress(0.0, v)
                })?,
            }
            meter.finish()
        };

        debug!(pattern = %pattern, write, read, unit = %native, "measurement finished");
        Ok(SpeedPair::new(write, read))
    }
}

/// Block geometry of one measurement
struct BlockLayout {
    file_size: u64,
    block: u64,
    /// Block-aligned slots available to random access
    slots: u64,
}

impl BlockLayout {
    fn new(pattern: &AccessPattern, file_size: u64) -> Self {
        // a file smaller than one block is handled as a single short block
        let block = pattern.block_size().min(file_size).max(1);
        Self {
            file_size,
            block,
            slots: (file_size / block).max(1),
        }
    }

    fn random_offset(&self, rng: &mut SmallRng) -> u64 {
        rng.gen_range(0..self.slots) * self.block
    }

    /// Offsets of every slot, each exactly once, in scattered order
    ///
    /// Walks `(stride * i + start) mod slots` with `stride` coprime to
    /// `slots`, which is a permutation without materializing the slot list.
    fn scattered_offsets(&self, rng: &mut SmallRng) -> impl Iterator<Item = u64> {
        let slots = self.slots;
        let block = self.block;
        let start = rng.gen_range(0..slots);
        let mut stride = rng.gen_range(1..=slots);
        while gcd(stride, slots) != 1 {
            stride = rng.gen_range(1..=slots);
        }
        (0..slots).map(move |i| {
            let slot = (stride as u128 * i as u128 + start as u128) % slots as u128;
            slot as u64 * block
        })
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Byte and operation counters of one timed pass
struct PassMeter {
    native: UnitMode,
    started: Instant,
    last_tick: Instant,
    bytes: u64,
    ops: u64,
    tick_bytes: u64,
    tick_ops: u64,
}

impl PassMeter {
    fn new(native: UnitMode) -> Self {
        let now = Instant::now();
        Self {
            native,
            started: now,
            last_tick: now,
            bytes: 0,
            ops: 0,
            tick_bytes: 0,
            tick_ops: 0,
        }
    }

    /// Count one completed operation, returning an interval reading when due
    fn record(&mut self, bytes: u64) -> Option<f64> {
        self.bytes += bytes;
        self.ops += 1;

        let elapsed = self.last_tick.elapsed();
        if elapsed < PROGRESS_INTERVAL {
            return None;
        }

        let reading = self.rate(self.bytes - self.tick_bytes, self.ops - self.tick_ops, elapsed);
        self.last_tick = Instant::now();
        self.tick_bytes = self.bytes;
        self.tick_ops = self.ops;
        reading.is_finite().then_some(reading)
    }

    fn finish(&self) -> f64 {
        self.rate(self.bytes, self.ops, self.started.elapsed())
    }

    fn rate(&self, bytes: u64, ops: u64, elapsed: Duration) -> f64 {
        if self.native.is_operation_rate() {
            calculate_iops(ops, elapsed)
        } else {
            calculate_speed_mbps(bytes, elapsed)
        }
    }
}

fn write_sequential(
    file: &mut File,
    layout: &BlockLayout,
    buffer: &[u8],
    meter: &mut PassMeter,
    report: &mut dyn FnMut(f64),
) -> Result<()> {
    let mut written = 0u64;
    while written < layout.file_size {
        let size = (layout.file_size - written).min(layout.block);
        file.write_all(&buffer[..size as usize])?;
        written += size;
        if let Some(reading) = meter.record(size) {
            report(reading);
        }
    }
    Ok(())
}

fn write_random(
    file: &mut File,
    layout: &BlockLayout,
    buffer: &[u8],
    rng: &mut SmallRng,
    meter: &mut PassMeter,
    report: &mut dyn FnMut(f64),
) -> Result<()> {
    // every slot is written so the read pass never lands on a hole
    for offset in layout.scattered_offsets(rng) {
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buffer)?;
        if let Some(reading) = meter.record(layout.block) {
            report(reading);
        }
    }
    Ok(())
}

fn read_sequential(
    file: &mut File,
    layout: &BlockLayout,
    buffer: &mut [u8],
    meter: &mut PassMeter,
    report: &mut dyn FnMut(f64),
) -> Result<()> {
    let mut remaining = layout.file_size;
    while remaining > 0 {
        let size = remaining.min(layout.block) as usize;
        file.read_exact(&mut buffer[..size])?;
        remaining -= size as u64;
        if let Some(reading) = meter.record(size as u64) {
            report(reading);
        }
    }
    Ok(())
}

fn read_random(
    file: &mut File,
    layout: &BlockLayout,
    buffer: &mut [u8],
    rng: &mut SmallRng,
    meter: &mut PassMeter,
    report: &mut dyn FnMut(f64),
) -> Result<()> {
    for _ in 0..layout.slots {
        file.seek(SeekFrom::Start(layout.random_offset(rng)))?;
        file.read_exact(buffer)?;
        if let Some(reading) = meter.record(layout.block) {
            report(reading);
        }
    }
    Ok(())
}
