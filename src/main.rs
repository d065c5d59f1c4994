//! diskio - disk throughput benchmark
//!
//! # Usage
//!
//! ```bash
//! # List writable volumes
//! diskio --list
//!
//! # Run the standard suite three times on a directory, in GB/s
//! diskio --disk /mnt/data --size 1GiB --count 3 --unit GB/s
//! ```
//!
//! Without `--disk` the volume remembered by `--save-config` is reused while it
//! stays writable; otherwise the writable volumes are listed for a choice.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use diskio::bench::{BenchmarkRunner, FileSpeedSampler};
use diskio::config::{BenchmarkConfig, MAX_REPETITIONS_MENU};
use diskio::console::{format_results_table, ConsoleObserver};
use diskio::error::{is_terminal_run_error, user_friendly_message};
use diskio::io::probe_writable;
use diskio::models::{SystemVolumes, Volume, VolumeProvider};
use diskio::util::{format_bytes, format_duration, parse_bytes, parse_duration, UnitMode};
use diskio::{DiskIoError, Result};

/// Disk throughput benchmark over sequential and random access patterns
#[derive(Parser)]
#[command(name = "diskio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// List writable volumes and exit
    #[arg(short, long)]
    list: bool,

    /// Directory to test (prompted for when omitted)
    #[arg(short, long)]
    disk: Option<PathBuf>,

    /// Test file size (e.g., 512M, 1GiB)
    #[arg(short, long)]
    size: Option<String>,

    /// Number of passes over the pattern suite
    #[arg(short, long)]
    count: Option<u32>,

    /// Display unit: KB/s, MB/s, GB/s or IOPS
    #[arg(short, long)]
    unit: Option<UnitMode>,

    /// Delay between patterns (e.g., 500ms, 1s)
    #[arg(long)]
    pacing: Option<String>,

    /// Leave the test file on the volume after each pattern
    #[arg(long)]
    keep_test_file: bool,

    /// Print the result table as JSON
    #[arg(long)]
    json: bool,

    /// Remember the chosen volume and settings
    #[arg(long)]
    save_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", user_friendly_message(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.list {
        list_volumes();
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = BenchmarkConfig::load().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring unreadable config file");
        BenchmarkConfig::default()
    });
    config = apply_overrides(config, &cli)?;

    let volume = select_volume(cli.disk.as_deref(), config.disk_path.as_deref(), || {
        prompt_volume(&SystemVolumes)
    })?;

    if cli.save_config {
        config.clone().with_disk_path(volume.path.clone()).save()?;
    }

    let sampler = FileSpeedSampler::new().keep_test_file(config.keep_test_file);
    let mut runner = BenchmarkRunner::new(Arc::new(sampler));
    let mut observer = if cli.json {
        ConsoleObserver::hidden(config.unit)
    } else {
        println!(
            "Testing {} with {} file, {} pass(es)",
            volume.display_name(),
            format_bytes(config.file_size),
            config.repetitions
        );
        ConsoleObserver::new(config.invocation_count(), config.unit)
    };

    runner.start(Some(&volume), &config)?;
    let started = Instant::now();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupts = InterruptCounter::default();
    while runner.is_running() {
        tokio::select! {
            _ = &mut ctrl_c => {
                match interrupts.record() {
                    Interrupt::Cancel => {
                        eprintln!("\nCancelling after the current pattern, press Ctrl-C again to quit");
                        runner.cancel();
                    }
                    Interrupt::Abort => {
                        eprintln!("\nAborted");
                        std::process::exit(130);
                    }
                }
                ctrl_c.set(tokio::signal::ctrl_c());
            }
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                runner.pump(&mut observer);
            }
        }
    }
    let elapsed = started.elapsed();
    info!(elapsed = %format_duration(elapsed), "run finished");

    if cli.json {
        println!("{}", serde_json::to_string_pretty(runner.aggregate())?);
    } else {
        print!("\n{}", format_results_table(runner.aggregate(), runner.unit()));
        println!("Finished in {}", format_duration(elapsed));
    }

    match runner.last_error() {
        Some(err) => {
            eprintln!("Error: {}", user_friendly_message(err));
            if let Some(note) = partial_results_note(err, runner.aggregate().len()) {
                eprintln!("{}", note);
            }
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

/// What a Ctrl-C does at this point of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    /// Stop after the current pattern
    Cancel,
    /// Leave immediately
    Abort,
}

#[derive(Debug, Default)]
struct InterruptCounter {
    received: u32,
}

impl InterruptCounter {
    fn record(&mut self) -> Interrupt {
        self.received += 1;
        if self.received == 1 {
            Interrupt::Cancel
        } else {
            Interrupt::Abort
        }
    }
}

fn partial_results_note(error: &DiskIoError, completed: usize) -> Option<String> {
    if is_terminal_run_error(error) && completed > 0 {
        Some(format!(
            "Results are partial: {} pattern(s) finished before the run stopped",
            completed
        ))
    } else {
        None
    }
}

fn apply_overrides(mut config: BenchmarkConfig, cli: &Cli) -> Result<BenchmarkConfig> {
    if let Some(size) = &cli.size {
        config.file_size = parse_bytes(size).map_err(DiskIoError::ConfigError)?;
    }
    if let Some(count) = cli.count {
        if count > MAX_REPETITIONS_MENU {
            return Err(DiskIoError::ConfigError(format!(
                "Count too large: {} (max: {})",
                count, MAX_REPETITIONS_MENU
            )));
        }
        config.repetitions = count;
    }
    if let Some(unit) = cli.unit {
        config.unit = unit;
    }
    if let Some(pacing) = &cli.pacing {
        config = config.with_pacing(parse_duration(pacing).map_err(DiskIoError::ConfigError)?);
    }
    if cli.keep_test_file {
        config = config.with_keep_test_file(true);
    }
    config.validate()?;
    Ok(config)
}

/// Volume to test: `--disk`, else the remembered one while writable, else `prompt`
fn select_volume(
    disk: Option<&Path>,
    remembered: Option<&Path>,
    prompt: impl FnOnce() -> Result<Volume>,
) -> Result<Volume> {
    if let Some(path) = disk {
        return Ok(Volume::at_path(path));
    }
    if let Some(path) = remembered {
        if probe_writable(path) {
            info!(path = %path.display(), "using remembered volume");
            return Ok(Volume::at_path(path));
        }
        warn!(path = %path.display(), "remembered volume is not writable");
    }
    prompt()
}

fn list_volumes() {
    let volumes = SystemVolumes.list_writable_volumes();
    if volumes.is_empty() {
        println!("No writable volumes found");
        return;
    }
    for volume in volumes {
        println!(
            "{}  {} free of {}  {}",
            volume.display_name(),
            format_bytes(volume.free_space),
            format_bytes(volume.capacity),
            volume.filesystem
        );
    }
}

fn prompt_volume(provider: &dyn VolumeProvider) -> Result<Volume> {
    let mut volumes = provider.list_writable_volumes();
    if volumes.is_empty() {
        return Err(DiskIoError::NoVolumeSelected);
    }

    println!("Available disks:");
    for (i, volume) in volumes.iter().enumerate() {
        println!("{}: {}", i + 1, volume.display_name());
    }
    print!("Enter disk number [1]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let idx = match input.trim() {
        "" => 1,
        choice => choice.parse::<usize>().unwrap_or(0),
    };

    if idx == 0 || idx > volumes.len() {
        return Err(DiskIoError::NoVolumeSelected);
    }
    Ok(volumes.swap_remove(idx - 1))
}
