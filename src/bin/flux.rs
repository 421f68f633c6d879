//! Flux CLI - Command-line interface for motor-flux
//!
//! Commands:
//! - run: Live ticking with the synthetic sampler, stdin lines are taps
//! - replay: Replay a recorded NDJSON session
//! - report: Simulate a session and print the assessment report
//! - zones: Print the severity zone table

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use motor_flux::clock::ManualClock;
use motor_flux::replay::parse_replay;
use motor_flux::types::MetricSnapshot;
use motor_flux::{
    replay, EngineConfig, FluxError, MetricEngine, ReportEncoder, SyntheticSampler, TickLoop,
    TremorTiming, Zone, FLUX_VERSION,
};

/// Flux - Streaming motor-symptom severity scoring
#[derive(Parser)]
#[command(name = "flux")]
#[command(version = FLUX_VERSION)]
#[command(about = "Score tremor, grip pressure and tapping rhythm", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tick live against the synthetic sampler; each stdin line records a tap
    Run {
        #[command(flatten)]
        engine: EngineArgs,

        /// Print a snapshot every N applied ticks
        #[arg(long, default_value = "1")]
        emit_every: u64,

        /// Stop after this many applied ticks
        #[arg(long)]
        ticks: Option<u64>,

        /// Seed for the synthetic sampler
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Replay a recorded NDJSON session
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,

        /// What to print
        #[arg(long, default_value = "snapshots")]
        output: ReplayOutput,

        /// Subject label for the report
        #[arg(long, default_value = "")]
        subject: String,
    },

    /// Simulate a session with evenly spaced taps and print the report
    Report {
        #[command(flatten)]
        engine: EngineArgs,

        /// Number of ticks to simulate
        #[arg(long, default_value = "100")]
        ticks: u64,

        /// Simulated tapping rate in taps/second (0 for no taps)
        #[arg(long, default_value = "5.0")]
        tap_rate: f64,

        /// Seed for the synthetic sampler
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Subject label for the report
        #[arg(long, default_value = "")]
        subject: String,
    },

    /// Print the severity zone table
    Zones {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Engine settings shared by the ticking commands
#[derive(Args)]
struct EngineArgs {
    /// Load engine configuration from a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tick period in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Tap retention window in milliseconds
    #[arg(long)]
    window_ms: Option<u64>,

    /// Target tapping rate in taps/second
    #[arg(long)]
    target_rate: Option<f64>,

    /// Score tremor from the reading held before each tick
    #[arg(long)]
    lagged_tremor: bool,
}

#[derive(Clone, ValueEnum)]
enum ReplayOutput {
    /// One snapshot per applied tick (NDJSON)
    Snapshots,
    /// Pretty-printed report of the final state
    Report,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), FluxCliError> {
    match cli.command {
        Commands::Run {
            engine,
            emit_every,
            ticks,
            seed,
        } => cmd_run(engine.load()?, emit_every, ticks, seed),

        Commands::Replay {
            input,
            engine,
            output,
            subject,
        } => cmd_replay(&input, engine.load()?, output, &subject),

        Commands::Report {
            engine,
            ticks,
            tap_rate,
            seed,
            subject,
        } => cmd_report(engine.load()?, ticks, tap_rate, seed, &subject),

        Commands::Zones { json } => cmd_zones(json),
    }
}

impl EngineArgs {
    /// Config file first, then flag overrides, then validation
    fn load(&self) -> Result<EngineConfig, FluxCliError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?)?,
            None => EngineConfig::default(),
        };

        if let Some(tick_ms) = self.tick_ms {
            config.tick_period_ms = tick_ms;
        }
        if let Some(window_ms) = self.window_ms {
            config.tap_window_ms = window_ms;
        }
        if let Some(target_rate) = self.target_rate {
            config.target_tap_rate_hz = target_rate;
        }
        if self.lagged_tremor {
            config.tremor_timing = TremorTiming::LaggedOneTick;
        }

        config.validate()?;
        Ok(config)
    }
}

fn cmd_run(
    config: EngineConfig,
    emit_every: u64,
    ticks: Option<u64>,
    seed: Option<u64>,
) -> Result<(), FluxCliError> {
    if emit_every == 0 {
        return Err(FluxCliError::InvalidArgument(
            "--emit-every must be at least 1".to_string(),
        ));
    }

    let engine = MetricEngine::synthetic(config, seed)?;
    let tick_loop = TickLoop::spawn_with_observer(engine, ticks, move |snapshot| {
        if snapshot.ticks_applied % emit_every != 0 {
            return;
        }
        if let Err(e) = write_snapshot(snapshot) {
            warn!(error = %e, "failed to write snapshot");
        }
    })?;

    // Stdin reads block, so taps are read on their own thread
    let trigger = tick_loop.tap_trigger();
    let (eof_tx, eof_rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if line.is_err() {
                break;
            }
            trigger.tap();
        }
        let _ = eof_tx.send(());
    });

    let stop_at_eof = ticks.is_none() && !atty::is(atty::Stream::Stdin);
    let mut drain_until: Option<u64> = None;
    loop {
        if tick_loop.is_finished() {
            break;
        }
        if let Some(target) = drain_until {
            if tick_loop.latest().ticks_applied >= target {
                info!(ticks = target, "stdin closed, stopping");
                break;
            }
        }
        match eof_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(()) if stop_at_eof => {
                let target = drain_target(tick_loop.latest().ticks_applied, emit_every);
                info!(until_tick = target, "stdin closed, finishing current batch");
                drain_until = Some(target);
            }
            Ok(()) | Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                thread::sleep(Duration::from_millis(50));
            }
        }
    }

    tick_loop.stop();
    Ok(())
}

/// Tick count at which a piped `run` may stop once stdin closes: the next
/// emitted snapshot after `applied`, so taps read before EOF always reach output
fn drain_target(applied: u64, emit_every: u64) -> u64 {
    (applied / emit_every + 1) * emit_every
}

fn write_snapshot(snapshot: &MetricSnapshot) -> Result<(), FluxCliError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string(snapshot)?)?;
    stdout.flush()?;
    Ok(())
}

fn cmd_replay(
    input: &Path,
    config: EngineConfig,
    output: ReplayOutput,
    subject: &str,
) -> Result<(), FluxCliError> {
    // Read input
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = parse_replay(&input_data)?;
    if records.is_empty() {
        return Err(FluxCliError::NoRecords);
    }

    let outcome = replay(config, &records)?;

    match output {
        ReplayOutput::Snapshots => {
            let mut stdout = io::stdout().lock();
            for snapshot in &outcome.snapshots {
                writeln!(stdout, "{}", serde_json::to_string(snapshot)?)?;
            }
        }
        ReplayOutput::Report => {
            let json = ReportEncoder::new().encode_to_json(&outcome.final_snapshot, subject)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn cmd_report(
    config: EngineConfig,
    ticks: u64,
    tap_rate: f64,
    seed: u64,
    subject: &str,
) -> Result<(), FluxCliError> {
    if !tap_rate.is_finite() || tap_rate < 0.0 {
        return Err(FluxCliError::InvalidArgument(format!(
            "--tap-rate must be a non-negative number, got {}",
            tap_rate
        )));
    }

    let period_ms = config.tick_period_ms;
    simulated_span_ms(ticks, period_ms)?;
    let clock = Arc::new(ManualClock::new(0));
    let sampler = SyntheticSampler::with_seed(period_ms, seed);
    let mut engine = MetricEngine::with_clock(config, sampler, clock.clone())?;

    let tap_interval_ms = if tap_rate > 0.0 {
        Some(1000.0 / tap_rate)
    } else {
        None
    };
    let mut next_tap_ms = 0.0;

    for tick in 1..=ticks {
        let now_ms = tick * period_ms;
        if let Some(interval) = tap_interval_ms {
            while next_tap_ms < now_ms as f64 {
                engine.record_tap_at(next_tap_ms.round() as u64);
                next_tap_ms += interval;
            }
        }
        clock.set(now_ms);
        engine.on_tick();
    }

    let json = ReportEncoder::new().encode_to_json(&engine.snapshot(), subject)?;
    println!("{}", json);
    Ok(())
}

/// Length of a simulated session; rejects tick counts whose timestamps overflow
fn simulated_span_ms(ticks: u64, period_ms: u64) -> Result<u64, FluxCliError> {
    ticks.checked_mul(period_ms).ok_or_else(|| {
        FluxCliError::InvalidArgument(format!(
            "--ticks {} at {} ms per tick exceeds the timestamp range",
            ticks, period_ms
        ))
    })
}

fn cmd_zones(json: bool) -> Result<(), FluxCliError> {
    let rows: Vec<ZoneRow> = Zone::ALL
        .iter()
        .map(|&zone| {
            let (min, max) = zone.range();
            ZoneRow {
                zone,
                label: zone.label(),
                min,
                max,
                color: zone.color(),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("Severity Zones");
        println!("==============");
        for row in &rows {
            println!(
                "  {:<8} [{:.2}, {:.2}{}  {}",
                row.label,
                row.min,
                row.max,
                if row.zone == Zone::Alert { "]" } else { ")" },
                row.color
            );
        }
    }

    Ok(())
}

// Error types

#[derive(Debug, thiserror::Error)]
enum FluxCliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Flux(#[from] FluxError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No records found in input")]
    NoRecords,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FluxCliError> for CliError {
    fn from(e: FluxCliError) -> Self {
        match e {
            FluxCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FluxCliError::Flux(FluxError::InvalidConfig(msg)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: msg,
                hint: Some("Check the config file and flag values".to_string()),
            },
            FluxCliError::Flux(e @ FluxError::ReplayError { .. }) => CliError {
                code: "REPLAY_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Each line must be a tick, tap or drop record".to_string()),
            },
            FluxCliError::Flux(e) => CliError {
                code: "FLUX_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            FluxCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FluxCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            FluxCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: Some("Run 'flux help' for usage".to_string()),
            },
        }
    }
}

// Output types

#[derive(serde::Serialize)]
struct ZoneRow {
    zone: Zone,
    label: &'static str,
    min: f64,
    max: f64,
    color: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_target_reaches_next_emitted_tick() {
        // EOF before the first tick still waits for the first batch
        assert_eq!(drain_target(0, 10), 10);
        assert_eq!(drain_target(0, 1), 1);
        assert_eq!(drain_target(7, 10), 10);
        // A batch just emitted: wait for the following one
        assert_eq!(drain_target(10, 10), 20);
        assert_eq!(drain_target(12, 5), 15);
    }

    #[test]
    fn test_simulated_span_overflow_rejected() {
        assert_eq!(simulated_span_ms(100, 100).unwrap(), 10_000);
        assert!(matches!(
            simulated_span_ms(u64::MAX, 100),
            Err(FluxCliError::InvalidArgument(_))
        ));
        assert_eq!(simulated_span_ms(u64::MAX, 1).unwrap(), u64::MAX);
    }

    #[test]
    fn test_cli_error_display_and_codes() {
        let e = FluxCliError::InvalidArgument("--emit-every must be at least 1".to_string());
        assert_eq!(e.to_string(), "Invalid argument: --emit-every must be at least 1");
        assert_eq!(CliError::from(e).code, "INVALID_ARGUMENT");

        let e = FluxCliError::from(FluxError::InvalidConfig(
            "tick_period_ms must be positive".to_string(),
        ));
        assert!(e.to_string().contains("tick_period_ms"));
        assert_eq!(CliError::from(e).code, "INVALID_CONFIG");

        assert_eq!(CliError::from(FluxCliError::NoRecords).code, "NO_RECORDS");
    }
}
