//! # Heel-Toe Trainer
//!
//! Rhythm-style trainer for sim-racing pedal, wheel and shifter inputs.
//!
//! Runs one training session: polls connected controllers, merges them with
//! the keyboard fallback, and judges the driver against a generated (or
//! file-supplied) target sequence at a fixed tick rate.

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

use heeltoe::config::Config;
use heeltoe::input::backend::{GilrsSource, NullSource, SnapshotSource};
use heeltoe::input::keyboard::KeyboardMap;
use heeltoe::input::{InputAggregator, MappingConfig, MappingConfigV2};
use heeltoe::judge::JudgmentSettings;
use heeltoe::notify::LogSink;
use heeltoe::sequence::file::{SequenceFile, SequenceSource};
use heeltoe::session::{SessionClock, TrainingSession};

/// Default configuration file, optional.
const CONFIG_PATH: &str = "heeltoe.toml";

/// Persisted channel mapping, optional.
const MAPPING_PATH: &str = "mappings.json";

/// Number of ticks between status log messages (5 seconds at 60Hz)
const LOG_INTERVAL_TICKS: u64 = 300;

/// Main entry point for the trainer
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (falls back to defaults when absent)
///    - Open the gamepad backend, or run keyboard-only
///    - Load or generate the target sequence
///
/// 2. **Main Loop**
///    - Poll devices, aggregate input, and judge once per tick
///    - Log progress every few seconds
///    - Handle Ctrl+C for early shutdown
///
/// 3. **Shutdown**
///    - Log the run summary (accuracy, score, tally, best combo)
///
/// # Errors
///
/// Returns error if the configuration or a supplied sequence file fails to
/// load or validate.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Heel-Toe Trainer v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match Config::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(heeltoe::error::TrainerError::Io(e))
            if e.kind() == std::io::ErrorKind::NotFound =>
        {
            info!("no {} found, using defaults", CONFIG_PATH);
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    let mut source: Box<dyn SnapshotSource> = match GilrsSource::new() {
        Ok(source) => Box::new(source),
        Err(e) => {
            warn!("gamepad backend unavailable ({}), keyboard-only mode", e);
            Box::new(NullSource)
        }
    };

    // Resolve the persisted mapping against whatever is connected right now;
    // a v1 file upgrades in place here.
    let connected = source.poll();
    let mapping = match std::fs::read_to_string(MAPPING_PATH) {
        Ok(json) => MappingConfig::from_json(&json)?.into_v2(&connected),
        Err(_) => {
            info!("no {} found, channels come from the keyboard", MAPPING_PATH);
            MappingConfigV2::default()
        }
    };
    let mut aggregator = InputAggregator::new(
        mapping,
        KeyboardMap::default_layout(),
        config.input.deadzone,
    );

    // A sequence file path on the command line bypasses the generator.
    let source_choice = match std::env::args().nth(1) {
        Some(path) => SequenceSource::Sequence(SequenceFile::load(path)?.into_sequence()?),
        None => SequenceSource::Random {
            difficulty: config.difficulty.clone(),
            duration_s: config.session.run_duration_s,
        },
    };
    let mut rng = SmallRng::from_entropy();
    let sequence = source_choice.produce(&mut rng);
    info!(
        targets = sequence.len(),
        duration_s = sequence.total_duration,
        "sequence ready"
    );

    let mut session = TrainingSession::new(
        JudgmentSettings::from(&config.judgment),
        sequence,
        SessionClock::monotonic(),
    );
    let mut sink = LogSink;

    let period_us = 1_000_000 / u64::from(config.session.tick_rate_hz);
    let mut tick_interval = interval(Duration::from_micros(period_us));

    info!(
        "Starting run at {}Hz, press Ctrl+C to stop early",
        config.session.tick_rate_hz
    );
    session.start();

    let mut tick_count: u64 = 0;
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let connected = source.poll();
                let input = aggregator.tick(&connected);
                session.tick(&input, &mut sink);
                tick_count += 1;

                if tick_count % LOG_INTERVAL_TICKS == 0 {
                    let summary = session.summary();
                    info!(
                        "{:.1}s elapsed, {} targets resolved, accuracy {:.1}%",
                        session.elapsed(),
                        summary.tally.total(),
                        summary.accuracy
                    );
                }

                if session.is_complete() {
                    info!("Run complete");
                    break;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, ending run early");
                break;
            }
        }
    }

    let summary = session.summary();
    info!(
        "Result: accuracy {:.1}%, score {:.1}, best combo {}",
        summary.accuracy, summary.score, summary.combo_max
    );
    info!(
        "Tally: perfect {}, great {}, good {}, ok {}, miss {}",
        summary.tally.perfect,
        summary.tally.great,
        summary.tally.good,
        summary.tally.ok,
        summary.tally.miss
    );

    Ok(())
}
