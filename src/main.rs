//! Frame Quality CLI
//!
//! Runs the calibration sequence and quality checks against the mock
//! camera, printing feedback as it changes and a run summary at the end.

use chrono::{DateTime, Utc};
use clap::Parser;
use frame_quality::{
    capture::{Camera, MockCamera},
    config::FileConfig,
    evaluation::{Feedback, FeedbackSink, LogFeedbackSink, QualityEngine, SessionStats},
    metrics::{MetricsRegistry, MetricsSnapshot},
    trigger::AdvanceTrigger,
    CalibrationStage,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "frame-quality", version, about = "Camera frame quality checker")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames to process (overrides `output.frame_count`).
    #[arg(short, long)]
    frames: Option<u32>,

    /// Milliseconds per calibration stage (overrides `calibration.advance_interval_ms`).
    #[arg(long)]
    advance_ms: Option<u64>,

    /// Run until Ctrl-C.
    #[arg(long)]
    continuous: bool,

    /// Brightness gain of the mock scene.
    #[arg(long, default_value_t = 1.0)]
    gain: f32,

    /// Seed for mock sensor noise.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Print Prometheus metrics after the run.
    #[arg(long)]
    metrics: bool,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    final_stage: CalibrationStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    blur_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sharpness_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sharpness_max: Option<f64>,
    stats: SessionStats,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    info!("Frame Quality v{}", frame_quality::VERSION);

    let mut config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    if let Some(frames) = args.frames {
        config.output.frame_count = frames;
    }
    if let Some(ms) = args.advance_ms {
        config.calibration.advance_interval_ms = ms;
    }
    config.output.continuous |= args.continuous;
    config.output.print_metrics |= args.metrics;
    config.validate()?;

    let mut camera = MockCamera::new().with_gain(args.gain).with_seed(args.seed);
    camera.open(&config.capture)?;

    let engine = QualityEngine::with_thresholds(
        &config.quality.thresholds,
        config.quality.blur_source,
        config.calibration.policy,
    );

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    let trigger = AdvanceTrigger::spawn(engine.clone(), config.calibration.advance_interval())?;
    let frame_period = Duration::from_secs_f64(1.0 / f64::from(config.capture.fps));
    let started_at = Utc::now();
    let mut sink = LogFeedbackSink::new();
    let mut processed: u32 = 0;

    info!(
        stage_ms = config.calibration.advance_interval_ms,
        fps = config.capture.fps,
        "Calibrating"
    );

    while running.load(Ordering::SeqCst)
        && (config.output.continuous || processed < config.output.frame_count)
    {
        engine.reconfigure(&mut camera);

        let frame = match camera.capture() {
            Ok(f) => f,
            Err(e) => {
                warn!("Frame capture failed: {}", e);
                thread::sleep(frame_period);
                continue;
            }
        };

        if let Some(verdict) = engine.process(&frame) {
            sink.render(&Feedback::from(&verdict));
        }

        processed += 1;
        thread::sleep(frame_period);
    }

    trigger.stop();
    camera.close();

    let snapshot = engine.snapshot();
    if snapshot.stage != CalibrationStage::QualityCheck {
        warn!(stage = %snapshot.stage, "Run ended before calibration finished");
    }

    let summary = RunSummary {
        started_at,
        finished_at: Utc::now(),
        final_stage: snapshot.stage,
        blur_threshold: snapshot.blur_threshold,
        sharpness_min: snapshot.running_min,
        sharpness_max: snapshot.running_max,
        stats: snapshot.stats.clone(),
    };
    println!("{}", toml::to_string(&summary)?);

    if config.output.print_metrics {
        let registry = MetricsRegistry::new()?;
        registry.update(&MetricsSnapshot::from(&snapshot));
        print!("{}", registry.encode()?);
    }

    info!("Done. Processed {} frames", processed);
    Ok(())
}
