// Gesture Lab command-line entry point

use anyhow::{anyhow, Context};
use gesture_lab_lib::cli::{Cli, Commands};
use gesture_lab_lib::core::capture_controller::{CaptureDevices, SessionCapture};
use gesture_lab_lib::core::config::Config;
use gesture_lab_lib::core::keystroke_capture::KeystrokeCapture;
use gesture_lab_lib::core::session_manager::SessionManager;
use gesture_lab_lib::core::training_pipeline::TrainingPipeline;
use gesture_lab_lib::platform::capture::{ReplayDisplay, ReplayFrameSource};
use gesture_lab_lib::platform::console::StdinPrompter;
use gesture_lab_lib::platform::pose::ReplayPoseEstimator;
use gesture_lab_lib::platform::signal::InterruptFlag;
use std::path::{Path, PathBuf};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    // --verbose raises the default; RUST_LOG still wins when set
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;

    match cli.command {
        Commands::Collect { source, data_dir } => {
            override_dir(&mut config.data_dir, data_dir);
            run_collect(&config, &source)
        }
        Commands::CollectKeys { source, data_dir } => {
            override_dir(&mut config.data_dir, data_dir);
            run_collect_keys(&config, &source)
        }
        Commands::Train {
            data_dir,
            models_dir,
        } => {
            override_dir(&mut config.data_dir, data_dir);
            override_dir(&mut config.models_dir, models_dir);
            run_train(&config)
        }
    }
}

fn override_dir(target: &mut PathBuf, value: Option<PathBuf>) {
    if let Some(dir) = value {
        *target = dir;
    }
}

fn run_collect(config: &Config, source: &Path) -> anyhow::Result<()> {
    let interrupt = InterruptFlag::install().context("Failed to install Ctrl-C handler")?;

    let mut source = ReplayFrameSource::from_path(source);
    let mut estimator = ReplayPoseEstimator::new(&config.pose)?;
    let mut display = ReplayDisplay::new();
    let mut manager = SessionManager::new(config.gestures.clone());
    let mut prompter = StdinPrompter::new(interrupt.clone());

    let summary = SessionCapture::new(config, &mut manager, &mut prompter, interrupt)
        .run(CaptureDevices {
            source: &mut source,
            estimator: &mut estimator,
            display: &mut display,
        })
        .context("Session collection failed")?;

    if summary.interrupted {
        log::warn!("Collection interrupted by Ctrl-C");
    }
    log::info!(
        "Sealed {} session(s), wrote {} file(s) to {}",
        summary.sessions_sealed,
        summary.files.len(),
        config.data_dir.display()
    );
    Ok(())
}

fn run_collect_keys(config: &Config, source: &Path) -> anyhow::Result<()> {
    let interrupt = InterruptFlag::install().context("Failed to install Ctrl-C handler")?;

    let mut source = ReplayFrameSource::from_path(source);
    let mut estimator = ReplayPoseEstimator::new(&config.pose)?;
    let mut display = ReplayDisplay::new();

    let summary = KeystrokeCapture::new(config, interrupt)
        .run(CaptureDevices {
            source: &mut source,
            estimator: &mut estimator,
            display: &mut display,
        })
        .context("Keystroke collection failed")?;

    if summary.skipped > 0 {
        log::warn!("{} key press(es) had no detected pose and were skipped", summary.skipped);
    }
    log::info!("Collected {} samples ({:?})", summary.samples, summary.outcome);
    Ok(())
}

fn run_train(config: &Config) -> anyhow::Result<()> {
    let outcome = TrainingPipeline::from_config(config)
        .run()
        .context("Training failed")?;

    log::info!(
        "Accuracy {:.3} on {} held-out samples",
        outcome.report.accuracy,
        outcome.test_size
    );
    Ok(())
}
