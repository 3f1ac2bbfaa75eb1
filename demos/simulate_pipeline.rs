// Simulated collection + training run
// Writes a synthetic pose log, labels it in keystroke mode, then trains on the result.
//
// Run with: cargo run --example simulate_pipeline

use gesture_lab_lib::core::capture_controller::CaptureDevices;
use gesture_lab_lib::core::config::Config;
use gesture_lab_lib::core::keystroke_capture::KeystrokeCapture;
use gesture_lab_lib::core::training_pipeline::TrainingPipeline;
use gesture_lab_lib::models::pose::{Landmark, LandmarkSet, POSE_LANDMARK_COUNT};
use gesture_lab_lib::platform::capture::{ReplayDisplay, ReplayFrameSource, ReplayRecord};
use gesture_lab_lib::platform::pose::ReplayPoseEstimator;
use gesture_lab_lib::platform::signal::InterruptFlag;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};

const FRAMES_PER_GESTURE: usize = 40;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Gesture Lab Pipeline Simulation ===\n");

    let work_dir = std::env::temp_dir().join("gesture_lab_simulation");
    let config = Config {
        data_dir: work_dir.join("gesture_raw"),
        models_dir: work_dir.join("models"),
        n_estimators: 50,
        ..Config::default()
    };

    // 1. Synthesize a pose log: each gesture holds the wrists at a different height
    std::fs::create_dir_all(&work_dir)?;
    let log_path = work_dir.join("poses.jsonl");
    let mut rng = StdRng::seed_from_u64(7);
    let mut writer = BufWriter::new(File::create(&log_path)?);
    for (key, gesture) in &config.keystroke_bindings {
        let height = match gesture.as_str() {
            "REST" => 0.8,
            "NEXT" => 0.3,
            "PREV" => 0.5,
            _ => 0.1,
        };
        for frame in 0..FRAMES_PER_GESTURE {
            let landmarks: Vec<Landmark> = (0..POSE_LANDMARK_COUNT)
                .map(|i| {
                    Landmark::new(
                        i as f32 / POSE_LANDMARK_COUNT as f32 + rng.gen_range(-0.01..0.01),
                        height + rng.gen_range(-0.03..0.03),
                        rng.gen_range(-0.2..0.0),
                        rng.gen_range(0.8..1.0),
                    )
                })
                .collect();
            let mut record = ReplayRecord::pose(&LandmarkSet::new(landmarks));
            // every fifth frame goes unlabeled
            if frame % 5 != 0 {
                record = record.with_key(*key);
            }
            serde_json::to_writer(&mut writer, &record)?;
            writeln!(writer)?;
        }
    }
    serde_json::to_writer(&mut writer, &ReplayRecord::no_pose().with_key(config.quit_key))?;
    writeln!(writer)?;
    writer.flush()?;
    println!("Wrote synthetic pose log: {}", log_path.display());

    // 2. Label it in keystroke mode
    let mut source = ReplayFrameSource::from_path(&log_path);
    let mut estimator = ReplayPoseEstimator::new(&config.pose)?;
    let mut display = ReplayDisplay::new();
    let summary = KeystrokeCapture::new(&config, InterruptFlag::new()).run(CaptureDevices {
        source: &mut source,
        estimator: &mut estimator,
        display: &mut display,
    })?;
    println!(
        "Collected {} samples ({} frames shown)\n",
        summary.samples,
        display.frames_shown()
    );

    // 3. Train on everything under the data directory
    let outcome = TrainingPipeline::from_config(&config).run()?;
    println!(
        "\nHeld-out accuracy: {:.1}% on {} samples",
        outcome.report.accuracy * 100.0,
        outcome.test_size
    );

    Ok(())
}
