// End-to-end collection and training scenarios

use chrono::{Local, TimeZone};
use gesture_lab_lib::core::capture_controller::{CaptureDevices, SessionCapture};
use gesture_lab_lib::core::config::Config;
use gesture_lab_lib::core::dataset_loader::load_all;
use gesture_lab_lib::core::feature_prep::prepare;
use gesture_lab_lib::core::model_store::ModelStore;
use gesture_lab_lib::core::random_forest::ForestParams;
use gesture_lab_lib::core::sample_store::SampleStore;
use gesture_lab_lib::core::session_manager::SessionManager;
use gesture_lab_lib::core::training_pipeline::TrainingPipeline;
use gesture_lab_lib::models::dataset::Cell;
use gesture_lab_lib::models::pose::{Landmark, LandmarkSet, PoseConfig};
use gesture_lab_lib::models::sample::{Sample, SampleOrigin};
use gesture_lab_lib::models::training::TrainingError;
use gesture_lab_lib::platform::capture::{ReplayDisplay, ReplayFrameSource, ReplayRecord};
use gesture_lab_lib::platform::console::ScriptedPrompter;
use gesture_lab_lib::platform::pose::ReplayPoseEstimator;
use gesture_lab_lib::platform::signal::InterruptFlag;
use std::fs;
use std::path::{Path, PathBuf};

const LANDMARKS: usize = 3;

fn scratch_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("gesture_lab_{}_{}", tag, uuid::Uuid::new_v4()))
}

/// Deterministic per-gesture pose with a little per-frame variation
fn gesture_features(gesture: &str, frame: usize) -> Vec<f32> {
    let base = match gesture {
        "REST" => 0.2,
        "NEXT" => 0.8,
        "PREV" => 0.4,
        _ => 0.6,
    };
    let wobble = (frame % 7) as f32 * 0.005;
    (0..LANDMARKS)
        .flat_map(|i| [base + wobble, base - wobble + i as f32 * 0.01, -0.1, 0.95])
        .collect()
}

/// Write one session-mode dataset file of `rows` samples
fn write_session_file(dir: &Path, gesture: &str, rows: usize, second: u32) -> PathBuf {
    let session_id = format!("20240101_1200{:02}", second);
    let samples: Vec<Sample> = (0..rows)
        .map(|i| {
            Sample::new(
                gesture,
                gesture_features(gesture, i),
                SampleOrigin::Session {
                    session_id: session_id.clone(),
                    frame_index: i as u64,
                },
                format!("2024-01-01T12:00:{:02}.{:06}", second, i),
            )
        })
        .collect();
    let now = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, second).unwrap();
    SampleStore::new(dir).flush_at(&samples, now).unwrap().unwrap()
}

fn pipeline(data_dir: &Path, models_dir: &Path) -> TrainingPipeline {
    TrainingPipeline {
        data_dir: data_dir.to_path_buf(),
        models_dir: models_dir.to_path_buf(),
        test_fraction: 0.2,
        params: ForestParams {
            n_estimators: 25,
            ..ForestParams::default()
        },
    }
}

#[test]
fn test_two_gesture_end_to_end() {
    let data_dir = scratch_dir("e2e_data");
    let models_dir = scratch_dir("e2e_models");
    write_session_file(&data_dir, "REST", 20, 1);
    write_session_file(&data_dir, "NEXT", 20, 2);

    let outcome = pipeline(&data_dir, &models_dir).run().unwrap();

    assert_eq!(outcome.files_loaded, 2);
    assert_eq!(outcome.rows_loaded, 40);
    assert_eq!(outcome.rows_dropped, 0);
    assert_eq!(outcome.train_size, 32);
    assert_eq!(outcome.test_size, 8);

    let report = &outcome.report;
    assert_eq!(report.classes, vec!["NEXT", "REST"]);
    assert_eq!(report.confusion_matrix.len(), 2);
    assert!(report.confusion_matrix.iter().all(|row| row.len() == 2));
    assert_eq!(report.class_metrics("NEXT").unwrap().support, 4);
    assert_eq!(report.class_metrics("REST").unwrap().support, 4);
    assert_eq!(report.accuracy, 1.0);

    let (artifact, codec) = ModelStore::new(&models_dir).load().unwrap();
    assert_eq!(codec.classes(), &["NEXT", "REST"]);
    assert_eq!(artifact.feature_names.len(), 4 * LANDMARKS);
    assert_eq!(artifact.forest.n_trees(), 25);

    let _ = fs::remove_dir_all(data_dir);
    let _ = fs::remove_dir_all(models_dir);
}

#[test]
fn test_singleton_class_stops_before_training() {
    let data_dir = scratch_dir("strat_data");
    let models_dir = scratch_dir("strat_models");
    write_session_file(&data_dir, "REST", 20, 1);
    write_session_file(&data_dir, "NEXT", 1, 2);

    match pipeline(&data_dir, &models_dir).run() {
        Err(TrainingError::Stratification { class, count }) => {
            assert_eq!(class, "NEXT");
            assert_eq!(count, 1);
        }
        other => panic!("expected stratification error, got {:?}", other.map(|o| o.report)),
    }
    assert!(!models_dir.exists());

    let _ = fs::remove_dir_all(data_dir);
}

#[test]
fn test_empty_data_dir_is_no_data() {
    let data_dir = scratch_dir("empty_data");
    fs::create_dir_all(&data_dir).unwrap();
    let models_dir = scratch_dir("empty_models");

    assert!(matches!(
        pipeline(&data_dir, &models_dir).run(),
        Err(TrainingError::NoDataFound(_))
    ));
    assert!(!models_dir.exists());

    let _ = fs::remove_dir_all(data_dir);
}

#[test]
fn test_legacy_label_column_is_reconciled() {
    let data_dir = scratch_dir("legacy");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(
        data_dir.join("gesture_samples_20240101_100000.csv"),
        "sample_index,timestamp,gesture_label,landmark_0_x,landmark_0_y\n\
         0,2024-01-01T10:00:00.000000,PREV,0.1,0.2\n\
         1,2024-01-01T10:00:01.000000,PREV,0.1,0.3\n",
    )
    .unwrap();
    fs::write(
        data_dir.join("gesture_samples_20240101_110000.csv"),
        "sample_index,timestamp,gesture,landmark_0_x,landmark_0_y\n\
         0,2024-01-01T11:00:00.000000,SELECT,0.7,0.8\n",
    )
    .unwrap();

    let loaded = load_all(&data_dir).unwrap();
    let table = &loaded.table;

    assert!(table.has_column("gesture"));
    assert!(!table.has_column("gesture_label"));
    assert_eq!(table.columns().len(), 5);
    assert_eq!(table.n_rows(), 3);
    assert_eq!(loaded.rows_dropped, 0);
    let labels: Vec<String> = table.column("gesture").unwrap().filter_map(Cell::to_label).collect();
    assert_eq!(labels, vec!["PREV", "PREV", "SELECT"]);

    let _ = fs::remove_dir_all(data_dir);
}

#[test]
fn test_rows_with_missing_values_are_dropped() {
    let data_dir = scratch_dir("missing");
    fs::create_dir_all(&data_dir).unwrap();
    let header = "sample_index,timestamp,gesture,landmark_0_x,landmark_0_y\n";
    let files = [
        // one missing value
        "0,t0,REST,0.1,0.2\n1,t1,REST,,0.2\n2,t2,REST,0.1,0.2\n3,t3,REST,0.1,0.2\n",
        // none missing
        "0,t0,NEXT,0.9,0.8\n1,t1,NEXT,0.9,0.8\n2,t2,NEXT,0.9,0.8\n3,t3,NEXT,0.9,0.8\n",
        // two missing, one of them the label
        "0,t0,SELECT,0.5,NaN\n1,t1,,0.5,0.5\n2,t2,SELECT,0.5,0.5\n3,t3,SELECT,0.5,0.5\n",
    ];
    for (i, body) in files.iter().enumerate() {
        fs::write(
            data_dir.join(format!("gesture_samples_2024010{}_000000.csv", i + 1)),
            format!("{}{}", header, body),
        )
        .unwrap();
    }

    let loaded = load_all(&data_dir).unwrap();
    assert_eq!(loaded.files.len(), 3);
    assert_eq!(loaded.rows_loaded, 3 * 4);
    assert_eq!(loaded.rows_dropped, 3);
    assert_eq!(loaded.table.n_rows(), 3 * 4 - 3);

    let _ = fs::remove_dir_all(data_dir);
}

#[test]
fn test_codec_order_ignores_first_appearance() {
    let data_dir = scratch_dir("codec");
    write_session_file(&data_dir, "SELECT", 3, 1);
    write_session_file(&data_dir, "REST", 3, 2);
    write_session_file(&data_dir, "PREV", 3, 3);
    write_session_file(&data_dir, "NEXT", 3, 4);

    let loaded = load_all(&data_dir).unwrap();
    let prepared = prepare(&loaded.table).unwrap();

    assert_eq!(prepared.codec.classes(), &["NEXT", "PREV", "REST", "SELECT"]);
    for (label, code) in [("NEXT", 0), ("PREV", 1), ("REST", 2), ("SELECT", 3)] {
        assert_eq!(prepared.codec.encode(label), Some(code));
    }
    // session metadata never leaks into the features
    assert_eq!(prepared.feature_names.len(), 4 * LANDMARKS);
    assert!(prepared.feature_names.iter().all(|n| n.starts_with("landmark_")));

    let _ = fs::remove_dir_all(data_dir);
}

#[test]
fn test_collect_sessions_then_train() {
    let data_dir = scratch_dir("collect_data");
    let models_dir = scratch_dir("collect_models");
    let config = Config {
        data_dir: data_dir.clone(),
        models_dir: models_dir.clone(),
        countdown_seconds: 0,
        n_estimators: 15,
        pose: PoseConfig {
            landmark_count: LANDMARKS,
            ..PoseConfig::default()
        },
        ..Config::default()
    };

    let record = |gesture: &str, frame: usize| {
        let features = gesture_features(gesture, frame);
        let landmarks = features
            .chunks(4)
            .map(|c| Landmark::new(c[0], c[1], c[2], c[3]))
            .collect();
        ReplayRecord::pose(&LandmarkSet::new(landmarks))
    };
    let mut records: Vec<ReplayRecord> = (0..10).map(|i| record("REST", i)).collect();
    records.push(ReplayRecord::no_pose());
    records.extend((0..10).map(|i| record("NEXT", i)));

    let mut source = ReplayFrameSource::from_records(records);
    let mut estimator = ReplayPoseEstimator::new(&config.pose).unwrap();
    let mut display = ReplayDisplay::new();
    let mut manager = SessionManager::new(config.gestures.clone());
    let mut prompter = ScriptedPrompter::new(["rest", "10", "n", "next", "10", "n", "exit"]);

    let summary = SessionCapture::new(&config, &mut manager, &mut prompter, InterruptFlag::new())
        .run(CaptureDevices {
            source: &mut source,
            estimator: &mut estimator,
            display: &mut display,
        })
        .unwrap();

    assert_eq!(summary.sessions_sealed, 2);
    assert_eq!(summary.files.len(), 2);
    assert_eq!(manager.total_for("REST"), 10);
    assert_eq!(manager.total_for("NEXT"), 10);
    assert!(source.is_released());

    let outcome = TrainingPipeline::from_config(&config).run().unwrap();
    assert_eq!(outcome.rows_loaded, 20);
    assert_eq!(outcome.train_size, 16);
    assert_eq!(outcome.test_size, 4);
    assert_eq!(outcome.codec.classes(), &["NEXT", "REST"]);
    assert!(ModelStore::new(&models_dir).exists());

    let _ = fs::remove_dir_all(data_dir);
    let _ = fs::remove_dir_all(models_dir);
}
