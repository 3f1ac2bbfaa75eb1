// Trained model persistence
// The classifier and its label codec are always written and read as a pair.

use crate::core::random_forest::RandomForest;
use crate::models::training::{LabelCodec, TrainingError, TrainingResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MODEL_FILE_NAME: &str = "gesture_rf.json";
pub const CODEC_FILE_NAME: &str = "gesture_label_encoder.json";
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Classifier file contents. `classes` is copied from the codec it was trained
/// with so a mismatched pair can be detected on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub classes: Vec<String>,
    pub feature_names: Vec<String>,
    pub trained_at: DateTime<Utc>,
    pub forest: RandomForest,
}

impl ModelArtifact {
    pub fn new(forest: RandomForest, feature_names: Vec<String>, codec: &LabelCodec) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            classes: codec.classes().to_vec(),
            feature_names,
            trained_at: Utc::now(),
            forest,
        }
    }
}

/// Model directory with fixed artifact file names
pub struct ModelStore {
    models_dir: PathBuf,
}

impl ModelStore {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join(MODEL_FILE_NAME)
    }

    pub fn codec_path(&self) -> PathBuf {
        self.models_dir.join(CODEC_FILE_NAME)
    }

    /// Both halves of the pair are on disk
    pub fn exists(&self) -> bool {
        self.model_path().is_file() && self.codec_path().is_file()
    }

    /// Write both artifacts, replacing whatever pair was there
    pub fn save(&self, artifact: &ModelArtifact, codec: &LabelCodec) -> TrainingResult<(PathBuf, PathBuf)> {
        if artifact.classes != codec.classes() {
            return Err(TrainingError::ArtifactMismatch {
                model_classes: artifact.classes.clone(),
                codec_classes: codec.classes().to_vec(),
            });
        }

        fs::create_dir_all(&self.models_dir)?;

        let model_path = self.model_path();
        let mut writer = BufWriter::new(File::create(&model_path)?);
        serde_json::to_writer(&mut writer, artifact)?;
        writer.flush()?;
        log::info!("Saved model to: {}", model_path.display());

        let codec_path = self.codec_path();
        fs::write(&codec_path, serde_json::to_string_pretty(codec)?)?;
        log::info!("Saved label encoder to: {}", codec_path.display());

        Ok((model_path, codec_path))
    }

    /// Load the pair, refusing a classifier whose classes differ from the codec's
    pub fn load(&self) -> TrainingResult<(ModelArtifact, LabelCodec)> {
        let model_path = self.model_path();
        let codec_path = self.codec_path();
        for path in [&model_path, &codec_path] {
            if !path.is_file() {
                return Err(TrainingError::ArtifactMissing(path.clone()));
            }
        }

        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(File::open(&model_path)?))?;
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(TrainingError::InvalidParameter(format!(
                "unsupported model format version {} (expected {})",
                artifact.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        let codec: LabelCodec = serde_json::from_str(&fs::read_to_string(&codec_path)?)?;

        if artifact.classes != codec.classes() || artifact.forest.n_classes() != codec.n_classes() {
            return Err(TrainingError::ArtifactMismatch {
                model_classes: artifact.classes,
                codec_classes: codec.classes().to_vec(),
            });
        }

        log::debug!(
            "Loaded model trained at {} ({} trees, {} features)",
            artifact.trained_at,
            artifact.forest.n_trees(),
            artifact.forest.n_features()
        );
        Ok((artifact, codec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random_forest::ForestParams;

    fn scratch_store() -> ModelStore {
        ModelStore::new(std::env::temp_dir().join(format!("gesture_lab_models_{}", uuid::Uuid::new_v4())))
    }

    fn fitted(codec: &LabelCodec) -> ModelArtifact {
        let x = vec![vec![0.0], vec![0.1], vec![1.0], vec![1.1]];
        let y = vec![0, 0, 1, 1];
        let params = ForestParams {
            n_estimators: 3,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&x, &y, codec.n_classes(), &params).unwrap();
        ModelArtifact::new(forest, vec!["f".to_string()], codec)
    }

    #[test]
    fn test_save_then_load() {
        let store = scratch_store();
        let codec = LabelCodec::fit(["REST", "NEXT"]);
        let artifact = fitted(&codec);

        let (model_path, codec_path) = store.save(&artifact, &codec).unwrap();
        assert_eq!(model_path.file_name().unwrap(), MODEL_FILE_NAME);
        assert_eq!(codec_path.file_name().unwrap(), CODEC_FILE_NAME);
        assert!(store.exists());

        let (loaded, loaded_codec) = store.load().unwrap();
        assert_eq!(loaded, artifact);
        assert_eq!(loaded_codec.classes(), &["NEXT", "REST"]);

        let _ = fs::remove_dir_all(store.models_dir());
    }

    #[test]
    fn test_missing_half_is_reported() {
        let store = scratch_store();
        let codec = LabelCodec::fit(["A", "B"]);
        store.save(&fitted(&codec), &codec).unwrap();
        fs::remove_file(store.codec_path()).unwrap();

        assert!(matches!(store.load(), Err(TrainingError::ArtifactMissing(p)) if p == store.codec_path()));

        let _ = fs::remove_dir_all(store.models_dir());
    }

    #[test]
    fn test_mismatched_codec_is_rejected() {
        let store = scratch_store();
        let codec = LabelCodec::fit(["A", "B"]);
        store.save(&fitted(&codec), &codec).unwrap();

        let other = LabelCodec::fit(["A", "C"]);
        fs::write(store.codec_path(), serde_json::to_string(&other).unwrap()).unwrap();

        assert!(matches!(store.load(), Err(TrainingError::ArtifactMismatch { .. })));

        let _ = fs::remove_dir_all(store.models_dir());
    }

    #[test]
    fn test_save_overwrites() {
        let store = scratch_store();
        let first = LabelCodec::fit(["A", "B"]);
        store.save(&fitted(&first), &first).unwrap();
        let second = LabelCodec::fit(["X", "Y"]);
        store.save(&fitted(&second), &second).unwrap();

        let (artifact, codec) = store.load().unwrap();
        assert_eq!(artifact.classes, vec!["X", "Y"]);
        assert_eq!(codec, second);

        let _ = fs::remove_dir_all(store.models_dir());
    }
}
