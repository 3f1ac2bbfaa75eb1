// End-to-end training run: load -> prepare -> split -> train -> evaluate -> save

use crate::core::config::Config;
use crate::core::dataset_loader::load_all;
use crate::core::feature_prep::prepare;
use crate::core::model_store::{ModelArtifact, ModelStore};
use crate::core::random_forest::ForestParams;
use crate::core::trainer::{evaluate, stratified_split, train};
use crate::models::training::{EvaluationReport, LabelCodec, TrainingResult};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
    pub test_fraction: f64,
    pub params: ForestParams,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub files_loaded: usize,
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub codec: LabelCodec,
    pub report: EvaluationReport,
    pub model_path: PathBuf,
    pub codec_path: PathBuf,
}

impl TrainingPipeline {
    pub fn from_config(config: &Config) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            models_dir: config.models_dir.clone(),
            test_fraction: config.test_fraction,
            params: ForestParams {
                n_estimators: config.n_estimators,
                max_depth: config.max_depth,
                min_samples_split: config.min_samples_split,
                seed: config.random_seed,
            },
        }
    }

    /// Run every stage in order. Any failure stops the run before later stages,
    /// so nothing is saved unless training and evaluation both succeeded.
    pub fn run(&self) -> TrainingResult<TrainingOutcome> {
        banner("Gesture Model Training");
        println!("\nData directory: {}", self.data_dir.display());
        println!("Models directory: {}", self.models_dir.display());

        step(1, "Loading gesture data");
        let loaded = load_all(&self.data_dir)?;
        println!("Loaded {} file(s)", loaded.files.len());
        println!("Total samples loaded: {}", loaded.rows_loaded);
        if loaded.rows_dropped > 0 {
            println!("Dropped {} rows with missing values", loaded.rows_dropped);
        }
        println!("Final dataset size: {} samples", loaded.table.n_rows());

        step(2, "Preparing features and labels");
        let prepared = prepare(&loaded.table)?;
        println!("Features: {} columns", prepared.feature_names.len());
        println!("Labels: {} unique gestures", prepared.codec.n_classes());
        println!("Label distribution:");
        for (label, count) in prepared.class_counts() {
            println!("  {}: {}", label, count);
        }
        println!("\nLabel mapping:");
        for (code, label) in prepared.codec.classes().iter().enumerate() {
            println!("  {}: {}", code, label);
        }

        step(3, "Splitting data into train/test sets");
        let split = stratified_split(
            &prepared.features,
            &prepared.labels,
            &prepared.codec,
            self.test_fraction,
            self.params.seed,
        )?;
        println!("Training set: {} samples", split.y_train.len());
        println!("Test set: {} samples", split.y_test.len());

        step(4, "Training model");
        let forest = train(&split.x_train, &split.y_train, &prepared.codec, &self.params)?;
        println!("Training completed!");

        step(5, "Evaluating model");
        let report = evaluate(&forest, &split.x_test, &split.y_test, &prepared.codec)?;
        println!("\n{}", "=".repeat(60));
        println!("Classification Report:");
        println!("{}", "=".repeat(60));
        println!("{}", report);

        step(6, "Saving model and encoder");
        let artifact = ModelArtifact::new(forest, prepared.feature_names.clone(), &prepared.codec);
        let (model_path, codec_path) = ModelStore::new(&self.models_dir).save(&artifact, &prepared.codec)?;
        println!("Saved model to: {}", model_path.display());
        println!("Saved label encoder to: {}", codec_path.display());

        println!();
        banner("Training pipeline completed successfully!");

        Ok(TrainingOutcome {
            files_loaded: loaded.files.len(),
            rows_loaded: loaded.rows_loaded,
            rows_dropped: loaded.rows_dropped,
            train_size: split.y_train.len(),
            test_size: split.y_test.len(),
            codec: prepared.codec,
            report,
            model_path,
            codec_path,
        })
    }
}

fn banner(title: &str) {
    println!("{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

fn step(n: usize, title: &str) {
    println!("\n{}", "-".repeat(60));
    println!("Step {}: {}", n, title);
    println!("{}", "-".repeat(60));
}
