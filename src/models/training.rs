// Label codec, evaluation report and training pipeline errors

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

// ==============================================================================
// Label Codec
// ==============================================================================

/// Maps gesture names to dense codes 0..K-1 in sorted label order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCodec {
    classes: Vec<String>,
}

impl LabelCodec {
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = labels.into_iter().map(|l| l.as_ref().to_string()).collect();
        Self {
            classes: distinct.into_iter().collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).ok()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn encode_all<S: AsRef<str>>(&self, labels: &[S]) -> TrainingResult<Vec<usize>> {
        labels
            .iter()
            .map(|l| {
                self.encode(l.as_ref())
                    .ok_or_else(|| TrainingError::UnknownLabel(l.as_ref().to_string()))
            })
            .collect()
    }

    pub fn decode_all(&self, codes: &[usize]) -> TrainingResult<Vec<String>> {
        codes
            .iter()
            .map(|&c| {
                self.decode(c)
                    .map(str::to_string)
                    .ok_or_else(|| TrainingError::UnknownLabel(format!("code {}", c)))
            })
            .collect()
    }
}

// ==============================================================================
// Evaluation Report
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Held-out scores keyed by gesture name, in codec class order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub classes: Vec<String>,
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    /// Rows are true labels, columns predicted labels
    pub confusion_matrix: Vec<Vec<usize>>,
}

impl EvaluationReport {
    pub fn class_metrics(&self, label: &str) -> Option<&ClassMetrics> {
        self.per_class.iter().find(|m| m.label == label)
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(String::len)
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support",
            width = width
        )?;
        writeln!(f)?;
        for m in &self.per_class {
            writeln!(
                f,
                "{:>width$} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                m.label, m.precision, m.recall, m.f1, m.support,
                width = width
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support,
            width = width
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, avg.precision, avg.recall, avg.f1, avg.support,
                width = width
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Confusion Matrix:")?;
        for row in &self.confusion_matrix {
            let cells: Vec<String> = row.iter().map(|c| format!("{:>4}", c)).collect();
            writeln!(f, "[{}]", cells.join(" "))?;
        }
        write!(f, "Labels: {:?}", self.classes)
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("No gesture dataset files found in {}. Run a collection first.", .0.display())]
    NoDataFound(PathBuf),

    #[error("Dataset must contain a 'gesture' or 'gesture_label' column")]
    NoLabelColumn,

    #[error("Dataset has no rows left to train on")]
    EmptyDataset,

    #[error("Dataset has no numeric feature columns")]
    NoFeatureColumns,

    #[error("Class '{class}' has {count} sample(s); at least 2 are needed for a stratified split")]
    Stratification { class: String, count: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    #[error("Model artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Model was trained on classes {model_classes:?} but label codec has {codec_classes:?}")]
    ArtifactMismatch {
        model_classes: Vec<String>,
        codec_classes: Vec<String>,
    },

    #[error("Failed to read dataset file {}: {source}", .path.display())]
    DatasetRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TrainingResult<T> = Result<T, TrainingError>;
