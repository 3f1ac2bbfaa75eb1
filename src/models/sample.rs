// Labeled samples, recording sessions and the dataset file schema

use crate::models::pose::LANDMARK_FIELDS;
use serde::{Deserialize, Serialize};

// ==============================================================================
// Dataset File Schema
// ==============================================================================

/// Canonical label column
pub const GESTURE_COLUMN: &str = "gesture";
/// Older label column name, still written by session mode as a mirror
pub const LEGACY_GESTURE_COLUMN: &str = "gesture_label";
pub const SESSION_ID_COLUMN: &str = "session_id";
pub const FRAME_INDEX_COLUMN: &str = "frame_index";
pub const SAMPLE_INDEX_COLUMN: &str = "sample_index";
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Columns that are never used as classifier features
pub const RESERVED_COLUMNS: [&str; 6] = [
    GESTURE_COLUMN,
    LEGACY_GESTURE_COLUMN,
    SESSION_ID_COLUMN,
    FRAME_INDEX_COLUMN,
    SAMPLE_INDEX_COLUMN,
    TIMESTAMP_COLUMN,
];

pub const DATASET_EXTENSION: &str = "csv";
pub const KEYSTROKE_FILE_PREFIX: &str = "gesture_samples_";
pub const SESSION_FILE_MARKER: &str = "_session_";

pub fn landmark_column(index: usize, field: &str) -> String {
    format!("landmark_{}_{}", index, field)
}

/// `landmark_{i}_{x|y|z|visibility}` for every landmark, index-major
pub fn landmark_columns(landmark_count: usize) -> Vec<String> {
    (0..landmark_count)
        .flat_map(|i| LANDMARK_FIELDS.iter().map(move |f| landmark_column(i, f)))
        .collect()
}

/// Flattened `(x, y, z, visibility)` per landmark
pub type FeatureVector = Vec<f32>;

// ==============================================================================
// Samples
// ==============================================================================

/// Which capture workflow produced a dataset file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    Session,
    Keystroke,
}

impl CaptureMode {
    /// File stem: `{gesture}_session_{ts}` or `gesture_samples_{ts}`
    pub fn file_stem(&self, gesture: &str, timestamp: &str) -> String {
        match self {
            CaptureMode::Session => format!("{}{}{}", gesture, SESSION_FILE_MARKER, timestamp),
            CaptureMode::Keystroke => format!("{}{}", KEYSTROKE_FILE_PREFIX, timestamp),
        }
    }
}

/// Per-mode provenance of a sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOrigin {
    Session { session_id: String, frame_index: u64 },
    Keystroke { sample_index: u64 },
}

/// One labeled frame. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    gesture: String,
    features: FeatureVector,
    origin: SampleOrigin,
    timestamp: String,
}

impl Sample {
    pub fn new(gesture: &str, features: FeatureVector, origin: SampleOrigin, timestamp: String) -> Self {
        Self {
            gesture: gesture.to_string(),
            features,
            origin,
            timestamp,
        }
    }

    pub fn gesture(&self) -> &str {
        &self.gesture
    }

    pub fn features(&self) -> &[f32] {
        &self.features
    }

    pub fn origin(&self) -> &SampleOrigin {
        &self.origin
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

// ==============================================================================
// Sessions
// ==============================================================================

/// One bounded recording for a single gesture
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub gesture: String,
    pub target_count: usize,
    samples: Vec<Sample>,
}

impl Session {
    pub fn new(session_id: String, gesture: &str, target_count: usize) -> Self {
        Self {
            session_id,
            gesture: gesture.to_string(),
            target_count,
            samples: Vec::new(),
        }
    }

    pub fn append(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.samples.len() >= self.target_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_columns_order() {
        let cols = landmark_columns(2);
        assert_eq!(
            cols,
            vec![
                "landmark_0_x",
                "landmark_0_y",
                "landmark_0_z",
                "landmark_0_visibility",
                "landmark_1_x",
                "landmark_1_y",
                "landmark_1_z",
                "landmark_1_visibility",
            ]
        );
    }

    #[test]
    fn test_file_stems() {
        assert_eq!(
            CaptureMode::Session.file_stem("NEXT", "20240101_120000"),
            "NEXT_session_20240101_120000"
        );
        assert_eq!(
            CaptureMode::Keystroke.file_stem("NEXT", "20240101_120000"),
            "gesture_samples_20240101_120000"
        );
    }

    #[test]
    fn test_session_completion() {
        let mut session = Session::new("s1".to_string(), "REST", 2);
        assert!(session.is_empty());
        for frame_index in 0..2 {
            session.append(Sample::new(
                "REST",
                vec![0.0; 4],
                SampleOrigin::Session {
                    session_id: "s1".to_string(),
                    frame_index,
                },
                "2024-01-01T12:00:00".to_string(),
            ));
        }
        assert_eq!(session.len(), 2);
        assert!(session.is_complete());
        assert!(matches!(
            session.samples()[1].origin(),
            SampleOrigin::Session { frame_index: 1, .. }
        ));
    }

    #[test]
    fn test_huge_target_reserves_nothing_up_front() {
        let session = Session::new("s1".to_string(), "REST", usize::MAX);
        assert!(session.is_empty());
        assert!(!session.is_complete());
    }
}
