// Data models for single-person body pose landmarks

use serde::{Deserialize, Serialize};

/// MediaPipe Pose emits 33 body landmarks per detected person
pub const POSE_LANDMARK_COUNT: usize = 33;

/// Numeric fields stored per landmark, in column order
pub const LANDMARK_FIELDS: [&str; 4] = ["x", "y", "z", "visibility"];

// ==============================================================================
// Landmarks
// ==============================================================================

/// A single body landmark with visibility confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,          // Normalized [0, 1] image coordinates
    pub y: f32,          // Normalized [0, 1] image coordinates
    pub z: f32,          // Depth relative to the hip midpoint
    pub visibility: f32, // Likelihood the point is visible [0, 1]
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility,
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.x, self.y, self.z, self.visibility]
    }
}

impl From<[f32; 4]> for Landmark {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// All landmarks the estimator produced for one frame, in landmark-index order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub landmarks: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

// ==============================================================================
// Configuration
// ==============================================================================

/// Estimator settings, fixed when the estimator is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseConfig {
    pub model_complexity: ModelComplexity,
    pub min_detection_confidence: f32, // default: 0.5
    pub min_tracking_confidence: f32,  // default: 0.5
    pub landmark_count: usize,         // default: 33
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelComplexity {
    Lite = 0,  // Fastest, less accurate
    Full = 1,  // Balanced
    Heavy = 2, // Slowest, most accurate
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            model_complexity: ModelComplexity::Full,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            landmark_count: POSE_LANDMARK_COUNT,
        }
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("Pose estimator not initialized")]
    NotInitialized,

    #[error("Model loading failed: {0}")]
    ModelLoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Expected {expected} landmarks, estimator returned {actual}")]
    LandmarkCount { expected: usize, actual: usize },
}

pub type PoseResult<T> = Result<T, PoseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_from_array() {
        let landmark = Landmark::from([0.1, 0.2, -0.3, 0.9]);
        assert_eq!(landmark.to_array(), [0.1, 0.2, -0.3, 0.9]);
    }

    #[test]
    fn test_pose_config_default() {
        let config = PoseConfig::default();
        assert_eq!(config.model_complexity, ModelComplexity::Full);
        assert_eq!(config.min_detection_confidence, 0.5);
        assert_eq!(config.min_tracking_confidence, 0.5);
        assert_eq!(config.landmark_count, 33);
    }
}
