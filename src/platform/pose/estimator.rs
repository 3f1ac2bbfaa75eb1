// Pose estimator bridge
// A backend turns one frame into zero or one body landmark set

use crate::models::capture::{Frame, PixelFormat};
use crate::models::pose::{Landmark, LandmarkSet, PoseConfig, PoseError, PoseResult};
use crate::platform::capture::ReplayRecord;

/// Single-person pose estimator
pub trait PoseEstimator {
    /// `Ok(None)` when no pose is detected in the frame
    fn process_frame(&mut self, frame: &Frame) -> PoseResult<Option<LandmarkSet>>;

    /// Check if the model is loaded
    fn is_initialized(&self) -> bool;

    /// Get model info
    fn get_model_info(&self) -> String;

    /// Release model resources. Safe to call more than once.
    fn close(&mut self);
}

// ==============================================================================
// Replay Implementation
// ==============================================================================

/// Reads the landmarks that were recorded alongside each pose-log frame
pub struct ReplayPoseEstimator {
    config: PoseConfig,
    initialized: bool,
}

impl ReplayPoseEstimator {
    pub fn new(config: &PoseConfig) -> PoseResult<Self> {
        if config.landmark_count == 0 {
            return Err(PoseError::ModelLoadFailed(
                "landmark count must be at least 1".to_string(),
            ));
        }

        log::debug!(
            "Replay pose estimator initialized: complexity={:?}, detection={}, tracking={}",
            config.model_complexity,
            config.min_detection_confidence,
            config.min_tracking_confidence
        );

        Ok(Self {
            config: config.clone(),
            initialized: true,
        })
    }
}

impl PoseEstimator for ReplayPoseEstimator {
    fn process_frame(&mut self, frame: &Frame) -> PoseResult<Option<LandmarkSet>> {
        if !self.initialized {
            return Err(PoseError::NotInitialized);
        }
        if frame.format != PixelFormat::PoseLog {
            return Err(PoseError::InferenceFailed(format!(
                "replay estimator cannot process {:?} frames",
                frame.format
            )));
        }

        let record = ReplayRecord::decode(frame)
            .map_err(|e| PoseError::InferenceFailed(format!("Failed to parse pose log entry: {}", e)))?;

        let Some(points) = record.landmarks else {
            return Ok(None);
        };

        // Below-threshold detections are reported as "no pose", like the live estimator
        if record
            .score
            .is_some_and(|s| s < self.config.min_detection_confidence)
        {
            return Ok(None);
        }

        if points.len() != self.config.landmark_count {
            return Err(PoseError::LandmarkCount {
                expected: self.config.landmark_count,
                actual: points.len(),
            });
        }

        Ok(Some(LandmarkSet::new(
            points.into_iter().map(Landmark::from).collect(),
        )))
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn get_model_info(&self) -> String {
        format!(
            "Replay pose estimator ({} landmarks, complexity {:?})",
            self.config.landmark_count, self.config.model_complexity
        )
    }

    fn close(&mut self) {
        self.initialized = false;
    }
}
