// Data structures for camera frames and the capture loop

use crate::models::pose::PoseError;
use std::path::PathBuf;

/// A frame handed from the frame source to the pose estimator
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub timestamp: i64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub format: PixelFormat,
}

/// Layout of `Frame::data`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Pre-estimated pose log entry (JSON), produced by replay sources
    PoseLog,
}

/// Error types for capture and dataset writing
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Frame source unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to read frame: {0}")]
    FrameReadFailure(String),

    #[error("Pose estimation error: {0}")]
    Pose(#[from] PoseError),

    #[error("Failed to write dataset file {}: {source}", .path.display())]
    DatasetWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CaptureResult<T> = Result<T, CaptureError>;
