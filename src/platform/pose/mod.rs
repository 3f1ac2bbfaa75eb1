// Pose estimation platform integration
// Estimator backends sit behind the `PoseEstimator` bridge trait

pub mod estimator;

pub use estimator::{PoseEstimator, ReplayPoseEstimator};
