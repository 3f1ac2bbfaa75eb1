pub mod cli;
pub mod core;
pub mod models;
pub mod platform;

pub use core::config::Config;
pub use models::capture::{CaptureError, CaptureResult};
pub use models::pose::{PoseError, PoseResult};
pub use models::training::{TrainingError, TrainingResult};
