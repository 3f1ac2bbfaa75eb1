// Frame sources and display/key-input sinks used by the capture loops
// Camera backends implement the same traits as the replay implementation

pub mod replay;

pub use replay::{ReplayDisplay, ReplayFrameSource, ReplayRecord, ReplayStep};
#[cfg(test)]
pub(crate) use replay::InterruptingDisplay;

use crate::models::capture::{CaptureResult, Frame};
use crate::models::pose::LandmarkSet;

/// Blocking source of frames
pub trait FrameSource {
    /// Acquire the device. Fails with `CaptureError::DeviceUnavailable`.
    fn open(&mut self) -> CaptureResult<()>;

    /// `Ok(None)` at end of stream, `Err(FrameReadFailure)` when a read fails mid-stream
    fn next_frame(&mut self) -> CaptureResult<Option<Frame>>;

    /// Release the device. Safe to call more than once.
    fn release(&mut self);

    fn describe(&self) -> String;
}

/// Text and skeleton drawn over a frame
#[derive(Debug, Clone, Default)]
pub struct Overlay<'a> {
    pub lines: Vec<String>,
    pub landmarks: Option<&'a LandmarkSet>,
}

/// Shows the frame and returns a key pressed during the wait, if any
pub trait FrameDisplay {
    fn show(&mut self, frame: &Frame, overlay: &Overlay<'_>) -> Option<char>;

    fn close(&mut self) {}
}
