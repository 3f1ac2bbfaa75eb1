// Replay of recorded pose logs
// Each line of a pose log is one frame: the landmarks the estimator saw (or null)
// and the key pressed while that frame was on screen.

use super::{FrameDisplay, FrameSource, Overlay};
use crate::models::capture::{CaptureError, CaptureResult, Frame, PixelFormat};
use crate::models::pose::LandmarkSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

// ==============================================================================
// Pose Log Record
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// `[x, y, z, visibility]` per landmark, `None` when no pose was detected
    #[serde(default)]
    pub landmarks: Option<Vec<[f32; 4]>>,
    #[serde(default)]
    pub key: Option<char>,
    /// Detection score reported by the estimator for this frame
    #[serde(default)]
    pub score: Option<f32>,
}

impl ReplayRecord {
    pub fn pose(landmarks: &LandmarkSet) -> Self {
        Self {
            landmarks: Some(landmarks.landmarks.iter().map(|l| l.to_array()).collect()),
            key: None,
            score: None,
        }
    }

    pub fn no_pose() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: char) -> Self {
        self.key = Some(key);
        self
    }

    pub fn decode(frame: &Frame) -> serde_json::Result<Self> {
        serde_json::from_slice(&frame.data)
    }
}

/// One scripted step of an in-memory replay
#[derive(Debug, Clone)]
pub enum ReplayStep {
    Record(ReplayRecord),
    ReadFailure(String),
}

// ==============================================================================
// Frame Source
// ==============================================================================

enum ReplayInput {
    File {
        path: PathBuf,
        reader: Option<BufReader<File>>,
    },
    Memory(VecDeque<ReplayStep>),
}

pub struct ReplayFrameSource {
    input: ReplayInput,
    opened: bool,
    released: bool,
    frames_read: u64,
}

impl ReplayFrameSource {
    /// Replay a JSON-lines pose log from disk
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::with_input(ReplayInput::File {
            path: path.into(),
            reader: None,
        })
    }

    pub fn from_steps(steps: impl IntoIterator<Item = ReplayStep>) -> Self {
        Self::with_input(ReplayInput::Memory(steps.into_iter().collect()))
    }

    pub fn from_records(records: impl IntoIterator<Item = ReplayRecord>) -> Self {
        Self::from_steps(records.into_iter().map(ReplayStep::Record))
    }

    fn with_input(input: ReplayInput) -> Self {
        Self {
            input,
            opened: false,
            released: false,
            frames_read: 0,
        }
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn next_payload(&mut self) -> CaptureResult<Option<Vec<u8>>> {
        match &mut self.input {
            ReplayInput::File { reader, .. } => {
                let reader = reader
                    .as_mut()
                    .ok_or_else(|| CaptureError::FrameReadFailure("pose log is not open".to_string()))?;
                loop {
                    let mut line = String::new();
                    match reader.read_line(&mut line) {
                        Ok(0) => return Ok(None),
                        Ok(_) => {
                            let trimmed = line.trim();
                            if !trimmed.is_empty() {
                                return Ok(Some(trimmed.as_bytes().to_vec()));
                            }
                        }
                        Err(e) => return Err(CaptureError::FrameReadFailure(e.to_string())),
                    }
                }
            }
            ReplayInput::Memory(steps) => match steps.pop_front() {
                None => Ok(None),
                Some(ReplayStep::Record(record)) => serde_json::to_vec(&record)
                    .map(Some)
                    .map_err(|e| CaptureError::FrameReadFailure(e.to_string())),
                Some(ReplayStep::ReadFailure(msg)) => Err(CaptureError::FrameReadFailure(msg)),
            },
        }
    }
}

impl FrameSource for ReplayFrameSource {
    fn open(&mut self) -> CaptureResult<()> {
        if let ReplayInput::File { path, reader } = &mut self.input {
            let file = File::open(&*path)
                .map_err(|e| CaptureError::DeviceUnavailable(format!("{}: {}", path.display(), e)))?;
            *reader = Some(BufReader::new(file));
        }
        self.opened = true;
        self.released = false;
        Ok(())
    }

    fn next_frame(&mut self) -> CaptureResult<Option<Frame>> {
        if !self.opened {
            return Err(CaptureError::FrameReadFailure("frame source is not open".to_string()));
        }

        let Some(data) = self.next_payload()? else {
            return Ok(None);
        };

        let frame = Frame {
            index: self.frames_read,
            timestamp: chrono::Utc::now().timestamp_millis(),
            width: 0,
            height: 0,
            data,
            format: PixelFormat::PoseLog,
        };
        self.frames_read += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        if let ReplayInput::File { reader, .. } = &mut self.input {
            *reader = None;
        }
        self.opened = false;
        self.released = true;
    }

    fn describe(&self) -> String {
        match &self.input {
            ReplayInput::File { path, .. } => format!("pose log {}", path.display()),
            ReplayInput::Memory(_) => "in-memory pose log".to_string(),
        }
    }
}

// ==============================================================================
// Display
// ==============================================================================

/// Headless display: logs the overlay and reports the key recorded with the frame
#[derive(Debug, Default)]
pub struct ReplayDisplay {
    frames_shown: u64,
    closed: bool,
}

impl ReplayDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl FrameDisplay for ReplayDisplay {
    fn show(&mut self, frame: &Frame, overlay: &Overlay<'_>) -> Option<char> {
        self.frames_shown += 1;
        log::debug!("[frame {}] {}", frame.index, overlay.lines.join(" | "));

        if frame.format != PixelFormat::PoseLog {
            return None;
        }
        ReplayRecord::decode(frame).ok().and_then(|r| r.key)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Presses Ctrl-C once `after` frames have been shown
#[cfg(test)]
pub(crate) struct InterruptingDisplay {
    pub inner: ReplayDisplay,
    interrupt: crate::platform::signal::InterruptFlag,
    after: u64,
}

#[cfg(test)]
impl InterruptingDisplay {
    pub fn new(interrupt: crate::platform::signal::InterruptFlag, after: u64) -> Self {
        Self {
            inner: ReplayDisplay::new(),
            interrupt,
            after,
        }
    }
}

#[cfg(test)]
impl FrameDisplay for InterruptingDisplay {
    fn show(&mut self, frame: &Frame, overlay: &Overlay<'_>) -> Option<char> {
        let key = self.inner.show(frame, overlay);
        if self.inner.frames_shown() == self.after {
            self.interrupt.raise();
        }
        key
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pose::Landmark;
    use std::io::Write;

    #[test]
    fn test_memory_replay_sequence() {
        let pose = LandmarkSet::new(vec![Landmark::new(0.1, 0.2, 0.3, 0.9)]);
        let mut source = ReplayFrameSource::from_steps(vec![
            ReplayStep::Record(ReplayRecord::pose(&pose)),
            ReplayStep::Record(ReplayRecord::no_pose().with_key('q')),
            ReplayStep::ReadFailure("camera unplugged".to_string()),
        ]);
        source.open().unwrap();

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.index, 0);
        let record = ReplayRecord::decode(&first).unwrap();
        assert_eq!(record.landmarks, Some(vec![[0.1, 0.2, 0.3, 0.9]]));

        let second = source.next_frame().unwrap().unwrap();
        let mut display = ReplayDisplay::new();
        assert_eq!(display.show(&second, &Overlay::default()), Some('q'));

        assert!(matches!(
            source.next_frame(),
            Err(CaptureError::FrameReadFailure(_))
        ));
        assert!(source.next_frame().unwrap().is_none());

        source.release();
        assert!(source.is_released());
    }

    #[test]
    fn test_missing_pose_log_is_device_unavailable() {
        let path = std::env::temp_dir().join(format!("missing_{}.jsonl", uuid::Uuid::new_v4()));
        let mut source = ReplayFrameSource::from_path(path);
        assert!(matches!(source.open(), Err(CaptureError::DeviceUnavailable(_))));
    }

    #[test]
    fn test_file_replay_skips_blank_lines() {
        let path = std::env::temp_dir().join(format!("pose_log_{}.jsonl", uuid::Uuid::new_v4()));
        {
            let mut f = File::create(&path).unwrap();
            writeln!(f, r#"{{"landmarks": [[0.5, 0.5, 0.0, 1.0]]}}"#).unwrap();
            writeln!(f).unwrap();
            writeln!(f, r#"{{"landmarks": null, "key": "n"}}"#).unwrap();
        }

        let mut source = ReplayFrameSource::from_path(&path);
        source.open().unwrap();
        assert!(source.next_frame().unwrap().is_some());
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(ReplayRecord::decode(&second).unwrap().key, Some('n'));
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.frames_read(), 2);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_next_frame_before_open_fails() {
        let mut source = ReplayFrameSource::from_records(vec![ReplayRecord::no_pose()]);
        assert!(source.next_frame().is_err());
    }
}
