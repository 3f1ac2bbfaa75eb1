// Keystroke-driven gesture collection
// A bound key labels the frame currently on screen; the whole run lands in one file.

use crate::core::capture_controller::{CaptureDevices, RecordingOutcome};
use crate::core::config::Config;
use crate::core::sample_store::{sample_timestamp, SampleStore};
use crate::core::vectorizer::vectorize;
use crate::models::capture::{CaptureError, CaptureResult};
use crate::models::sample::{Sample, SampleOrigin};
use crate::platform::capture::Overlay;
use crate::platform::signal::InterruptFlag;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct KeystrokeSummary {
    pub samples: usize,
    pub file: Option<PathBuf>,
    /// Bound keys pressed while no pose was detected
    pub skipped: usize,
    pub outcome: RecordingOutcome,
}

pub struct KeystrokeCapture<'a> {
    config: &'a Config,
    store: SampleStore,
    interrupt: InterruptFlag,
    samples: Vec<Sample>,
    skipped: usize,
}

impl<'a> KeystrokeCapture<'a> {
    pub fn new(config: &'a Config, interrupt: InterruptFlag) -> Self {
        Self {
            config,
            store: SampleStore::new(&config.data_dir),
            interrupt,
            samples: Vec::new(),
            skipped: 0,
        }
    }

    pub fn run(&mut self, mut devices: CaptureDevices<'_>) -> CaptureResult<KeystrokeSummary> {
        if let Err(e) = devices.source.open() {
            log::error!("Could not open {}: {}", devices.source.describe(), e);
            devices.finalize();
            return Err(e);
        }

        self.print_instructions();
        let looped = self.capture_loop(&mut devices);
        devices.finalize();

        // Single flush for the whole run, whatever ended it
        let flushed = self.store.flush(&self.samples);

        let outcome = looped?;
        let file = flushed?;
        Ok(KeystrokeSummary {
            samples: self.samples.len(),
            file,
            skipped: self.skipped,
            outcome,
        })
    }

    fn capture_loop(&mut self, devices: &mut CaptureDevices<'_>) -> CaptureResult<RecordingOutcome> {
        let key_help = self.key_help();

        loop {
            if self.interrupt.is_raised() {
                println!("\nInterrupted by user.");
                return Ok(RecordingOutcome::Interrupted);
            }

            let frame = match devices.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::warn!("Frame source ended");
                    return Ok(RecordingOutcome::EndOfStream);
                }
                Err(CaptureError::FrameReadFailure(msg)) => {
                    log::error!("Failed to read frame: {}", msg);
                    return Ok(RecordingOutcome::ReadFailure(msg));
                }
                Err(e) => return Err(e),
            };

            let landmarks = match devices.estimator.process_frame(&frame) {
                Ok(landmarks) => landmarks,
                Err(e) => {
                    log::error!("Pose estimation failed: {}", e);
                    return Err(e.into());
                }
            };

            let overlay = Overlay {
                lines: vec![format!("Samples: {}", self.samples.len()), key_help.clone()],
                landmarks: landmarks.as_ref(),
            };
            let Some(key) = devices.display.show(&frame, &overlay) else {
                continue;
            };

            if key == self.config.quit_key {
                println!("\nQuitting...");
                return Ok(RecordingOutcome::Quit);
            }

            let Some(gesture) = self.config.keystroke_bindings.get(&key) else {
                continue;
            };

            match vectorize(landmarks.as_ref()) {
                Some(features) => {
                    let sample_index = self.samples.len() as u64;
                    self.samples.push(Sample::new(
                        gesture,
                        features,
                        SampleOrigin::Keystroke { sample_index },
                        sample_timestamp(),
                    ));
                    println!("Captured {} (total: {})", gesture, self.samples.len());
                }
                None => {
                    self.skipped += 1;
                    log::warn!("No pose detected, '{}' for {} not recorded", key, gesture);
                }
            }
        }
    }

    fn key_help(&self) -> String {
        let mut parts: Vec<String> = self
            .config
            .keystroke_bindings
            .iter()
            .map(|(key, gesture)| format!("{}={}", key, gesture))
            .collect();
        parts.push(format!("{}=quit", self.config.quit_key));
        parts.join(" ")
    }

    fn print_instructions(&self) {
        println!("=== Gesture Data Collection (Keystroke) ===");
        println!("Hold a gesture and press its key to record the current frame:");
        for (key, gesture) in &self.config.keystroke_bindings {
            println!("  '{}' -> {}", key, gesture);
        }
        println!("  '{}' -> save and quit\n", self.config.quit_key);
    }
}
