// Session-based gesture collection
// One session = one gesture, one target frame count, one dataset file.

use crate::core::config::Config;
use crate::core::sample_store::{sample_timestamp, SampleStore};
use crate::core::session_manager::{GestureChoice, SessionManager};
use crate::core::vectorizer::vectorize;
use crate::models::capture::{CaptureError, CaptureResult};
use crate::models::sample::{Sample, SampleOrigin, Session};
use crate::platform::capture::{FrameDisplay, FrameSource, Overlay};
use crate::platform::console::Prompter;
use crate::platform::pose::PoseEstimator;
use crate::platform::signal::InterruptFlag;
use std::path::PathBuf;
use std::time::Duration;

// ==============================================================================
// States
// ==============================================================================

#[derive(Debug)]
pub enum CaptureState {
    Idle,
    PromptGesture,
    PromptCount { gesture: String },
    Countdown(Session),
    Recording(Session),
    Sealed {
        session: Session,
        outcome: RecordingOutcome,
    },
    Exit,
}

/// Why a recording loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingOutcome {
    Completed,
    Quit,
    EndOfStream,
    ReadFailure(String),
    Interrupted,
}

impl RecordingOutcome {
    /// Outcomes after which the run cannot continue
    pub fn ends_run(&self) -> bool {
        matches!(
            self,
            RecordingOutcome::EndOfStream
                | RecordingOutcome::ReadFailure(_)
                | RecordingOutcome::Interrupted
        )
    }
}

// ==============================================================================
// Collaborators
// ==============================================================================

/// The external devices a capture loop drives
pub struct CaptureDevices<'a> {
    pub source: &'a mut dyn FrameSource,
    pub estimator: &'a mut dyn PoseEstimator,
    pub display: &'a mut dyn FrameDisplay,
}

impl CaptureDevices<'_> {
    /// Release everything. Runs on every exit path.
    pub fn finalize(&mut self) {
        self.source.release();
        self.estimator.close();
        self.display.close();
        log::info!("Cleanup done.");
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectionSummary {
    pub sessions_sealed: usize,
    pub files: Vec<PathBuf>,
    /// `(gesture, samples)` in vocabulary order
    pub totals: Vec<(String, usize)>,
    /// Ctrl-C ended the run
    pub interrupted: bool,
}

/// Parse the frame-count answer; `None` when it is not a positive integer
pub fn parse_frame_count(input: &str) -> Option<usize> {
    match input.trim().parse::<i64>() {
        Ok(n) if n > 0 => usize::try_from(n).ok(),
        _ => None,
    }
}

// ==============================================================================
// Session Capture
// ==============================================================================

pub struct SessionCapture<'a> {
    config: &'a Config,
    manager: &'a mut SessionManager,
    store: SampleStore,
    prompter: &'a mut dyn Prompter,
    interrupt: InterruptFlag,
}

impl<'a> SessionCapture<'a> {
    pub fn new(
        config: &'a Config,
        manager: &'a mut SessionManager,
        prompter: &'a mut dyn Prompter,
        interrupt: InterruptFlag,
    ) -> Self {
        Self {
            config,
            manager,
            store: SampleStore::new(&config.data_dir),
            prompter,
            interrupt,
        }
    }

    /// Run the collection loop until the user exits or the frame source gives out.
    ///
    /// Samples already recorded are flushed before any error is returned, and the
    /// devices are released on every path.
    pub fn run(&mut self, mut devices: CaptureDevices<'_>) -> CaptureResult<CollectionSummary> {
        if let Err(e) = devices.source.open() {
            log::error!("Could not open {}: {}", devices.source.describe(), e);
            devices.finalize();
            return Err(e);
        }
        log::info!(
            "Collecting from {} with {}",
            devices.source.describe(),
            devices.estimator.get_model_info()
        );

        let mut files = Vec::new();
        let mut state = CaptureState::Idle;

        let result = loop {
            state = match state {
                CaptureState::Idle => {
                    self.print_instructions();
                    CaptureState::PromptGesture
                }
                CaptureState::PromptGesture => match self.prompt_gesture() {
                    Some(gesture) => CaptureState::PromptCount { gesture },
                    None => {
                        println!("Exiting collection loop.");
                        CaptureState::Exit
                    }
                },
                CaptureState::PromptCount { gesture } => match self.prompt_count() {
                    Some(target) => {
                        CaptureState::Countdown(self.manager.begin_session(&gesture, target))
                    }
                    None => CaptureState::Exit,
                },
                CaptureState::Countdown(session) => {
                    println!("\nPrepare for gesture: {}", session.gesture);
                    self.countdown();
                    CaptureState::Recording(session)
                }
                CaptureState::Recording(mut session) => {
                    match self.record(&mut devices, &mut session) {
                        Ok(outcome) => CaptureState::Sealed { session, outcome },
                        Err(e) => {
                            log::error!("Recording failed: {}", e);
                            if let Err(flush_err) = self.seal(&session, &mut files) {
                                log::error!("Failed to save session {}: {}", session.session_id, flush_err);
                            }
                            break Err(e);
                        }
                    }
                }
                CaptureState::Sealed { session, outcome } => {
                    if let Err(e) = self.seal(&session, &mut files) {
                        break Err(e);
                    }
                    if outcome.ends_run() {
                        CaptureState::Exit
                    } else {
                        self.prompt_continue(&session.gesture)
                    }
                }
                CaptureState::Exit => break Ok(()),
            };
        };

        devices.finalize();

        result.map(|()| CollectionSummary {
            sessions_sealed: self.manager.sessions_sealed(),
            files,
            totals: self.manager.totals(),
            interrupted: self.interrupt.is_raised(),
        })
    }

    fn record(&mut self, devices: &mut CaptureDevices<'_>, session: &mut Session) -> CaptureResult<RecordingOutcome> {
        let gesture = session.gesture.clone();
        let session_id = session.session_id.clone();
        let mut frame_index: u64 = 0;

        log::info!(
            "Session {}: recording {} frames of {}",
            session_id,
            session.target_count,
            gesture
        );

        while !session.is_complete() {
            if self.interrupt.is_raised() {
                println!("\nInterrupted by user.");
                return Ok(RecordingOutcome::Interrupted);
            }

            let frame = match devices.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::warn!("Frame source ended after {} frames", frame_index);
                    return Ok(RecordingOutcome::EndOfStream);
                }
                Err(CaptureError::FrameReadFailure(msg)) => {
                    log::error!("Failed to read frame: {}", msg);
                    return Ok(RecordingOutcome::ReadFailure(msg));
                }
                Err(e) => return Err(e),
            };

            let landmarks = devices.estimator.process_frame(&frame)?;

            let overlay = Overlay {
                lines: vec![
                    format!("Gesture: {}  Session: {}", gesture, session_id),
                    format!("Frame: {}/{}", session.len() + 1, session.target_count),
                ],
                landmarks: landmarks.as_ref(),
            };
            if devices.display.show(&frame, &overlay) == Some(self.config.quit_key) {
                println!("\nQuitting early...");
                return Ok(RecordingOutcome::Quit);
            }

            if let Some(features) = vectorize(landmarks.as_ref()) {
                session.append(Sample::new(
                    &gesture,
                    features,
                    SampleOrigin::Session {
                        session_id: session_id.clone(),
                        frame_index,
                    },
                    sample_timestamp(),
                ));
            }
            frame_index += 1;
        }

        Ok(RecordingOutcome::Completed)
    }

    /// Flush a finished session and fold it into the running totals
    fn seal(&mut self, session: &Session, files: &mut Vec<PathBuf>) -> CaptureResult<()> {
        let Some(path) = self.store.flush_session(session)? else {
            return Ok(());
        };
        files.push(path);
        self.manager.record_sealed(session);

        println!("\n=== Session Summary ===");
        for (gesture, total) in self.manager.totals() {
            println!("  {}: {} total samples (this run)", gesture, total);
        }
        println!(
            "Recommendation: collect at least {} samples per gesture.\n",
            self.config.recommended_samples_per_gesture
        );
        Ok(())
    }

    // ==========================================================================
    // Console
    // ==========================================================================

    fn print_instructions(&self) {
        println!("=== Gesture Data Collection (Session-based) ===");
        println!("Instructions:");
        println!("- Stand at a comfortable distance facing the camera.");
        println!("- Hold the chosen gesture steadily during recording.");
        println!("- Press '{}' to stop a recording early.", self.config.quit_key);
        println!("- Repeat for each gesture to build a balanced dataset.\n");
    }

    /// `None` once Ctrl-C has been pressed, even if a line arrived with it
    fn ask(&mut self, prompt: &str) -> Option<String> {
        if self.interrupt.is_raised() {
            return None;
        }
        let answer = self.prompter.read_line(prompt);
        if self.interrupt.is_raised() {
            println!("\nInterrupted by user.");
            return None;
        }
        answer
    }

    /// `None` means exit: typed `exit`, closed or interrupted input, or too many invalid answers
    fn prompt_gesture(&mut self) -> Option<String> {
        for _ in 0..self.config.max_prompt_attempts {
            println!("Available gestures: {}", self.manager.gestures().join(", "));
            let input = self.ask("Choose a gesture label (or type 'exit' to finish): ")?;
            match self.manager.parse_gesture(&input) {
                GestureChoice::Gesture(gesture) => return Some(gesture),
                GestureChoice::Exit => return None,
                GestureChoice::Invalid(choice) => println!("Invalid choice '{}'. Try again.\n", choice),
            }
        }
        log::warn!(
            "No valid gesture after {} attempts",
            self.config.max_prompt_attempts
        );
        None
    }

    fn prompt_count(&mut self) -> Option<usize> {
        let default = self.config.default_frame_count;
        let input = self.ask(&format!(
            "How many frames to record for this session (e.g., {})? ",
            default
        ))?;
        Some(parse_frame_count(&input).unwrap_or_else(|| {
            println!("Invalid number. Defaulting to {}.", default);
            default
        }))
    }

    fn countdown(&self) {
        println!("Starting in:");
        for s in (1..=self.config.countdown_seconds).rev() {
            println!("  {}...", s);
            std::thread::sleep(Duration::from_secs(1));
        }
        println!("Recording!\n");
    }

    fn prompt_continue(&mut self, gesture: &str) -> CaptureState {
        match self.ask("Record another batch? (y to continue, other to choose gesture/exit): ") {
            None => CaptureState::Exit,
            Some(answer) if answer.trim().eq_ignore_ascii_case("y") => CaptureState::PromptCount {
                gesture: gesture.to_string(),
            },
            Some(_) => CaptureState::PromptGesture,
        }
    }
}
