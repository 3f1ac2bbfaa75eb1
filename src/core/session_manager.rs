use crate::core::sample_store::FILE_TIMESTAMP_FORMAT;
use crate::models::sample::Session;
use chrono::{DateTime, Local};

// ==============================================================================
// Gesture Choice
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureChoice {
    Gesture(String),
    Exit,
    Invalid(String),
}

// ==============================================================================
// Session Manager
// ==============================================================================

/// Gesture vocabulary and per-gesture totals for one collection run
#[derive(Debug, Clone)]
pub struct SessionManager {
    gestures: Vec<String>,
    totals: Vec<usize>,
    sessions_sealed: usize,
}

impl SessionManager {
    pub fn new(gestures: Vec<String>) -> Self {
        let totals = vec![0; gestures.len()];
        Self {
            gestures,
            totals,
            sessions_sealed: 0,
        }
    }

    pub fn gestures(&self) -> &[String] {
        &self.gestures
    }

    /// Case-insensitive; `exit` ends the run
    pub fn parse_gesture(&self, input: &str) -> GestureChoice {
        let choice = input.trim().to_uppercase();
        if choice == "EXIT" {
            return GestureChoice::Exit;
        }
        match self.gestures.iter().find(|g| g.to_uppercase() == choice) {
            Some(g) => GestureChoice::Gesture(g.clone()),
            None => GestureChoice::Invalid(choice),
        }
    }

    pub fn begin_session(&self, gesture: &str, target_count: usize) -> Session {
        self.begin_session_at(gesture, target_count, Local::now())
    }

    pub fn begin_session_at(&self, gesture: &str, target_count: usize, now: DateTime<Local>) -> Session {
        let session_id = now.format(FILE_TIMESTAMP_FORMAT).to_string();
        Session::new(session_id, gesture, target_count)
    }

    /// Add a flushed session's samples to the running totals
    pub fn record_sealed(&mut self, session: &Session) {
        if session.is_empty() {
            return;
        }
        if let Some(idx) = self.gestures.iter().position(|g| *g == session.gesture) {
            self.totals[idx] += session.len();
        }
        self.sessions_sealed += 1;
    }

    pub fn total_for(&self, gesture: &str) -> usize {
        self.gestures
            .iter()
            .position(|g| g == gesture)
            .map(|idx| self.totals[idx])
            .unwrap_or(0)
    }

    /// `(gesture, total)` in vocabulary order
    pub fn totals(&self) -> Vec<(String, usize)> {
        self.gestures
            .iter()
            .cloned()
            .zip(self.totals.iter().copied())
            .collect()
    }

    pub fn sessions_sealed(&self) -> usize {
        self.sessions_sealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample::{Sample, SampleOrigin};

    fn manager() -> SessionManager {
        SessionManager::new(
            ["REST", "NEXT", "PREV", "SELECT"]
                .iter()
                .map(|g| g.to_string())
                .collect(),
        )
    }

    #[test]
    fn test_parse_gesture() {
        let m = manager();
        assert_eq!(m.parse_gesture(" next "), GestureChoice::Gesture("NEXT".to_string()));
        assert_eq!(m.parse_gesture("Exit"), GestureChoice::Exit);
        assert_eq!(m.parse_gesture("wave"), GestureChoice::Invalid("WAVE".to_string()));
    }

    #[test]
    fn test_totals_accumulate_per_gesture() {
        let mut m = manager();
        let mut session = m.begin_session("NEXT", 3);
        for frame_index in 0..3 {
            session.append(Sample::new(
                "NEXT",
                vec![0.0; 4],
                SampleOrigin::Session {
                    session_id: session.session_id.clone(),
                    frame_index,
                },
                String::new(),
            ));
        }
        m.record_sealed(&session);
        m.record_sealed(&session);
        let empty = m.begin_session("REST", 5);
        m.record_sealed(&empty);

        assert_eq!(m.total_for("NEXT"), 6);
        assert_eq!(m.total_for("REST"), 0);
        assert_eq!(m.sessions_sealed(), 2);
        assert_eq!(m.totals()[1], ("NEXT".to_string(), 6));
    }

    #[test]
    fn test_session_id_is_second_resolution_stamp() {
        use chrono::TimeZone;
        let m = manager();
        let now = Local.with_ymd_and_hms(2024, 3, 9, 8, 7, 6).unwrap();
        let session = m.begin_session_at("REST", 10, now);
        assert_eq!(session.session_id, "20240309_080706");
        assert_eq!(session.target_count, 10);
    }
}
