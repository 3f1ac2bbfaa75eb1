use crate::models::capture::{CaptureError, CaptureResult};
use crate::models::sample::{
    landmark_columns, CaptureMode, Sample, SampleOrigin, Session,
    DATASET_EXTENSION, FRAME_INDEX_COLUMN, GESTURE_COLUMN, LEGACY_GESTURE_COLUMN,
    SAMPLE_INDEX_COLUMN, SESSION_ID_COLUMN, TIMESTAMP_COLUMN,
};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Second-resolution stamp used in dataset file names and session ids
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Local ISO-8601 with microseconds, written into each row
pub const SAMPLE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

pub fn sample_timestamp() -> String {
    Local::now().format(SAMPLE_TIMESTAMP_FORMAT).to_string()
}

// ==============================================================================
// Sample Store
// ==============================================================================

/// Writes buffered samples to one CSV file per flush
pub struct SampleStore {
    output_dir: PathBuf,
}

impl SampleStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Flush a sealed session, `None` when it recorded nothing
    pub fn flush_session(&self, session: &Session) -> CaptureResult<Option<PathBuf>> {
        self.flush(session.samples())
    }

    pub fn flush(&self, samples: &[Sample]) -> CaptureResult<Option<PathBuf>> {
        self.flush_at(samples, Local::now())
    }

    /// Two flushes in the same second resolve to the same path; the later one wins.
    pub fn flush_at(&self, samples: &[Sample], now: DateTime<Local>) -> CaptureResult<Option<PathBuf>> {
        let Some(first) = samples.first() else {
            log::info!("No samples collected. Nothing to save.");
            return Ok(None);
        };

        std::fs::create_dir_all(&self.output_dir)?;

        let mode = match first.origin() {
            SampleOrigin::Session { .. } => CaptureMode::Session,
            SampleOrigin::Keystroke { .. } => CaptureMode::Keystroke,
        };
        let stamp = now.format(FILE_TIMESTAMP_FORMAT).to_string();
        let filename = format!("{}.{}", mode.file_stem(first.gesture(), &stamp), DATASET_EXTENSION);
        let path = self.output_dir.join(filename);

        let landmark_count = first.features().len() / 4;
        let mut header: Vec<String> = match mode {
            CaptureMode::Session => vec![
                SESSION_ID_COLUMN.to_string(),
                FRAME_INDEX_COLUMN.to_string(),
                TIMESTAMP_COLUMN.to_string(),
                GESTURE_COLUMN.to_string(),
                LEGACY_GESTURE_COLUMN.to_string(),
            ],
            CaptureMode::Keystroke => vec![
                SAMPLE_INDEX_COLUMN.to_string(),
                TIMESTAMP_COLUMN.to_string(),
                GESTURE_COLUMN.to_string(),
            ],
        };
        header.extend(landmark_columns(landmark_count));

        let write_err = |source: csv::Error| CaptureError::DatasetWrite {
            path: path.clone(),
            source,
        };

        let mut writer = csv::Writer::from_path(&path).map_err(write_err)?;
        writer.write_record(&header).map_err(write_err)?;
        for sample in samples {
            writer.write_record(Self::row(sample)).map_err(write_err)?;
        }
        writer.flush()?;

        log::info!("Saved {} samples to: {}", samples.len(), path.display());
        Ok(Some(path))
    }

    fn row(sample: &Sample) -> Vec<String> {
        let mut row = match sample.origin() {
            SampleOrigin::Session {
                session_id,
                frame_index,
            } => vec![
                session_id.clone(),
                frame_index.to_string(),
                sample.timestamp().to_string(),
                sample.gesture().to_string(),
                sample.gesture().to_string(),
            ],
            SampleOrigin::Keystroke { sample_index } => vec![
                sample_index.to_string(),
                sample.timestamp().to_string(),
                sample.gesture().to_string(),
            ],
        };
        row.extend(sample.features().iter().map(|v| v.to_string()));
        row
    }
}
