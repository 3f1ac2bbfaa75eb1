// Dataset discovery and aggregation
// Loads every collected CSV under the data directory into one table.

use crate::models::dataset::{Cell, Table};
use crate::models::sample::{
    DATASET_EXTENSION, GESTURE_COLUMN, KEYSTROKE_FILE_PREFIX, LEGACY_GESTURE_COLUMN,
    SESSION_FILE_MARKER,
};
use crate::models::training::{TrainingError, TrainingResult};
use std::fs;
use std::path::{Path, PathBuf};

// ==============================================================================
// Label Schema
// ==============================================================================

/// Which label column(s) a single dataset file carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSchema {
    /// `gesture` only (keystroke mode)
    Canonical,
    /// `gesture_label` only (older files)
    Legacy,
    /// Both, the second mirroring the first (session mode)
    Mirrored,
    Unlabeled,
}

impl LabelSchema {
    pub fn detect(table: &Table) -> Self {
        match (
            table.has_column(GESTURE_COLUMN),
            table.has_column(LEGACY_GESTURE_COLUMN),
        ) {
            (true, false) => LabelSchema::Canonical,
            (false, true) => LabelSchema::Legacy,
            (true, true) => LabelSchema::Mirrored,
            (false, false) => LabelSchema::Unlabeled,
        }
    }

    /// Bring the table to the canonical single `gesture` column
    pub fn normalize(self, table: &mut Table) {
        match self {
            LabelSchema::Canonical | LabelSchema::Unlabeled => {}
            LabelSchema::Legacy => {
                table.rename_column(LEGACY_GESTURE_COLUMN, GESTURE_COLUMN);
            }
            LabelSchema::Mirrored => {
                table.drop_column(LEGACY_GESTURE_COLUMN);
            }
        }
    }
}

// ==============================================================================
// Discovery
// ==============================================================================

/// `gesture_samples_*.csv` or `*_session_*.csv`
pub fn is_dataset_file(path: &Path) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some(DATASET_EXTENSION) {
        return false;
    }
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    stem.starts_with(KEYSTROKE_FILE_PREFIX) || stem.contains(SESSION_FILE_MARKER)
}

/// Dataset files directly under `data_dir`, sorted by file name
pub fn discover_dataset_files(data_dir: &Path) -> TrainingResult<Vec<PathBuf>> {
    if !data_dir.is_dir() {
        return Err(TrainingError::NoDataFound(data_dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(data_dir)? {
        let path = entry?.path();
        if path.is_file() && is_dataset_file(&path) {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(TrainingError::NoDataFound(data_dir.to_path_buf()));
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn read_dataset_file(path: &Path) -> TrainingResult<Table> {
    let read_err = |source: csv::Error| TrainingError::DatasetRead {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(read_err)?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(read_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        table.push_row(record.iter().map(Cell::parse).collect());
    }
    Ok(table)
}

// ==============================================================================
// Aggregation
// ==============================================================================

#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub table: Table,
    pub files: Vec<PathBuf>,
    /// Rows concatenated before missing-value filtering
    pub rows_loaded: usize,
    pub rows_dropped: usize,
}

/// Load, reconcile and concatenate every dataset file, then drop incomplete rows
pub fn load_all(data_dir: &Path) -> TrainingResult<LoadedDataset> {
    let files = discover_dataset_files(data_dir)?;
    log::info!("Found {} CSV file(s) in {}", files.len(), data_dir.display());

    let mut tables = Vec::with_capacity(files.len());
    for path in &files {
        let mut table = read_dataset_file(path)?;
        let schema = LabelSchema::detect(&table);
        match schema {
            LabelSchema::Legacy => log::info!(
                "  Loading: {} ({} rows, renaming '{}' to '{}')",
                display_name(path),
                table.n_rows(),
                LEGACY_GESTURE_COLUMN,
                GESTURE_COLUMN
            ),
            LabelSchema::Unlabeled => log::warn!(
                "  Loading: {} ({} rows) has no label column",
                display_name(path),
                table.n_rows()
            ),
            _ => log::info!("  Loading: {} ({} rows)", display_name(path), table.n_rows()),
        }
        schema.normalize(&mut table);
        tables.push(table);
    }

    let mut table = Table::concat(tables);
    if !table.has_column(GESTURE_COLUMN) {
        return Err(TrainingError::NoLabelColumn);
    }

    let rows_loaded = table.n_rows();
    let rows_dropped = table.drop_missing();
    if rows_dropped > 0 {
        log::warn!("Dropped {} rows with missing values", rows_dropped);
    }
    log::info!("Final dataset size: {} samples", table.n_rows());

    Ok(LoadedDataset {
        table,
        files,
        rows_loaded,
        rows_dropped,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
