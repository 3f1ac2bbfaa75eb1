// Splits an aggregated table into a feature matrix and encoded labels

use crate::models::dataset::Table;
use crate::models::sample::{GESTURE_COLUMN, LEGACY_GESTURE_COLUMN, RESERVED_COLUMNS};
use crate::models::training::{LabelCodec, TrainingError, TrainingResult};

#[derive(Debug, Clone)]
pub struct PreparedData {
    /// One row per sample, columns in `feature_names` order
    pub features: Vec<Vec<f64>>,
    pub feature_names: Vec<String>,
    pub labels: Vec<usize>,
    pub codec: LabelCodec,
}

impl PreparedData {
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// `(label, count)` in codec order
    pub fn class_counts(&self) -> Vec<(String, usize)> {
        let mut counts = vec![0usize; self.codec.n_classes()];
        for &code in &self.labels {
            counts[code] += 1;
        }
        self.codec
            .classes()
            .iter()
            .cloned()
            .zip(counts)
            .collect()
    }
}

/// Feature columns are the all-numeric columns that are not label or metadata columns
pub fn feature_columns(table: &Table) -> Vec<usize> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, name)| {
            !RESERVED_COLUMNS.contains(&name.as_str()) && table.is_numeric_column(*idx)
        })
        .map(|(idx, _)| idx)
        .collect()
}

pub fn prepare(table: &Table) -> TrainingResult<PreparedData> {
    let label_idx = table
        .column_index(GESTURE_COLUMN)
        .or_else(|| table.column_index(LEGACY_GESTURE_COLUMN))
        .ok_or(TrainingError::NoLabelColumn)?;

    if table.n_rows() == 0 {
        return Err(TrainingError::EmptyDataset);
    }

    let feature_idx = feature_columns(table);
    if feature_idx.is_empty() {
        return Err(TrainingError::NoFeatureColumns);
    }
    let feature_names: Vec<String> = feature_idx
        .iter()
        .map(|&i| table.columns()[i].clone())
        .collect();

    let raw_labels: Vec<String> = table
        .rows()
        .iter()
        .map(|row| {
            row[label_idx]
                .to_label()
                .ok_or_else(|| TrainingError::UnknownLabel("<missing>".to_string()))
        })
        .collect::<TrainingResult<_>>()?;

    let codec = LabelCodec::fit(&raw_labels);
    let labels = codec.encode_all(&raw_labels)?;

    // feature columns are all-numeric, so as_f64 always succeeds here
    let features: Vec<Vec<f64>> = table
        .rows()
        .iter()
        .map(|row| {
            feature_idx
                .iter()
                .map(|&i| row[i].as_f64().unwrap_or(f64::NAN))
                .collect()
        })
        .collect();

    log::debug!(
        "Prepared {} samples x {} features, {} classes",
        raw_labels.len(),
        feature_names.len(),
        codec.n_classes()
    );

    Ok(PreparedData {
        features,
        feature_names,
        labels,
        codec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dataset::Cell;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            t.push_row(row.iter().map(|v| Cell::parse(v)).collect());
        }
        t
    }

    #[test]
    fn test_reserved_and_text_columns_excluded() {
        let t = table(
            &["session_id", "frame_index", "timestamp", "gesture", "landmark_0_x", "note"],
            &[
                &["20240101_120000", "0", "2024-01-01T12:00:00", "REST", "0.5", "ok"],
                &["20240101_120000", "3", "2024-01-01T12:00:01", "NEXT", "0.7", "ok"],
            ],
        );
        let prepared = prepare(&t).unwrap();
        assert_eq!(prepared.feature_names, vec!["landmark_0_x"]);
        assert_eq!(prepared.features, vec![vec![0.5], vec![0.7]]);
    }

    #[test]
    fn test_codes_follow_sorted_labels() {
        let t = table(
            &["gesture", "f"],
            &[&["SELECT", "1"], &["NEXT", "2"], &["PREV", "3"], &["REST", "4"], &["SELECT", "5"]],
        );
        let prepared = prepare(&t).unwrap();
        assert_eq!(prepared.codec.classes(), &["NEXT", "PREV", "REST", "SELECT"]);
        assert_eq!(prepared.labels, vec![3, 0, 1, 2, 3]);
        assert_eq!(prepared.class_counts()[3], ("SELECT".to_string(), 2));
    }

    #[test]
    fn test_errors() {
        let unlabeled = table(&["f"], &[&["1"]]);
        assert!(matches!(prepare(&unlabeled), Err(TrainingError::NoLabelColumn)));

        let empty = table(&["gesture", "f"], &[]);
        assert!(matches!(prepare(&empty), Err(TrainingError::EmptyDataset)));

        let no_features = table(&["gesture", "sample_index"], &[&["REST", "0"]]);
        assert!(matches!(prepare(&no_features), Err(TrainingError::NoFeatureColumns)));
    }
}
