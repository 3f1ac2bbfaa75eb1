// Stratified split, forest training and held-out evaluation

use crate::core::random_forest::{ForestParams, RandomForest};
use crate::models::training::{
    AverageMetrics, ClassMetrics, EvaluationReport, LabelCodec, TrainingError, TrainingResult,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

// ==============================================================================
// Split
// ==============================================================================

#[derive(Debug, Clone)]
pub struct DataSplit {
    pub x_train: Vec<Vec<f64>>,
    pub y_train: Vec<usize>,
    pub x_test: Vec<Vec<f64>>,
    pub y_test: Vec<usize>,
}

/// Split so every class lands in both halves in proportion to its size.
///
/// Each class contributes `round(count * test_fraction)` rows to the test half,
/// clamped so both halves get at least one. A class with fewer than two rows
/// cannot be split and fails the whole call.
pub fn stratified_split(
    x: &[Vec<f64>],
    y: &[usize],
    codec: &LabelCodec,
    test_fraction: f64,
    seed: u64,
) -> TrainingResult<DataSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(TrainingError::InvalidParameter(format!(
            "test_fraction must be between 0 and 1, got {}",
            test_fraction
        )));
    }
    if x.len() != y.len() {
        return Err(TrainingError::InvalidParameter(format!(
            "{} feature rows but {} labels",
            x.len(),
            y.len()
        )));
    }
    if y.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); codec.n_classes()];
    for (row, &code) in y.iter().enumerate() {
        let bucket = by_class.get_mut(code).ok_or_else(|| {
            TrainingError::UnknownLabel(format!("code {}", code))
        })?;
        bucket.push(row);
    }

    for (code, rows) in by_class.iter().enumerate() {
        if rows.len() < 2 {
            return Err(TrainingError::Stratification {
                class: codec.decode(code).unwrap_or_default().to_string(),
                count: rows.len(),
            });
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_rows = Vec::new();
    let mut test_rows = Vec::new();
    for mut rows in by_class {
        let count = rows.len();
        let n_test = ((count as f64 * test_fraction).round() as usize).clamp(1, count - 1);
        rows.shuffle(&mut rng);
        test_rows.extend_from_slice(&rows[..n_test]);
        train_rows.extend_from_slice(&rows[n_test..]);
    }
    train_rows.shuffle(&mut rng);
    test_rows.shuffle(&mut rng);

    let take = |rows: &[usize]| -> (Vec<Vec<f64>>, Vec<usize>) {
        rows.iter().map(|&r| (x[r].clone(), y[r])).unzip()
    };
    let (x_train, y_train) = take(&train_rows);
    let (x_test, y_test) = take(&test_rows);

    Ok(DataSplit {
        x_train,
        y_train,
        x_test,
        y_test,
    })
}

// ==============================================================================
// Train / Evaluate
// ==============================================================================

pub fn train(
    x_train: &[Vec<f64>],
    y_train: &[usize],
    codec: &LabelCodec,
    params: &ForestParams,
) -> TrainingResult<RandomForest> {
    log::info!(
        "Training random forest: {} trees on {} samples",
        params.n_estimators,
        x_train.len()
    );
    let started = std::time::Instant::now();
    let forest = RandomForest::fit(x_train, y_train, codec.n_classes(), params)?;
    log::info!("Training completed in {:?}", started.elapsed());
    Ok(forest)
}

/// Score predictions on the held-out half, per gesture name in codec order
pub fn evaluate(
    model: &RandomForest,
    x_test: &[Vec<f64>],
    y_test: &[usize],
    codec: &LabelCodec,
) -> TrainingResult<EvaluationReport> {
    if y_test.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }

    let predicted = codec.decode_all(&model.predict(x_test)?)?;
    let actual = codec.decode_all(y_test)?;
    Ok(score(&actual, &predicted, codec.classes()))
}

/// Classification metrics from string labels, reported for `classes` in order
pub fn score(actual: &[String], predicted: &[String], classes: &[String]) -> EvaluationReport {
    let k = classes.len();
    let position = |label: &str| classes.iter().position(|c| c == label);

    let mut confusion_matrix = vec![vec![0usize; k]; k];
    for (a, p) in actual.iter().zip(predicted) {
        if let (Some(i), Some(j)) = (position(a.as_str()), position(p.as_str())) {
            confusion_matrix[i][j] += 1;
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    let per_class: Vec<ClassMetrics> = classes
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let tp = confusion_matrix[i][i];
            let support: usize = confusion_matrix[i].iter().sum();
            let predicted_pos: usize = confusion_matrix.iter().map(|row| row[i]).sum();
            let precision = ratio(tp, predicted_pos);
            let recall = ratio(tp, support);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            ClassMetrics {
                label: label.clone(),
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect();

    let total: usize = per_class.iter().map(|m| m.support).sum();
    let correct: usize = (0..k).map(|i| confusion_matrix[i][i]).sum();

    let n = per_class.len().max(1) as f64;
    let macro_avg = AverageMetrics {
        precision: per_class.iter().map(|m| m.precision).sum::<f64>() / n,
        recall: per_class.iter().map(|m| m.recall).sum::<f64>() / n,
        f1: per_class.iter().map(|m| m.f1).sum::<f64>() / n,
        support: total,
    };

    let weighted = |f: fn(&ClassMetrics) -> f64| {
        if total == 0 {
            0.0
        } else {
            per_class.iter().map(|m| f(m) * m.support as f64).sum::<f64>() / total as f64
        }
    };
    let weighted_avg = AverageMetrics {
        precision: weighted(|m| m.precision),
        recall: weighted(|m| m.recall),
        f1: weighted(|m| m.f1),
        support: total,
    };

    EvaluationReport {
        classes: classes.to_vec(),
        accuracy: ratio(correct, total),
        per_class,
        macro_avg,
        weighted_avg,
        confusion_matrix,
    }
}
