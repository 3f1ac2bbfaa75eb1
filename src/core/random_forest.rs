// Random forest classifier
// Bagged CART trees (Gini impurity, sqrt(n_features) candidates per split),
// prediction by averaged leaf class distributions.

use crate::models::training::{TrainingError, TrainingResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Parameters
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// Unlimited when `None`
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> TrainingResult<()> {
        if self.n_estimators == 0 {
            return Err(TrainingError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(TrainingError::InvalidParameter(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(TrainingError::InvalidParameter(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

// ==============================================================================
// Decision Tree
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        /// Class probabilities, indexed by class code
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        /// Samples with `x[feature] <= threshold` go left
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// One CART tree stored as a flat node arena, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        samples: Vec<usize>,
        n_classes: usize,
        params: &ForestParams,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = x.first().map_or(0, Vec::len);
        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let placeholder = || Node::Leaf {
            distribution: Vec::new(),
        };

        let mut nodes = vec![placeholder()];
        let mut stack = vec![(0usize, samples, 0usize)];

        while let Some((slot, samples, depth)) = stack.pop() {
            let counts = class_counts(y, &samples, n_classes);

            let splittable = samples.len() >= params.min_samples_split
                && params.max_depth.map_or(true, |d| depth < d)
                && counts.iter().filter(|&&c| c > 0).count() > 1;

            let split = if splittable {
                best_split(x, y, &samples, n_classes, n_features, max_features, rng)
            } else {
                None
            };

            match split {
                None => {
                    nodes[slot] = Node::Leaf {
                        distribution: normalize(&counts),
                    };
                }
                Some(split) => {
                    let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                        .into_iter()
                        .partition(|&i| x[i][split.feature] <= split.threshold);

                    let left = nodes.len();
                    nodes.push(placeholder());
                    let right = nodes.len();
                    nodes.push(placeholder());
                    nodes[slot] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                    };

                    stack.push((right, right_samples, depth + 1));
                    stack.push((left, left_samples, depth + 1));
                }
            }
        }

        Self { nodes }
    }

    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Node::Split { left, right, .. } = &self.nodes[idx] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }
}

fn class_counts(y: &[usize], samples: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &i in samples {
        counts[y[i]] += 1;
    }
    counts
}

fn normalize(counts: &[usize]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Midpoint of two adjacent distinct values, falling back to `a` when the
/// midpoint rounds up to `b`
fn threshold_between(a: f64, b: f64) -> f64 {
    let mid = a / 2.0 + b / 2.0;
    if mid >= b || !mid.is_finite() {
        a
    } else {
        mid
    }
}

/// Lowest weighted child impurity over a random subset of features.
///
/// Features are visited in shuffled order until `max_features` non-constant
/// ones have been tried; the search keeps going past that only while no
/// valid split has been found.
fn best_split(
    x: &[Vec<f64>],
    y: &[usize],
    samples: &[usize],
    n_classes: usize,
    n_features: usize,
    max_features: usize,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let mut features: Vec<usize> = (0..n_features).collect();
    features.shuffle(rng);

    let n = samples.len();
    let parent_counts = class_counts(y, samples, n_classes);
    let mut best: Option<SplitCandidate> = None;
    let mut tried = 0;
    let mut column: Vec<(f64, usize)> = Vec::with_capacity(n);

    for feature in features {
        if tried >= max_features && best.is_some() {
            break;
        }

        column.clear();
        column.extend(samples.iter().map(|&i| (x[i][feature], y[i])));
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (Some(first), Some(last)) = (column.first(), column.last()) else {
            continue;
        };
        if first.0 >= last.0 {
            continue;
        }
        tried += 1;

        let mut left = vec![0usize; n_classes];
        let mut right = parent_counts.clone();
        for k in 0..n - 1 {
            let (value, class) = column[k];
            left[class] += 1;
            right[class] -= 1;

            let next = column[k + 1].0;
            if value >= next {
                continue;
            }

            let n_left = k + 1;
            let n_right = n - n_left;
            let impurity = (n_left as f64 * gini(&left, n_left) + n_right as f64 * gini(&right, n_right))
                / n as f64;

            if best.map_or(true, |b| impurity < b.impurity) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: threshold_between(value, next),
                    impurity,
                });
            }
        }
    }

    best
}

// ==============================================================================
// Forest
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit on `x` (one row per sample) and class codes `y` in `0..n_classes`.
    ///
    /// Each tree gets a bootstrap resample and its own seed drawn from `params.seed`,
    /// so the same data, seed and tree count always reproduce the same forest.
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, params: &ForestParams) -> TrainingResult<Self> {
        params.validate()?;

        if x.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        if x.len() != y.len() {
            return Err(TrainingError::InvalidParameter(format!(
                "{} feature rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        if n_features == 0 {
            return Err(TrainingError::NoFeatureColumns);
        }
        if let Some(row) = x.iter().position(|r| r.len() != n_features) {
            return Err(TrainingError::InvalidParameter(format!(
                "row {} has {} features, expected {}",
                row,
                x[row].len(),
                n_features
            )));
        }
        if let Some(&code) = y.iter().find(|&&c| c >= n_classes) {
            return Err(TrainingError::InvalidParameter(format!(
                "label code {} out of range for {} classes",
                code, n_classes
            )));
        }

        let n_samples = x.len();
        let mut master = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for t in 0..params.n_estimators {
            let mut rng = StdRng::seed_from_u64(master.gen::<u64>());
            let bootstrap: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            let tree = DecisionTree::fit(x, y, bootstrap, n_classes, params, &mut rng);
            log::trace!(
                "tree {}/{}: {} nodes, depth {}",
                t + 1,
                params.n_estimators,
                tree.node_count(),
                tree.depth()
            );
            trees.push(tree);
        }

        log::debug!(
            "Fitted {} trees on {} samples x {} features",
            trees.len(),
            n_samples,
            n_features
        );

        Ok(Self {
            params: params.clone(),
            n_features,
            n_classes,
            trees,
        })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the trees' leaf distributions
    pub fn predict_proba(&self, row: &[f64]) -> TrainingResult<Vec<f64>> {
        if row.len() != self.n_features {
            return Err(TrainingError::InvalidParameter(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }

        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }

    /// Most probable class code; ties go to the lower code
    pub fn predict_one(&self, row: &[f64]) -> TrainingResult<usize> {
        let proba = self.predict_proba(row)?;
        let mut best = 0;
        for (code, &p) in proba.iter().enumerate().skip(1) {
            if p > proba[best] {
                best = code;
            }
        }
        Ok(best)
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> TrainingResult<Vec<usize>> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }
}
