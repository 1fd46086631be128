//! Gradient-boosted regression trees backend.
//!
//! Small depth-limited trees fit to residuals with shrinkage. Row
//! subsampling is driven by a seeded generator, so training is
//! deterministic for a given configuration.

use crate::error::{EngineError, Result};
use crate::models::{Backend, BackendId, BackendParams};
use crate::utils::stats;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for the boosted ensemble.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoostedConfig {
    /// Number of boosting rounds.
    pub n_trees: usize,
    /// Shrinkage applied to each tree's contribution.
    pub learning_rate: f64,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum rows per leaf.
    pub min_samples_leaf: usize,
    /// Fraction of rows sampled per round (1.0 disables subsampling).
    pub subsample: f64,
    /// Seed for the row sampler.
    pub seed: u64,
}

impl Default for BoostedConfig {
    fn default() -> Self {
        Self {
            n_trees: 50,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 2,
            subsample: 0.8,
            seed: 42,
        }
    }
}

/// A node of a regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, features: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if features[*feature] <= *threshold {
                    left.predict(features)
                } else {
                    right.predict(features)
                }
            }
        }
    }
}

/// Persisted parameters of the boosted backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedParams {
    /// Training configuration.
    pub config: BoostedConfig,
    /// Base prediction (training target mean).
    base: f64,
    /// Fitted trees in boosting order.
    trees: Vec<TreeNode>,
}

/// Gradient-boosted regression trees.
#[derive(Debug, Clone)]
pub struct GradientBoostedTrees {
    config: BoostedConfig,
    fitted: Option<BoostedParams>,
}

impl GradientBoostedTrees {
    /// Create an unfitted ensemble.
    pub fn new(config: BoostedConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Rebuild from persisted parameters.
    pub fn from_params(params: BoostedParams) -> Self {
        Self {
            config: params.config,
            fitted: Some(params),
        }
    }

    fn build_tree(
        &self,
        x: &[Vec<f64>],
        residuals: &[f64],
        rows: &[usize],
        depth: usize,
    ) -> TreeNode {
        let values: Vec<f64> = rows.iter().map(|&r| residuals[r]).collect();
        let node_mean = stats::mean(&values);

        if depth >= self.config.max_depth || rows.len() < 2 * self.config.min_samples_leaf {
            return TreeNode::Leaf { value: node_mean };
        }

        let node_sse = sse(&values, node_mean);
        if node_sse < 1e-12 {
            return TreeNode::Leaf { value: node_mean };
        }

        match self.best_split(x, residuals, rows) {
            Some((feature, threshold, left_rows, right_rows)) => TreeNode::Split {
                feature,
                threshold,
                left: Box::new(self.build_tree(x, residuals, &left_rows, depth + 1)),
                right: Box::new(self.build_tree(x, residuals, &right_rows, depth + 1)),
            },
            None => TreeNode::Leaf { value: node_mean },
        }
    }

    /// Exhaustive search for the split with the largest error
    /// reduction; candidate thresholds are midpoints between adjacent
    /// distinct feature values.
    #[allow(clippy::type_complexity)]
    fn best_split(
        &self,
        x: &[Vec<f64>],
        residuals: &[f64],
        rows: &[usize],
    ) -> Option<(usize, f64, Vec<usize>, Vec<usize>)> {
        let k = x[0].len();
        let min_leaf = self.config.min_samples_leaf;
        let mut best: Option<(f64, usize, f64)> = None;

        for feature in 0..k {
            let mut ordered: Vec<(f64, f64)> = rows
                .iter()
                .map(|&r| (x[r][feature], residuals[r]))
                .collect();
            ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let total_sum: f64 = ordered.iter().map(|&(_, v)| v).sum();
            let n = ordered.len() as f64;
            let mut left_sum = 0.0;
            let mut left_count = 0usize;

            for i in 0..ordered.len() - 1 {
                left_sum += ordered[i].1;
                left_count += 1;

                if ordered[i].0 == ordered[i + 1].0 {
                    continue;
                }
                let right_count = ordered.len() - left_count;
                if left_count < min_leaf || right_count < min_leaf {
                    continue;
                }

                // SSE reduction from splitting, via the two group sums.
                let right_sum = total_sum - left_sum;
                let gain = left_sum * left_sum / left_count as f64
                    + right_sum * right_sum / right_count as f64
                    - total_sum * total_sum / n;

                if gain > 1e-12 && best.map(|(g, _, _)| gain > g).unwrap_or(true) {
                    let threshold = (ordered[i].0 + ordered[i + 1].0) / 2.0;
                    best = Some((gain, feature, threshold));
                }
            }
        }

        let (_, feature, threshold) = best?;
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&r| x[r][feature] <= threshold);
        Some((feature, threshold, left_rows, right_rows))
    }
}

impl Backend for GradientBoostedTrees {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        if x.is_empty() || y.is_empty() {
            return Err(EngineError::EmptyData);
        }
        if x.len() != y.len() {
            return Err(EngineError::DimensionMismatch {
                expected: y.len(),
                got: x.len(),
            });
        }
        if !(self.config.subsample > 0.0 && self.config.subsample <= 1.0) {
            return Err(EngineError::InvalidParameter(
                "subsample must be in (0, 1]".into(),
            ));
        }

        let n = x.len();
        let base = stats::mean(y);
        let mut residuals: Vec<f64> = y.iter().map(|v| v - base).collect();
        let mut trees = Vec::with_capacity(self.config.n_trees);
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let sample_size = ((n as f64 * self.config.subsample).ceil() as usize)
            .max(2 * self.config.min_samples_leaf)
            .min(n);

        for _ in 0..self.config.n_trees {
            let mut rows: Vec<usize> = (0..n).collect();
            if sample_size < n {
                rows.shuffle(&mut rng);
                rows.truncate(sample_size);
                rows.sort_unstable();
            }

            let tree = self.build_tree(x, &residuals, &rows, 0);

            for (row, residual) in residuals.iter_mut().enumerate() {
                *residual -= self.config.learning_rate * tree.predict(&x[row]);
            }
            trees.push(tree);
        }

        self.fitted = Some(BoostedParams {
            config: self.config,
            base,
            trees,
        });
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        let params = self.fitted.as_ref().ok_or(EngineError::FitRequired)?;
        let mut prediction = params.base;
        for tree in &params.trees {
            prediction += params.config.learning_rate * tree.predict(features);
        }
        Ok(prediction)
    }

    fn id(&self) -> BackendId {
        BackendId::GradientBoosted
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn params(&self) -> Result<BackendParams> {
        let params = self.fitted.clone().ok_or(EngineError::FitRequired)?;
        Ok(BackendParams::GradientBoosted(params))
    }
}

fn sse(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean).powi(2)).sum()
}
