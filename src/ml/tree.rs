//! CART regression tree.
//!
//! Nodes live in a flat vector; node 0 is the root. Split rule:
//! `row[feature] <= threshold` goes left.

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::core::{DashboardError, DashboardResult};

/// Impurity at or below this is treated as a pure node
const PURE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// `None` grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: u32,
        right: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Number of sorted samples going left
    left_count: usize,
    impurity: f64,
}

/// Sum of squared deviations from the mean
fn sse(sum: f64, sum_sq: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (sum_sq - sum * sum / count as f64).max(0.0)
}

impl RegressionTree {
    /// Fit on the rows of `x` named by `samples`. Repeated indices count as
    /// repeated rows, which is how bootstrap samples are passed in.
    pub fn fit(
        params: &TreeParams,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        samples: Vec<usize>,
    ) -> DashboardResult<Self> {
        if samples.is_empty() {
            return Err(DashboardError::TrainingError(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(DashboardError::TrainingError(format!(
                "feature rows ({}) and targets ({}) differ",
                x.nrows(),
                y.len()
            )));
        }

        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut stack = vec![(0usize, samples, 0usize)];

        while let Some((slot, samples, depth)) = stack.pop() {
            let count = samples.len();
            let (sum, sum_sq) = samples.iter().fold((0.0, 0.0), |(s, sq), &i| {
                let v = y[i];
                (s + v, sq + v * v)
            });
            let mean = sum / count as f64;
            let impurity = sse(sum, sum_sq, count);

            let depth_exhausted = params.max_depth.map_or(false, |max| depth >= max);
            if depth_exhausted
                || count < params.min_samples_split
                || count < 2 * params.min_samples_leaf
                || impurity <= PURE_EPSILON
            {
                nodes[slot] = Node::Leaf { value: mean };
                continue;
            }

            let Some((best, sorted)) = Self::best_split(params, x, y, &samples) else {
                nodes[slot] = Node::Leaf { value: mean };
                continue;
            };

            let (left_samples, right_samples) = {
                let (l, r) = sorted.split_at(best.left_count);
                (l.to_vec(), r.to_vec())
            };

            let left = nodes.len();
            nodes.push(Node::Leaf { value: 0.0 });
            let right = nodes.len();
            nodes.push(Node::Leaf { value: 0.0 });

            nodes[slot] = Node::Split {
                feature: best.feature,
                threshold: best.threshold,
                left: left as u32,
                right: right as u32,
            };

            stack.push((right, right_samples, depth + 1));
            stack.push((left, left_samples, depth + 1));
        }

        Ok(Self {
            nodes,
            n_features: x.ncols(),
        })
    }

    /// Exhaustive search over every feature and every boundary between
    /// distinct sorted values. Returns the winning split and the samples
    /// sorted along its feature.
    fn best_split(
        params: &TreeParams,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        samples: &[usize],
    ) -> Option<(BestSplit, Vec<usize>)> {
        let count = samples.len();
        let min_leaf = params.min_samples_leaf.max(1);
        let mut best: Option<(BestSplit, Vec<usize>)> = None;

        for feature in 0..x.ncols() {
            let mut sorted = samples.to_vec();
            sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

            let (total, total_sq) = sorted.iter().fold((0.0, 0.0), |(s, sq), &i| {
                let v = y[i];
                (s + v, sq + v * v)
            });

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            let mut candidate: Option<BestSplit> = None;

            for k in 1..count {
                let v = y[sorted[k - 1]];
                left_sum += v;
                left_sq += v * v;

                if k < min_leaf || count - k < min_leaf {
                    continue;
                }

                let lo = x[[sorted[k - 1], feature]];
                let hi = x[[sorted[k], feature]];
                if lo >= hi {
                    continue;
                }

                let impurity = sse(left_sum, left_sq, k)
                    + sse(total - left_sum, total_sq - left_sq, count - k);

                if candidate.as_ref().map_or(true, |c| impurity < c.impurity) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi || !threshold.is_finite() {
                        threshold = lo;
                    }
                    candidate = Some(BestSplit {
                        feature,
                        threshold,
                        left_count: k,
                        impurity,
                    });
                }
            }

            if let Some(candidate) = candidate {
                let better = best
                    .as_ref()
                    .map_or(true, |(b, _)| candidate.impurity < b.impurity);
                if better {
                    best = Some((candidate, sorted));
                }
            }
        }

        best
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut index = 0usize;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Node::Split { left, right, .. } = &self.nodes[index] {
                stack.push((*left as usize, depth + 1));
                stack.push((*right as usize, depth + 1));
            }
        }
        max_depth
    }
}
