//! Bootstrap-aggregated regression trees.

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tree::{RegressionTree, TreeParams};
use crate::core::{DashboardError, DashboardResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub seed: u64,
    /// Draw each tree's rows with replacement; otherwise every tree sees all rows
    pub bootstrap: bool,
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            seed: 42,
            bootstrap: true,
            tree: TreeParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    params: ForestParams,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForestRegressor {
    pub fn fit(params: ForestParams, x: ArrayView2<f64>, y: ArrayView1<f64>) -> DashboardResult<Self> {
        Self::fit_with_progress(params, x, y, |_| {})
    }

    /// Fit, calling `on_tree` with the number of finished trees after each one
    pub fn fit_with_progress<F>(
        params: ForestParams,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        mut on_tree: F,
    ) -> DashboardResult<Self>
    where
        F: FnMut(usize),
    {
        if params.n_estimators == 0 {
            return Err(DashboardError::TrainingError(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        let n_rows = x.nrows();
        if n_rows == 0 || n_rows != y.len() {
            return Err(DashboardError::TrainingError(format!(
                "need matching non-empty features and targets, got {} rows and {} targets",
                n_rows,
                y.len()
            )));
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for i in 0..params.n_estimators {
            let samples: Vec<usize> = if params.bootstrap {
                (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
            } else {
                (0..n_rows).collect()
            };

            let tree = RegressionTree::fit(&params.tree, x, y, samples)?;
            debug!(tree = i, nodes = tree.node_count(), depth = tree.depth(), "Tree fitted");
            trees.push(tree);
            on_tree(i + 1);
        }

        Ok(Self {
            params,
            trees,
            n_features: x.ncols(),
        })
    }

    /// Mean of the trees' predictions for one feature row
    pub fn predict_row(&self, row: ArrayView1<f64>) -> DashboardResult<f64> {
        if row.len() != self.n_features {
            return Err(DashboardError::InvalidInput(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        let total: f64 = self.trees.iter().map(|tree| tree.predict_row(row)).sum();
        Ok(total / self.trees.len() as f64)
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> DashboardResult<Array1<f64>> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Check that a deserialized forest still matches the shape it was fitted with
    pub fn check_integrity(&self) -> DashboardResult<()> {
        if self.trees.len() != self.params.n_estimators {
            return Err(DashboardError::ArtifactError(format!(
                "forest holds {} trees, fitted with n_estimators = {}",
                self.trees.len(),
                self.params.n_estimators
            )));
        }
        if let Some((i, tree)) = self
            .trees
            .iter()
            .enumerate()
            .find(|(_, tree)| tree.n_features() != self.n_features)
        {
            return Err(DashboardError::ArtifactError(format!(
                "tree {} expects {} features, forest expects {}",
                i,
                tree.n_features(),
                self.n_features
            )));
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
