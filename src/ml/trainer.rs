use ndarray::{Array1, Array2};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::artifact::{ModelArtifact, FEATURE_NAMES};
use super::baseline::linear_baseline_mse;
use super::forest::{ForestParams, RandomForestRegressor};
use super::metrics::mean_squared_error;
use super::split::train_test_split;
use crate::core::config::ModelSettings;
use crate::core::{DashboardError, DashboardResult};
use crate::dataset::Dataset;

/// Outcome of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub n_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub n_trees: usize,
    /// Held-out mean squared error of the forest
    pub forest_mse: f64,
    /// Held-out mean squared error of a linear fit, when it could be computed
    pub baseline_mse: Option<f64>,
    pub elapsed: Duration,
}

/// Fits the life expectancy forest on `[year, pop, gdpPercap]`
#[derive(Debug, Clone)]
pub struct Trainer {
    params: ForestParams,
    test_size: f64,
    split_seed: u64,
}

impl Trainer {
    pub fn new(params: ForestParams, test_size: f64, split_seed: u64) -> Self {
        Self {
            params,
            test_size,
            split_seed,
        }
    }

    /// Split and forest share the configured seed
    pub fn from_settings(settings: &ModelSettings) -> Self {
        let params = ForestParams {
            n_estimators: settings.n_estimators,
            seed: settings.seed,
            ..Default::default()
        };
        Self::new(params, settings.test_size, settings.seed)
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Split, fit, evaluate. The held-out scores are reported, never enforced.
    pub fn train<F>(&self, dataset: &Dataset, on_tree: F) -> DashboardResult<(ModelArtifact, TrainingReport)>
    where
        F: FnMut(usize),
    {
        let started = Instant::now();
        let (x, y) = feature_matrix(dataset)?;
        let split = train_test_split(&x, &y, self.test_size, self.split_seed)?;

        info!(
            rows = x.nrows(),
            train = split.x_train.nrows(),
            test = split.x_test.nrows(),
            features = ?FEATURE_NAMES,
            n_estimators = self.params.n_estimators,
            seed = self.params.seed,
            "Training random forest"
        );

        let forest = RandomForestRegressor::fit_with_progress(
            self.params,
            split.x_train.view(),
            split.y_train.view(),
            on_tree,
        )?;

        let predictions = forest.predict(split.x_test.view())?;
        let forest_mse = mean_squared_error(split.y_test.view(), predictions.view())?;

        let baseline_mse = match linear_baseline_mse(&split) {
            Ok(mse) => Some(mse),
            Err(e) => {
                warn!(error = %e, "Linear baseline failed");
                None
            }
        };

        let report = TrainingReport {
            n_rows: x.nrows(),
            n_train: split.x_train.nrows(),
            n_test: split.x_test.nrows(),
            n_trees: forest.n_trees(),
            forest_mse,
            baseline_mse,
            elapsed: started.elapsed(),
        };
        info!(mse = forest_mse, baseline_mse = ?baseline_mse, "Training finished");

        Ok((ModelArtifact::new(forest, forest_mse), report))
    }
}

/// Features `[year, pop, gdpPercap]` and lifeExp targets as arrays
pub fn feature_matrix(dataset: &Dataset) -> DashboardResult<(Array2<f64>, Array1<f64>)> {
    let (rows, targets) = dataset.features_and_targets();
    let flat: Vec<f64> = rows.iter().flat_map(|row| row.iter().copied()).collect();
    let x = Array2::from_shape_vec((rows.len(), FEATURE_NAMES.len()), flat)
        .map_err(|e| DashboardError::TrainingError(e.to_string()))?;
    Ok((x, Array1::from(targets)))
}
