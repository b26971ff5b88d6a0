use linfa::prelude::*;
use linfa::Dataset as LinfaDataset;
use linfa_linear::LinearRegression;

use super::metrics::mean_squared_error;
use super::split::TrainTestSplit;
use crate::core::{DashboardError, DashboardResult};

/// Held-out MSE of an ordinary least squares fit on the same split, as a
/// reference point for the forest's score.
pub fn linear_baseline_mse(split: &TrainTestSplit) -> DashboardResult<f64> {
    let train = LinfaDataset::new(split.x_train.clone(), split.y_train.clone());

    let model = LinearRegression::default()
        .fit(&train)
        .map_err(|e| DashboardError::TrainingError(format!("linear baseline: {}", e)))?;

    let predictions = model.predict(&split.x_test);
    mean_squared_error(split.y_test.view(), predictions.view())
}
