use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::core::{DashboardError, DashboardResult};

/// Row indices for a train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// A materialized train/test partition
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Shuffle `0..n_rows` with `seed` and hold out `ceil(test_size * n_rows)` rows
pub fn split_indices(n_rows: usize, test_size: f64, seed: u64) -> DashboardResult<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DashboardError::InvalidInput(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_test = (test_size * n_rows as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_rows {
        return Err(DashboardError::InvalidInput(format!(
            "cannot split {} rows with test_size {}",
            n_rows, test_size
        )));
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n_rows).collect();
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(SplitIndices { train, test: indices })
}

pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_size: f64,
    seed: u64,
) -> DashboardResult<TrainTestSplit> {
    if x.nrows() != y.len() {
        return Err(DashboardError::InvalidInput(format!(
            "feature rows ({}) and targets ({}) differ",
            x.nrows(),
            y.len()
        )));
    }
    let indices = split_indices(x.nrows(), test_size, seed)?;

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &indices.train),
        x_test: x.select(Axis(0), &indices.test),
        y_train: y.select(Axis(0), &indices.train),
        y_test: y.select(Axis(0), &indices.test),
    })
}
