use ndarray::ArrayView1;

use crate::core::{DashboardError, DashboardResult};

/// mean((y_true - y_pred)²)
pub fn mean_squared_error(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> DashboardResult<f64> {
    if y_true.len() != y_pred.len() {
        return Err(DashboardError::InvalidInput(format!(
            "length mismatch: {} targets vs {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(DashboardError::InvalidInput(
            "mean squared error of an empty set".to_string(),
        ));
    }

    let sum: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| {
            let diff = t - p;
            diff * diff
        })
        .sum();
    Ok(sum / y_true.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mse() {
        let y_true = array![3.0, -0.5, 2.0, 7.0];
        let y_pred = array![2.5, 0.0, 2.0, 8.0];
        assert_eq!(mean_squared_error(y_true.view(), y_pred.view()).unwrap(), 0.375);
    }

    #[test]
    fn test_mismatch_and_empty() {
        let a = array![1.0, 2.0];
        let b = array![1.0];
        assert!(mean_squared_error(a.view(), b.view()).is_err());
        let empty = ndarray::Array1::<f64>::zeros(0);
        assert!(mean_squared_error(empty.view(), empty.view()).is_err());
    }
}
