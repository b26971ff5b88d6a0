use std::sync::Arc;

use crate::charts::ChartOptions;
use crate::core::config::ChartSettings;
use crate::core::DashboardResult;
use crate::dataset::{Dataset, DatasetStore};
use crate::predictor::Predictor;

/// Read-only state shared by every request handler
pub struct AppState {
    dataset: DatasetStore,
    chart_settings: ChartSettings,
    predictor: Predictor,
}

impl AppState {
    pub fn new(dataset: DatasetStore, chart_settings: ChartSettings, predictor: Predictor) -> Self {
        Self {
            dataset,
            chart_settings,
            predictor,
        }
    }

    /// Load the dataset now so a bad source fails before the server binds
    pub async fn warm_up(&self) -> DashboardResult<()> {
        self.dataset.get().await.map(|_| ())
    }

    pub async fn dataset(&self) -> DashboardResult<Arc<Dataset>> {
        self.dataset.get().await
    }

    pub async fn chart_options(&self) -> DashboardResult<ChartOptions> {
        let dataset = self.dataset().await?;
        ChartOptions::build(&dataset, &self.chart_settings)
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }
}
