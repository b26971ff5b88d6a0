use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::form::{PredictionRequest, PredictionResult, PredictorForm};
use crate::core::{DashboardError, DashboardResult};
use crate::ml::ModelArtifact;

/// Serves predictions from a model loaded once and shared read-only
#[derive(Debug, Clone)]
pub struct Predictor {
    model: Arc<ModelArtifact>,
    form: PredictorForm,
}

impl Predictor {
    pub fn new(model: ModelArtifact, form: PredictorForm) -> Self {
        Self {
            model: Arc::new(model),
            form,
        }
    }

    pub fn load(path: &Path, form: PredictorForm) -> DashboardResult<Self> {
        let model = ModelArtifact::load(path)?;
        Ok(Self::new(model, form))
    }

    pub fn form(&self) -> &PredictorForm {
        &self.form
    }

    pub fn model(&self) -> &ModelArtifact {
        &self.model
    }

    /// Clamp the inputs to the form bounds and run the forest
    pub fn predict(&self, request: &PredictionRequest) -> DashboardResult<PredictionResult> {
        let input = self.form.clamp(request);
        let life_expectancy = self.model.predict(input.features())?;

        if !life_expectancy.is_finite() {
            return Err(DashboardError::ArtifactError(
                "model produced a non-finite prediction".to_string(),
            ));
        }

        debug!(?input, life_expectancy, "Prediction served");
        Ok(PredictionResult {
            life_expectancy,
            input,
        })
    }
}
