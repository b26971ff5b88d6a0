//! On-disk model artifact.
//!
//! The artifact is a bincode file holding the fitted forest together with
//! the feature order it was trained on. Loading refuses files whose feature
//! order differs from [`FEATURE_NAMES`].

use chrono::{DateTime, Utc};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use super::forest::RandomForestRegressor;
use crate::core::{DashboardError, DashboardResult};

/// Model inputs, in the order the forest consumes them
pub const FEATURE_NAMES: [&str; 3] = ["year", "pop", "gdpPercap"];

/// Bumped whenever the serialized layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub trained_at: DateTime<Utc>,
    /// Held-out MSE measured at training time
    pub test_mse: f64,
    pub forest: RandomForestRegressor,
}

impl ModelArtifact {
    pub fn new(forest: RandomForestRegressor, test_mse: f64) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            trained_at: Utc::now(),
            test_mse,
            forest,
        }
    }

    /// Write to `path`, replacing whatever is there
    pub fn save(&self, path: &Path) -> DashboardResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;

        info!(path = %path.display(), trees = self.forest.n_trees(), "Model artifact written");
        Ok(())
    }

    pub fn load(path: &Path) -> DashboardResult<Self> {
        // read fully so length prefixes are checked against the real size
        let bytes = std::fs::read(path).map_err(|e| {
            DashboardError::ArtifactError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let artifact: ModelArtifact = bincode::deserialize(&bytes)?;
        artifact.validate()?;

        info!(
            path = %path.display(),
            trees = artifact.forest.n_trees(),
            trained_at = %artifact.trained_at,
            "Model artifact loaded"
        );
        Ok(artifact)
    }

    fn validate(&self) -> DashboardResult<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(DashboardError::ArtifactError(format!(
                "unsupported artifact format {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
            return Err(DashboardError::ArtifactError(format!(
                "artifact features {:?} do not match {:?}",
                self.feature_names, FEATURE_NAMES
            )));
        }
        if self.forest.n_features() != FEATURE_NAMES.len() {
            return Err(DashboardError::ArtifactError(format!(
                "forest expects {} features",
                self.forest.n_features()
            )));
        }
        self.forest.check_integrity()
    }

    /// Predict life expectancy for `[year, pop, gdpPercap]`
    pub fn predict(&self, features: [f64; 3]) -> DashboardResult<f64> {
        let row = Array1::from(features.to_vec());
        self.forest.predict_row(row.view())
    }
}
