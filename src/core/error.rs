use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Dataset error: {0}")]
    DatasetError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unknown country: {0}")]
    UnknownCountry(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Model artifact error: {0}")]
    ArtifactError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] bincode::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DashboardError {
    /// Whether the error was caused by the caller's input rather than by
    /// this process.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DashboardError::UnknownCountry(_) | DashboardError::InvalidInput(_)
        )
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            DashboardError::ConfigError(_) => "config",
            DashboardError::DatasetError(_) | DashboardError::CsvError(_) => "dataset",
            DashboardError::UnknownCountry(_) => "unknown_country",
            DashboardError::InvalidInput(_) => "invalid_input",
            DashboardError::TrainingError(_) => "training",
            DashboardError::ArtifactError(_) | DashboardError::SerializationError(_) => "model",
            DashboardError::IoError(_) => "io",
        }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
