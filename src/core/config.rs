use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::DashboardResult;

/// Prefix for environment overrides, e.g. `LIFEEXP_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "LIFEEXP";

/// Default configuration file, optional
pub const DEFAULT_CONFIG_FILE: &str = "config/default";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub server: ServerSettings,
    pub dataset: DatasetSettings,
    pub model: ModelSettings,
    pub charts: ChartSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSettings {
    /// CSV file to load instead of the bundled table
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Artifact location, written by `train` and read by `serve`/`predict`
    pub path: PathBuf,
    pub n_estimators: usize,
    pub seed: u64,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub default_countries: Vec<String>,
    pub year_step: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerSettings::default(),
            dataset: DatasetSettings::default(),
            model: ModelSettings::default(),
            charts: ChartSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("gapminder_model.bin"),
            n_estimators: 100,
            seed: 42,
            test_size: 0.2,
        }
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            default_countries: vec![
                "Turkey".to_string(),
                "Syria".to_string(),
                "Greece".to_string(),
            ],
            year_step: 5,
        }
    }
}

impl Settings {
    /// Load settings from the default file, an optional explicit file and
    /// the environment, in increasing priority.
    pub fn load(path: Option<&Path>) -> DashboardResult<Self> {
        let mut builder = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        Ok(settings)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
