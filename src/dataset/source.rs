use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use super::Dataset;
use crate::core::{DashboardError, DashboardResult};

/// Gapminder table compiled into the binary
pub const BUNDLED_GAPMINDER: &str = include_str!("../../data/gapminder.csv");

/// Where the dataset comes from
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch(&self) -> DashboardResult<Dataset>;

    fn describe(&self) -> String;
}

/// The table bundled at build time
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSource;

#[async_trait]
impl DatasetSource for BundledSource {
    async fn fetch(&self) -> DashboardResult<Dataset> {
        Dataset::from_csv_reader(BUNDLED_GAPMINDER.as_bytes())
    }

    fn describe(&self) -> String {
        "bundled gapminder table".to_string()
    }
}

/// A CSV file with the Gapminder header
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetSource for FileSource {
    async fn fetch(&self) -> DashboardResult<Dataset> {
        info!(path = %self.path.display(), "Reading dataset file");
        let content = tokio::fs::read(&self.path).await.map_err(|e| {
            DashboardError::DatasetError(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        Dataset::from_csv_reader(content.as_slice())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Pick the source for an optional configured path
pub fn source_for(path: Option<&PathBuf>) -> Box<dyn DatasetSource> {
    match path {
        Some(path) => Box::new(FileSource::new(path.clone())),
        None => Box::new(BundledSource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_bundled_source_loads() {
        let dataset = BundledSource.fetch().await.unwrap();
        assert_eq!(dataset.len(), 1704);
        assert_eq!(dataset.countries().len(), 142);
        assert_eq!(dataset.years().len(), 12);
        assert_eq!(dataset.year_range(), (1952, 2007));
        for country in ["Turkey", "Syria", "Greece", "Congo, Dem. Rep.", "Cote d'Ivoire"] {
            assert!(dataset.contains_country(country), "missing {}", country);
        }
    }

    #[tokio::test]
    async fn test_file_source_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "country,continent,year,lifeExp,pop,gdpPercap,iso_alpha,iso_num\nPeru,Americas,1952,43.902,8025700,3758.523437,PER,604\n"
        )
        .unwrap();

        let source = FileSource::new(file.path());
        let dataset = source.fetch().await.unwrap();
        assert_eq!(dataset.countries(), &["Peru".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let source = FileSource::new("/nonexistent/gapminder.csv");
        let result = source.fetch().await;
        assert!(matches!(result, Err(DashboardError::DatasetError(_))));
    }
}
