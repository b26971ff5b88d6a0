use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use super::{Dataset, DatasetSource};
use crate::core::DashboardResult;

/// Loads the dataset on first access and hands out the same table for the
/// rest of the process lifetime.
pub struct DatasetStore {
    source: Box<dyn DatasetSource>,
    cell: OnceCell<Arc<Dataset>>,
}

impl DatasetStore {
    pub fn new(source: Box<dyn DatasetSource>) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Return the cached table, fetching it on the first call
    pub async fn get(&self) -> DashboardResult<Arc<Dataset>> {
        let dataset = self
            .cell
            .get_or_try_init(|| async {
                crate::track_performance!("dataset_load");
                let dataset = self.source.fetch().await?;
                info!(
                    source = %self.source.describe(),
                    rows = dataset.len(),
                    countries = dataset.countries().len(),
                    "Dataset loaded"
                );
                Ok::<_, crate::core::DashboardError>(Arc::new(dataset))
            })
            .await?;
        Ok(Arc::clone(dataset))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        fetches: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DatasetSource for CountingSource {
        async fn fetch(&self) -> DashboardResult<Dataset> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            super::super::BundledSource.fetch().await
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    #[tokio::test]
    async fn test_fetches_once() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let store = DatasetStore::new(Box::new(CountingSource {
            fetches: Arc::clone(&fetches),
        }));

        assert!(!store.is_loaded());
        let first = store.get().await.unwrap();
        let second = store.get().await.unwrap();

        assert!(store.is_loaded());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }
}
