//! Engine facade: add, remove, list and query datasets.
//!
//! The engine holds no dataset state of its own. Every call re-derives what
//! exists from the [`DatasetStore`], so a freshly constructed engine over the
//! same directory sees exactly the datasets added before it.

use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::dataset::{self, DatasetContent, DatasetInfo};
use crate::error::{InsightError, InsightResult};
use crate::executor::{Executor, OutputRow};
use crate::query;
use crate::storage::DatasetStore;

pub struct Engine {
    store: DatasetStore,
    executor: Executor,
}

impl Engine {
    pub async fn new(config: &Config) -> InsightResult<Self> {
        let store = DatasetStore::open(&config.data_dir).await?;
        debug!(data_dir = %config.data_dir.display(), "Engine opened");

        Ok(Self {
            store,
            executor: Executor::new(config.max_results),
        })
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Store `content` under `id` and return every stored id.
    pub async fn add_dataset(&self, id: &str, content: DatasetContent) -> InsightResult<Vec<String>> {
        dataset::validate_id(id)?;
        if self.store.exists(id).await? {
            return Err(InsightError::Conflict(format!("dataset '{}' already exists", id)));
        }

        let kind = content.kind;
        let records = content.into_usable_records()?;
        self.store.put(id, kind, &records).await?;
        info!(id, %kind, rows = records.len(), "Dataset added");

        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .map(|info| info.id)
            .collect())
    }

    /// Delete the dataset `id` and return the id.
    pub async fn remove_dataset(&self, id: &str) -> InsightResult<String> {
        dataset::validate_id(id)?;
        self.store.remove(id).await?;
        info!(id, "Dataset removed");
        Ok(id.to_string())
    }

    /// Validate and run a JSON query.
    pub async fn perform_query(&self, query: &Value) -> InsightResult<Vec<OutputRow>> {
        let query = query::validate(query)?;
        let dataset = self.store.get(&query.dataset).await?;

        if dataset.kind != query.kind {
            return Err(InsightError::invalid(format!(
                "dataset '{}' holds {}, but the query uses {} fields",
                dataset.id, dataset.kind, query.kind
            )));
        }

        let rows = self.executor.execute(&query, &dataset.records)?;
        debug!(dataset = %dataset.id, rows = rows.len(), "Query finished");
        Ok(rows)
    }

    pub async fn list_datasets(&self) -> InsightResult<Vec<DatasetInfo>> {
        self.store.list().await
    }
}

#[cfg(test)]
mod tests;
