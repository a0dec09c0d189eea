use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use insight_core::{
	Config, DatasetContent, DatasetInfo, DatasetKind, Engine, InsightResult, OutputRow, Record,
};
use tokio::runtime::{Builder, Runtime};
use tracing::warn;

/// Synchronous handle on an [`Engine`] for the line-oriented shell.
pub struct Session {
	engine: Engine,
	runtime: Runtime,
}

impl Session {
	pub fn open(config: &Config) -> anyhow::Result<Self> {
		let runtime = Builder::new_current_thread()
			.enable_all()
			.build()
			.context("Failed to create async runtime")?;
		let engine = runtime
			.block_on(Engine::new(config))
			.with_context(|| format!("Failed to open data directory {}", config.data_dir.display()))?;

		Ok(Self { engine, runtime })
	}

	pub fn data_dir(&self) -> &Path {
		self.engine.store().root()
	}

	pub fn query(&self, query: &serde_json::Value) -> InsightResult<Vec<OutputRow>> {
		self.runtime.block_on(self.engine.perform_query(query))
	}

	pub fn add(&self, id: &str, kind: DatasetKind, records: Vec<Record>) -> InsightResult<Vec<String>> {
		self.runtime
			.block_on(self.engine.add_dataset(id, DatasetContent::new(kind, records)))
	}

	pub fn remove(&self, id: &str) -> InsightResult<String> {
		self.runtime.block_on(self.engine.remove_dataset(id))
	}

	pub fn datasets(&self) -> InsightResult<Vec<DatasetInfo>> {
		self.runtime.block_on(self.engine.list_datasets())
	}
}

/// Read a JSON array of records. Elements that are not a section or a room
/// are skipped.
pub fn load_records(path: &Path) -> anyhow::Result<Vec<Record>> {
	let text = fs::read_to_string(path)
		.with_context(|| format!("Failed to read {}", path.display()))?;
	let value: serde_json::Value = serde_json::from_str(&text)
		.with_context(|| format!("Failed to parse {}", path.display()))?;

	let serde_json::Value::Array(items) = value else {
		bail!("{} must contain a JSON array of records", path.display());
	};

	let total = items.len();
	let records: Vec<Record> = items
		.into_iter()
		.filter_map(|item| serde_json::from_value(item).ok())
		.collect();

	if records.len() < total {
		warn!(
			file = %path.display(),
			skipped = total - records.len(),
			"Skipping malformed records"
		);
	}
	Ok(records)
}
