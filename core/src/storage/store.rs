//! File-per-dataset durable store.
//!
//! The set of `<hex id>.json` files in the data directory is the registry of
//! datasets; nothing is cached between calls. Files are published with
//! write-to-temp, fsync, rename so a reader sees a dataset completely or not
//! at all.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dataset::{Dataset, DatasetInfo, DatasetKind, Record};
use crate::error::{InsightError, InsightResult};

const DATASET_EXT: &str = "json";
const TEMP_EXT: &str = "tmp";

/// Longest hex stem used verbatim; longer ids get a fixed-length hashed stem
/// so temp names stay under common 255-byte file name limits.
const MAX_HEX_STEM: usize = 128;
const HASHED_PREFIX: &str = "id-";

/// On-disk layout of a dataset file.
#[derive(Serialize)]
struct DatasetFileRef<'a> {
	id: &'a str,
	kind: DatasetKind,
	size: usize,
	records: &'a [Record],
}

#[derive(Deserialize)]
struct DatasetFile {
	id: String,
	kind: DatasetKind,
	size: usize,
	records: Vec<Record>,
}

/// Leading fields of a dataset file; `records` is skipped.
#[derive(Deserialize)]
struct DatasetHeader {
	id: String,
	kind: DatasetKind,
	size: usize,
}

#[derive(Debug, Clone)]
pub struct DatasetStore {
	root: PathBuf,
}

impl DatasetStore {
	/// Open (creating if needed) the store at `root` and remove temp files
	/// left behind by an interrupted `put`.
	pub async fn open<P: AsRef<Path>>(root: P) -> InsightResult<Self> {
		let root = root.as_ref().to_path_buf();
		fs::create_dir_all(&root).await?;

		let store = Self { root };
		store.sweep_temp_files().await?;
		Ok(store)
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn path_for(&self, id: &str) -> PathBuf {
		self.root.join(format!("{}.{}", file_stem_for(id), DATASET_EXT))
	}

	fn temp_path_for(&self, id: &str) -> PathBuf {
		self.root.join(format!(
			".{}.{}.{}",
			file_stem_for(id),
			Uuid::new_v4().simple(),
			TEMP_EXT
		))
	}

	pub async fn exists(&self, id: &str) -> InsightResult<bool> {
		Ok(fs::try_exists(self.path_for(id)).await?)
	}

	/// Durably write a new dataset. Fails with `Conflict` if `id` is taken.
	pub async fn put(&self, id: &str, kind: DatasetKind, records: &[Record]) -> InsightResult<()> {
		if self.exists(id).await? {
			return Err(InsightError::Conflict(format!("dataset '{}' already exists", id)));
		}

		let file = DatasetFileRef {
			id,
			kind,
			size: records.len(),
			records,
		};
		let bytes = serde_json::to_vec(&file)
			.map_err(|e| InsightError::Storage(format!("Failed to serialize dataset: {}", e)))?;

		let temp_path = self.temp_path_for(id);
		if let Err(e) = self.publish(&temp_path, &self.path_for(id), &bytes).await {
			let _ = fs::remove_file(&temp_path).await;
			return Err(e);
		}

		debug!(id, bytes = bytes.len(), "Dataset file written");
		Ok(())
	}

	async fn publish(&self, temp_path: &Path, path: &Path, bytes: &[u8]) -> InsightResult<()> {
		let mut file = fs::File::create(temp_path).await?;
		file.write_all(bytes).await?;
		file.sync_all().await?;
		drop(file);

		fs::rename(temp_path, path).await?;
		self.sync_dir().await;
		Ok(())
	}

	async fn sync_dir(&self) {
		if let Ok(dir) = fs::File::open(&self.root).await {
			let _ = dir.sync_all().await;
		}
	}

	/// Delete a dataset's file. Fails with `NotFound` if absent.
	pub async fn remove(&self, id: &str) -> InsightResult<()> {
		match fs::remove_file(self.path_for(id)).await {
			Ok(()) => {
				self.sync_dir().await;
				Ok(())
			}
			Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(id)),
			Err(e) => Err(e.into()),
		}
	}

	/// Load a dataset with all of its records.
	pub async fn get(&self, id: &str) -> InsightResult<Dataset> {
		let bytes = match fs::read(self.path_for(id)).await {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found(id)),
			Err(e) => return Err(e.into()),
		};

		let file: DatasetFile = serde_json::from_slice(&bytes)
			.map_err(|e| InsightError::Storage(format!("Failed to parse dataset '{}': {}", id, e)))?;

		if file.id != id {
			return Err(InsightError::Storage(format!(
				"dataset file for '{}' holds '{}'",
				id, file.id
			)));
		}
		if file.size != file.records.len() {
			return Err(InsightError::Storage(format!(
				"dataset '{}' declares {} records but holds {}",
				id,
				file.size,
				file.records.len()
			)));
		}
		if file.records.iter().any(|r| r.kind() != file.kind) {
			return Err(InsightError::Storage(format!(
				"dataset '{}' holds records that are not {}",
				id, file.kind
			)));
		}

		Ok(Dataset {
			id: file.id,
			kind: file.kind,
			records: file.records,
		})
	}

	/// Every dataset currently on disk, sorted by id.
	pub async fn list(&self) -> InsightResult<Vec<DatasetInfo>> {
		let mut infos = Vec::new();
		let mut entries = fs::read_dir(&self.root).await?;

		while let Some(entry) = entries.next_entry().await? {
			let path = entry.path();
			let Some(stem) = dataset_stem(&path) else {
				continue;
			};

			match read_header(&path).await {
				Ok(header) if file_stem_for(&header.id) == stem => infos.push(DatasetInfo {
					id: header.id,
					kind: header.kind,
					num_rows: header.size,
				}),
				Ok(header) => {
					warn!(path = %path.display(), id = %header.id, "Skipping misnamed dataset file");
				}
				Err(e) => {
					warn!(path = %path.display(), error = %e, "Skipping unreadable dataset file");
				}
			}
		}

		infos.sort_by(|a, b| a.id.cmp(&b.id));
		Ok(infos)
	}

	async fn sweep_temp_files(&self) -> InsightResult<()> {
		let mut entries = fs::read_dir(&self.root).await?;
		while let Some(entry) = entries.next_entry().await? {
			let name = entry.file_name();
			let name = name.to_string_lossy();
			if name.starts_with('.') && name.ends_with(&format!(".{}", TEMP_EXT)) {
				warn!(file = %name, "Removing stale temporary dataset file");
				fs::remove_file(entry.path()).await?;
			}
		}
		Ok(())
	}
}

/// File stem for `id`: lowercase hex of its bytes, or `id-<uuid v5>` when the
/// hex form is too long. The prefix keeps the two forms from colliding.
fn file_stem_for(id: &str) -> String {
	let hex = hex::encode(id.as_bytes());
	if hex.len() <= MAX_HEX_STEM {
		hex
	} else {
		let hashed = Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes());
		format!("{}{}", HASHED_PREFIX, hashed.simple())
	}
}

fn not_found(id: &str) -> InsightError {
	InsightError::NotFound(format!("dataset '{}'", id))
}

/// Hex stem of a published dataset file, `None` for anything else.
fn dataset_stem(path: &Path) -> Option<String> {
	if path.extension()? != DATASET_EXT {
		return None;
	}
	let stem = path.file_stem()?.to_str()?;
	if stem.starts_with('.') {
		return None;
	}
	Some(stem.to_string())
}

async fn read_header(path: &Path) -> InsightResult<DatasetHeader> {
	let bytes = fs::read(path).await?;
	serde_json::from_slice(&bytes)
		.map_err(|e| InsightError::Storage(format!("Failed to parse header: {}", e)))
}
