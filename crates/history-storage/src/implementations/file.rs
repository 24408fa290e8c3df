//! File backend for the reconciler's persistent state.
//!
//! Two kinds of entries live here: the published history of an account
//! (`history:<account_id>`) and the cached confirm-swap payload of the last
//! submitted swap (`local:confirm_swap`). Each entry is one JSON document.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Default directory when `storage_path` is not configured.
const DEFAULT_STORAGE_PATH: &str = "./data/storage";

fn backend_error(e: std::io::Error) -> StorageError {
	StorageError::Backend(e.to_string())
}

/// Keeps each entry in `<base_path>/<namespace>_<id>.json`.
///
/// Account ids contain dots but never path separators, so the file name of
/// `history:alice.near` is `history_alice.near.json`.
pub struct FileStorage {
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	fn entry_path(&self, key: &str) -> PathBuf {
		let file_stem = key.replace(['/', ':', '\\'], "_");
		self.base_path.join(format!("{}.json", file_stem))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		fs::read(self.entry_path(key)).await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				StorageError::NotFound
			} else {
				backend_error(e)
			}
		})
	}

	/// Replaces the whole entry. A history is rewritten once per cycle, so
	/// the new document goes to a sibling `.tmp` file first and is renamed
	/// over the old one.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.entry_path(key);
		if let Some(dir) = path.parent() {
			fs::create_dir_all(dir).await.map_err(backend_error)?;
		}

		let staged = path.with_extension("tmp");
		fs::write(&staged, value).await.map_err(backend_error)?;
		fs::rename(&staged, &path).await.map_err(backend_error)
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.entry_path(key)).await {
			Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(backend_error(e)),
			_ => Ok(()),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.entry_path(key))
			.await
			.map_err(backend_error)
	}
}

/// Builds a [`FileStorage`] from `[storage.implementations.file]`.
///
/// `storage_path` is the directory holding history and cache entries
/// (default `./data/storage`).
pub fn create_storage(config: &toml::Value) -> Box<dyn StorageInterface> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	Box::new(FileStorage::new(PathBuf::from(storage_path)))
}
