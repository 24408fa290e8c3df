//! Storage for the intent history reconciler.
//!
//! Provides a key-value backend abstraction with file and in-memory
//! implementations, a typed JSON service on top of it, the reader of the
//! persisted confirm-swap payload and the persistent history store.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod cache;
pub mod history;

pub use cache::ConfirmSwapCache;
pub use history::HistoryStore;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Not found")]
	NotFound,
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Low-level key-value operations a storage backend provides.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deleting a missing key is not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Typed JSON storage over a backend.
///
/// Values live under `<namespace>:<id>` keys.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&Self::key(namespace, id), bytes)
			.await
	}

	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}

	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}
}

/// Builds a backend by implementation name.
pub fn create_storage_backend(
	name: &str,
	config: &toml::Value,
) -> Result<Box<dyn StorageInterface>, StorageError> {
	match name {
		"file" => Ok(implementations::file::create_storage(config)),
		"memory" => Ok(implementations::memory::create_storage(config)),
		other => Err(StorageError::Backend(format!(
			"Unknown storage implementation: {}",
			other
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Entry {
		value: u32,
	}

	#[tokio::test]
	async fn test_namespaced_store_and_remove() {
		let storage = StorageService::new(Box::new(MemoryStorage::new()));
		storage.store("a", "1", &Entry { value: 7 }).await.unwrap();

		assert!(storage.exists("a", "1").await.unwrap());
		assert!(!storage.exists("b", "1").await.unwrap());
		assert_eq!(
			storage.retrieve::<Entry>("a", "1").await.unwrap(),
			Entry { value: 7 }
		);

		storage.remove("a", "1").await.unwrap();
		assert!(matches!(
			storage.retrieve::<Entry>("a", "1").await,
			Err(StorageError::NotFound)
		));
	}

	#[test]
	fn test_unknown_backend() {
		let config = toml::Value::Table(Default::default());
		assert!(create_storage_backend("redis", &config).is_err());
		assert!(create_storage_backend("memory", &config).is_ok());
	}
}
