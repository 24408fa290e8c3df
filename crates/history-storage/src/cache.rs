//! Read access to the persisted confirm-swap payload.

use history_types::{ConfirmSwapEnvelope, ConfirmSwapPayload, CONFIRM_SWAP_LOCAL_KEY};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{StorageError, StorageService};

/// Namespace of values mirrored from the client's local storage.
pub const LOCAL_NAMESPACE: &str = "local";

/// The confirm-swap blob the swap form saves before submitting an intent.
#[derive(Clone)]
pub struct ConfirmSwapCache {
	storage: Arc<StorageService>,
}

impl ConfirmSwapCache {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Returns the cached payload, or `None` if it is absent or unreadable.
	pub async fn read(&self) -> Option<ConfirmSwapPayload> {
		match self
			.storage
			.retrieve::<ConfirmSwapEnvelope>(LOCAL_NAMESPACE, CONFIRM_SWAP_LOCAL_KEY)
			.await
		{
			Ok(envelope) => Some(envelope.data),
			Err(StorageError::NotFound) => {
				debug!("No confirm-swap payload cached");
				None
			}
			Err(e) => {
				warn!("Failed to read confirm-swap payload: {}", e);
				None
			}
		}
	}

	pub async fn write(&self, payload: ConfirmSwapPayload) -> Result<(), StorageError> {
		self.storage
			.store(
				LOCAL_NAMESPACE,
				CONFIRM_SWAP_LOCAL_KEY,
				&ConfirmSwapEnvelope { data: payload },
			)
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::memory::MemoryStorage;
	use crate::StorageInterface;

	#[tokio::test]
	async fn test_read_back_written_payload() {
		let cache = ConfirmSwapCache::new(Arc::new(StorageService::new(Box::new(
			MemoryStorage::new(),
		))));
		assert!(cache.read().await.is_none());

		let payload = ConfirmSwapPayload {
			client_id: Some("abc".into()),
			token_in: Some("1000".into()),
			..Default::default()
		};
		cache.write(payload.clone()).await.unwrap();
		assert_eq!(cache.read().await, Some(payload));
	}

	#[tokio::test]
	async fn test_unreadable_payload_is_none() {
		let backend = MemoryStorage::new();
		backend
			.set_bytes("local:confirm_swap", b"not json".to_vec())
			.await
			.unwrap();

		let cache = ConfirmSwapCache::new(Arc::new(StorageService::new(Box::new(backend))));
		assert!(cache.read().await.is_none());
	}
}
