//! Persistent history of reconciled records, one list per account.

use history_types::IntentRecord;
use std::sync::Arc;

use crate::{StorageError, StorageService};

pub const HISTORY_NAMESPACE: &str = "history";

#[derive(Clone)]
pub struct HistoryStore {
	storage: Arc<StorageService>,
	account_id: String,
}

impl HistoryStore {
	pub fn new(storage: Arc<StorageService>, account_id: impl Into<String>) -> Self {
		Self {
			storage,
			account_id: account_id.into(),
		}
	}

	pub fn account_id(&self) -> &str {
		&self.account_id
	}

	/// Replaces the stored history with `records`.
	pub async fn save(&self, records: &[IntentRecord]) -> Result<(), StorageError> {
		self.storage
			.store(HISTORY_NAMESPACE, &self.account_id, &records)
			.await
	}

	/// Loads the stored history; an account without history yields an empty list.
	pub async fn load(&self) -> Result<Vec<IntentRecord>, StorageError> {
		match self
			.storage
			.retrieve(HISTORY_NAMESPACE, &self.account_id)
			.await
		{
			Ok(records) => Ok(records),
			Err(StorageError::NotFound) => Ok(Vec::new()),
			Err(e) => Err(e),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::memory::MemoryStorage;
	use history_types::HistoryStatus;

	#[tokio::test]
	async fn test_history_is_per_account() {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let alice = HistoryStore::new(storage.clone(), "alice.near");
		let bob = HistoryStore::new(storage, "bob.near");

		let record = IntentRecord::new("9xQ", 1).with_status(HistoryStatus::Deposit);
		alice.save(&[record.clone()]).await.unwrap();

		assert_eq!(alice.load().await.unwrap(), vec![record]);
		assert!(bob.load().await.unwrap().is_empty());
	}
}
