//! Failure scan over a transaction and its receipts.
//!
//! A positive scan is authoritative: the reconciler marks the record
//! `Failed` regardless of what any other source reported in the same cycle.

use async_trait::async_trait;
use history_types::{ConfigSchema, IntentDetails};
use thiserror::Error;
use tracing::debug;

/// Re-export implementations
pub mod implementations {
	pub mod receipts;
}

#[derive(Debug, Error)]
pub enum ScanError {
	#[error("Cannot decode transaction: {0}")]
	Decode(String),
}

/// Outcome of a failure scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanResult {
	pub is_failure: bool,
}

#[async_trait]
pub trait ScanInterface: Send + Sync {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Judges whether the transaction in `details` failed.
	///
	/// Details without a transaction report no failure.
	async fn scan(&self, details: &IntentDetails) -> Result<ScanResult, ScanError>;
}

pub struct ScanService {
	implementation: Box<dyn ScanInterface>,
}

impl ScanService {
	pub fn new(implementation: Box<dyn ScanInterface>) -> Self {
		Self { implementation }
	}

	pub async fn scan(&self, hash: &str, details: &IntentDetails) -> Result<ScanResult, ScanError> {
		let result = self.implementation.scan(details).await?;
		if result.is_failure {
			debug!("Failure scan flagged transaction {}", hash);
		}
		Ok(result)
	}
}
