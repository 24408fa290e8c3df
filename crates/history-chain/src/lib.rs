//! Chain transaction lookup for the intent history reconciler.
//!
//! Fetches a transaction together with its execution receipts so records
//! observed only by hash can be decoded and scanned.

use async_trait::async_trait;
use history_types::{ConfigSchema, TransactionDetails};
use thiserror::Error;
use tracing::debug;

pub mod rpc;

/// Re-export implementations
pub mod implementations {
	pub mod near_rpc;
}

#[derive(Debug, Error)]
pub enum ChainError {
	#[error("Transport error: {0}")]
	Transport(String),
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	#[error("Node error: {0}")]
	Node(String),
}

impl From<rpc::RpcError> for ChainError {
	fn from(err: rpc::RpcError) -> Self {
		match err {
			rpc::RpcError::Transport(msg) => ChainError::Transport(msg),
			rpc::RpcError::Status(code) => ChainError::Transport(format!("HTTP {}", code)),
			rpc::RpcError::InvalidResponse(msg) => ChainError::InvalidResponse(msg),
			rpc::RpcError::Rpc { name, message, .. } => {
				ChainError::Node(format!("{}: {}", name, message))
			}
		}
	}
}

/// Backend able to look up a transaction and its receipts.
#[async_trait]
pub trait ChainInterface: Send + Sync {
	/// Schema of the implementation's config table.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Looks up `hash` sent by `account_id`.
	///
	/// Returns `Ok(None)` when the node does not know the transaction.
	async fn get_transaction_details(
		&self,
		hash: &str,
		account_id: &str,
	) -> Result<Option<TransactionDetails>, ChainError>;
}

/// Service wrapping the configured chain backend.
pub struct ChainService {
	implementation: Box<dyn ChainInterface>,
}

impl ChainService {
	pub fn new(implementation: Box<dyn ChainInterface>) -> Self {
		Self { implementation }
	}

	pub async fn get_transaction_details(
		&self,
		hash: &str,
		account_id: &str,
	) -> Result<Option<TransactionDetails>, ChainError> {
		let details = self
			.implementation
			.get_transaction_details(hash, account_id)
			.await?;
		debug!(
			"Transaction {} lookup: {}",
			hash,
			if details.is_some() { "found" } else { "unknown" }
		);
		Ok(details)
	}
}
