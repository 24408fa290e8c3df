//! Intent status oracle.
//!
//! Asks the intent contract which lifecycle state it holds for an intent id
//! and maps the raw vocabulary onto [`HistoryStatus`].

use async_trait::async_trait;
use history_types::{ConfigSchema, HistoryStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Re-export implementations
pub mod implementations {
	pub mod near_rpc;
}

#[derive(Debug, Error)]
pub enum OracleError {
	#[error("Transport error: {0}")]
	Transport(String),
	#[error("Contract error: {0}")]
	Contract(String),
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
}

impl From<history_chain::rpc::RpcError> for OracleError {
	fn from(err: history_chain::rpc::RpcError) -> Self {
		use history_chain::rpc::RpcError;
		match err {
			RpcError::Transport(msg) => OracleError::Transport(msg),
			RpcError::Status(code) => OracleError::Transport(format!("HTTP {}", code)),
			RpcError::InvalidResponse(msg) => OracleError::InvalidResponse(msg),
			RpcError::Rpc { name, message, .. } => {
				OracleError::Contract(format!("{}: {}", name, message))
			}
		}
	}
}

/// Intent state as stored by the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawIntentStatus {
	pub status: String,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Backend able to read an intent's state from its contract.
#[async_trait]
pub trait OracleInterface: Send + Sync {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Returns `Ok(None)` when the contract has no record of `intent_id`.
	async fn get_intent_status(
		&self,
		receiver_id: &str,
		intent_id: &str,
	) -> Result<Option<RawIntentStatus>, OracleError>;
}

/// Maps a raw contract status onto the unified vocabulary.
///
/// The v1 contract's `available` is folded into [`HistoryStatus::Available`];
/// unrecognised strings yield `None`.
pub fn map_status(raw: &str) -> Option<HistoryStatus> {
	match HistoryStatus::from_raw(raw)? {
		HistoryStatus::Intent1Available => Some(HistoryStatus::Available),
		status => Some(status),
	}
}

/// Service wrapping the configured oracle backend.
pub struct OracleService {
	implementation: Box<dyn OracleInterface>,
}

impl OracleService {
	pub fn new(implementation: Box<dyn OracleInterface>) -> Self {
		Self { implementation }
	}

	/// Current status of `intent_id` on contract `receiver_id`.
	///
	/// Never fails: transport and contract errors are logged and reported as
	/// "no knowledge".
	pub async fn get_intent_status(
		&self,
		receiver_id: &str,
		intent_id: &str,
	) -> Option<HistoryStatus> {
		let raw = match self
			.implementation
			.get_intent_status(receiver_id, intent_id)
			.await
		{
			Ok(Some(raw)) => raw,
			Ok(None) => {
				debug!("Oracle has no record of intent {}", intent_id);
				return None;
			}
			Err(e) => {
				warn!(
					"Failed to query status of intent {} on {}: {}",
					intent_id, receiver_id, e
				);
				return None;
			}
		};

		let status = map_status(&raw.status);
		if status.is_none() {
			warn!(
				"Ignoring unknown status '{}' for intent {}",
				raw.status, intent_id
			);
		}
		status
	}
}
