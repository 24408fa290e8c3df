//! Minimal NEAR JSON-RPC client.
//!
//! Shared by the chain lookup and the status oracle implementations.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default public mainnet endpoint.
pub const DEFAULT_RPC_URL: &str = "https://rpc.mainnet.near.org";
/// Default HTTP timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum RpcError {
	#[error("HTTP request failed: {0}")]
	Transport(String),
	#[error("HTTP request failed with status: {0}")]
	Status(u16),
	#[error("RPC error {name}: {message}")]
	Rpc {
		name: String,
		cause: Option<String>,
		message: String,
	},
	#[error("Invalid RPC response: {0}")]
	InvalidResponse(String),
}

impl RpcError {
	/// Name of the error cause reported by the node, e.g. `UNKNOWN_TRANSACTION`.
	pub fn cause(&self) -> Option<&str> {
		match self {
			RpcError::Rpc { cause, .. } => cause.as_deref(),
			_ => None,
		}
	}
}

#[derive(Deserialize)]
struct RpcResponse<T> {
	result: Option<T>,
	error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	cause: Option<RpcErrorCause>,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	data: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RpcErrorCause {
	name: String,
}

#[derive(Clone)]
pub struct NearRpcClient {
	client: reqwest::Client,
	rpc_url: String,
}

impl NearRpcClient {
	pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Self {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.unwrap_or_else(|_| reqwest::Client::new());

		Self {
			client,
			rpc_url: rpc_url.into(),
		}
	}

	/// Builds a client from an implementation config table.
	///
	/// Configuration parameters:
	/// - `rpc_url`: JSON-RPC endpoint (default: mainnet)
	/// - `timeout_ms`: HTTP timeout (default: 10000)
	pub fn from_config(config: &toml::Value) -> Self {
		let rpc_url = config
			.get("rpc_url")
			.and_then(|v| v.as_str())
			.unwrap_or(DEFAULT_RPC_URL)
			.to_string();
		let timeout_ms = config
			.get("timeout_ms")
			.and_then(|v| v.as_integer())
			.map(|v| v as u64)
			.unwrap_or(DEFAULT_TIMEOUT_MS);

		Self::new(rpc_url, Duration::from_millis(timeout_ms))
	}

	pub fn rpc_url(&self) -> &str {
		&self.rpc_url
	}

	/// Sends one JSON-RPC request and returns its `result`.
	pub async fn call<T: DeserializeOwned>(
		&self,
		method: &str,
		params: serde_json::Value,
	) -> Result<T, RpcError> {
		let body = serde_json::json!({
			"jsonrpc": "2.0",
			"id": "dontcare",
			"method": method,
			"params": params,
		});

		debug!("Calling {} on {}", method, self.rpc_url);

		let response = self
			.client
			.post(&self.rpc_url)
			.json(&body)
			.send()
			.await
			.map_err(|e| RpcError::Transport(e.to_string()))?;

		if !response.status().is_success() {
			return Err(RpcError::Status(response.status().as_u16()));
		}

		let parsed: RpcResponse<T> = response
			.json()
			.await
			.map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

		if let Some(error) = parsed.error {
			return Err(RpcError::Rpc {
				name: error.name.unwrap_or_else(|| "UNKNOWN".to_string()),
				cause: error.cause.map(|c| c.name),
				message: error
					.message
					.or_else(|| error.data.map(|d| d.to_string()))
					.unwrap_or_default(),
			});
		}

		parsed
			.result
			.ok_or_else(|| RpcError::InvalidResponse("Missing result".to_string()))
	}
}
