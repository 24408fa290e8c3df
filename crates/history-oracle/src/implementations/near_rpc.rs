//! Oracle backed by a view call on the intent contract.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use history_chain::rpc::NearRpcClient;
use history_types::{http_url, ConfigSchema, Field, FieldType, Schema, ValidationError};
use serde::Deserialize;

use crate::{OracleError, OracleInterface, RawIntentStatus};

/// View method exposed by the intent contracts.
pub const DEFAULT_METHOD_NAME: &str = "get_intent";

pub struct NearRpcOracle {
	client: NearRpcClient,
	method_name: String,
}

impl NearRpcOracle {
	pub fn new(client: NearRpcClient, method_name: impl Into<String>) -> Self {
		Self {
			client,
			method_name: method_name.into(),
		}
	}
}

#[derive(Deserialize)]
struct CallFunctionResult {
	#[serde(default)]
	result: Option<Vec<u8>>,
	#[serde(default)]
	error: Option<String>,
}

pub struct NearRpcOracleSchema;

impl ConfigSchema for NearRpcOracleSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("rpc_url", FieldType::String).with_validator(http_url)],
			vec![
				Field::new("method_name", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(name) if !name.is_empty() => Ok(()),
						_ => Err("method_name cannot be empty".to_string()),
					}
				}),
				Field::new(
					"timeout_ms",
					FieldType::Integer {
						min: Some(100),
						max: None,
					},
				),
			],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl OracleInterface for NearRpcOracle {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NearRpcOracleSchema)
	}

	async fn get_intent_status(
		&self,
		receiver_id: &str,
		intent_id: &str,
	) -> Result<Option<RawIntentStatus>, OracleError> {
		let args = serde_json::json!({ "id": intent_id }).to_string();
		let params = serde_json::json!({
			"request_type": "call_function",
			"finality": "final",
			"account_id": receiver_id,
			"method_name": self.method_name,
			"args_base64": general_purpose::STANDARD.encode(args),
		});

		let call: CallFunctionResult = self.client.call("query", params).await?;
		if let Some(error) = call.error {
			return Err(OracleError::Contract(error));
		}

		let bytes = call
			.result
			.ok_or_else(|| OracleError::InvalidResponse("Missing call result".to_string()))?;

		serde_json::from_slice::<Option<RawIntentStatus>>(&bytes)
			.map_err(|e| OracleError::InvalidResponse(e.to_string()))
	}
}

/// Factory function to create an oracle backend from configuration.
///
/// Configuration parameters:
/// - `rpc_url`: NEAR JSON-RPC endpoint
/// - `method_name`: view method returning the intent (default: "get_intent")
/// - `timeout_ms`: HTTP timeout (default: 10000)
pub fn create_oracle(config: &toml::Value) -> Box<dyn OracleInterface> {
	let method_name = config
		.get("method_name")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_METHOD_NAME)
		.to_string();

	Box::new(NearRpcOracle::new(
		NearRpcClient::from_config(config),
		method_name,
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::OracleService;
	use history_types::HistoryStatus;
	use serde_json::json;
	use std::time::Duration;
	use wiremock::matchers::{body_partial_json, method};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	async fn mount_view_result(server: &MockServer, payload: &str) {
		Mock::given(method("POST"))
			.and(body_partial_json(json!({
				"method": "query",
				"params": {
					"request_type": "call_function",
					"account_id": "intents.near",
					"method_name": "get_intent",
					"args_base64": general_purpose::STANDARD.encode("{\"id\":\"abc\"}"),
				}
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"id": "dontcare",
				"result": {
					"result": payload.as_bytes(),
					"logs": [],
					"block_height": 1,
					"block_hash": "h"
				}
			})))
			.mount(server)
			.await;
	}

	fn oracle_for(server: &MockServer) -> NearRpcOracle {
		NearRpcOracle::new(
			NearRpcClient::new(server.uri(), Duration::from_secs(2)),
			DEFAULT_METHOD_NAME,
		)
	}

	#[tokio::test]
	async fn test_reads_intent_status() {
		let server = MockServer::start().await;
		mount_view_result(&server, r#"{"status":"available","initiator":"alice.near"}"#).await;

		let raw = oracle_for(&server)
			.get_intent_status("intents.near", "abc")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(raw.status, "available");
		assert_eq!(raw.extra.get("initiator"), Some(&json!("alice.near")));
	}

	#[tokio::test]
	async fn test_null_result_is_unknown() {
		let server = MockServer::start().await;
		mount_view_result(&server, "null").await;

		let service = OracleService::new(Box::new(oracle_for(&server)));
		assert_eq!(service.get_intent_status("intents.near", "abc").await, None);
	}

	#[tokio::test]
	async fn test_service_maps_v1_available() {
		let server = MockServer::start().await;
		mount_view_result(&server, r#"{"status":"available"}"#).await;

		let service = OracleService::new(Box::new(oracle_for(&server)));
		assert_eq!(
			service.get_intent_status("intents.near", "abc").await,
			Some(HistoryStatus::Available)
		);
	}

	#[tokio::test]
	async fn test_contract_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"id": "dontcare",
				"result": { "error": "wasm execution failed", "logs": [] }
			})))
			.mount(&server)
			.await;

		let result = oracle_for(&server)
			.get_intent_status("intents.near", "abc")
			.await;
		assert!(matches!(result, Err(OracleError::Contract(_))));
	}

	#[test]
	fn test_config_schema_rejects_empty_method() {
		let oracle = create_oracle(&toml::Value::Table(Default::default()));
		let config: toml::Value =
			toml::from_str("rpc_url = \"https://rpc.mainnet.near.org\"\nmethod_name = \"\"")
				.unwrap();
		assert!(oracle.config_schema().validate(&config).is_err());
	}
}
