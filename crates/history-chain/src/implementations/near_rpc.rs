//! Chain lookup through the NEAR `tx` JSON-RPC method.

use async_trait::async_trait;
use history_types::{
	http_url, ConfigSchema, Field, FieldType, Schema, TransactionDetails, ValidationError,
};

use crate::rpc::NearRpcClient;
use crate::{ChainError, ChainInterface};

/// Cause reported by the node for hashes it has never seen.
const UNKNOWN_TRANSACTION: &str = "UNKNOWN_TRANSACTION";

pub struct NearRpcChain {
	client: NearRpcClient,
}

impl NearRpcChain {
	pub fn new(client: NearRpcClient) -> Self {
		Self { client }
	}
}

pub struct NearRpcChainSchema;

impl ConfigSchema for NearRpcChainSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("rpc_url", FieldType::String).with_validator(http_url)],
			vec![Field::new(
				"timeout_ms",
				FieldType::Integer {
					min: Some(100),
					max: None,
				},
			)],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl ChainInterface for NearRpcChain {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NearRpcChainSchema)
	}

	async fn get_transaction_details(
		&self,
		hash: &str,
		account_id: &str,
	) -> Result<Option<TransactionDetails>, ChainError> {
		match self
			.client
			.call::<TransactionDetails>("tx", serde_json::json!([hash, account_id]))
			.await
		{
			Ok(details) => Ok(Some(details)),
			Err(e) if e.cause() == Some(UNKNOWN_TRANSACTION) => Ok(None),
			Err(e) => Err(e.into()),
		}
	}
}

/// Factory function to create a chain backend from configuration.
///
/// Configuration parameters:
/// - `rpc_url`: NEAR JSON-RPC endpoint
/// - `timeout_ms`: HTTP timeout (default: 10000)
pub fn create_chain(config: &toml::Value) -> Box<dyn ChainInterface> {
	Box::new(NearRpcChain::new(NearRpcClient::from_config(config)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ChainService;
	use serde_json::json;
	use std::time::Duration;
	use wiremock::matchers::{body_partial_json, method};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn chain_for(server: &MockServer) -> ChainService {
		ChainService::new(Box::new(NearRpcChain::new(NearRpcClient::new(
			server.uri(),
			Duration::from_secs(2),
		))))
	}

	#[tokio::test]
	async fn test_fetches_transaction_and_receipts() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({ "method": "tx", "params": ["9xQ", "alice.near"] })))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"id": "dontcare",
				"result": {
					"transaction": {
						"signer_id": "alice.near",
						"receiver_id": "wrap.near",
						"actions": [{ "FunctionCall": { "method_name": "near_deposit", "args": "e30=", "gas": 1, "deposit": "5" } }]
					},
					"receipts_outcome": [
						{ "id": "r1", "outcome": { "logs": ["Deposit 5 NEAR to alice.near"], "status": { "SuccessValue": "" } } }
					]
				}
			})))
			.mount(&server)
			.await;

		let details = chain_for(&server)
			.get_transaction_details("9xQ", "alice.near")
			.await
			.unwrap()
			.unwrap();

		assert_eq!(details.transaction.receiver_id, "wrap.near");
		assert_eq!(
			details.receipts_outcome[0].outcome.logs[0],
			"Deposit 5 NEAR to alice.near"
		);
	}

	#[tokio::test]
	async fn test_unknown_transaction_is_none() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"id": "dontcare",
				"error": {
					"name": "HANDLER_ERROR",
					"cause": { "name": "UNKNOWN_TRANSACTION", "info": {} },
					"message": "Transaction not found"
				}
			})))
			.mount(&server)
			.await;

		let details = chain_for(&server)
			.get_transaction_details("missing", "alice.near")
			.await
			.unwrap();
		assert!(details.is_none());
	}

	#[tokio::test]
	async fn test_http_failure_is_transport_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(503))
			.mount(&server)
			.await;

		let result = chain_for(&server)
			.get_transaction_details("9xQ", "alice.near")
			.await;
		assert!(matches!(result, Err(ChainError::Transport(_))));
	}

	#[test]
	fn test_config_schema() {
		let chain = create_chain(&toml::Value::Table(Default::default()));
		let valid: toml::Value = toml::from_str("rpc_url = \"https://rpc.testnet.near.org\"").unwrap();
		assert!(chain.config_schema().validate(&valid).is_ok());

		let missing: toml::Value = toml::from_str("timeout_ms = 1000").unwrap();
		assert!(chain.config_schema().validate(&missing).is_err());
	}
}
