//! NEAR transaction types as returned by the `tx` RPC method.
//!
//! Only the parts the reconciler inspects are modelled; everything else the
//! node returns is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// Signed transaction as observed on chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearTransaction {
	pub signer_id: String,
	pub receiver_id: String,
	#[serde(default)]
	pub actions: Vec<Action>,
}

impl NearTransaction {
	/// The function call carried by the first action, if that action is one.
	pub fn first_function_call(&self) -> Option<&FunctionCallAction> {
		match self.actions.first() {
			Some(Action::FunctionCall { function_call }) => Some(function_call),
			_ => None,
		}
	}
}

/// A single transaction action.
///
/// Function calls are the only actions the reconciler understands; any other
/// action kind is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
	FunctionCall {
		#[serde(rename = "FunctionCall")]
		function_call: FunctionCallAction,
	},
	Other(serde_json::Value),
}

/// Arguments of a `FunctionCall` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallAction {
	pub method_name: String,
	/// Base64 encoded call arguments.
	#[serde(default)]
	pub args: String,
	#[serde(default)]
	pub gas: u64,
	#[serde(default)]
	pub deposit: String,
}

/// Execution outcome of one receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptOutcome {
	#[serde(default)]
	pub id: String,
	pub outcome: ExecutionOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
	#[serde(default)]
	pub logs: Vec<String>,
	#[serde(default)]
	pub receipt_ids: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub executor_id: Option<String>,
	#[serde(default)]
	pub status: ExecutionStatus,
}

/// Receipt execution status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ExecutionStatus {
	#[default]
	Unknown,
	SuccessValue(String),
	SuccessReceiptId(String),
	Failure(serde_json::Value),
}

impl ExecutionStatus {
	pub fn is_failure(&self) -> bool {
		matches!(self, ExecutionStatus::Failure(_))
	}
}

/// Transaction plus receipts, the result of a chain lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
	pub transaction: NearTransaction,
	#[serde(default)]
	pub receipts_outcome: Vec<ReceiptOutcome>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_parse_rpc_transaction() {
		let raw = json!({
			"transaction": {
				"signer_id": "alice.near",
				"receiver_id": "wrap.near",
				"actions": [
					"CreateAccount",
					{ "FunctionCall": { "method_name": "near_withdraw", "args": "e30=", "gas": 300, "deposit": "1" } }
				],
				"nonce": 7
			},
			"receipts_outcome": [
				{
					"id": "r1",
					"block_hash": "abc",
					"outcome": { "logs": ["hello"], "receipt_ids": [], "status": { "SuccessValue": "" } }
				},
				{
					"id": "r2",
					"outcome": { "logs": [], "status": { "Failure": { "ActionError": {} } } }
				}
			]
		});

		let details: TransactionDetails = serde_json::from_value(raw).unwrap();
		assert_eq!(details.transaction.actions.len(), 2);
		// First action is not a function call
		assert!(details.transaction.first_function_call().is_none());
		assert_eq!(details.receipts_outcome[0].outcome.logs, vec!["hello"]);
		assert!(!details.receipts_outcome[0].outcome.status.is_failure());
		assert!(details.receipts_outcome[1].outcome.status.is_failure());
	}

	#[test]
	fn test_first_function_call() {
		let tx: NearTransaction = serde_json::from_value(json!({
			"signer_id": "alice.near",
			"receiver_id": "wrap.near",
			"actions": [{ "FunctionCall": { "method_name": "storage_deposit", "args": "", "gas": 1, "deposit": "0" } }]
		}))
		.unwrap();

		assert_eq!(
			tx.first_function_call().map(|c| c.method_name.as_str()),
			Some("storage_deposit")
		);
	}
}
