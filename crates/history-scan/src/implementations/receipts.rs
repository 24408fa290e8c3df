//! Receipt based failure detection.

use async_trait::async_trait;
use history_decoder::decode_args;
use history_types::{
	methods, ConfigSchema, Field, FieldType, IntentDetails, ReceiptOutcome, Schema,
	ValidationError,
};
use serde::Deserialize;

use crate::{ScanError, ScanInterface, ScanResult};

/// Flags failed receipts and, optionally, fully refunded token transfers.
pub struct ReceiptScan {
	detect_refunds: bool,
}

impl ReceiptScan {
	pub fn new(detect_refunds: bool) -> Self {
		Self { detect_refunds }
	}
}

#[derive(Deserialize)]
struct TransferArgs {
	#[serde(with = "history_decoder::serde_helpers::amount_string")]
	amount: String,
}

/// Whether some receipt logs `Refund <amount> from <receiver> to <signer>`
/// for exactly the transferred amount.
fn is_full_refund(
	receipts: &[ReceiptOutcome],
	amount: &str,
	receiver_id: &str,
	signer_id: &str,
) -> bool {
	let expected = format!("Refund {} from {} to {}", amount, receiver_id, signer_id);
	receipts
		.iter()
		.flat_map(|receipt| receipt.outcome.logs.iter())
		.any(|log| log.trim() == expected)
}

pub struct ReceiptScanSchema;

impl ConfigSchema for ReceiptScanSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![Field::new("detect_refunds", FieldType::Boolean)]).validate(config)
	}
}

#[async_trait]
impl ScanInterface for ReceiptScan {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(ReceiptScanSchema)
	}

	async fn scan(&self, details: &IntentDetails) -> Result<ScanResult, ScanError> {
		let Some(transaction) = &details.transaction else {
			return Ok(ScanResult::default());
		};
		let receipts = details.receipts_outcome.as_deref().unwrap_or_default();

		if receipts.iter().any(|receipt| receipt.outcome.status.is_failure()) {
			return Ok(ScanResult { is_failure: true });
		}

		if !self.detect_refunds {
			return Ok(ScanResult::default());
		}

		let Some(call) = transaction.first_function_call() else {
			return Ok(ScanResult::default());
		};
		if call.method_name != methods::FT_TRANSFER_CALL {
			return Ok(ScanResult::default());
		}

		let args: TransferArgs =
			decode_args(&call.args).map_err(|e| ScanError::Decode(e.to_string()))?;

		Ok(ScanResult {
			is_failure: is_full_refund(
				receipts,
				&args.amount,
				&transaction.receiver_id,
				&transaction.signer_id,
			),
		})
	}
}

/// Factory function to create a receipt scan from configuration.
///
/// Configuration parameters:
/// - `detect_refunds`: treat a full token refund as failure (default: true)
pub fn create_scan(config: &toml::Value) -> Box<dyn ScanInterface> {
	let detect_refunds = config
		.get("detect_refunds")
		.and_then(|v| v.as_bool())
		.unwrap_or(true);

	Box::new(ReceiptScan::new(detect_refunds))
}

#[cfg(test)]
mod tests {
	use super::*;
	use base64::{engine::general_purpose, Engine as _};
	use history_types::{
		Action, ExecutionOutcome, ExecutionStatus, FunctionCallAction, NearTransaction,
	};
	use serde_json::json;

	fn transfer_details(logs: Vec<&str>, status: ExecutionStatus) -> IntentDetails {
		IntentDetails {
			transaction: Some(NearTransaction {
				signer_id: "alice.near".into(),
				receiver_id: "usdt.tether-token.near".into(),
				actions: vec![Action::FunctionCall {
					function_call: FunctionCallAction {
						method_name: "ft_transfer_call".into(),
						args: general_purpose::STANDARD.encode(
							json!({ "receiver_id": "intents.near", "amount": "1000", "msg": "{}" })
								.to_string(),
						),
						gas: 1,
						deposit: "1".into(),
					},
				}],
			}),
			receipts_outcome: Some(vec![ReceiptOutcome {
				id: "r1".into(),
				outcome: ExecutionOutcome {
					logs: logs.into_iter().map(String::from).collect(),
					status,
					..Default::default()
				},
			}]),
			..Default::default()
		}
	}

	#[tokio::test]
	async fn test_failed_receipt() {
		let details = transfer_details(vec![], ExecutionStatus::Failure(json!({"ActionError": {}})));
		let result = ReceiptScan::new(false).scan(&details).await.unwrap();
		assert!(result.is_failure);
	}

	#[tokio::test]
	async fn test_full_refund_is_failure() {
		let details = transfer_details(
			vec!["Refund 1000 from usdt.tether-token.near to alice.near"],
			ExecutionStatus::SuccessValue(String::new()),
		);
		assert!(ReceiptScan::new(true).scan(&details).await.unwrap().is_failure);
		assert!(!ReceiptScan::new(false).scan(&details).await.unwrap().is_failure);
	}

	#[tokio::test]
	async fn test_partial_refund_is_not_failure() {
		let details = transfer_details(
			vec!["Refund 400 from usdt.tether-token.near to alice.near"],
			ExecutionStatus::SuccessValue(String::new()),
		);
		assert!(!ReceiptScan::new(true).scan(&details).await.unwrap().is_failure);
	}

	#[tokio::test]
	async fn test_missing_transaction_reports_no_failure() {
		let result = ReceiptScan::new(true)
			.scan(&IntentDetails::default())
			.await
			.unwrap();
		assert_eq!(result, ScanResult::default());
	}
}
