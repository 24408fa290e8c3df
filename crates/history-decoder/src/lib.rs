//! Transaction decoder for intent history records.
//!
//! Turns the first function call of a NEAR transaction into a typed
//! [`MethodCall`]. Call arguments arrive base64 encoded; they are decoded to
//! UTF-8 JSON, and an `ft_transfer_call` message that is not JSON is read as
//! base64 borsh using the legacy swap schema. Nothing here panics on bad
//! input: every failure is a [`DecodeError`].

use base64::{engine::general_purpose, Engine as _};
use history_types::{methods, FunctionCallAction, NearTransaction};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

pub mod schema;
pub mod serde_helpers;

pub use schema::*;

use serde_helpers::amount_string;

#[derive(Debug, Error)]
pub enum DecodeError {
	#[error("Invalid base64 payload: {0}")]
	Base64(#[from] base64::DecodeError),
	#[error("Payload is not valid UTF-8: {0}")]
	Utf8(#[from] std::string::FromUtf8Error),
	#[error("Invalid JSON payload: {0}")]
	Json(#[from] serde_json::Error),
	#[error("Invalid borsh payload: {0}")]
	Borsh(#[from] std::io::Error),
}

/// Typed view of a recognised method invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodCall {
	FtTransferCall(FtTransferCall),
	RollbackIntent { id: String },
	NearDeposit,
	NearWithdraw { amount: String },
	StorageDeposit,
	NativeOnTransfer(IntentV1),
	Unknown { method_name: String },
}

/// A token transfer to an intent contract carrying a swap message.
#[derive(Debug, Clone, PartialEq)]
pub struct FtTransferCall {
	pub receiver_id: String,
	pub amount: String,
	pub message: SwapMessage,
}

#[derive(Deserialize)]
struct FtTransferCallArgs {
	receiver_id: String,
	#[serde(with = "amount_string")]
	amount: String,
	msg: String,
}

#[derive(Deserialize)]
struct IdArgs {
	id: String,
}

#[derive(Deserialize)]
struct AmountArgs {
	#[serde(with = "amount_string")]
	amount: String,
}

#[derive(Deserialize)]
struct MsgArgs {
	msg: String,
}

/// Decodes the first action of `transaction`.
///
/// Returns `Ok(None)` when the transaction has no leading function call.
pub fn decode_transaction(
	transaction: &NearTransaction,
) -> Result<Option<MethodCall>, DecodeError> {
	transaction
		.first_function_call()
		.map(decode_function_call)
		.transpose()
}

/// Decodes one function call into a [`MethodCall`].
pub fn decode_function_call(call: &FunctionCallAction) -> Result<MethodCall, DecodeError> {
	let decoded = match call.method_name.as_str() {
		methods::FT_TRANSFER_CALL => {
			let args: FtTransferCallArgs = decode_args(&call.args)?;
			MethodCall::FtTransferCall(FtTransferCall {
				message: decode_swap_message(&args.msg)?,
				receiver_id: args.receiver_id,
				amount: args.amount,
			})
		}
		methods::ROLLBACK_INTENT => {
			let args: IdArgs = decode_args(&call.args)?;
			MethodCall::RollbackIntent { id: args.id }
		}
		methods::NEAR_DEPOSIT => MethodCall::NearDeposit,
		methods::NEAR_WITHDRAW => {
			let args: AmountArgs = decode_args(&call.args)?;
			MethodCall::NearWithdraw {
				amount: args.amount,
			}
		}
		methods::STORAGE_DEPOSIT => MethodCall::StorageDeposit,
		methods::NATIVE_ON_TRANSFER => {
			let args: MsgArgs = decode_args(&call.args)?;
			MethodCall::NativeOnTransfer(serde_json::from_str(&args.msg)?)
		}
		other => MethodCall::Unknown {
			method_name: other.to_string(),
		},
	};

	Ok(decoded)
}

/// Base64 → UTF-8 → JSON.
pub fn decode_args<T: DeserializeOwned>(args_base64: &str) -> Result<T, DecodeError> {
	let bytes = general_purpose::STANDARD.decode(args_base64)?;
	let text = String::from_utf8(bytes)?;
	Ok(serde_json::from_str(&text)?)
}

/// Decodes an `ft_transfer_call` message.
///
/// A message holding a JSON object is read as JSON; anything else is taken
/// to be base64 encoded borsh of the legacy [`SwapAction`].
pub fn decode_swap_message(msg: &str) -> Result<SwapMessage, DecodeError> {
	if let Ok(value @ serde_json::Value::Object(_)) = serde_json::from_str::<serde_json::Value>(msg)
	{
		return Ok(serde_json::from_value(value)?);
	}

	tracing::debug!("Swap message is not JSON, decoding as borsh");
	let bytes = general_purpose::STANDARD.decode(msg.trim())?;
	Ok(SwapMessage::Legacy(decode_swap_action(&bytes)?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn call(method_name: &str, args: serde_json::Value) -> FunctionCallAction {
		FunctionCallAction {
			method_name: method_name.to_string(),
			args: general_purpose::STANDARD.encode(args.to_string()),
			gas: 300_000_000_000_000,
			deposit: "1".to_string(),
		}
	}

	fn legacy_action() -> SwapAction {
		SwapAction::CreateIntent(CreateIntent {
			id: "legacy-1".to_string(),
			intent: IntentStruct {
				initiator: "alice.near".to_string(),
				send: TokenAmount {
					token_id: "usdt.tether-token.near".to_string(),
					amount: 10_000_000,
				},
				receive: TokenAmount {
					token_id: "wrap.near".to_string(),
					amount: 2_000_000_000_000_000_000_000_000,
				},
				expiration: Expiration::Block(500),
				referral: None,
			},
		})
	}

	#[test]
	fn test_near_withdraw() {
		let decoded = decode_function_call(&call(
			"near_withdraw",
			json!({ "amount": "1000000000000000000000000" }),
		))
		.unwrap();
		assert_eq!(
			decoded,
			MethodCall::NearWithdraw {
				amount: "1000000000000000000000000".to_string()
			}
		);
	}

	#[test]
	fn test_storage_deposit_needs_no_args() {
		let mut storage = call("storage_deposit", json!({}));
		storage.args = String::new();
		assert_eq!(
			decode_function_call(&storage).unwrap(),
			MethodCall::StorageDeposit
		);
	}

	#[test]
	fn test_rollback_intent() {
		let decoded = decode_function_call(&call("rollback_intent", json!({ "id": "abc" }))).unwrap();
		assert_eq!(decoded, MethodCall::RollbackIntent { id: "abc".into() });
	}

	#[test]
	fn test_unknown_method() {
		let decoded = decode_function_call(&call("ft_transfer", json!({}))).unwrap();
		assert_eq!(
			decoded,
			MethodCall::Unknown {
				method_name: "ft_transfer".into()
			}
		);
	}

	#[test]
	fn test_ft_transfer_call_with_borsh_message() {
		let msg = general_purpose::STANDARD.encode(encode_swap_action(&legacy_action()).unwrap());
		let decoded = decode_function_call(&call(
			"ft_transfer_call",
			json!({ "receiver_id": "esmeralda.near", "amount": "10000000", "msg": msg }),
		))
		.unwrap();

		match decoded {
			MethodCall::FtTransferCall(transfer) => {
				assert_eq!(transfer.receiver_id, "esmeralda.near");
				assert_eq!(transfer.amount, "10000000");
				assert_eq!(transfer.message, SwapMessage::Legacy(legacy_action()));
			}
			other => panic!("unexpected call {:?}", other),
		}
	}

	#[test]
	fn test_ft_transfer_call_with_v1_json_message() {
		let msg = json!({
			"type": "create",
			"id": "v1",
			"asset_out": { "amount": "777" },
			"expiration": { "block_number": 42 }
		})
		.to_string();
		let decoded = decode_function_call(&call(
			"ft_transfer_call",
			json!({ "receiver_id": "intents.near", "amount": "5", "msg": msg }),
		))
		.unwrap();

		match decoded {
			MethodCall::FtTransferCall(transfer) => {
				assert_eq!(transfer.message.intent_id(), "v1");
				assert!(matches!(transfer.message, SwapMessage::V1(_)));
			}
			other => panic!("unexpected call {:?}", other),
		}
	}

	#[test]
	fn test_malformed_payloads_are_errors() {
		let mut bad_base64 = call("near_withdraw", json!({}));
		bad_base64.args = "***".to_string();
		assert!(matches!(
			decode_function_call(&bad_base64),
			Err(DecodeError::Base64(_))
		));

		let garbage = call(
			"ft_transfer_call",
			json!({ "receiver_id": "x.near", "amount": "1", "msg": "AAAA" }),
		);
		assert!(matches!(
			decode_function_call(&garbage),
			Err(DecodeError::Borsh(_))
		));

		// Native transfers never fall back to borsh
		let native = call("native_on_transfer", json!({ "msg": "AAAA" }));
		assert!(matches!(
			decode_function_call(&native),
			Err(DecodeError::Json(_))
		));
	}

	#[test]
	fn test_decode_transaction_without_function_call() {
		let tx = NearTransaction {
			signer_id: "alice.near".into(),
			receiver_id: "bob.near".into(),
			actions: vec![],
		};
		assert!(decode_transaction(&tx).unwrap().is_none());
	}
}
