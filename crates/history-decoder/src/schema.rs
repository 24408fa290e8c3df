//! Swap intent message shapes.
//!
//! Two generations of the intent contract are in use:
//!
//! - the legacy contract, whose `ft_transfer_call` message is a [`SwapAction`]
//!   either as JSON (`{"CreateIntent": {...}}`) or as base64 borsh;
//! - the v1 contract, whose message is a flat JSON [`IntentV1`] with
//!   `asset_out` and `expiration.block_number`.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::serde_helpers::{amount_string, u128_string};

/// Legacy intent contract action.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum SwapAction {
	CreateIntent(CreateIntent),
	ExecuteIntent(String),
	RollbackIntent(String),
}

impl SwapAction {
	pub fn intent_id(&self) -> &str {
		match self {
			SwapAction::CreateIntent(create) => &create.id,
			SwapAction::ExecuteIntent(id) | SwapAction::RollbackIntent(id) => id,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct CreateIntent {
	pub id: String,
	#[serde(rename = "IntentStruct")]
	pub intent: IntentStruct,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct IntentStruct {
	#[serde(default)]
	pub initiator: String,
	pub send: TokenAmount,
	pub receive: TokenAmount,
	pub expiration: Expiration,
	#[serde(default)]
	pub referral: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TokenAmount {
	pub token_id: String,
	#[serde(with = "u128_string")]
	pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum Expiration {
	Null,
	Time(u64),
	Block(u64),
}

/// Intent created against the v1 contract (cross-chain or single-chain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentV1 {
	pub id: String,
	pub asset_out: AssetOut,
	pub expiration: BlockExpiration,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetOut {
	#[serde(with = "amount_string")]
	pub amount: String,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockExpiration {
	pub block_number: u64,
}

/// Decoded `msg` of an `ft_transfer_call` to an intent contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SwapMessage {
	Legacy(SwapAction),
	V1(IntentV1),
}

impl SwapMessage {
	pub fn intent_id(&self) -> &str {
		match self {
			SwapMessage::Legacy(action) => action.intent_id(),
			SwapMessage::V1(intent) => &intent.id,
		}
	}
}

/// Encodes a legacy action with the borsh wire format.
pub fn encode_swap_action(action: &SwapAction) -> Result<Vec<u8>, std::io::Error> {
	borsh::to_vec(action)
}

/// Decodes a legacy action from borsh bytes; trailing bytes are an error.
pub fn decode_swap_action(bytes: &[u8]) -> Result<SwapAction, std::io::Error> {
	borsh::from_slice(bytes)
}
