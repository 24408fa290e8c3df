//! Confirm-swap payload persisted by the swap form before submission.

use serde::{Deserialize, Serialize};

use crate::record::TokenMeta;

/// Well-known key of the persisted confirm-swap blob.
pub const CONFIRM_SWAP_LOCAL_KEY: &str = "confirm_swap";

/// Swap terms the user confirmed, keyed by the intent client id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSwapPayload {
	#[serde(default)]
	pub client_id: Option<String>,
	#[serde(default)]
	pub token_in: Option<String>,
	#[serde(default)]
	pub token_out: Option<String>,
	#[serde(default)]
	pub selected_token_in: Option<TokenMeta>,
	#[serde(default)]
	pub selected_token_out: Option<TokenMeta>,
	/// Other form state stored alongside (estimate, route, ...).
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Envelope the payload is stored in: `{ "data": { ... } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfirmSwapEnvelope {
	pub data: ConfirmSwapPayload,
}
