//! Intent history records.
//!
//! An [`IntentRecord`] is one tracked wallet action (a swap, a rollback, a
//! wrap/unwrap of NEAR, a storage deposit). Records are serialized with the
//! field names used by the client's persisted history so exported histories
//! can be loaded as-is.

use serde::{Deserialize, Serialize};

use crate::transaction::{NearTransaction, ReceiptOutcome};

/// Method names the reconciler recognises on the first transaction action.
pub mod methods {
	pub const FT_TRANSFER_CALL: &str = "ft_transfer_call";
	pub const ROLLBACK_INTENT: &str = "rollback_intent";
	pub const NEAR_DEPOSIT: &str = "near_deposit";
	pub const NEAR_WITHDRAW: &str = "near_withdraw";
	pub const STORAGE_DEPOSIT: &str = "storage_deposit";
	pub const NATIVE_ON_TRANSFER: &str = "native_on_transfer";
}

/// Unified lifecycle status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryStatus {
	Failed,
	Available,
	Completed,
	RolledBack,
	Withdraw,
	Deposit,
	StorageDeposit,
	#[serde(rename = "available")]
	Intent1Available,
	#[serde(rename = "executed")]
	Intent1Executed,
	#[serde(rename = "rolled_back")]
	Intent1RolledBack,
}

/// Statuses after which a record is no longer polled.
pub const TERMINAL_STATUSES: [HistoryStatus; 7] = [
	HistoryStatus::Failed,
	HistoryStatus::Completed,
	HistoryStatus::RolledBack,
	HistoryStatus::Withdraw,
	HistoryStatus::Deposit,
	HistoryStatus::StorageDeposit,
	HistoryStatus::Intent1RolledBack,
];

impl HistoryStatus {
	pub fn is_terminal(&self) -> bool {
		TERMINAL_STATUSES.contains(self)
	}

	/// Parses a raw status string using the wire names.
	pub fn from_raw(raw: &str) -> Option<Self> {
		serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
	}
}

/// Token metadata as selected in the swap form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMeta {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub defuse_asset_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub symbol: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default)]
	pub decimals: u32,
	/// Remaining fields (icon, chain info, balances) carried through untouched.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Token identifier and minor-unit amount of one side of a swap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetAmount {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub amount: Option<String>,
}

/// Block-height expiration of a recovered intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpirationInfo {
	#[serde(rename = "Block", default, skip_serializing_if = "Option::is_none")]
	pub block: Option<String>,
}

/// Swap terms reconstructed from the raw transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverDetails {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub send: Option<AssetAmount>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub receive: Option<AssetAmount>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expiration: Option<ExpirationInfo>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub receiver_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub msg: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub amount: Option<String>,
	/// Any other fields of the decoded intent message.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Details bag of a record, augmented field by field over time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentDetails {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub transaction: Option<NearTransaction>,
	#[serde(
		rename = "receipts_outcome",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub receipts_outcome: Option<Vec<ReceiptOutcome>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub recover_details: Option<RecoverDetails>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub selected_token_in: Option<TokenMeta>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub selected_token_out: Option<TokenMeta>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_in: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_out: Option<String>,
}

impl IntentDetails {
	/// Whether any of the four token fields is still unknown.
	pub fn is_token_detail_missing(&self) -> bool {
		self.selected_token_in.is_none()
			|| self.selected_token_out.is_none()
			|| self.token_in.is_none()
			|| self.token_out.is_none()
	}

	/// Method name of the first function call of the transaction.
	pub fn method_name(&self) -> Option<&str> {
		self.transaction
			.as_ref()
			.and_then(|tx| tx.first_function_call())
			.map(|call| call.method_name.as_str())
	}
}

/// One tracked wallet action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRecord {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_id: Option<String>,
	pub hash: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<HistoryStatus>,
	#[serde(default)]
	pub timestamp: u64,
	#[serde(default)]
	pub details: IntentDetails,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_message: Option<String>,
	#[serde(default)]
	pub is_closed: bool,
}

impl IntentRecord {
	pub fn new(hash: impl Into<String>, timestamp: u64) -> Self {
		Self {
			hash: hash.into(),
			timestamp,
			..Default::default()
		}
	}

	/// Whether the record is excluded from further polling.
	pub fn is_terminal(&self) -> bool {
		self.status.map(|s| s.is_terminal()).unwrap_or(false)
			|| self.error_message.is_some()
			|| self.is_closed
	}

	/// Returns the record with `status` applied, unless the current status is
	/// already terminal.
	pub fn with_status(mut self, status: HistoryStatus) -> Self {
		if self.status.map(|s| s.is_terminal()).unwrap_or(false) {
			return self;
		}
		self.status = Some(status);
		self
	}

	pub fn method_name(&self) -> Option<&str> {
		self.details.method_name()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_status_wire_names() {
		assert_eq!(
			HistoryStatus::from_raw("available"),
			Some(HistoryStatus::Intent1Available)
		);
		assert_eq!(
			HistoryStatus::from_raw("Available"),
			Some(HistoryStatus::Available)
		);
		assert_eq!(
			HistoryStatus::from_raw("rolled_back"),
			Some(HistoryStatus::Intent1RolledBack)
		);
		assert_eq!(HistoryStatus::from_raw("bogus"), None);
	}

	#[test]
	fn test_terminal_set() {
		assert!(HistoryStatus::Failed.is_terminal());
		assert!(HistoryStatus::Intent1RolledBack.is_terminal());
		assert!(!HistoryStatus::Available.is_terminal());
		assert!(!HistoryStatus::Intent1Available.is_terminal());
		assert!(!HistoryStatus::Intent1Executed.is_terminal());
	}

	#[test]
	fn test_terminal_status_is_frozen() {
		let record = IntentRecord::new("hash", 0)
			.with_status(HistoryStatus::Available)
			.with_status(HistoryStatus::Completed)
			.with_status(HistoryStatus::Available);

		assert_eq!(record.status, Some(HistoryStatus::Completed));
	}

	#[test]
	fn test_external_markers_are_terminal() {
		let mut record = IntentRecord::new("hash", 0);
		assert!(!record.is_terminal());

		record.is_closed = true;
		assert!(record.is_terminal());

		let record = IntentRecord {
			error_message: Some("rejected".into()),
			..IntentRecord::new("hash", 0)
		};
		assert!(record.is_terminal());
	}

	#[test]
	fn test_client_history_blob_roundtrip() {
		let raw = json!({
			"clientId": "abc",
			"hash": "9xQ",
			"status": "available",
			"timestamp": 1700000000,
			"details": {
				"tokenIn": "1000",
				"selectedTokenIn": { "symbol": "USDT", "decimals": 6, "icon": "usdt.svg" },
				"recoverDetails": { "receiverId": "intents.near", "expiration": { "Block": "120" } }
			},
			"isClosed": false
		});

		let record: IntentRecord = serde_json::from_value(raw).unwrap();
		assert_eq!(record.client_id.as_deref(), Some("abc"));
		assert_eq!(record.status, Some(HistoryStatus::Intent1Available));
		let token = record.details.selected_token_in.as_ref().unwrap();
		assert_eq!(token.decimals, 6);
		assert_eq!(token.extra.get("icon"), Some(&json!("usdt.svg")));
		let recover = record.details.recover_details.as_ref().unwrap();
		assert_eq!(recover.receiver_id.as_deref(), Some("intents.near"));
		assert_eq!(
			recover.expiration.as_ref().and_then(|e| e.block.as_deref()),
			Some("120")
		);

		let back = serde_json::to_value(&record).unwrap();
		assert_eq!(back["details"]["selectedTokenIn"]["icon"], json!("usdt.svg"));
		assert_eq!(back["clientId"], json!("abc"));
	}
}
