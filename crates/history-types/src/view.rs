//! Classification of records into the history card a client renders.

use serde::Serialize;

use crate::format::{balance_to_decimal, NEAR_DECIMALS};
use crate::record::{HistoryStatus, IntentRecord};

/// Which card a history entry is shown as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CardKind {
	/// Not classified yet, or details still incomplete.
	Loading,
	Swap,
	Failed,
	Rollback,
	Withdraw,
	Deposit,
	StorageDeposit,
}

/// Picks the card for `record`.
///
/// Every classified card needs a hash and the four token fields; failed,
/// rollback, withdraw, deposit and storage-deposit cards additionally need
/// the raw transaction.
pub fn card_kind(record: &IntentRecord) -> CardKind {
	let details = &record.details;
	let incomplete = record.hash.is_empty() || details.is_token_detail_missing();
	let has_transaction = details.transaction.is_some();

	let Some(status) = record.status else {
		return CardKind::Loading;
	};

	let (kind, needs_transaction) = match status {
		HistoryStatus::Failed => (CardKind::Failed, true),
		HistoryStatus::Available
		| HistoryStatus::Completed
		| HistoryStatus::Intent1Available
		| HistoryStatus::Intent1Executed => (CardKind::Swap, false),
		HistoryStatus::RolledBack | HistoryStatus::Intent1RolledBack => (CardKind::Rollback, true),
		HistoryStatus::Withdraw => (CardKind::Withdraw, true),
		HistoryStatus::Deposit => (CardKind::Deposit, true),
		HistoryStatus::StorageDeposit => (CardKind::StorageDeposit, true),
	};

	if incomplete || (needs_transaction && !has_transaction) {
		CardKind::Loading
	} else {
		kind
	}
}

/// Amount shown on a withdraw card, in NEAR.
pub fn withdraw_amount(record: &IntentRecord) -> String {
	let amount = record
		.details
		.recover_details
		.as_ref()
		.and_then(|r| r.amount.as_deref())
		.unwrap_or("0");
	balance_to_decimal(amount, NEAR_DECIMALS)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::record::{RecoverDetails, TokenMeta};
	use crate::transaction::NearTransaction;

	fn complete_record(status: HistoryStatus) -> IntentRecord {
		let mut record = IntentRecord::new("hash", 1).with_status(status);
		record.details.token_in = Some("1".into());
		record.details.token_out = Some("2".into());
		record.details.selected_token_in = Some(TokenMeta::default());
		record.details.selected_token_out = Some(TokenMeta::default());
		record.details.transaction = Some(NearTransaction {
			signer_id: "alice.near".into(),
			receiver_id: "wrap.near".into(),
			actions: vec![],
		});
		record
	}

	#[test]
	fn test_unclassified_is_loading() {
		assert_eq!(card_kind(&IntentRecord::new("hash", 0)), CardKind::Loading);
	}

	#[test]
	fn test_cards_by_status() {
		assert_eq!(
			card_kind(&complete_record(HistoryStatus::Intent1Executed)),
			CardKind::Swap
		);
		assert_eq!(
			card_kind(&complete_record(HistoryStatus::Intent1RolledBack)),
			CardKind::Rollback
		);
		assert_eq!(
			card_kind(&complete_record(HistoryStatus::StorageDeposit)),
			CardKind::StorageDeposit
		);
	}

	#[test]
	fn test_missing_details_fall_back_to_loading() {
		let mut record = complete_record(HistoryStatus::Withdraw);
		record.details.transaction = None;
		assert_eq!(card_kind(&record), CardKind::Loading);

		// Swap cards do not need the transaction
		let mut record = complete_record(HistoryStatus::Available);
		record.details.transaction = None;
		assert_eq!(card_kind(&record), CardKind::Swap);

		let mut record = complete_record(HistoryStatus::Available);
		record.details.token_out = None;
		assert_eq!(card_kind(&record), CardKind::Loading);
	}

	#[test]
	fn test_withdraw_amount() {
		let mut record = complete_record(HistoryStatus::Withdraw);
		record.details.recover_details = Some(RecoverDetails {
			amount: Some("2500000000000000000000000".into()),
			..Default::default()
		});
		assert_eq!(withdraw_amount(&record), "2.5");
	}
}
