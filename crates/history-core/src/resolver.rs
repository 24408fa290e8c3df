//! Recovery of intent terms from a record's raw transaction.
//!
//! Each recognised method has its own recovery path. Recovered terms are
//! merged into the record; a decode failure leaves the record untouched
//! until the next cycle. Rollbacks take their token fields from the intent
//! creation once the whole batch of a cycle is resolved, see
//! [`backfill_rollbacks`].

use history_decoder::{
	decode_transaction, Expiration, FtTransferCall, IntentV1, MethodCall, SwapAction, SwapMessage,
};
use history_oracle::OracleService;
use history_types::{
	methods, AssetAmount, ExpirationInfo, HistoryStatus, IntentDetails, IntentRecord,
	RecoverDetails,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::merge;

/// What one recovery path learned about a record.
#[derive(Debug, Default)]
struct Recovery {
	client_id: Option<String>,
	recover: Option<RecoverDetails>,
	details: Option<IntentDetails>,
	status: Option<HistoryStatus>,
	/// Contract and intent id to ask the oracle about.
	oracle_query: Option<(String, String)>,
}

pub struct Resolver {
	oracle: Arc<OracleService>,
}

impl Resolver {
	pub fn new(oracle: Arc<OracleService>) -> Self {
		Self { oracle }
	}

	/// Recovers what the transaction of `record` reveals.
	pub async fn resolve(&self, record: IntentRecord) -> IntentRecord {
		let Some(transaction) = &record.details.transaction else {
			return record;
		};

		let call = match decode_transaction(transaction) {
			Ok(Some(call)) => call,
			Ok(None) => return record,
			Err(e) => {
				warn!("Cannot recover record {}: {}", record.hash, e);
				return record;
			}
		};

		let recovery = recover(&record, call);
		let mut record = apply(record, &recovery);

		if let Some((receiver_id, intent_id)) = &recovery.oracle_query {
			if let Some(status) = self.oracle.get_intent_status(receiver_id, intent_id).await {
				debug!("Intent {} reported as {:?}", intent_id, status);
				record = record.with_status(status);
			}
		}

		record
	}
}

fn apply(mut record: IntentRecord, recovery: &Recovery) -> IntentRecord {
	if let Some(client_id) = &recovery.client_id {
		record.client_id = Some(client_id.clone());
	}

	let mut patch = recovery.details.clone().unwrap_or_default();
	patch.recover_details = recovery.recover.clone();
	record.details = merge::augment(&record.details, &patch);

	match recovery.status {
		Some(status) => record.with_status(status),
		None => record,
	}
}

fn recover(record: &IntentRecord, call: MethodCall) -> Recovery {
	match call {
		MethodCall::FtTransferCall(transfer) => recover_transfer(transfer),
		MethodCall::RollbackIntent { id } => Recovery {
			client_id: Some(id),
			status: Some(HistoryStatus::RolledBack),
			..Default::default()
		},
		MethodCall::NearDeposit => Recovery {
			recover: Some(RecoverDetails {
				msg: record
					.details
					.receipts_outcome
					.as_ref()
					.and_then(|receipts| receipts.first())
					.and_then(|receipt| receipt.outcome.logs.first())
					.cloned(),
				..Default::default()
			}),
			status: Some(HistoryStatus::Deposit),
			..Default::default()
		},
		MethodCall::NearWithdraw { amount } => Recovery {
			recover: Some(RecoverDetails {
				amount: Some(amount),
				..Default::default()
			}),
			status: Some(HistoryStatus::Withdraw),
			..Default::default()
		},
		MethodCall::StorageDeposit => Recovery {
			status: Some(HistoryStatus::StorageDeposit),
			..Default::default()
		},
		MethodCall::NativeOnTransfer(intent) => {
			let receiver_id = record
				.details
				.transaction
				.as_ref()
				.map(|tx| tx.receiver_id.clone())
				.unwrap_or_default();
			recover_native(intent, receiver_id)
		}
		MethodCall::Unknown { method_name } => {
			debug!("No recovery for method {} of {}", method_name, record.hash);
			Recovery::default()
		}
	}
}

fn recover_transfer(transfer: FtTransferCall) -> Recovery {
	let FtTransferCall {
		receiver_id,
		amount,
		message,
	} = transfer;

	let (intent_id, recover) = match message {
		SwapMessage::Legacy(SwapAction::CreateIntent(create)) => {
			let intent = create.intent;
			let mut extra = serde_json::Map::new();
			extra.insert("id".to_string(), serde_json::Value::String(create.id.clone()));
			extra.insert(
				"initiator".to_string(),
				serde_json::Value::String(intent.initiator),
			);
			if let Some(referral) = intent.referral {
				extra.insert("referral".to_string(), serde_json::Value::String(referral));
			}

			let recover = RecoverDetails {
				send: Some(AssetAmount {
					token_id: Some(intent.send.token_id),
					amount: Some(intent.send.amount.to_string()),
				}),
				receive: Some(AssetAmount {
					token_id: Some(intent.receive.token_id),
					amount: Some(intent.receive.amount.to_string()),
				}),
				expiration: match intent.expiration {
					Expiration::Block(block) => Some(ExpirationInfo {
						block: Some(block.to_string()),
					}),
					Expiration::Null | Expiration::Time(_) => None,
				},
				receiver_id: Some(receiver_id.clone()),
				extra,
				..Default::default()
			};
			(create.id, recover)
		}
		// Only the intent id travels with these
		SwapMessage::Legacy(SwapAction::ExecuteIntent(id))
		| SwapMessage::Legacy(SwapAction::RollbackIntent(id)) => (
			id,
			RecoverDetails {
				receiver_id: Some(receiver_id.clone()),
				..Default::default()
			},
		),
		SwapMessage::V1(intent) => {
			let mut recover = v1_terms(&intent);
			recover.send = Some(AssetAmount {
				token_id: None,
				amount: Some(amount),
			});
			recover.receiver_id = Some(receiver_id.clone());
			(intent.id, recover)
		}
	};

	Recovery {
		client_id: Some(intent_id.clone()),
		recover: Some(recover),
		oracle_query: Some((receiver_id, intent_id)),
		..Default::default()
	}
}

fn recover_native(intent: IntentV1, receiver_id: String) -> Recovery {
	let mut recover = v1_terms(&intent);
	recover.receiver_id = Some(receiver_id.clone());

	Recovery {
		client_id: Some(intent.id.clone()),
		recover: Some(recover),
		oracle_query: Some((receiver_id, intent.id)),
		..Default::default()
	}
}

/// Terms carried by a v1 intent message.
fn v1_terms(intent: &IntentV1) -> RecoverDetails {
	let mut extra = intent.extra.clone();
	extra.insert("id".to_string(), serde_json::Value::String(intent.id.clone()));

	RecoverDetails {
		receive: Some(AssetAmount {
			token_id: None,
			amount: Some(intent.asset_out.amount.clone()),
		}),
		expiration: Some(ExpirationInfo {
			block: Some(intent.expiration.block_number.to_string()),
		}),
		extra,
		..Default::default()
	}
}

/// Copies token fields from the intent creation into each rollback record
/// flagged in `processed`.
///
/// Runs on the resolved batch, so a creation whose `client_id` was recovered
/// in the same cycle is found.
pub fn backfill_rollbacks(records: &mut [IntentRecord], processed: &[bool]) {
	let resolved: &[IntentRecord] = records;
	let patches: Vec<(usize, IntentDetails)> = resolved
		.iter()
		.enumerate()
		.filter(|(index, record)| {
			processed.get(*index).copied().unwrap_or(false)
				&& record.method_name() == Some(methods::ROLLBACK_INTENT)
		})
		.filter_map(|(index, record)| {
			let client_id = record.client_id.as_deref()?;
			let creation = find_creation(resolved, client_id, &record.hash)?;
			Some((index, merge::token_fields(creation)))
		})
		.collect();

	for (index, patch) in patches {
		debug!("Backfilled rollback {} from its creation", records[index].hash);
		records[index].details = merge::augment(&records[index].details, &patch);
	}
}

/// The record in `batch` that created intent `client_id`, if any. The last
/// match wins.
fn find_creation<'a>(
	batch: &'a [IntentRecord],
	client_id: &str,
	own_hash: &str,
) -> Option<&'a IntentDetails> {
	batch
		.iter()
		.rev()
		.filter(|r| r.hash != own_hash && r.client_id.as_deref() == Some(client_id))
		.find(|r| {
			matches!(
				r.method_name(),
				Some(methods::FT_TRANSFER_CALL) | Some(methods::NATIVE_ON_TRANSFER)
			)
		})
		.map(|r| &r.details)
}
