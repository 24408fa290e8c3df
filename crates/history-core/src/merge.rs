//! Field-wise merging of record details.
//!
//! Every function here is pure and returns a new snapshot. No merge ever
//! replaces a present value with an absent one.

use history_types::{AssetAmount, ConfirmSwapPayload, IntentDetails, RecoverDetails};

fn prefer<T: Clone>(first: &Option<T>, second: &Option<T>) -> Option<T> {
	first.clone().or_else(|| second.clone())
}

fn augment_asset(base: &Option<AssetAmount>, patch: &Option<AssetAmount>) -> Option<AssetAmount> {
	match (base, patch) {
		(Some(base), Some(patch)) => Some(AssetAmount {
			token_id: prefer(&patch.token_id, &base.token_id),
			amount: prefer(&patch.amount, &base.amount),
		}),
		_ => prefer(patch, base),
	}
}

/// Overlays `patch` on `base`; fields present in `patch` win.
pub fn augment_recover(base: &RecoverDetails, patch: &RecoverDetails) -> RecoverDetails {
	let mut extra = base.extra.clone();
	extra.extend(patch.extra.clone());

	RecoverDetails {
		send: augment_asset(&base.send, &patch.send),
		receive: augment_asset(&base.receive, &patch.receive),
		expiration: match (&base.expiration, &patch.expiration) {
			(Some(base), Some(patch)) => Some(history_types::ExpirationInfo {
				block: prefer(&patch.block, &base.block),
			}),
			(base, patch) => prefer(patch, base),
		},
		receiver_id: prefer(&patch.receiver_id, &base.receiver_id),
		msg: prefer(&patch.msg, &base.msg),
		amount: prefer(&patch.amount, &base.amount),
		extra,
	}
}

/// Overlays `patch` on `base`; fields present in `patch` win.
pub fn augment(base: &IntentDetails, patch: &IntentDetails) -> IntentDetails {
	IntentDetails {
		transaction: prefer(&patch.transaction, &base.transaction),
		receipts_outcome: prefer(&patch.receipts_outcome, &base.receipts_outcome),
		recover_details: match (&base.recover_details, &patch.recover_details) {
			(Some(base), Some(patch)) => Some(augment_recover(base, patch)),
			(base, patch) => prefer(patch, base),
		},
		selected_token_in: prefer(&patch.selected_token_in, &base.selected_token_in),
		selected_token_out: prefer(&patch.selected_token_out, &base.selected_token_out),
		token_in: prefer(&patch.token_in, &base.token_in),
		token_out: prefer(&patch.token_out, &base.token_out),
	}
}

/// Fills fields absent from `base` with those of `fallback`; `base` wins.
pub fn fill_missing(base: &IntentDetails, fallback: &IntentDetails) -> IntentDetails {
	augment(fallback, base)
}

/// Token fields of a details bag, everything else left empty.
pub fn token_fields(details: &IntentDetails) -> IntentDetails {
	IntentDetails {
		selected_token_in: details.selected_token_in.clone(),
		selected_token_out: details.selected_token_out.clone(),
		token_in: details.token_in.clone(),
		token_out: details.token_out.clone(),
		..Default::default()
	}
}

/// Fills missing token fields from the confirm-swap payload when it belongs
/// to the same intent. Returns `None` when the payload does not apply.
pub fn apply_confirm_swap(
	details: &IntentDetails,
	client_id: Option<&str>,
	payload: &ConfirmSwapPayload,
) -> Option<IntentDetails> {
	let client_id = client_id?;
	if payload.client_id.as_deref() != Some(client_id) {
		return None;
	}

	let cached = IntentDetails {
		selected_token_in: payload.selected_token_in.clone(),
		selected_token_out: payload.selected_token_out.clone(),
		token_in: payload.token_in.clone(),
		token_out: payload.token_out.clone(),
		..Default::default()
	};

	Some(fill_missing(details, &cached))
}
