//! Human readable lines for the CLI output.

use history_types::format::{balance_to_decimal, truncate_fraction};
use history_types::view::{card_kind, withdraw_amount, CardKind};
use history_types::{IntentRecord, TokenMeta};

/// Fractional digits shown for token amounts.
const DISPLAY_FRACTION: usize = 7;

fn token_amount(amount: Option<&str>, token: Option<&TokenMeta>) -> String {
	let decimals = token.map(|t| t.decimals).unwrap_or(0);
	let symbol = token
		.and_then(|t| t.symbol.as_deref())
		.unwrap_or("?");
	let value = truncate_fraction(
		&balance_to_decimal(amount.unwrap_or("0"), decimals),
		DISPLAY_FRACTION,
	);
	format!("{} {}", value, symbol)
}

fn timestamp(millis: u64) -> String {
	i64::try_from(millis)
		.ok()
		.and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
		.map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
		.unwrap_or_else(|| "-".to_string())
}

/// One line describing `record` as its history card.
pub fn describe(record: &IntentRecord) -> String {
	let details = &record.details;
	let kind = card_kind(record);
	let body = match kind {
		CardKind::Swap | CardKind::Failed | CardKind::Rollback => format!(
			"{} -> {}",
			token_amount(details.token_in.as_deref(), details.selected_token_in.as_ref()),
			token_amount(details.token_out.as_deref(), details.selected_token_out.as_ref()),
		),
		CardKind::Withdraw => format!("{} NEAR", withdraw_amount(record)),
		CardKind::Deposit => details
			.recover_details
			.as_ref()
			.and_then(|r| r.msg.clone())
			.unwrap_or_default(),
		CardKind::StorageDeposit | CardKind::Loading => String::new(),
	};

	let status = record
		.status
		.map(|s| format!("{:?}", s))
		.unwrap_or_else(|| "Pending".to_string());

	format!(
		"{} {:<14} {:<16} {} {}",
		timestamp(record.timestamp),
		format!("{:?}", kind),
		status,
		record.hash,
		body
	)
	.trim_end()
	.to_string()
}
