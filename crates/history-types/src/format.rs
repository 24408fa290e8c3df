//! Exact conversion of minor-unit amounts for display.
//!
//! Amounts travel as decimal strings of integers in minor units (yocto NEAR,
//! token base units). They are only turned into a decimal representation at
//! the display edge, using string arithmetic so no precision is lost.

/// Decimals of native NEAR (1 NEAR = 10^24 yocto).
pub const NEAR_DECIMALS: u32 = 24;

/// Renders `amount` minor units with `decimals` fractional digits.
///
/// Trailing fractional zeros are trimmed. Anything that is not a plain
/// non-negative integer renders as `"0"`.
pub fn balance_to_decimal(amount: &str, decimals: u32) -> String {
	let amount = amount.trim();
	if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
		return "0".to_string();
	}

	let digits = amount.trim_start_matches('0');
	if digits.is_empty() {
		return "0".to_string();
	}

	let decimals = decimals as usize;
	let (int_part, frac_part) = if digits.len() > decimals {
		let split = digits.len() - decimals;
		(digits[..split].to_string(), digits[split..].to_string())
	} else {
		(
			"0".to_string(),
			format!("{}{}", "0".repeat(decimals - digits.len()), digits),
		)
	};

	let frac_part = frac_part.trim_end_matches('0');
	if frac_part.is_empty() {
		int_part
	} else {
		format!("{}.{}", int_part, frac_part)
	}
}

/// Truncates a decimal string to at most `max_fraction` fractional digits.
pub fn truncate_fraction(value: &str, max_fraction: usize) -> String {
	match value.split_once('.') {
		Some((int_part, frac_part)) => {
			let frac: String = frac_part.chars().take(max_fraction).collect();
			let frac = frac.trim_end_matches('0');
			if frac.is_empty() {
				int_part.to_string()
			} else {
				format!("{}.{}", int_part, frac)
			}
		}
		None => value.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_one_near() {
		assert_eq!(
			balance_to_decimal("1000000000000000000000000", NEAR_DECIMALS),
			"1"
		);
	}

	#[test]
	fn test_fractional_amounts() {
		assert_eq!(balance_to_decimal("1500000", 6), "1.5");
		assert_eq!(balance_to_decimal("42", 6), "0.000042");
		assert_eq!(balance_to_decimal("0001", 0), "1");
		assert_eq!(balance_to_decimal("123", 0), "123");
	}

	#[test]
	fn test_beyond_u128() {
		// 10^40 minor units still converts exactly
		let amount = format!("1{}", "0".repeat(40));
		assert_eq!(
			balance_to_decimal(&amount, NEAR_DECIMALS),
			format!("1{}", "0".repeat(16))
		);
	}

	#[test]
	fn test_invalid_input() {
		assert_eq!(balance_to_decimal("", 6), "0");
		assert_eq!(balance_to_decimal("-5", 6), "0");
		assert_eq!(balance_to_decimal("1.5", 6), "0");
		assert_eq!(balance_to_decimal("000", 6), "0");
	}

	#[test]
	fn test_truncate_fraction() {
		assert_eq!(truncate_fraction("0.123456789", 7), "0.1234567");
		assert_eq!(truncate_fraction("2.000000001", 7), "2");
		assert_eq!(truncate_fraction("15", 7), "15");
	}
}
