//! Serde helpers for amounts that arrive either as JSON strings or numbers.

use serde::{de, Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
	String(String),
	Number(serde_json::Number),
}

/// `u128` encoded as a decimal string, accepting plain numbers on input.
pub mod u128_string {
	use super::*;

	pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = match StringOrNumber::deserialize(deserializer)? {
			StringOrNumber::String(s) => s,
			StringOrNumber::Number(n) => n.to_string(),
		};
		raw.parse::<u128>()
			.map_err(|_| de::Error::custom(format!("Invalid amount: {}", raw)))
	}
}

/// Decimal amount kept as a string, accepting plain numbers on input.
pub mod amount_string {
	use super::*;

	pub fn serialize<S>(value: &str, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(value)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = match StringOrNumber::deserialize(deserializer)? {
			StringOrNumber::String(s) => s,
			StringOrNumber::Number(n) => n.to_string(),
		};
		if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
			return Err(de::Error::custom(format!("Invalid amount: {}", raw)));
		}
		Ok(raw)
	}
}
