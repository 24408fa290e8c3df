//! Configuration for the intent history reconciler.
//!
//! The config file is TOML. `${VAR}` references are substituted from the
//! environment before parsing, and a few settings can be overridden with
//! `HISTORY_*` variables afterwards. Pluggable components are configured as
//! a `primary` implementation name plus one raw table per implementation;
//! those tables are validated by the implementations themselves when the
//! reconciler is built.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub reconciliation: ReconciliationConfig,
	pub storage: ComponentConfig,
	pub chain: ComponentConfig,
	pub oracle: ComponentConfig,
	pub scan: ComponentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationConfig {
	/// Account whose history is reconciled.
	pub account_id: String,
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	/// Give up after this many cycles; unlimited when unset.
	#[serde(default)]
	pub max_cycles: Option<u64>,
}

fn default_poll_interval_ms() -> u64 {
	5000
}

impl ReconciliationConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}
}

/// A pluggable component: which implementation to use and each
/// implementation's settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
	pub primary: String,
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

impl ComponentConfig {
	/// Settings table of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

impl std::str::FromStr for Config {
	type Err = ConfigError;

	/// Parses and validates an already substituted TOML document.
	fn from_str(content: &str) -> Result<Self, Self::Err> {
		let config: Config =
			toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}
}

impl Config {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.reconciliation.account_id.trim().is_empty() {
			return Err(ConfigError::ValidationError(
				"reconciliation.account_id cannot be empty".to_string(),
			));
		}

		if self.reconciliation.poll_interval_ms == 0 {
			return Err(ConfigError::ValidationError(
				"reconciliation.poll_interval_ms must be greater than 0".to_string(),
			));
		}

		if self.reconciliation.max_cycles == Some(0) {
			return Err(ConfigError::ValidationError(
				"reconciliation.max_cycles must be greater than 0 when set".to_string(),
			));
		}

		for (section, component) in [
			("storage", &self.storage),
			("chain", &self.chain),
			("oracle", &self.oracle),
			("scan", &self.scan),
		] {
			if component.primary_config().is_none() {
				return Err(ConfigError::ValidationError(format!(
					"{}.primary '{}' has no [{}.implementations.{}] table",
					section, component.primary, section, component.primary
				)));
			}
		}

		Ok(())
	}
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "HISTORY_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<Config, ConfigError> {
		let Some(file_path) = &self.file_path else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		let content = match tokio::fs::read_to_string(file_path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(ConfigError::FileNotFound(file_path.clone()))
			}
			Err(e) => return Err(e.into()),
		};

		let substituted = substitute_env_vars(&content)?;
		let mut config: Config =
			toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config)?;
		config.validate()?;

		Ok(config)
	}

	fn apply_env_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
		if let Ok(account_id) = env::var(format!("{}ACCOUNT_ID", self.env_prefix)) {
			debug!("Overriding account id from environment");
			config.reconciliation.account_id = account_id;
		}

		if let Ok(interval) = env::var(format!("{}POLL_INTERVAL_MS", self.env_prefix)) {
			config.reconciliation.poll_interval_ms = interval.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid poll interval: {}", e))
			})?;
		}

		if let Ok(max_cycles) = env::var(format!("{}MAX_CYCLES", self.env_prefix)) {
			config.reconciliation.max_cycles = Some(max_cycles.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid max cycles: {}", e))
			})?);
		}

		// One endpoint for every component talking to the node
		if let Ok(rpc_url) = env::var(format!("{}RPC_URL", self.env_prefix)) {
			debug!("Overriding RPC URL from environment");
			for component in [&mut config.chain, &mut config.oracle] {
				for table in component.implementations.values_mut() {
					if let Some(table) = table.as_table_mut() {
						if table.contains_key("rpc_url") {
							table.insert("rpc_url".to_string(), toml::Value::String(rpc_url.clone()));
						}
					}
				}
			}
		}

		Ok(())
	}
}

/// Replaces every `${VAR_NAME}` with the value of that environment variable.
pub fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = regex::Regex::new(r"\$\{([^}]+)\}")
		.map_err(|e| ConfigError::ParseError(e.to_string()))?;

	let mut missing = None;
	let result = re.replace_all(content, |caps: &regex::Captures| {
		let var_name = &caps[1];
		env::var(var_name).unwrap_or_else(|_| {
			missing.get_or_insert_with(|| var_name.to_string());
			String::new()
		})
	});

	match missing {
		Some(var_name) => Err(ConfigError::EnvVarNotFound(var_name)),
		None => Ok(result.into_owned()),
	}
}
