//! Intent history reconciliation engine.
//!
//! Recovers the canonical state of wallet actions from their on-chain
//! transactions, cached swap metadata and the intent status oracle, and
//! keeps polling until every record is terminal.

use history_chain::{ChainInterface, ChainService};
use history_config::{ComponentConfig, Config};
use history_oracle::{OracleInterface, OracleService};
use history_scan::{ScanInterface, ScanService};
use history_storage::{ConfirmSwapCache, HistoryStore, StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub mod clock;
pub mod engine;
pub mod merge;
pub mod resolver;

pub use clock::{Clock, ShutdownHandle, TokioClock};
pub use engine::{
	HistorySink, Reconciler, ReconcilerSettings, ReconciliationProgress, ReconciliationSession,
	SessionOutcome, SessionReport,
};

#[derive(Debug, Error)]
pub enum ReconcileError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}

// Type aliases for factory functions
type StorageFactory = Box<dyn Fn(&toml::Value) -> Box<dyn StorageInterface> + Send>;
type ChainFactory = Box<dyn Fn(&toml::Value) -> Box<dyn ChainInterface> + Send>;
type OracleFactory = Box<dyn Fn(&toml::Value) -> Box<dyn OracleInterface> + Send>;
type ScanFactory = Box<dyn Fn(&toml::Value) -> Box<dyn ScanInterface> + Send>;

/// Everything a built reconciler consists of.
pub struct ReconcilerParts {
	pub reconciler: Reconciler,
	pub storage: Arc<StorageService>,
	pub history: HistoryStore,
	pub cache: ConfirmSwapCache,
}

// Factory pattern for creating services from config
pub struct ReconcilerBuilder {
	config: Config,
	storage_factories: HashMap<String, StorageFactory>,
	chain_factories: HashMap<String, ChainFactory>,
	oracle_factories: HashMap<String, OracleFactory>,
	scan_factories: HashMap<String, ScanFactory>,
	clock: Option<Arc<dyn Clock>>,
	sink: Option<Arc<dyn HistorySink>>,
}

impl ReconcilerBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			storage_factories: HashMap::new(),
			chain_factories: HashMap::new(),
			oracle_factories: HashMap::new(),
			scan_factories: HashMap::new(),
			clock: None,
			sink: None,
		}
	}

	pub fn with_storage_factory<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Box<dyn StorageInterface> + Send + 'static,
	{
		self.storage_factories
			.insert(name.to_string(), Box::new(factory));
		self
	}

	pub fn with_chain_factory<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Box<dyn ChainInterface> + Send + 'static,
	{
		self.chain_factories
			.insert(name.to_string(), Box::new(factory));
		self
	}

	pub fn with_oracle_factory<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Box<dyn OracleInterface> + Send + 'static,
	{
		self.oracle_factories
			.insert(name.to_string(), Box::new(factory));
		self
	}

	pub fn with_scan_factory<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Box<dyn ScanInterface> + Send + 'static,
	{
		self.scan_factories
			.insert(name.to_string(), Box::new(factory));
		self
	}

	/// Replaces the real-time clock, e.g. to drive cycles in tests.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);
		self
	}

	/// Replaces the default sink, the persistent history of the account.
	pub fn with_sink(mut self, sink: Arc<dyn HistorySink>) -> Self {
		self.sink = Some(sink);
		self
	}

	pub fn build(self) -> Result<ReconcilerParts, ReconcileError> {
		let storage_backend = instantiate("storage", &self.config.storage, &self.storage_factories)?;
		let storage = Arc::new(StorageService::new(storage_backend));

		let chain = instantiate("chain", &self.config.chain, &self.chain_factories)?;
		validate("chain", &self.config.chain, chain.config_schema().as_ref())?;

		let oracle = instantiate("oracle", &self.config.oracle, &self.oracle_factories)?;
		validate("oracle", &self.config.oracle, oracle.config_schema().as_ref())?;

		let scan = instantiate("scan", &self.config.scan, &self.scan_factories)?;
		validate("scan", &self.config.scan, scan.config_schema().as_ref())?;

		let reconciliation = &self.config.reconciliation;
		let history = HistoryStore::new(storage.clone(), reconciliation.account_id.clone());
		let cache = ConfirmSwapCache::new(storage.clone());

		let settings = ReconcilerSettings {
			account_id: reconciliation.account_id.clone(),
			poll_interval: reconciliation.poll_interval(),
			max_cycles: reconciliation.max_cycles,
		};

		info!(
			"Reconciler built for {} (storage: {}, chain: {}, oracle: {}, scan: {})",
			settings.account_id,
			self.config.storage.primary,
			self.config.chain.primary,
			self.config.oracle.primary,
			self.config.scan.primary
		);

		let reconciler = Reconciler::new(
			settings,
			Arc::new(ChainService::new(chain)),
			Arc::new(OracleService::new(oracle)),
			Arc::new(ScanService::new(scan)),
			cache.clone(),
			self.sink
				.unwrap_or_else(|| Arc::new(history.clone()) as Arc<dyn HistorySink>),
			self.clock
				.unwrap_or_else(|| Arc::new(TokioClock) as Arc<dyn Clock>),
		);

		Ok(ReconcilerParts {
			reconciler,
			storage,
			history,
			cache,
		})
	}
}

fn instantiate<T: ?Sized>(
	section: &str,
	component: &ComponentConfig,
	factories: &HashMap<String, Box<dyn Fn(&toml::Value) -> Box<T> + Send>>,
) -> Result<Box<T>, ReconcileError> {
	let factory = factories.get(&component.primary).ok_or_else(|| {
		ReconcileError::Config(format!(
			"No {} factory registered for '{}'",
			section, component.primary
		))
	})?;
	let config = component.primary_config().ok_or_else(|| {
		ReconcileError::Config(format!(
			"Missing config for {} implementation '{}'",
			section, component.primary
		))
	})?;
	Ok(factory(config))
}

fn validate(
	section: &str,
	component: &ComponentConfig,
	schema: &dyn history_types::ConfigSchema,
) -> Result<(), ReconcileError> {
	let config = component
		.primary_config()
		.ok_or_else(|| ReconcileError::Config(format!("Missing config for {}", section)))?;
	schema.validate(config).map_err(|e| {
		ReconcileError::Config(format!("{}.implementations.{}: {}", section, component.primary, e))
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(chain_url: &str) -> Config {
		format!(
			r#"
[reconciliation]
account_id = "alice.near"

[storage]
primary = "memory"
[storage.implementations.memory]

[chain]
primary = "near_rpc"
[chain.implementations.near_rpc]
rpc_url = "{}"

[oracle]
primary = "near_rpc"
[oracle.implementations.near_rpc]
rpc_url = "https://rpc.mainnet.near.org"

[scan]
primary = "receipts"
[scan.implementations.receipts]
detect_refunds = true
"#,
			chain_url
		)
		.parse()
		.unwrap()
	}

	fn builder(config: Config) -> ReconcilerBuilder {
		ReconcilerBuilder::new(config)
			.with_storage_factory("memory", history_storage::implementations::memory::create_storage)
			.with_chain_factory("near_rpc", history_chain::implementations::near_rpc::create_chain)
			.with_oracle_factory("near_rpc", history_oracle::implementations::near_rpc::create_oracle)
			.with_scan_factory("receipts", history_scan::implementations::receipts::create_scan)
	}

	#[test]
	fn test_build_from_config() {
		let parts = builder(config("https://rpc.mainnet.near.org")).build().unwrap();
		assert_eq!(parts.reconciler.settings().account_id, "alice.near");
		assert_eq!(parts.history.account_id(), "alice.near");
	}

	#[test]
	fn test_build_rejects_invalid_implementation_config() {
		let err = builder(config("ftp://rpc.mainnet.near.org")).build().err().unwrap();
		assert!(matches!(err, ReconcileError::Config(msg) if msg.contains("chain.implementations.near_rpc")));
	}

	#[test]
	fn test_build_requires_registered_factory() {
		let err = ReconcilerBuilder::new(config("https://rpc.mainnet.near.org"))
			.build()
			.err()
			.unwrap();
		assert!(matches!(err, ReconcileError::Config(msg) if msg.contains("No storage factory")));
	}
}
