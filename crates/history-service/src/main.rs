use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use history_config::{Config, ConfigLoader};
use history_core::{ReconcilerBuilder, ReconcilerParts, SessionOutcome};
use history_types::{ConfirmSwapEnvelope, IntentRecord};
use std::path::{Path, PathBuf};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod report;

#[derive(Parser)]
#[command(name = "intent-history")]
#[command(about = "Intent history reconciler", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config/local.toml")]
	config: PathBuf,

	#[arg(long, env = "HISTORY_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Reconcile records until every one is terminal
	Run {
		/// JSON array of records; the stored history is used when omitted
		#[arg(long, value_name = "FILE")]
		records: Option<PathBuf>,

		/// Confirm-swap payload (`{"data": {...}}`) to cache before running
		#[arg(long, value_name = "FILE")]
		confirm_swap: Option<PathBuf>,
	},
	/// Print the stored history
	Show,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	match cli.command {
		Some(Commands::Run {
			ref records,
			ref confirm_swap,
		}) => run(&cli.config, records.as_deref(), confirm_swap.as_deref()).await,
		None => run(&cli.config, None, None).await,
		Some(Commands::Show) => show(&cli.config).await,
		Some(Commands::Validate) => validate_config(&cli.config).await,
	}
}

async fn load_config(path: &Path) -> Result<Config> {
	info!("Loading configuration from: {:?}", path);
	ConfigLoader::new()
		.with_file(path)
		.load()
		.await
		.context("Failed to load configuration")
}

fn build(config: Config) -> Result<ReconcilerParts> {
	ReconcilerBuilder::new(config)
		.with_storage_factory("file", history_storage::implementations::file::create_storage)
		.with_storage_factory("memory", history_storage::implementations::memory::create_storage)
		.with_chain_factory("near_rpc", history_chain::implementations::near_rpc::create_chain)
		.with_oracle_factory("near_rpc", history_oracle::implementations::near_rpc::create_oracle)
		.with_scan_factory("receipts", history_scan::implementations::receipts::create_scan)
		.build()
		.context("Failed to build reconciler")
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
	let content = tokio::fs::read_to_string(path)
		.await
		.with_context(|| format!("Failed to read {:?}", path))?;
	serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}

async fn run(config_path: &Path, records: Option<&Path>, confirm_swap: Option<&Path>) -> Result<()> {
	let config = load_config(config_path).await?;
	let parts = build(config)?;

	if let Some(path) = confirm_swap {
		let envelope: ConfirmSwapEnvelope = read_json(path).await?;
		parts
			.cache
			.write(envelope.data)
			.await
			.context("Failed to cache confirm-swap payload")?;
	}

	let records: Vec<IntentRecord> = match records {
		Some(path) => read_json(path).await?,
		None => parts
			.history
			.load()
			.await
			.context("Failed to load stored history")?,
	};

	if records.is_empty() {
		info!("Nothing to reconcile for {}", parts.history.account_id());
		return Ok(());
	}

	let session = parts.reconciler.start(records);
	let shutdown = session.shutdown_handle();
	let signal_task = tokio::spawn(async move {
		setup_shutdown_signal().await;
		info!("Shutdown signal received, stopping reconciliation...");
		shutdown.shutdown();
	});

	let report = session.run().await;
	signal_task.abort();

	for record in &report.records {
		println!("{}", report::describe(record));
	}

	let pending = report.records.iter().filter(|r| !r.is_terminal()).count();
	match report.outcome {
		SessionOutcome::Completed => info!(
			"Reconciled {} records in {} cycles",
			report.records.len(),
			report.progress.cycle_count
		),
		SessionOutcome::Cancelled => warn!("Cancelled with {} records pending", pending),
		SessionOutcome::GaveUp => warn!(
			"Stopped after {} cycles with {} records pending",
			report.progress.cycle_count, pending
		),
	}

	Ok(())
}

async fn show(config_path: &Path) -> Result<()> {
	let config = load_config(config_path).await?;
	let parts = build(config)?;

	let records = parts
		.history
		.load()
		.await
		.context("Failed to load stored history")?;

	info!(
		"{} records stored for {}",
		records.len(),
		parts.history.account_id()
	);
	for record in &records {
		println!("{}", report::describe(record));
	}

	Ok(())
}

async fn validate_config(config_path: &Path) -> Result<()> {
	let config = load_config(config_path).await?;

	info!("Account: {}", config.reconciliation.account_id);
	info!(
		"Poll interval: {}ms, max cycles: {}",
		config.reconciliation.poll_interval_ms,
		config
			.reconciliation
			.max_cycles
			.map(|n| n.to_string())
			.unwrap_or_else(|| "unlimited".to_string())
	);
	info!("Storage: {}", config.storage.primary);
	info!("Chain: {}", config.chain.primary);
	info!("Oracle: {}", config.oracle.primary);
	info!("Scan: {}", config.scan.primary);

	// Building also validates each implementation's own settings
	build(config)?;
	info!("Configuration is valid");

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}

async fn setup_shutdown_signal() {
	let ctrl_c = async {
		signal::ctrl_c()
			.await
			.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		signal::unix::signal(signal::unix::SignalKind::terminate())
			.expect("failed to install signal handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
