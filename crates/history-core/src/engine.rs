//! The reconciliation loop.
//!
//! A [`Reconciler`] holds the collaborators; each call to
//! [`Reconciler::start`] creates an independent [`ReconciliationSession`]
//! owning its record batch and progress state. A session runs cycles until
//! every record is terminal, it is cancelled, or it reaches its cycle limit.

use async_trait::async_trait;
use futures::future::join_all;
use history_chain::ChainService;
use history_oracle::OracleService;
use history_scan::ScanService;
use history_storage::{ConfirmSwapCache, HistoryStore};
use history_types::{HistoryStatus, IntentDetails, IntentRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::clock::{Clock, ShutdownHandle};
use crate::merge;
use crate::resolver::{backfill_rollbacks, Resolver};
use crate::ReconcileError;

/// Receives the full record set once per cycle.
#[async_trait]
pub trait HistorySink: Send + Sync {
	async fn update_history(&self, records: &[IntentRecord]) -> Result<(), ReconcileError>;
}

#[async_trait]
impl HistorySink for HistoryStore {
	async fn update_history(&self, records: &[IntentRecord]) -> Result<(), ReconcileError> {
		self.save(records).await?;
		Ok(())
	}
}

/// Observable state of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationProgress {
	/// Completed cycles.
	pub cycle_count: u64,
	/// Every record reached a terminal state.
	pub is_done: bool,
	/// No cycle is running or scheduled.
	pub is_idle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
	Completed,
	Cancelled,
	/// The cycle limit was reached with records still pending.
	GaveUp,
}

#[derive(Debug)]
pub struct SessionReport {
	pub outcome: SessionOutcome,
	pub progress: ReconciliationProgress,
	pub records: Vec<IntentRecord>,
}

#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
	pub account_id: String,
	pub poll_interval: Duration,
	pub max_cycles: Option<u64>,
}

/// Per-record processing steps shared by all sessions.
struct Pipeline {
	account_id: String,
	chain: Arc<ChainService>,
	resolver: Resolver,
	scan: Arc<ScanService>,
	cache: ConfirmSwapCache,
}

impl Pipeline {
	/// Runs one cycle for one record and reports whether it is now terminal.
	async fn process(&self, record: IntentRecord) -> (IntentRecord, bool) {
		if record.is_terminal() {
			return (record, true);
		}

		let mut record = self.fetch_details(record).await;

		if record.details.transaction.is_some() {
			record = self.resolver.resolve(record).await;
		}

		if record.details.is_token_detail_missing() {
			if let Some(payload) = self.cache.read().await {
				if let Some(details) =
					merge::apply_confirm_swap(&record.details, record.client_id.as_deref(), &payload)
				{
					debug!("Filled token details of {} from confirm-swap cache", record.hash);
					record.details = details;
				}
			}
		}

		match self.scan.scan(&record.hash, &record.details).await {
			Ok(result) if result.is_failure => {
				record.status = Some(HistoryStatus::Failed);
				return (record, true);
			}
			Ok(_) => {}
			Err(e) => warn!("Failure scan of {} did not run: {}", record.hash, e),
		}

		let terminal = record.is_terminal();
		(record, terminal)
	}

	/// Loads transaction and receipts for records that have none yet.
	async fn fetch_details(&self, mut record: IntentRecord) -> IntentRecord {
		if record.details.receipts_outcome.is_some() {
			return record;
		}

		match self
			.chain
			.get_transaction_details(&record.hash, &self.account_id)
			.await
		{
			Ok(Some(found)) => {
				let patch = IntentDetails {
					transaction: Some(found.transaction),
					receipts_outcome: Some(found.receipts_outcome),
					..Default::default()
				};
				record.details = merge::augment(&record.details, &patch);
			}
			Ok(None) => debug!("Transaction {} not known yet", record.hash),
			Err(e) => warn!("Failed to fetch transaction {}: {}", record.hash, e),
		}

		record
	}
}

pub struct Reconciler {
	pipeline: Arc<Pipeline>,
	sink: Arc<dyn HistorySink>,
	clock: Arc<dyn Clock>,
	settings: ReconcilerSettings,
}

impl Reconciler {
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		settings: ReconcilerSettings,
		chain: Arc<ChainService>,
		oracle: Arc<OracleService>,
		scan: Arc<ScanService>,
		cache: ConfirmSwapCache,
		sink: Arc<dyn HistorySink>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self {
			pipeline: Arc::new(Pipeline {
				account_id: settings.account_id.clone(),
				chain,
				resolver: Resolver::new(oracle),
				scan,
				cache,
			}),
			sink,
			clock,
			settings,
		}
	}

	pub fn settings(&self) -> &ReconcilerSettings {
		&self.settings
	}

	/// Creates a session over `records`. Nothing runs until
	/// [`ReconciliationSession::run`] is awaited.
	pub fn start(&self, records: Vec<IntentRecord>) -> ReconciliationSession {
		let (progress, _) = watch::channel(ReconciliationProgress {
			is_idle: true,
			..Default::default()
		});

		ReconciliationSession {
			pipeline: self.pipeline.clone(),
			sink: self.sink.clone(),
			clock: self.clock.clone(),
			poll_interval: self.settings.poll_interval,
			max_cycles: self.settings.max_cycles,
			records,
			progress,
			shutdown: ShutdownHandle::new(),
		}
	}
}

pub struct ReconciliationSession {
	pipeline: Arc<Pipeline>,
	sink: Arc<dyn HistorySink>,
	clock: Arc<dyn Clock>,
	poll_interval: Duration,
	max_cycles: Option<u64>,
	records: Vec<IntentRecord>,
	progress: watch::Sender<ReconciliationProgress>,
	shutdown: ShutdownHandle,
}

impl ReconciliationSession {
	pub fn progress(&self) -> watch::Receiver<ReconciliationProgress> {
		self.progress.subscribe()
	}

	pub fn shutdown_handle(&self) -> ShutdownHandle {
		self.shutdown.clone()
	}

	pub fn records(&self) -> &[IntentRecord] {
		&self.records
	}

	/// Runs a single cycle over the batch and publishes the result.
	///
	/// Returns whether every record is terminal afterwards.
	pub async fn run_cycle(&mut self) -> bool {
		let batch = std::mem::take(&mut self.records);
		let processed: Vec<bool> = batch.iter().map(|r| !r.is_terminal()).collect();
		debug!(
			"Reconciling {} of {} records",
			processed.iter().filter(|p| **p).count(),
			batch.len()
		);

		let pipeline = &self.pipeline;
		let results = join_all(batch.into_iter().map(|record| pipeline.process(record))).await;

		let all_terminal = results.iter().all(|(_, terminal)| *terminal);
		self.records = results.into_iter().map(|(record, _)| record).collect();
		backfill_rollbacks(&mut self.records, &processed);

		if let Err(e) = self.sink.update_history(&self.records).await {
			warn!("Failed to publish history: {}", e);
		}

		self.progress.send_modify(|progress| progress.cycle_count += 1);
		all_terminal
	}

	/// Runs cycles until done, cancelled or out of cycles.
	pub async fn run(mut self) -> SessionReport {
		self.progress.send_modify(|progress| progress.is_idle = false);
		info!(
			"Reconciliation started for {} records",
			self.records.len()
		);

		let outcome = loop {
			if self.shutdown.is_shutdown() {
				break SessionOutcome::Cancelled;
			}

			let all_terminal = self.run_cycle().await;
			let cycle = self.progress.borrow().cycle_count;

			if all_terminal {
				info!("All records terminal after {} cycles", cycle);
				break SessionOutcome::Completed;
			}

			if self.max_cycles.is_some_and(|max| cycle >= max) {
				warn!(
					"Giving up after {} cycles with {} records pending",
					cycle,
					self.records.iter().filter(|r| !r.is_terminal()).count()
				);
				break SessionOutcome::GaveUp;
			}

			debug!("Cycle {} done, next run in {:?}", cycle, self.poll_interval);
			tokio::select! {
				_ = self.clock.sleep(self.poll_interval) => {}
				_ = self.shutdown.cancelled() => break SessionOutcome::Cancelled,
			}
		};

		if outcome == SessionOutcome::Cancelled {
			info!("Reconciliation cancelled");
		}

		self.progress.send_modify(|progress| {
			progress.is_idle = true;
			progress.is_done = outcome == SessionOutcome::Completed;
		});
		let progress = *self.progress.borrow();

		SessionReport {
			outcome,
			progress,
			records: self.records,
		}
	}
}
