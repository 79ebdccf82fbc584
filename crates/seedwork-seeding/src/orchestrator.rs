//! Seeding orchestration.
//!
//! A run resolves the seeder order, gates every seeder against the active
//! environment, validates the desired sets of admitted seeders, and only then
//! reconciles and applies each seeder in order. Configuration errors abort the
//! run before anything is written. Load, apply and history write failures are
//! fail-fast by default: the failed seeder is reported as `Failed` and the
//! rest as `NotRun`, while chunks already committed stay committed. History
//! rows count committed writes only.

use std::sync::Arc;
use std::time::Instant;

use seedwork_conf::SeedingSettings;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::apply::{ApplyObserver, BatchApplier, DEFAULT_BATCH_SIZE, NoopObserver};
use crate::error::{SeedingError, SeedingResult};
use crate::history::{InMemorySeedHistory, JsonLinesSeedHistory, SeedHistory, SeedHistoryRecord};
use crate::policy::GateDecision;
use crate::registry::{SeederCatalog, SeederFailure};
use crate::resolver::resolve_order;
use crate::summary::{FailureDetail, RunSummary, SeederOutcome, SeederStatus};

/// Options for a seeding run.
#[derive(Debug, Clone)]
pub struct RunOptions {
	/// Maximum operations per committed chunk.
	pub batch_size: usize,

	/// Stop after the first failed seeder.
	pub fail_fast: bool,

	/// Run-scoped cancellation signal.
	pub cancellation: CancellationToken,
}

impl Default for RunOptions {
	fn default() -> Self {
		Self {
			batch_size: DEFAULT_BATCH_SIZE,
			fail_fast: true,
			cancellation: CancellationToken::new(),
		}
	}
}

impl RunOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the batch size.
	pub fn with_batch_size(mut self, batch_size: usize) -> Self {
		self.batch_size = batch_size;
		self
	}

	/// Sets the fail-fast flag.
	pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
		self.fail_fast = fail_fast;
		self
	}

	/// Sets the cancellation token.
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancellation = token;
		self
	}
}

impl From<&SeedingSettings> for RunOptions {
	fn from(settings: &SeedingSettings) -> Self {
		Self::new()
			.with_batch_size(settings.batch_size)
			.with_fail_fast(settings.fail_fast)
	}
}

/// Drives seeding runs over a catalog.
pub struct SeedingOrchestrator {
	catalog: SeederCatalog,
	history: Arc<dyn SeedHistory>,
	observer: Arc<dyn ApplyObserver>,
	options: RunOptions,
}

impl SeedingOrchestrator {
	/// Creates an orchestrator writing history to `history`.
	pub fn new(catalog: SeederCatalog, history: Arc<dyn SeedHistory>) -> Self {
		Self {
			catalog,
			history,
			observer: Arc::new(NoopObserver),
			options: RunOptions::default(),
		}
	}

	/// Creates an orchestrator configured from settings.
	///
	/// History goes to `settings.history_path` when set, otherwise to memory.
	pub fn from_settings(catalog: SeederCatalog, settings: &SeedingSettings) -> Self {
		let history: Arc<dyn SeedHistory> = match &settings.history_path {
			Some(path) => Arc::new(JsonLinesSeedHistory::new(path)),
			None => Arc::new(InMemorySeedHistory::new()),
		};
		Self::new(catalog, history).with_settings(settings)
	}

	/// Replaces the run options.
	pub fn with_options(mut self, options: RunOptions) -> Self {
		self.options = options;
		self
	}

	/// Takes batch size and fail-fast from `settings`, keeping the current
	/// cancellation token.
	pub fn with_settings(mut self, settings: &SeedingSettings) -> Self {
		self.options.batch_size = settings.batch_size;
		self.options.fail_fast = settings.fail_fast;
		self
	}

	/// Sets the batch size.
	pub fn with_batch_size(mut self, batch_size: usize) -> Self {
		self.options.batch_size = batch_size;
		self
	}

	/// Sets the fail-fast flag.
	pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
		self.options.fail_fast = fail_fast;
		self
	}

	/// Sets the cancellation token.
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.options.cancellation = token;
		self
	}

	/// Receives chunk commit callbacks.
	pub fn with_observer(mut self, observer: Arc<dyn ApplyObserver>) -> Self {
		self.observer = observer;
		self
	}

	/// Registered seeders.
	pub fn catalog(&self) -> &SeederCatalog {
		&self.catalog
	}

	/// Seed history sink.
	pub fn history(&self) -> &Arc<dyn SeedHistory> {
		&self.history
	}

	/// Current run options.
	pub fn options(&self) -> &RunOptions {
		&self.options
	}

	/// Runs every seeder against `environment`.
	///
	/// # Errors
	///
	/// Configuration errors (unknown dependency, cycle, duplicate desired key,
	/// invalid batch size). Load, apply and history write failures are
	/// reported in the summary as a `Failed` seeder instead.
	pub async fn run(&self, environment: &str) -> SeedingResult<RunSummary> {
		let run_id = Uuid::new_v4();
		let started = Instant::now();
		tracing::info!(%run_id, environment, seeders = self.catalog.len(), "seeding run started");

		let applier = BatchApplier::new(self.options.batch_size)?
			.with_cancellation(self.options.cancellation.clone());
		let order = resolve_order(&self.catalog)?;

		let mut plan = Vec::with_capacity(order.len());
		for name in &order {
			let seeder = self
				.catalog
				.get(name)
				.ok_or_else(|| SeedingError::SeederNotFound(name.clone()))?;
			let decision = seeder.policy().evaluate(environment);
			if decision.is_admitted() {
				let desired = seeder.validate()?;
				tracing::debug!(seeder = %name, desired, "desired set validated");
			}
			plan.push((Arc::clone(seeder), decision));
		}

		let mut outcomes = Vec::with_capacity(plan.len());
		let mut halted = false;

		for (seeder, decision) in plan {
			let name = seeder.name().to_string();

			if halted {
				outcomes.push(SeederOutcome::with_status(name, SeederStatus::NotRun));
				continue;
			}
			if self.options.cancellation.is_cancelled() {
				outcomes.push(SeederOutcome::with_status(name, SeederStatus::Cancelled));
				continue;
			}

			let mut outcome = match decision {
				GateDecision::Skip(reason) => {
					tracing::info!(seeder = %name, environment, %reason, "seeder skipped");
					let mut outcome = SeederOutcome::with_status(name, SeederStatus::Skipped);
					outcome.skip_reason = Some(reason.to_string());
					outcome
				}
				GateDecision::Admit => {
					let seeder_started = Instant::now();
					let result = seeder.seed(&applier, self.observer.as_ref()).await;
					let mut outcome = SeederOutcome::with_status(name.clone(), SeederStatus::Applied);
					outcome.duration = seeder_started.elapsed();

					let run = match result {
						Ok(run) => {
							if run.report.cancelled {
								outcome.status = SeederStatus::Cancelled;
								tracing::warn!(
									seeder = %name,
									committed = run.report.chunks_committed,
									planned = run.report.chunks_planned,
									"seeder cancelled"
								);
							} else {
								tracing::info!(
									seeder = %name,
									inserted = run.counts.inserted,
									updated = run.counts.updated,
									unchanged = run.counts.unchanged,
									chunks = run.report.chunks_committed,
									"seeder applied"
								);
							}
							run
						}
						Err(SeederFailure { run, error }) => {
							tracing::error!(
								seeder = %name,
								error = %error,
								committed = run.report.chunks_committed,
								"seeder failed"
							);
							outcome.status = SeederStatus::Failed;
							outcome.failure = Some(FailureDetail::from(&error));
							halted = self.options.fail_fast;
							run
						}
					};
					outcome.counts = run.counts;
					outcome.committed = run.committed();
					outcome.chunks_committed = run.report.chunks_committed;
					outcome.operations_applied = run.report.operations_applied;
					outcome
				}
			};

			let record = SeedHistoryRecord::from_outcome(run_id, environment, &outcome);
			if let Err(source) = self.history.append(record).await {
				let error = SeedingError::HistoryAppend {
					seeder: outcome.seeder.clone(),
					source: Box::new(source),
				};
				tracing::error!(seeder = %outcome.seeder, error = %error, "seed history append failed");
				outcome.status = SeederStatus::Failed;
				if outcome.failure.is_none() {
					outcome.failure = Some(FailureDetail::from(&error));
				}
				halted = self.options.fail_fast;
			}
			outcomes.push(outcome);
		}

		let summary = RunSummary {
			run_id,
			environment: environment.to_string(),
			outcomes,
			elapsed: started.elapsed(),
		};
		tracing::info!(
			%run_id,
			success = summary.is_success(),
			commits = summary.total_commits(),
			elapsed = ?summary.elapsed,
			"seeding run finished"
		);
		Ok(summary)
	}
}

/// Runs every seeder in `catalog` against `environment` with default options
/// and in-memory history.
pub async fn run_seeding(catalog: SeederCatalog, environment: &str) -> SeedingResult<RunSummary> {
	SeedingOrchestrator::new(catalog, Arc::new(InMemorySeedHistory::new()))
		.run(environment)
		.await
}
