//! Stress test runner.
//!
//! Each iteration is a full orchestrated seeding run of the synthetic dataset
//! against one shared store. Chunk timings flow into the [`MetricsCollector`]
//! through the orchestrator's apply observer.

use std::sync::Arc;
use std::time::Instant;

use seedwork_seeding::{
	CancellationToken, InMemorySeedHistory, RunSummary, SeederCatalog, SeederStatus,
	SeedingOrchestrator,
};
use serde::{Deserialize, Serialize};

use crate::config::StressTestConfiguration;
use crate::error::{StressError, StressResult};
use crate::generator::DatasetGenerator;
use crate::metrics::{MetricsCollector, StressTestMetrics};
use crate::reporter::Reporter;
use crate::seeder::{SyntheticRepository, SyntheticSeeder, synthetic_repository};

/// Result of a stress run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestReport {
	/// Configuration the run used.
	pub configuration: StressTestConfiguration,
	/// Collected metrics.
	pub metrics: StressTestMetrics,
	/// Summary of every completed seeding run, in order.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub summaries: Vec<RunSummary>,
	/// Set when cancellation stopped the run early.
	pub cancelled: bool,
}

/// Runs stress iterations against a synthetic store.
#[derive(Debug)]
pub struct StressTestRunner {
	configuration: StressTestConfiguration,
	repository: SyntheticRepository,
	cancellation: CancellationToken,
}

impl StressTestRunner {
	/// Creates a runner over a fresh in-memory store.
	///
	/// # Errors
	///
	/// Returns [`StressError::InvalidConfiguration`] for an invalid
	/// configuration.
	pub fn new(configuration: StressTestConfiguration) -> StressResult<Self> {
		configuration.validate()?;
		Ok(Self {
			configuration,
			repository: synthetic_repository(),
			cancellation: CancellationToken::new(),
		})
	}

	/// Seeds into `repository` instead of a fresh store.
	pub fn with_repository(mut self, repository: SyntheticRepository) -> Self {
		self.repository = repository;
		self
	}

	/// Stops the run between chunks once `token` is cancelled.
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancellation = token;
		self
	}

	/// The configuration.
	pub fn configuration(&self) -> &StressTestConfiguration {
		&self.configuration
	}

	/// The store being seeded.
	pub fn repository(&self) -> &SyntheticRepository {
		&self.repository
	}

	fn generator(&self, iteration: usize) -> DatasetGenerator {
		let generator =
			DatasetGenerator::for_size(self.configuration.dataset_size, self.configuration.seed);
		if iteration > 0 && self.configuration.mutate_fraction > 0.0 {
			generator
				.mutate_fraction(self.configuration.mutate_fraction)
				.with_revision(iteration as u32)
		} else {
			generator
		}
	}

	/// Executes every configured iteration.
	///
	/// # Errors
	///
	/// Fails on seeding configuration errors and when an iteration does not
	/// apply the dataset. Cancellation is not an error: the report covers the
	/// iterations that ran and is flagged `cancelled`.
	pub async fn run(&self) -> StressResult<StressTestReport> {
		let config = &self.configuration;
		let collector = Arc::new(MetricsCollector::new(config.collect_memory));
		let history = Arc::new(InMemorySeedHistory::new());
		let started = Instant::now();
		let mut summaries = Vec::with_capacity(config.iterations);
		let mut cancelled = false;

		tracing::info!(
			dataset = %config.dataset_size,
			records = config.record_count(),
			batch_size = config.batch_size,
			iterations = config.iterations,
			"stress test started"
		);

		for iteration in 0..config.iterations {
			let catalog = SeederCatalog::new()
				.with(SyntheticSeeder::new(self.generator(iteration)), self.repository.clone())?;

			if iteration > 0 && config.clear_between_iterations {
				let removed = catalog.clear_all().await?;
				tracing::debug!(iteration, removed, "store cleared");
			}

			let orchestrator = SeedingOrchestrator::new(catalog, history.clone())
				.with_batch_size(config.batch_size)
				.with_cancellation(self.cancellation.clone())
				.with_observer(collector.clone());

			let iteration_started = Instant::now();
			let summary = orchestrator.run(&config.environment).await?;
			let elapsed = iteration_started.elapsed();

			if let Some(outcome) = summary
				.outcomes
				.iter()
				.find(|o| o.status != SeederStatus::Applied)
			{
				if outcome.status == SeederStatus::Cancelled {
					collector.finish_iteration(iteration, elapsed, &summary);
					summaries.push(summary);
					cancelled = true;
					tracing::warn!(iteration, "stress test cancelled");
					break;
				}
				let message = outcome
					.failure
					.as_ref()
					.map(|f| f.message.clone())
					.or_else(|| outcome.skip_reason.clone())
					.unwrap_or_default();
				return Err(StressError::IterationFailed {
					iteration,
					seeder: outcome.seeder.clone(),
					status: outcome.status,
					message,
				});
			}

			let metrics = collector.finish_iteration(iteration, elapsed, &summary);
			tracing::info!(
				iteration,
				inserted = metrics.inserted,
				updated = metrics.updated,
				unchanged = metrics.unchanged,
				chunks = metrics.chunks_committed,
				elapsed_ms = metrics.elapsed_ms,
				"iteration finished"
			);
			summaries.push(summary);
		}

		let metrics = collector.finish(started.elapsed());
		tracing::info!(
			records_per_second = metrics.records_per_second,
			total_elapsed_ms = metrics.total_elapsed_ms,
			"stress test finished"
		);

		Ok(StressTestReport {
			configuration: config.clone(),
			metrics,
			summaries,
			cancelled,
		})
	}
}

/// Runs a stress test and writes its report to the configured outputs.
///
/// Console output goes to standard output.
pub async fn run_stress_test(
	configuration: StressTestConfiguration,
) -> StressResult<StressTestReport> {
	let reporter = Reporter::from_configuration(&configuration);
	let report = StressTestRunner::new(configuration)?.run().await?;
	reporter.emit(&report, &mut std::io::stdout())?;
	Ok(report)
}
