//! Chunked application of an apply plan.
//!
//! A plan is split into consecutive chunks of at most `batch_size` operations.
//! Each chunk is staged on its own unit of work and committed once. Chunks are
//! committed sequentially; a failing chunk stops the apply with every earlier
//! chunk already durable. Cancellation is checked between chunks, never
//! inside one.

use std::ops::Range;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{SeedingError, SeedingResult, StoreError};
use crate::plan::{ApplyPlan, Operation};
use crate::store::Repository;

/// Default number of operations per committed chunk.
pub const DEFAULT_BATCH_SIZE: usize = seedwork_conf::DEFAULT_BATCH_SIZE;

/// Timing of one committed chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkTiming {
	/// Zero-based chunk index within the seeder's plan.
	pub chunk: usize,
	/// Operations in the chunk.
	pub operations: usize,
	/// Wall-clock time spent staging and committing.
	pub duration: Duration,
}

/// Receives a callback after every committed chunk.
pub trait ApplyObserver: Send + Sync {
	/// Called once per successfully committed chunk.
	fn on_chunk_committed(&self, seeder: &str, timing: &ChunkTiming);
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ApplyObserver for NoopObserver {
	fn on_chunk_committed(&self, _seeder: &str, _timing: &ChunkTiming) {}
}

/// What an apply achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
	/// Chunks committed.
	pub chunks_committed: usize,
	/// Operations committed.
	pub operations_applied: usize,
	/// Inserts committed.
	pub inserted: usize,
	/// Updates committed.
	pub updated: usize,
	/// Chunks the plan was split into.
	pub chunks_planned: usize,
	/// True if cancellation stopped the apply before the plan was exhausted.
	pub cancelled: bool,
}

/// A chunk that failed to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
	/// Zero-based chunk index.
	pub chunk: usize,
	/// Operation range covered by the chunk.
	pub range: Range<usize>,
	/// Progress committed before the failure.
	pub committed: ApplyReport,
	/// Store failure.
	pub source: StoreError,
}

impl ChunkFailure {
	/// Attributes the failure to a seeder.
	pub fn into_error(self, seeder: impl Into<String>) -> SeedingError {
		SeedingError::ApplyFailed {
			seeder: seeder.into(),
			chunk: self.chunk,
			start: self.range.start,
			end: self.range.end,
			source: self.source,
		}
	}
}

/// Applies plans in bounded chunks.
#[derive(Debug, Clone)]
pub struct BatchApplier {
	batch_size: usize,
	cancellation: CancellationToken,
}

impl Default for BatchApplier {
	fn default() -> Self {
		Self {
			batch_size: DEFAULT_BATCH_SIZE,
			cancellation: CancellationToken::new(),
		}
	}
}

impl BatchApplier {
	/// Creates an applier committing at most `batch_size` operations per chunk.
	pub fn new(batch_size: usize) -> SeedingResult<Self> {
		if batch_size == 0 {
			return Err(SeedingError::InvalidBatchSize(batch_size));
		}
		Ok(Self {
			batch_size,
			cancellation: CancellationToken::new(),
		})
	}

	/// Uses `token` as the run-scoped cancellation signal.
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancellation = token;
		self
	}

	/// Configured batch size.
	pub fn batch_size(&self) -> usize {
		self.batch_size
	}

	/// Cancellation signal observed between chunks.
	pub fn cancellation(&self) -> &CancellationToken {
		&self.cancellation
	}

	/// Applies `plan` to `repository` chunk by chunk.
	pub async fn apply<E: Send + 'static>(
		&self,
		seeder: &str,
		repository: &dyn Repository<E>,
		plan: ApplyPlan<E>,
		observer: &dyn ApplyObserver,
	) -> Result<ApplyReport, ChunkFailure> {
		let mut report = ApplyReport {
			chunks_planned: plan.chunk_count(self.batch_size),
			..Default::default()
		};
		let mut operations = plan.into_operations().into_iter();
		let mut start = 0;

		while operations.len() > 0 {
			if self.cancellation.is_cancelled() {
				tracing::info!(
					seeder,
					committed = report.chunks_committed,
					planned = report.chunks_planned,
					"cancellation requested, stopping before next chunk"
				);
				report.cancelled = true;
				break;
			}

			let chunk = report.chunks_committed;
			let started = Instant::now();
			let mut unit = repository.begin();
			let (mut inserts, mut updates) = (0, 0);
			for operation in operations.by_ref().take(self.batch_size) {
				match operation {
					Operation::Insert(entity) => {
						inserts += 1;
						unit.stage_insert(entity);
					}
					Operation::Update(entity) => {
						updates += 1;
						unit.stage_update(entity);
					}
				}
			}
			let staged = unit.staged();
			let range = start..start + staged;

			if let Err(source) = unit.commit().await {
				tracing::error!(
					seeder,
					chunk,
					start = range.start,
					end = range.end,
					error = %source,
					"chunk commit failed"
				);
				return Err(ChunkFailure {
					chunk,
					range,
					committed: report,
					source,
				});
			}

			let timing = ChunkTiming {
				chunk,
				operations: staged,
				duration: started.elapsed(),
			};
			tracing::debug!(seeder, chunk, operations = staged, elapsed = ?timing.duration, "chunk committed");
			observer.on_chunk_committed(seeder, &timing);

			report.chunks_committed += 1;
			report.operations_applied += staged;
			report.inserted += inserts;
			report.updated += updates;
			start = range.end;
		}

		Ok(report)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryRepository;
	use parking_lot::Mutex;
	use rstest::rstest;

	#[derive(Default)]
	struct Recorder {
		chunks: Mutex<Vec<ChunkTiming>>,
	}

	impl ApplyObserver for Recorder {
		fn on_chunk_committed(&self, _seeder: &str, timing: &ChunkTiming) {
			self.chunks.lock().push(timing.clone());
		}
	}

	struct CancelAfter {
		chunks: usize,
		token: CancellationToken,
	}

	impl ApplyObserver for CancelAfter {
		fn on_chunk_committed(&self, _seeder: &str, timing: &ChunkTiming) {
			if timing.chunk + 1 == self.chunks {
				self.token.cancel();
			}
		}
	}

	fn inserts(count: u32) -> ApplyPlan<u32> {
		(0..count).map(Operation::Insert).collect::<Vec<_>>().into()
	}

	fn repository() -> MemoryRepository<u32, u32> {
		MemoryRepository::new(|v: &u32| *v)
	}

	#[rstest]
	fn test_zero_batch_size_rejected() {
		assert!(matches!(
			BatchApplier::new(0),
			Err(SeedingError::InvalidBatchSize(0))
		));
	}

	#[rstest]
	#[tokio::test]
	async fn test_batching_boundary() {
		// Arrange
		let batch_size = 10;
		let repo = repository();
		let applier = BatchApplier::new(batch_size).unwrap();
		let recorder = Recorder::default();

		// Act
		let report = applier
			.apply("numbers", &repo, inserts(3 * batch_size as u32 + 1), &recorder)
			.await
			.unwrap();

		// Assert
		assert_eq!(report.chunks_committed, 4);
		assert_eq!(report.chunks_planned, 4);
		assert_eq!(report.operations_applied, 31);
		assert_eq!(repo.commits(), 4);
		let sizes: Vec<_> = recorder.chunks.lock().iter().map(|c| c.operations).collect();
		assert_eq!(sizes, vec![10, 10, 10, 1]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_empty_plan_commits_nothing() {
		let repo = repository();
		let report = BatchApplier::default()
			.apply("numbers", &repo, ApplyPlan::new(), &NoopObserver)
			.await
			.unwrap();
		assert_eq!(report, ApplyReport::default());
		assert_eq!(repo.commits(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_failure_keeps_prior_chunks() {
		// Arrange
		let repo = repository();
		repo.fail_on_commit(3);
		let applier = BatchApplier::new(5).unwrap();

		// Act
		let failure = applier
			.apply("numbers", &repo, inserts(20), &NoopObserver)
			.await
			.unwrap_err();

		// Assert
		assert_eq!(failure.chunk, 2);
		assert_eq!(failure.range, 10..15);
		assert_eq!(failure.committed.chunks_committed, 2);
		assert_eq!(failure.committed.operations_applied, 10);
		assert_eq!(failure.committed.inserted, 10);
		assert_eq!(repo.len(), 10);

		let error = failure.into_error("numbers");
		assert!(matches!(
			error,
			SeedingError::ApplyFailed { chunk: 2, start: 10, end: 15, .. }
		));
	}

	#[rstest]
	#[tokio::test]
	async fn test_cancellation_between_chunks() {
		// Arrange
		let token = CancellationToken::new();
		let applier = BatchApplier::new(10).unwrap().with_cancellation(token.clone());
		let repo = repository();
		let observer = CancelAfter {
			chunks: 2,
			token: token.clone(),
		};

		// Act
		let report = applier
			.apply("numbers", &repo, inserts(50), &observer)
			.await
			.unwrap();

		// Assert
		assert!(report.cancelled);
		assert_eq!(report.chunks_committed, 2);
		assert_eq!(report.chunks_planned, 5);
		assert_eq!(report.inserted, 20);
		assert_eq!(repo.len(), 20);
	}

	#[rstest]
	#[tokio::test]
	async fn test_report_splits_inserts_and_updates() {
		// Arrange
		let repo = repository();
		repo.seed_rows([1, 2]);
		let plan: ApplyPlan<u32> = vec![
			Operation::Update(1),
			Operation::Insert(3),
			Operation::Update(2),
			Operation::Insert(4),
			Operation::Insert(5),
		]
		.into();

		// Act
		let report = BatchApplier::new(2)
			.unwrap()
			.apply("numbers", &repo, plan, &NoopObserver)
			.await
			.unwrap();

		// Assert
		assert_eq!((report.inserted, report.updated), (3, 2));
		assert_eq!(report.operations_applied, 5);
		assert_eq!(report.chunks_committed, 3);
	}
}
