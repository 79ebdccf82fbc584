//! Per-run results.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SeedingError;
use crate::plan::SeedCounts;

/// Terminal status of one seeder in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeederStatus {
	/// Reconciled and every chunk committed.
	Applied,
	/// Not admitted by the environment gate.
	Skipped,
	/// A chunk failed to commit, or existing records could not be loaded.
	Failed,
	/// Stopped by cancellation, before or during its apply.
	Cancelled,
	/// Never started because an earlier seeder failed.
	NotRun,
}

impl fmt::Display for SeederStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Self::Applied => "applied",
			Self::Skipped => "skipped",
			Self::Failed => "failed",
			Self::Cancelled => "cancelled",
			Self::NotRun => "not run",
		};
		f.write_str(label)
	}
}

/// Where and why a seeder failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
	/// Rendered error.
	pub message: String,
	/// Chunk that failed to commit, for apply failures.
	pub chunk: Option<usize>,
	/// Operation range of that chunk, as `(start, end)`.
	pub operations: Option<(usize, usize)>,
}

impl From<&SeedingError> for FailureDetail {
	fn from(error: &SeedingError) -> Self {
		match error {
			SeedingError::ApplyFailed {
				chunk, start, end, ..
			} => Self {
				message: error.to_string(),
				chunk: Some(*chunk),
				operations: Some((*start, *end)),
			},
			other => Self {
				message: other.to_string(),
				chunk: None,
				operations: None,
			},
		}
	}
}

/// Result for one seeder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeederOutcome {
	/// Seeder name.
	pub seeder: String,
	/// Terminal status.
	pub status: SeederStatus,
	/// Reconciliation counts. Zero unless the seeder was reconciled.
	pub counts: SeedCounts,
	/// Inserts and updates that were committed, plus the unchanged count.
	/// Falls short of `counts` when the seeder was cancelled or failed.
	#[serde(default)]
	pub committed: SeedCounts,
	/// Chunks committed.
	pub chunks_committed: usize,
	/// Operations committed.
	pub operations_applied: usize,
	/// Time spent on this seeder.
	pub duration: Duration,
	/// Gate skip reason, for [`SeederStatus::Skipped`].
	pub skip_reason: Option<String>,
	/// Failure detail, for [`SeederStatus::Failed`].
	pub failure: Option<FailureDetail>,
}

impl SeederOutcome {
	pub(crate) fn with_status(seeder: impl Into<String>, status: SeederStatus) -> Self {
		Self {
			seeder: seeder.into(),
			status,
			counts: SeedCounts::default(),
			committed: SeedCounts::default(),
			chunks_committed: 0,
			operations_applied: 0,
			duration: Duration::ZERO,
			skip_reason: None,
			failure: None,
		}
	}
}

/// Summary of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
	/// Identifier shared by the run's seed history records.
	pub run_id: Uuid,
	/// Environment the run was gated against.
	pub environment: String,
	/// One outcome per catalog seeder, in execution order.
	pub outcomes: Vec<SeederOutcome>,
	/// Wall-clock time of the whole run.
	pub elapsed: Duration,
}

impl RunSummary {
	/// Looks up a seeder's outcome.
	pub fn outcome(&self, seeder: &str) -> Option<&SeederOutcome> {
		self.outcomes.iter().find(|o| o.seeder == seeder)
	}

	/// Seeder names in execution order.
	pub fn order(&self) -> Vec<&str> {
		self.outcomes.iter().map(|o| o.seeder.as_str()).collect()
	}

	/// Counts summed over every seeder.
	pub fn total_counts(&self) -> SeedCounts {
		let mut total = SeedCounts::default();
		for outcome in &self.outcomes {
			total += outcome.counts;
		}
		total
	}

	/// Committed counts summed over every seeder.
	pub fn total_committed(&self) -> SeedCounts {
		let mut total = SeedCounts::default();
		for outcome in &self.outcomes {
			total += outcome.committed;
		}
		total
	}

	/// Chunks committed across every seeder.
	pub fn total_commits(&self) -> usize {
		self.outcomes.iter().map(|o| o.chunks_committed).sum()
	}

	/// Number of seeders with `status`.
	pub fn count_status(&self, status: SeederStatus) -> usize {
		self.outcomes.iter().filter(|o| o.status == status).count()
	}

	/// First failed outcome, if any.
	pub fn failure(&self) -> Option<&SeederOutcome> {
		self.outcomes
			.iter()
			.find(|o| o.status == SeederStatus::Failed)
	}

	/// True when every seeder was applied or skipped.
	pub fn is_success(&self) -> bool {
		self.outcomes
			.iter()
			.all(|o| matches!(o.status, SeederStatus::Applied | SeederStatus::Skipped))
	}
}
