//! Append-only seed history.
//!
//! One [`SeedHistoryRecord`] is appended per seeder per run. Records are never
//! rewritten.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{SeedingError, SeedingResult};
use crate::summary::{SeederOutcome, SeederStatus};

/// Audit row for one seeder in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedHistoryRecord {
	/// Run identifier.
	pub run_id: Uuid,
	/// Seeder name.
	pub seeder: String,
	/// Environment the run was gated against.
	pub environment: String,
	/// When the seeder finished.
	pub ran_at: DateTime<Utc>,
	/// Terminal status.
	pub status: SeederStatus,
	/// Records inserted. Only committed inserts are counted.
	pub inserted: usize,
	/// Records updated. Only committed updates are counted.
	pub updated: usize,
	/// Desired records left alone because they already matched.
	pub skipped: usize,
	/// Skip reason or failure message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub note: Option<String>,
}

impl SeedHistoryRecord {
	/// Builds the record for a finished seeder.
	pub fn from_outcome(run_id: Uuid, environment: &str, outcome: &SeederOutcome) -> Self {
		let note = outcome
			.skip_reason
			.clone()
			.or_else(|| outcome.failure.as_ref().map(|f| f.message.clone()));
		Self {
			run_id,
			seeder: outcome.seeder.clone(),
			environment: environment.to_string(),
			ran_at: Utc::now(),
			status: outcome.status,
			inserted: outcome.committed.inserted,
			updated: outcome.committed.updated,
			skipped: outcome.committed.unchanged,
			note,
		}
	}
}

/// Storage for the seed history log.
#[async_trait]
pub trait SeedHistory: Send + Sync {
	/// Appends a record.
	async fn append(&self, record: SeedHistoryRecord) -> SeedingResult<()>;

	/// Every record, in append order.
	async fn records(&self) -> SeedingResult<Vec<SeedHistoryRecord>>;
}

/// History kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySeedHistory {
	records: Arc<RwLock<Vec<SeedHistoryRecord>>>,
}

impl InMemorySeedHistory {
	/// Creates an empty history.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of records.
	pub fn len(&self) -> usize {
		self.records.read().len()
	}

	/// Returns true when no record was appended.
	pub fn is_empty(&self) -> bool {
		self.records.read().is_empty()
	}
}

#[async_trait]
impl SeedHistory for InMemorySeedHistory {
	async fn append(&self, record: SeedHistoryRecord) -> SeedingResult<()> {
		self.records.write().push(record);
		Ok(())
	}

	async fn records(&self) -> SeedingResult<Vec<SeedHistoryRecord>> {
		Ok(self.records.read().clone())
	}
}

/// History stored as a JSON-lines file, one record per line.
#[derive(Debug, Clone)]
pub struct JsonLinesSeedHistory {
	path: PathBuf,
}

impl JsonLinesSeedHistory {
	/// Uses `path`, creating it on first append.
	pub fn new(path: impl AsRef<Path>) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
		}
	}

	/// Log file location.
	pub fn path(&self) -> &Path {
		&self.path
	}
}

#[async_trait]
impl SeedHistory for JsonLinesSeedHistory {
	async fn append(&self, record: SeedHistoryRecord) -> SeedingResult<()> {
		let mut line = serde_json::to_string(&record)?;
		line.push('\n');

		let mut file = tokio::fs::OpenOptions::new()
			.create(true)
			.append(true)
			.open(&self.path)
			.await
			.map_err(|e| {
				SeedingError::History(format!("cannot open {}: {}", self.path.display(), e))
			})?;
		file.write_all(line.as_bytes()).await?;
		file.flush().await?;
		Ok(())
	}

	async fn records(&self) -> SeedingResult<Vec<SeedHistoryRecord>> {
		let content = match tokio::fs::read_to_string(&self.path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(e.into()),
		};

		content
			.lines()
			.filter(|line| !line.trim().is_empty())
			.map(|line| serde_json::from_str(line).map_err(SeedingError::from))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::plan::SeedCounts;
	use rstest::rstest;
	use tempfile::TempDir;

	fn record(seeder: &str, status: SeederStatus) -> SeedHistoryRecord {
		let mut outcome = SeederOutcome::with_status(seeder, status);
		outcome.counts = SeedCounts {
			inserted: 3,
			updated: 1,
			unchanged: 2,
		};
		outcome.committed = outcome.counts;
		SeedHistoryRecord::from_outcome(Uuid::new_v4(), "Development", &outcome)
	}

	#[rstest]
	fn test_record_from_outcome() {
		let r = record("users", SeederStatus::Applied);
		assert_eq!(r.seeder, "users");
		assert_eq!((r.inserted, r.updated, r.skipped), (3, 1, 2));
		assert_eq!(r.note, None);
	}

	#[rstest]
	fn test_record_counts_only_committed_writes() {
		let mut outcome = SeederOutcome::with_status("users", SeederStatus::Cancelled);
		outcome.counts = SeedCounts {
			inserted: 50,
			updated: 0,
			unchanged: 4,
		};
		outcome.committed = SeedCounts {
			inserted: 20,
			updated: 0,
			unchanged: 4,
		};

		let r = SeedHistoryRecord::from_outcome(Uuid::new_v4(), "Development", &outcome);

		assert_eq!((r.inserted, r.updated, r.skipped), (20, 0, 4));
	}

	#[rstest]
	#[tokio::test]
	async fn test_in_memory_append_order() {
		let history = InMemorySeedHistory::new();
		history.append(record("a", SeederStatus::Applied)).await.unwrap();
		history.append(record("b", SeederStatus::Skipped)).await.unwrap();

		let names: Vec<_> = history
			.records()
			.await
			.unwrap()
			.into_iter()
			.map(|r| r.seeder)
			.collect();
		assert_eq!(names, vec!["a", "b"]);
		assert_eq!(history.len(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_json_lines_appends_across_handles() {
		// Arrange
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("seed_history.jsonl");
		let first = record("a", SeederStatus::Applied);
		let second = record("b", SeederStatus::Failed);

		// Act
		JsonLinesSeedHistory::new(&path).append(first.clone()).await.unwrap();
		JsonLinesSeedHistory::new(&path).append(second.clone()).await.unwrap();

		// Assert
		let records = JsonLinesSeedHistory::new(&path).records().await.unwrap();
		assert_eq!(records, vec![first, second]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_json_lines_missing_file_is_empty() {
		let dir = TempDir::new().unwrap();
		let history = JsonLinesSeedHistory::new(dir.path().join("none.jsonl"));
		assert!(history.records().await.unwrap().is_empty());
	}
}
