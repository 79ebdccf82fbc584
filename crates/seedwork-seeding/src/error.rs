//! Error types for the seeding module.
//!
//! Configuration errors ([`SeedingError::UnknownDependency`],
//! [`SeedingError::DependencyCycle`], [`SeedingError::DuplicateDesiredKey`]) are
//! raised before any store mutation. Apply failures carry the seeder name and
//! the chunk that failed to commit.

use std::time::Duration;

use thiserror::Error;

/// Errors reported by a persistence collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
	/// The backend rejected the operation.
	#[error("Backend error: {0}")]
	Backend(String),

	/// A uniqueness or existence constraint was violated.
	#[error("Conflict: {0}")]
	Conflict(String),

	/// The operation did not complete in time.
	#[error("Timed out after {0:?}")]
	Timeout(Duration),
}

/// Result type alias for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during seeding operations.
#[derive(Debug, Error)]
pub enum SeedingError {
	/// A seeder names a dependency that is not in the catalog.
	#[error("Seeder '{seeder}' depends on unknown seeder '{missing}'")]
	UnknownDependency {
		/// Seeder declaring the dependency.
		seeder: String,
		/// Name that could not be found.
		missing: String,
	},

	/// The dependency graph contains a cycle.
	#[error("Dependency cycle detected: {}", .0.join(" -> "))]
	DependencyCycle(Vec<String>),

	/// Two seeders were registered under the same name.
	#[error("Seeder already registered: {0}")]
	DuplicateSeeder(String),

	/// A seeder name was looked up but is not registered.
	#[error("Seeder not found: {0}")]
	SeederNotFound(String),

	/// The desired set of a seeder contains the same business key twice.
	#[error("Seeder '{seeder}' declares business key {key} more than once (record {index})")]
	DuplicateDesiredKey {
		/// Seeder owning the desired set.
		seeder: String,
		/// Debug rendering of the duplicated key.
		key: String,
		/// Position of the second occurrence in the desired sequence.
		index: usize,
	},

	/// A chunk failed to commit. Earlier chunks remain committed.
	#[error(
		"Seeder '{seeder}' failed to commit chunk {chunk} (operations {start}..{end}): {source}"
	)]
	ApplyFailed {
		/// Seeder being applied.
		seeder: String,
		/// Zero-based chunk index.
		chunk: usize,
		/// First operation index of the chunk.
		start: usize,
		/// One past the last operation index of the chunk.
		end: usize,
		/// Store failure.
		#[source]
		source: StoreError,
	},

	/// A read or delete against the store failed.
	#[error("Seeder '{seeder}' could not {operation}: {source}")]
	Store {
		/// Seeder whose store failed.
		seeder: String,
		/// What was being attempted ("load existing records", "clear records").
		operation: &'static str,
		/// Store failure.
		#[source]
		source: StoreError,
	},

	/// Seed history could not be written or read.
	#[error("Seed history error: {0}")]
	History(String),

	/// The history row of a seeder could not be appended. Chunks the seeder
	/// committed remain committed.
	#[error("Seeder '{seeder}' could not record seed history: {source}")]
	HistoryAppend {
		/// Seeder whose row was lost.
		seeder: String,
		/// History backend failure.
		#[source]
		source: Box<SeedingError>,
	},

	/// Batch size must be at least one.
	#[error("Invalid batch size: {0}")]
	InvalidBatchSize(usize),

	/// I/O operation failed.
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),
}

impl SeedingError {
	/// Returns true for errors detected before any store mutation.
	pub fn is_configuration_error(&self) -> bool {
		matches!(
			self,
			Self::UnknownDependency { .. }
				| Self::DependencyCycle(_)
				| Self::DuplicateSeeder(_)
				| Self::SeederNotFound(_)
				| Self::DuplicateDesiredKey { .. }
				| Self::InvalidBatchSize(_)
		)
	}

	/// Seeder this error is attributed to, if any.
	pub fn seeder(&self) -> Option<&str> {
		match self {
			Self::UnknownDependency { seeder, .. }
			| Self::DuplicateDesiredKey { seeder, .. }
			| Self::ApplyFailed { seeder, .. }
			| Self::Store { seeder, .. }
			| Self::HistoryAppend { seeder, .. } => Some(seeder),
			Self::DuplicateSeeder(name) | Self::SeederNotFound(name) => Some(name),
			_ => None,
		}
	}
}

/// Result type alias for seeding operations.
pub type SeedingResult<T> = Result<T, SeedingError>;
