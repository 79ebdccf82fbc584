//! Error types for the stress harness.

use seedwork_seeding::{SeederStatus, SeedingError};
use thiserror::Error;

/// Stress harness errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StressError {
	/// A configuration field is out of range.
	#[error("Invalid stress test configuration: {field}: {message}")]
	InvalidConfiguration {
		/// Offending field.
		field: &'static str,
		/// What is wrong with it.
		message: String,
	},

	/// A dataset size name could not be parsed.
	#[error("Unknown dataset size: {0}")]
	UnknownDatasetSize(String),

	/// A report format name could not be parsed.
	#[error("Unknown report format: {0}")]
	UnknownReportFormat(String),

	/// A seeding run returned a configuration error.
	#[error("Seeding error: {0}")]
	Seeding(#[from] SeedingError),

	/// A seeding run finished without applying the synthetic dataset.
	#[error("Iteration {iteration} ended with seeder '{seeder}' {status}: {message}")]
	IterationFailed {
		/// Zero-based iteration index.
		iteration: usize,
		/// Seeder that did not apply.
		seeder: String,
		/// Its terminal status.
		status: SeederStatus,
		/// Failure or skip detail.
		message: String,
	},

	/// IO error while writing a report.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON rendering error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Result type for stress harness operations.
pub type StressResult<T> = Result<T, StressError>;
