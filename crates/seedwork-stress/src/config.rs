//! Stress test configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use seedwork_conf::{DEFAULT_BATCH_SIZE, DEVELOPMENT, SeedingSettings, is_production};
use serde::{Deserialize, Serialize};

use crate::error::{StressError, StressResult};

/// Dataset size tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSize {
	/// 1,000 records.
	#[default]
	Small,
	/// 10,000 records.
	Medium,
	/// 100,000 records.
	Large,
	/// 1,000,000 records.
	ExtraLarge,
}

impl DatasetSize {
	/// Every tier, smallest first.
	pub const ALL: [DatasetSize; 4] = [Self::Small, Self::Medium, Self::Large, Self::ExtraLarge];

	/// Number of records generated for this tier.
	pub const fn record_count(self) -> usize {
		match self {
			Self::Small => 1_000,
			Self::Medium => 10_000,
			Self::Large => 100_000,
			Self::ExtraLarge => 1_000_000,
		}
	}
}

impl fmt::Display for DatasetSize {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Small => "small",
			Self::Medium => "medium",
			Self::Large => "large",
			Self::ExtraLarge => "extra_large",
		};
		f.write_str(name)
	}
}

impl FromStr for DatasetSize {
	type Err = StressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"small" | "s" | "1k" => Ok(Self::Small),
			"medium" | "m" | "10k" => Ok(Self::Medium),
			"large" | "l" | "100k" => Ok(Self::Large),
			"extra_large" | "extra-large" | "extralarge" | "xl" | "1m" => Ok(Self::ExtraLarge),
			_ => Err(StressError::UnknownDatasetSize(s.to_string())),
		}
	}
}

/// Report output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
	/// Human-readable text on the console.
	#[default]
	Console,
	/// Human-readable text written to the output path.
	File,
	/// Text on the console and in the output path.
	Both,
	/// JSON, written to the output path when set, otherwise to the console.
	Json,
}

impl ReportFormat {
	/// Whether this format requires an output path.
	pub fn requires_output_path(self) -> bool {
		matches!(self, Self::File | Self::Both)
	}
}

impl fmt::Display for ReportFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Console => "console",
			Self::File => "file",
			Self::Both => "both",
			Self::Json => "json",
		};
		f.write_str(name)
	}
}

impl FromStr for ReportFormat {
	type Err = StressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"console" | "text" => Ok(Self::Console),
			"file" => Ok(Self::File),
			"both" => Ok(Self::Both),
			"json" => Ok(Self::Json),
			_ => Err(StressError::UnknownReportFormat(s.to_string())),
		}
	}
}

/// Configuration of a stress test run.
///
/// # Example
///
/// ```
/// use seedwork_stress::{DatasetSize, ReportFormat, StressTestConfiguration};
///
/// let config = StressTestConfiguration::new()
///     .with_dataset_size(DatasetSize::Medium)
///     .with_batch_size(500)
///     .with_iterations(3)
///     .with_report_format(ReportFormat::Json);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.record_count(), 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressTestConfiguration {
	/// Size tier of the synthetic dataset.
	pub dataset_size: DatasetSize,

	/// Maximum operations per committed chunk.
	pub batch_size: usize,

	/// Number of seeding runs.
	pub iterations: usize,

	/// Delete seeded rows before every iteration after the first.
	pub clear_between_iterations: bool,

	/// Environment the runs are gated against.
	pub environment: String,

	/// Report format.
	pub report_format: ReportFormat,

	/// Report file location.
	pub output_path: Option<PathBuf>,

	/// Seed of the dataset generator.
	pub seed: u64,

	/// Fraction of records changed in every iteration after the first.
	pub mutate_fraction: f64,

	/// Sample resident memory of the process after each iteration.
	pub collect_memory: bool,
}

impl Default for StressTestConfiguration {
	fn default() -> Self {
		Self {
			dataset_size: DatasetSize::default(),
			batch_size: DEFAULT_BATCH_SIZE,
			iterations: 1,
			clear_between_iterations: true,
			environment: DEVELOPMENT.to_string(),
			report_format: ReportFormat::default(),
			output_path: None,
			seed: 42,
			mutate_fraction: 0.0,
			collect_memory: false,
		}
	}
}

impl StressTestConfiguration {
	/// Create a configuration with defaults.
	pub fn new() -> Self {
		Self::default()
	}

	/// Take the batch size and environment from seeding settings.
	pub fn from_settings(settings: &SeedingSettings) -> Self {
		let mut config = Self::new().with_batch_size(settings.batch_size);
		if let Some(environment) = &settings.environment {
			config.environment = environment.clone();
		}
		config
	}

	/// Set the dataset size.
	pub fn with_dataset_size(mut self, size: DatasetSize) -> Self {
		self.dataset_size = size;
		self
	}

	/// Set the batch size.
	pub fn with_batch_size(mut self, batch_size: usize) -> Self {
		self.batch_size = batch_size;
		self
	}

	/// Set the iteration count.
	pub fn with_iterations(mut self, iterations: usize) -> Self {
		self.iterations = iterations;
		self
	}

	/// Set whether seeded rows are cleared between iterations.
	pub fn with_clear_between_iterations(mut self, clear: bool) -> Self {
		self.clear_between_iterations = clear;
		self
	}

	/// Set the environment.
	pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = environment.into();
		self
	}

	/// Set the report format.
	pub fn with_report_format(mut self, format: ReportFormat) -> Self {
		self.report_format = format;
		self
	}

	/// Set the report file location.
	pub fn with_output_path(mut self, path: impl AsRef<Path>) -> Self {
		self.output_path = Some(path.as_ref().to_path_buf());
		self
	}

	/// Set the generator seed.
	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = seed;
		self
	}

	/// Set the fraction of records changed between iterations.
	pub fn with_mutate_fraction(mut self, fraction: f64) -> Self {
		self.mutate_fraction = fraction;
		self
	}

	/// Enable or disable memory sampling.
	pub fn with_memory_sampling(mut self, enabled: bool) -> Self {
		self.collect_memory = enabled;
		self
	}

	/// Number of records generated per iteration.
	pub fn record_count(&self) -> usize {
		self.dataset_size.record_count()
	}

	/// Check the configuration.
	///
	/// # Errors
	///
	/// Returns [`StressError::InvalidConfiguration`] naming the first invalid
	/// field.
	pub fn validate(&self) -> StressResult<()> {
		if self.batch_size == 0 {
			return Err(invalid("batch_size", "must be at least 1"));
		}
		if self.iterations == 0 {
			return Err(invalid("iterations", "must be at least 1"));
		}
		if !(0.0..=1.0).contains(&self.mutate_fraction) {
			return Err(invalid(
				"mutate_fraction",
				format!("{} is outside 0.0..=1.0", self.mutate_fraction),
			));
		}
		if self.environment.trim().is_empty() {
			return Err(invalid("environment", "must not be blank"));
		}
		if is_production(&self.environment) {
			return Err(invalid(
				"environment",
				"synthetic data is never seeded into production",
			));
		}
		if self.report_format.requires_output_path() && self.output_path.is_none() {
			return Err(invalid(
				"output_path",
				format!("required by the '{}' report format", self.report_format),
			));
		}
		Ok(())
	}
}

fn invalid(field: &'static str, message: impl Into<String>) -> StressError {
	StressError::InvalidConfiguration {
		field,
		message: message.into(),
	}
}
