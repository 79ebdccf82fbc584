//! Stress test harness for seeding runs.
//!
//! Generates a synthetic dataset in one of four size tiers, seeds it through
//! the regular orchestrator for a number of iterations, and reports chunk
//! latency, throughput and optionally process memory.
//!
//! ## Components
//!
//! - [`StressTestConfiguration`]: dataset size, batch size, iterations,
//!   report format
//! - [`DatasetGenerator`]: deterministic, lazily evaluated synthetic models
//! - [`MetricsCollector`]: per-chunk and per-iteration timings
//! - [`Reporter`]: console text, JSON, or file output
//! - [`StressTestRunner`]: drives the iterations
//!
//! ## Example
//!
//! ```no_run
//! use seedwork_stress::{DatasetSize, StressTestConfiguration, run_stress_test};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StressTestConfiguration::new()
//!     .with_dataset_size(DatasetSize::Medium)
//!     .with_batch_size(500)
//!     .with_iterations(3)
//!     .with_clear_between_iterations(false);
//!
//! let report = run_stress_test(config).await?;
//! println!("{:.0} records/sec", report.metrics.records_per_second);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod reporter;
pub mod runner;
pub mod seeder;

pub use config::{DatasetSize, ReportFormat, StressTestConfiguration};
pub use error::{StressError, StressResult};
pub use generator::{DatasetGenerator, DatasetIter, SyntheticModel, synthetic_key};
pub use metrics::{
	IterationMetrics, LatencyStats, MetricsCollector, StressTestMetrics, current_process_memory,
};
pub use reporter::Reporter;
pub use runner::{StressTestReport, StressTestRunner, run_stress_test};
pub use seeder::{
	SYNTHETIC_SEEDER, SyntheticRecord, SyntheticRepository, SyntheticSeeder, synthetic_repository,
};
