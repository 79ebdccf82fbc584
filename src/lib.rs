//! # Seedwork
//!
//! Reconciles declared seed data against a persistence store. Seeders run in
//! dependency order, are gated by the active environment, and write only the
//! difference between the desired records and what the store already holds,
//! in bounded chunks.
//!
//! ## Feature Flags
//!
//! - `full` (default) - Everything below
//! - `conf` - Environment resolution and settings
//! - `seeding` - Seeders, catalog, orchestrator
//! - `stress` - Stress test harness with synthetic datasets
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use seedwork::prelude::*;
//!
//! let mut catalog = SeederCatalog::new();
//! catalog.register(CountrySeeder::default(), country_repository)?;
//! catalog.register(CustomerSeeder::default(), customer_repository)?;
//!
//! let environment = EnvironmentResolver.current()?;
//! let summary = run_seeding(catalog, &environment).await?;
//! assert!(summary.is_success());
//! ```

#[cfg(feature = "conf")]
pub mod conf;
#[cfg(feature = "seeding")]
pub mod seeding;
#[cfg(feature = "stress")]
pub mod stress;

// Re-export settings
#[cfg(feature = "conf")]
pub use seedwork_conf::{EnvironmentResolver, SeedingSettings, SettingsBuilder, SettingsError};

// Re-export the seeding core
#[cfg(feature = "seeding")]
pub use seedwork_seeding::{
	EnvironmentPolicy, MemoryRepository, Repository, RunSummary, Seeder, SeederCatalog,
	SeederStatus, SeedingError, SeedingOrchestrator, SeedingResult, run_seeding,
};

// Re-export the stress harness
#[cfg(feature = "stress")]
pub use seedwork_stress::{
	DatasetSize, ReportFormat, StressError, StressTestConfiguration, StressTestReport,
	StressTestRunner, run_stress_test,
};

/// Convenience re-exports for common usage.
pub mod prelude {
	#[cfg(feature = "conf")]
	pub use seedwork_conf::{EnvironmentResolver, SeedingSettings, SettingsBuilder};

	#[cfg(feature = "seeding")]
	pub use seedwork_seeding::prelude::*;

	#[cfg(feature = "stress")]
	pub use seedwork_stress::{
		DatasetSize, ReportFormat, StressTestConfiguration, StressTestRunner, run_stress_test,
	};
}
