//! Seeding module.
//!
//! Seeders, the seeder catalog, dependency resolution, reconciliation, batched
//! apply and the orchestrator.
//!
//! # Examples
//!
//! ```rust,no_run
//! use seedwork::seeding::{SeederCatalog, SeedingOrchestrator, run_seeding};
//! ```

#[cfg(feature = "seeding")]
pub use seedwork_seeding::*;
