//! Dependency-ordered, environment-gated seed reconciliation.
//!
//! A seeding run reconciles declared seed models (desired records) against the
//! current contents of a store and applies the difference:
//!
//! - **Seeders**: a [`Seeder`] describes one entity type, its business key and
//!   how desired models map onto persisted entities
//! - **Catalog**: a [`SeederCatalog`] binds each seeder to its [`Repository`]
//! - **Ordering**: [`resolve_order`] sorts seeders so dependencies run first
//! - **Gating**: an [`EnvironmentPolicy`] admits or skips a seeder for the
//!   active environment
//! - **Reconciliation**: [`reconcile`] diffs by business key into an
//!   [`ApplyPlan`] of inserts and updates; nothing is ever deleted
//! - **Apply**: [`BatchApplier`] commits the plan in bounded chunks, one unit
//!   of work per chunk
//! - **History**: every seeder's result is appended to a [`SeedHistory`]
//!
//! # Quick Start
//!
//! ```ignore
//! use seedwork_seeding::prelude::*;
//!
//! let mut catalog = SeederCatalog::new();
//! catalog.register(CountrySeeder::default(), MemoryRepository::new(|c: &Country| c.code.clone()))?;
//! catalog.register(CustomerSeeder::default(), customer_repository)?;
//!
//! let summary = run_seeding(catalog, "Development").await?;
//! for outcome in &summary.outcomes {
//!     println!("{}: {} ({} inserted)", outcome.seeder, outcome.status, outcome.counts.inserted);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod apply;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod plan;
pub mod policy;
pub mod prelude;
pub mod reconcile;
pub mod registry;
pub mod resolver;
pub mod seeder;
pub mod store;
pub mod summary;

// Re-export commonly used types at crate root
pub use apply::{ApplyObserver, ApplyReport, BatchApplier, ChunkFailure, ChunkTiming, NoopObserver};
pub use error::{SeedingError, SeedingResult, StoreError, StoreResult};
pub use history::{InMemorySeedHistory, JsonLinesSeedHistory, SeedHistory, SeedHistoryRecord};
pub use orchestrator::{RunOptions, SeedingOrchestrator, run_seeding};
pub use plan::{ApplyPlan, Operation, OperationKind, SeedCounts};
pub use policy::{EnvironmentPolicy, GateDecision, SkipReason, gate};
pub use reconcile::{IntegrityWarning, Reconciliation, check_unique_keys, reconcile};
pub use registry::{ErasedSeeder, SeederCatalog, SeederFailure, SeederRegistration, SeederRun};
pub use resolver::{DependencyNode, resolve_order, resolve_subset, topological_order};
pub use seeder::Seeder;
pub use store::{MemoryRepository, Repository, UnitOfWork};
pub use summary::{FailureDetail, RunSummary, SeederOutcome, SeederStatus};

pub use tokio_util::sync::CancellationToken;
