//! Convenience re-exports for common usage.
//!
//! ```ignore
//! use seedwork_seeding::prelude::*;
//! ```

// Error types
pub use crate::error::{SeedingError, SeedingResult, StoreError, StoreResult};

// Seeder contract and catalog
pub use crate::policy::{EnvironmentPolicy, GateDecision, SkipReason};
pub use crate::registry::{SeederCatalog, SeederRegistration};
pub use crate::seeder::Seeder;

// Persistence
pub use crate::store::{MemoryRepository, Repository, UnitOfWork};

// Running
pub use crate::apply::{ApplyObserver, BatchApplier, ChunkTiming};
pub use crate::history::{InMemorySeedHistory, JsonLinesSeedHistory, SeedHistory};
pub use crate::orchestrator::{RunOptions, SeedingOrchestrator, run_seeding};
pub use crate::summary::{RunSummary, SeederOutcome, SeederStatus};
pub use tokio_util::sync::CancellationToken;
