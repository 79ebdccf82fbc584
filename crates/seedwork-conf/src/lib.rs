//! # seedwork configuration
//!
//! Environment and settings plumbing for seeding runs.
//!
//! - [`env`]: prefix-aware typed access to environment variables
//! - [`environment`]: resolution of the active runtime environment name, cached
//!   once per process with a reset hook for tests
//! - [`settings`]: [`SeedingSettings`] merged from defaults, a TOML file and
//!   `SEEDWORK_*` variables
//!
//! ```no_run
//! use seedwork_conf::SettingsBuilder;
//!
//! let settings = SettingsBuilder::new().build()?;
//! let environment = settings.active_environment()?;
//! # Ok::<(), seedwork_conf::SettingsError>(())
//! ```

#![warn(missing_docs)]

pub mod env;
pub mod environment;
pub mod settings;

pub use env::{Env, EnvError};
pub use environment::{DEVELOPMENT, EnvironmentResolver, PRODUCTION, is_production};
pub use settings::{DEFAULT_BATCH_SIZE, SeedingSettings, SettingsBuilder, SettingsError};
