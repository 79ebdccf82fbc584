//! Configuration module.
//!
//! Environment variable access, active environment resolution and seeding
//! settings.
//!
//! # Examples
//!
//! ```rust,no_run
//! use seedwork::conf::{EnvironmentResolver, SettingsBuilder};
//! ```

#[cfg(feature = "conf")]
pub use seedwork_conf::*;
