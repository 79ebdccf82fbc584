//! Stress test module.
//!
//! # Examples
//!
//! ```rust,no_run
//! use seedwork::stress::{DatasetSize, StressTestConfiguration, StressTestRunner};
//! ```

#[cfg(feature = "stress")]
pub use seedwork_stress::*;
