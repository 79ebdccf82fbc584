//! Active runtime environment resolution.
//!
//! The environment name is read from `SEEDWORK_ENVIRONMENT`, then
//! `APP_ENVIRONMENT`, and falls back to [`DEVELOPMENT`]. The first resolution
//! is cached for the lifetime of the process; [`EnvironmentResolver::reset`]
//! drops the cache so tests can switch environments.

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::env::{Env, EnvError};

/// Name of the designated production environment.
pub const PRODUCTION: &str = "Production";

/// Name used when no environment variable is set.
pub const DEVELOPMENT: &str = "Development";

/// Variables consulted, in priority order.
pub const ENVIRONMENT_VARIABLES: [&str; 2] = ["SEEDWORK_ENVIRONMENT", "APP_ENVIRONMENT"];

static RESOLVED_ENVIRONMENT: Lazy<RwLock<Option<String>>> = Lazy::new(|| RwLock::new(None));

/// Returns true when `name` designates the production environment.
///
/// Comparison ignores surrounding whitespace and ASCII case, so
/// `"production"` and `"PRODUCTION "` match.
pub fn is_production(name: &str) -> bool {
	name.trim().eq_ignore_ascii_case(PRODUCTION)
}

/// Process-wide resolver for the active environment name.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvironmentResolver;

impl EnvironmentResolver {
	/// Creates a resolver handle.
	pub fn new() -> Self {
		Self
	}

	/// Returns the active environment, resolving and caching it on first use.
	pub fn current(&self) -> Result<String, EnvError> {
		if let Some(name) = RESOLVED_ENVIRONMENT.read().as_ref() {
			return Ok(name.clone());
		}

		let mut slot = RESOLVED_ENVIRONMENT.write();
		// Another caller may have won the race between the two locks.
		if let Some(name) = slot.as_ref() {
			return Ok(name.clone());
		}
		let name = self.resolve_uncached()?;
		tracing::debug!(environment = %name, "resolved active environment");
		*slot = Some(name.clone());
		Ok(name)
	}

	/// Reads the environment variables without touching the cache.
	pub fn resolve_uncached(&self) -> Result<String, EnvError> {
		let env = Env::new();
		for key in ENVIRONMENT_VARIABLES {
			if let Some(value) = env.raw(key)? {
				let trimmed = value.trim();
				if !trimmed.is_empty() {
					return Ok(trimmed.to_string());
				}
			}
		}
		Ok(DEVELOPMENT.to_string())
	}

	/// Pins the cached environment to `name`.
	pub fn set(&self, name: impl Into<String>) {
		*RESOLVED_ENVIRONMENT.write() = Some(name.into());
	}

	/// Clears the cached value.
	///
	/// This is primarily useful for testing.
	pub fn reset(&self) {
		*RESOLVED_ENVIRONMENT.write() = None;
	}

	/// Returns true when the active environment is production.
	pub fn is_production(&self) -> Result<bool, EnvError> {
		Ok(is_production(&self.current()?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	fn clear_vars() {
		// SAFETY: Callers are #[serial] tests with exclusive access to environment variables.
		unsafe {
			for key in ENVIRONMENT_VARIABLES {
				std::env::remove_var(key);
			}
		}
	}

	#[rstest]
	#[serial(env_change)]
	fn test_defaults_to_development() {
		clear_vars();
		let resolver = EnvironmentResolver::new();
		resolver.reset();

		assert_eq!(resolver.current().unwrap(), DEVELOPMENT);
		assert!(!resolver.is_production().unwrap());
	}

	#[rstest]
	#[serial(env_change)]
	fn test_primary_variable_wins() {
		clear_vars();
		// SAFETY: This test uses #[serial] to ensure exclusive access to environment variables.
		unsafe {
			std::env::set_var("SEEDWORK_ENVIRONMENT", "Staging");
			std::env::set_var("APP_ENVIRONMENT", "Production");
		}
		let resolver = EnvironmentResolver::new();
		resolver.reset();

		assert_eq!(resolver.current().unwrap(), "Staging");
		clear_vars();
		resolver.reset();
	}

	#[rstest]
	#[serial(env_change)]
	fn test_value_is_cached_until_reset() {
		clear_vars();
		let resolver = EnvironmentResolver::new();
		resolver.reset();
		// SAFETY: This test uses #[serial] to ensure exclusive access to environment variables.
		unsafe {
			std::env::set_var("APP_ENVIRONMENT", "Production");
		}
		assert_eq!(resolver.current().unwrap(), "Production");

		// SAFETY: This test uses #[serial] to ensure exclusive access to environment variables.
		unsafe {
			std::env::set_var("APP_ENVIRONMENT", "Testing");
		}
		assert_eq!(resolver.current().unwrap(), "Production");

		resolver.reset();
		assert_eq!(resolver.current().unwrap(), "Testing");

		clear_vars();
		resolver.reset();
	}

	#[rstest]
	#[serial(env_change)]
	fn test_set_pins_value() {
		let resolver = EnvironmentResolver::new();
		resolver.set("Qa");
		assert_eq!(resolver.current().unwrap(), "Qa");
		resolver.reset();
	}

	#[rstest]
	#[case("Production", true)]
	#[case("production", true)]
	#[case(" Production ", true)]
	#[case("PRODUCTION\n", true)]
	#[case("Development", false)]
	#[case("Prod", false)]
	fn test_is_production(#[case] name: &str, #[case] expected: bool) {
		assert_eq!(is_production(name), expected);
	}
}
