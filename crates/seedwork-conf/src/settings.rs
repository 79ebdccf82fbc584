//! Layered seeding settings.
//!
//! Sources are merged in priority order: environment variables > TOML file >
//! defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::env::{Env, EnvError};
use crate::environment::EnvironmentResolver;

/// Default number of operations committed per unit of work.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "SEEDWORK_";

/// Settings consumed by the seeding orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedingSettings {
	/// Explicit environment name. When unset the process environment is resolved.
	pub environment: Option<String>,

	/// Maximum operations per committed chunk.
	pub batch_size: usize,

	/// Abort the remaining seeders after the first apply failure.
	pub fail_fast: bool,

	/// Append-only seed history log (JSON lines). In-memory when unset.
	pub history_path: Option<PathBuf>,
}

impl Default for SeedingSettings {
	fn default() -> Self {
		Self {
			environment: None,
			batch_size: DEFAULT_BATCH_SIZE,
			fail_fast: true,
			history_path: None,
		}
	}
}

impl SeedingSettings {
	/// Returns the environment to seed against.
	pub fn active_environment(&self) -> Result<String, SettingsError> {
		match &self.environment {
			Some(name) => Ok(name.trim().to_string()),
			None => Ok(EnvironmentResolver::new().current()?),
		}
	}

	/// Checks invariants that serde cannot express.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.batch_size == 0 {
			return Err(SettingsError::Invalid {
				field: "batch_size".to_string(),
				message: "must be at least 1".to_string(),
			});
		}
		if let Some(name) = &self.environment
			&& name.trim().is_empty()
		{
			return Err(SettingsError::Invalid {
				field: "environment".to_string(),
				message: "must not be blank".to_string(),
			});
		}
		Ok(())
	}
}

/// Builder merging defaults, an optional TOML file and environment variables.
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
	file: Option<PathBuf>,
	env_prefix: Option<String>,
}

impl Default for SettingsBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl SettingsBuilder {
	/// Creates a builder reading `SEEDWORK_*` variables and no file.
	pub fn new() -> Self {
		Self {
			file: None,
			env_prefix: Some(DEFAULT_ENV_PREFIX.to_string()),
		}
	}

	/// Adds a TOML settings file.
	pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
		self.file = Some(path.as_ref().to_path_buf());
		self
	}

	/// Changes the environment variable prefix.
	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = Some(prefix.into());
		self
	}

	/// Skips environment variable overrides entirely.
	pub fn without_env(mut self) -> Self {
		self.env_prefix = None;
		self
	}

	/// Merges every source and validates the result.
	pub fn build(&self) -> Result<SeedingSettings, SettingsError> {
		let mut settings = match &self.file {
			Some(path) => {
				let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
					path: path.clone(),
					source,
				})?;
				toml::from_str::<SeedingSettings>(&content)?
			}
			None => SeedingSettings::default(),
		};
		if let Some(name) = settings.environment.as_mut() {
			*name = name.trim().to_string();
		}

		if let Some(prefix) = &self.env_prefix {
			apply_env_overrides(&mut settings, &Env::new().with_prefix(prefix.clone()))?;
		}

		settings.validate()?;
		Ok(settings)
	}
}

fn apply_env_overrides(settings: &mut SeedingSettings, env: &Env) -> Result<(), SettingsError> {
	if let Some(name) = env.raw("ENVIRONMENT")? {
		settings.environment = Some(name.trim().to_string());
	}
	if let Some(value) = env.int("BATCH_SIZE")? {
		settings.batch_size = usize::try_from(value).map_err(|_| SettingsError::Invalid {
			field: "batch_size".to_string(),
			message: format!("{} is out of range", value),
		})?;
	}
	if let Some(fail_fast) = env.bool("FAIL_FAST")? {
		settings.fail_fast = fail_fast;
	}
	if let Some(path) = env.path("HISTORY_PATH")? {
		settings.history_path = Some(path);
	}
	Ok(())
}

/// Errors raised while loading settings.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	/// Settings file could not be read.
	#[error("Failed to read settings file {path}: {source}")]
	Io {
		/// File that failed.
		path: PathBuf,
		/// Underlying error.
		#[source]
		source: std::io::Error,
	},

	/// Settings file is not valid TOML for [`SeedingSettings`].
	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Environment variable error.
	#[error("Environment error: {0}")]
	Env(#[from] EnvError),

	/// A value is out of its allowed range.
	#[error("Invalid setting {field}: {message}")]
	Invalid {
		/// Setting name.
		field: String,
		/// What is wrong with it.
		message: String,
	},
}
