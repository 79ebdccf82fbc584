//! Environment variable handling module
//!
//! Typed, prefix-aware access to process environment variables. Every reader
//! returns `Ok(None)` for an unset variable so callers layer overrides on top
//! of other sources.

use std::env;
use std::path::PathBuf;

/// Environment variable reader with prefix support
#[derive(Debug, Clone, Default)]
pub struct Env {
	prefix: Option<String>,
}

impl Env {
	/// Create a reader without prefix
	pub fn new() -> Self {
		Self::default()
	}

	/// Prepends `prefix` to every looked-up name.
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	fn full_key(&self, key: &str) -> String {
		match &self.prefix {
			Some(prefix) => format!("{}{}", prefix, key),
			None => key.to_string(),
		}
	}

	/// Reads the raw value.
	pub fn raw(&self, key: &str) -> Result<Option<String>, EnvError> {
		let full_key = self.full_key(key);
		validate_env_var_name(&full_key)?;
		Ok(env::var(&full_key).ok())
	}

	/// Reads a boolean (`true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`).
	pub fn bool(&self, key: &str) -> Result<Option<bool>, EnvError> {
		self.parsed(key, parse_bool)
	}

	/// Reads a signed integer, ignoring surrounding whitespace.
	pub fn int(&self, key: &str) -> Result<Option<i64>, EnvError> {
		self.parsed(key, |value| value.trim().parse::<i64>().map_err(|e| e.to_string()))
	}

	/// Reads a filesystem path.
	pub fn path(&self, key: &str) -> Result<Option<PathBuf>, EnvError> {
		Ok(self.raw(key)?.map(PathBuf::from))
	}

	fn parsed<T>(
		&self,
		key: &str,
		parse: impl FnOnce(&str) -> Result<T, String>,
	) -> Result<Option<T>, EnvError> {
		let Some(value) = self.raw(key)? else {
			return Ok(None);
		};
		parse(&value).map(Some).map_err(|error| EnvError::ParseError {
			key: self.full_key(key),
			value_len: value.len(),
			error,
		})
	}
}

fn parse_bool(value: &str) -> Result<bool, String> {
	match value.trim().to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" | "" => Ok(false),
		_ => Err("not a recognised boolean".to_string()),
	}
}

/// Rejects empty names and names containing `=` or control characters.
pub fn validate_env_var_name(name: &str) -> Result<(), EnvError> {
	let reason = if name.is_empty() {
		"must not be empty".to_string()
	} else if let Some(pos) = name.find(char::is_control) {
		format!("control character at position {}", pos)
	} else if name.contains('=') {
		"must not contain '='".to_string()
	} else {
		return Ok(());
	};
	Err(EnvError::InvalidVariableName {
		name: name.to_string(),
		reason,
	})
}

/// Environment variable errors
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
	/// The variable is set but its value does not parse.
	#[error("Failed to parse environment variable '{key}' (value length: {value_len}): {error}")]
	ParseError {
		/// Fully prefixed variable name.
		key: String,
		/// Length of the value; the value itself is never reported.
		value_len: usize,
		/// Parser message.
		error: String,
	},

	/// The variable name itself is malformed.
	#[error("Invalid environment variable name '{name}': {reason}")]
	InvalidVariableName {
		/// Offending name.
		name: String,
		/// Why it was rejected.
		reason: String,
	},
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[serial(env_change)]
	fn test_prefixed_readers() {
		// SAFETY: This test uses #[serial] to ensure exclusive access to environment variables.
		unsafe {
			env::set_var("SEEDWORK_TEST_INT", " 42 ");
			env::set_var("SEEDWORK_TEST_FLAG", "Yes");
			env::set_var("SEEDWORK_TEST_PATH", "/tmp/history.jsonl");
		}

		let env = Env::new().with_prefix("SEEDWORK_");
		assert_eq!(env.int("TEST_INT").unwrap(), Some(42));
		assert_eq!(env.bool("TEST_FLAG").unwrap(), Some(true));
		assert_eq!(
			env.path("TEST_PATH").unwrap(),
			Some(PathBuf::from("/tmp/history.jsonl"))
		);

		// SAFETY: This test uses #[serial] to ensure exclusive access to environment variables.
		unsafe {
			env::remove_var("SEEDWORK_TEST_INT");
			env::remove_var("SEEDWORK_TEST_FLAG");
			env::remove_var("SEEDWORK_TEST_PATH");
		}
	}

	#[rstest]
	fn test_unset_is_none() {
		let env = Env::new().with_prefix("SEEDWORK_");
		assert_eq!(env.raw("NOT_SET_ANYWHERE").unwrap(), None);
		assert_eq!(env.int("NOT_SET_ANYWHERE").unwrap(), None);
		assert_eq!(env.bool("NOT_SET_ANYWHERE").unwrap(), None);
	}

	#[rstest]
	#[serial(env_change)]
	fn test_int_parse_error_hides_value() {
		// SAFETY: This test uses #[serial] to ensure exclusive access to environment variables.
		unsafe {
			env::set_var("SEEDWORK_TEST_BAD_INT", "forty-two");
		}
		let err = Env::new().int("SEEDWORK_TEST_BAD_INT").unwrap_err();
		match &err {
			EnvError::ParseError { key, value_len, .. } => {
				assert_eq!(key.as_str(), "SEEDWORK_TEST_BAD_INT");
				assert_eq!(*value_len, 9);
			}
			other => panic!("unexpected error: {other}"),
		}
		assert!(!err.to_string().contains("forty-two"));
		// SAFETY: This test uses #[serial] to ensure exclusive access to environment variables.
		unsafe {
			env::remove_var("SEEDWORK_TEST_BAD_INT");
		}
	}

	#[rstest]
	#[case("true", true)]
	#[case("1", true)]
	#[case(" ON ", true)]
	#[case("off", false)]
	#[case("0", false)]
	fn test_parse_bool(#[case] input: &str, #[case] expected: bool) {
		assert_eq!(parse_bool(input).unwrap(), expected);
	}

	#[rstest]
	fn test_parse_bool_rejects_garbage() {
		assert!(parse_bool("maybe").is_err());
	}

	#[rstest]
	#[case("")]
	#[case("A=B")]
	#[case("MY\x00VAR")]
	fn test_invalid_names_rejected(#[case] name: &str) {
		assert!(matches!(
			validate_env_var_name(name),
			Err(EnvError::InvalidVariableName { .. })
		));
	}

	#[rstest]
	fn test_valid_name_accepted() {
		assert!(validate_env_var_name("SEEDWORK_ENVIRONMENT").is_ok());
	}
}
