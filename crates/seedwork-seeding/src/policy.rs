//! Environment admission control.
//!
//! Every seeder carries an [`EnvironmentPolicy`]. The gate admits or skips a
//! seeder for the active environment; a skip is never an error.

use std::fmt;

use seedwork_conf::is_production;
use serde::{Deserialize, Serialize};

/// Static environment policy attached to a seeder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentPolicy {
	/// Whether the seeder may run in the production environment.
	pub production_safe: bool,

	/// Environments the seeder may run in. Empty means "any".
	pub allowed_environments: Vec<String>,
}

impl EnvironmentPolicy {
	/// Creates the default policy: not production-safe, any environment.
	pub fn new() -> Self {
		Self::default()
	}

	/// A policy that may run everywhere, production included.
	pub fn production_safe() -> Self {
		Self {
			production_safe: true,
			allowed_environments: Vec::new(),
		}
	}

	/// A policy restricted to the development environment.
	pub fn development_only() -> Self {
		Self::new().allow(seedwork_conf::DEVELOPMENT)
	}

	/// Marks the policy production-safe or not.
	pub fn with_production_safe(mut self, safe: bool) -> Self {
		self.production_safe = safe;
		self
	}

	/// Adds an environment to the allow-list.
	pub fn allow(mut self, environment: impl Into<String>) -> Self {
		self.allowed_environments.push(environment.into());
		self
	}

	/// Decides whether the seeder runs in `environment`.
	pub fn evaluate(&self, environment: &str) -> GateDecision {
		if is_production(environment) && !self.production_safe {
			return GateDecision::Skip(SkipReason::NotProductionSafe);
		}

		if !self.allowed_environments.is_empty()
			&& !self
				.allowed_environments
				.iter()
				.any(|allowed| allowed.trim().eq_ignore_ascii_case(environment.trim()))
		{
			return GateDecision::Skip(SkipReason::NotInAllowList {
				environment: environment.to_string(),
				allowed: self.allowed_environments.clone(),
			});
		}

		GateDecision::Admit
	}
}

/// Outcome of the environment gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
	/// The seeder runs.
	Admit,
	/// The seeder is skipped for the given reason.
	Skip(SkipReason),
}

impl GateDecision {
	/// Returns true for [`GateDecision::Admit`].
	pub fn is_admitted(&self) -> bool {
		matches!(self, Self::Admit)
	}
}

/// Why a seeder was not admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
	/// Active environment is production and the seeder is not production-safe.
	NotProductionSafe,
	/// Active environment is missing from the seeder's allow-list.
	NotInAllowList {
		/// Active environment.
		environment: String,
		/// Declared allow-list.
		allowed: Vec<String>,
	},
}

impl fmt::Display for SkipReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotProductionSafe => write!(f, "not production-safe"),
			Self::NotInAllowList {
				environment,
				allowed,
			} => write!(
				f,
				"environment '{}' not in allow-list [{}]",
				environment,
				allowed.join(", ")
			),
		}
	}
}

/// Evaluates `policy` for `environment`.
pub fn gate(policy: &EnvironmentPolicy, environment: &str) -> GateDecision {
	policy.evaluate(environment)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("Production", false)]
	#[case("Production ", false)]
	#[case(" production", false)]
	#[case("Development", true)]
	#[case("Staging", true)]
	fn test_default_policy(#[case] environment: &str, #[case] admitted: bool) {
		let policy = EnvironmentPolicy::default();
		assert_eq!(gate(&policy, environment).is_admitted(), admitted);
	}

	#[rstest]
	fn test_default_policy_skip_reason() {
		assert_eq!(
			gate(&EnvironmentPolicy::default(), "Production"),
			GateDecision::Skip(SkipReason::NotProductionSafe)
		);
	}

	#[rstest]
	fn test_production_safe_runs_everywhere() {
		let policy = EnvironmentPolicy::production_safe();
		assert!(gate(&policy, "Production").is_admitted());
		assert!(gate(&policy, "Development").is_admitted());
	}

	#[rstest]
	fn test_allow_list() {
		let policy = EnvironmentPolicy::new().allow("Development").allow("Testing");

		assert!(gate(&policy, "Testing").is_admitted());
		assert!(gate(&policy, "development").is_admitted());

		let decision = gate(&policy, "Staging");
		match decision {
			GateDecision::Skip(reason) => assert_eq!(
				reason.to_string(),
				"environment 'Staging' not in allow-list [Development, Testing]"
			),
			GateDecision::Admit => panic!("Staging should be skipped"),
		}
	}

	#[rstest]
	fn test_production_check_precedes_allow_list() {
		let policy = EnvironmentPolicy::new().allow("Production");
		assert_eq!(
			gate(&policy, "Production"),
			GateDecision::Skip(SkipReason::NotProductionSafe)
		);

		let policy = policy.with_production_safe(true);
		assert!(gate(&policy, "Production").is_admitted());
	}

	#[rstest]
	fn test_development_only() {
		let policy = EnvironmentPolicy::development_only();
		assert!(gate(&policy, "Development").is_admitted());
		assert!(!gate(&policy, "Staging").is_admitted());
	}
}
