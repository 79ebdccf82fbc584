//! Seeder catalog.
//!
//! Seeders are bound to their repository and stored behind the object-safe
//! [`ErasedSeeder`] trait, in registration order.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::apply::{ApplyObserver, ApplyReport, BatchApplier};
use crate::error::{SeedingError, SeedingResult};
use crate::plan::SeedCounts;
use crate::policy::EnvironmentPolicy;
use crate::reconcile::{check_unique_keys, reconcile};
use crate::seeder::Seeder;
use crate::store::Repository;

/// What one seeder run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeederRun {
	/// Reconciliation counts.
	pub counts: SeedCounts,
	/// Apply progress.
	pub report: ApplyReport,
	/// Integrity warnings raised while reconciling.
	pub warnings: usize,
}

impl SeederRun {
	/// Counts of what actually reached the store.
	///
	/// Equal to [`counts`](Self::counts) once every chunk is committed; lower
	/// after cancellation or a failed chunk.
	pub fn committed(&self) -> SeedCounts {
		SeedCounts {
			inserted: self.report.inserted,
			updated: self.report.updated,
			unchanged: self.counts.unchanged,
		}
	}
}

/// A seeder run that stopped on an error, with the progress made before it.
#[derive(Debug)]
pub struct SeederFailure {
	/// Reconciliation counts and committed chunks, zeroed when the failure
	/// happened before reconciling.
	pub run: SeederRun,
	/// The error that stopped the seeder.
	pub error: SeedingError,
}

impl From<SeedingError> for SeederFailure {
	fn from(error: SeedingError) -> Self {
		Self {
			run: SeederRun::default(),
			error,
		}
	}
}

/// Type-erased seeder bound to its repository.
#[async_trait]
pub trait ErasedSeeder: Send + Sync {
	/// Unique seeder name.
	fn name(&self) -> &str;

	/// Seeders that must run first.
	fn dependencies(&self) -> &[String];

	/// Environment policy.
	fn policy(&self) -> &EnvironmentPolicy;

	/// Checks the desired set for duplicate business keys without touching the store.
	fn validate(&self) -> SeedingResult<usize>;

	/// Loads, reconciles and applies.
	async fn seed(
		&self,
		applier: &BatchApplier,
		observer: &dyn ApplyObserver,
	) -> Result<SeederRun, SeederFailure>;

	/// Deletes every entity of this seeder's type.
	async fn clear(&self) -> SeedingResult<usize>;
}

/// A [`Seeder`] together with the repository it writes to.
pub struct SeederRegistration<S: Seeder> {
	seeder: S,
	repository: Arc<dyn Repository<S::Entity>>,
	name: String,
	dependencies: Vec<String>,
	policy: EnvironmentPolicy,
}

impl<S: Seeder> SeederRegistration<S> {
	/// Binds `seeder` to `repository`.
	pub fn new<R>(seeder: S, repository: R) -> Self
	where
		R: Repository<S::Entity> + 'static,
	{
		Self::with_shared_repository(seeder, Arc::new(repository))
	}

	/// Binds `seeder` to an already shared repository.
	pub fn with_shared_repository(seeder: S, repository: Arc<dyn Repository<S::Entity>>) -> Self {
		let name = seeder.name().to_string();
		let mut dependencies = seeder.dependencies();
		let mut seen = std::collections::HashSet::new();
		dependencies.retain(|d| seen.insert(d.clone()));
		let policy = seeder.policy();
		Self {
			seeder,
			repository,
			name,
			dependencies,
			policy,
		}
	}

	/// The wrapped seeder.
	pub fn seeder(&self) -> &S {
		&self.seeder
	}
}

impl<S: Seeder> fmt::Debug for SeederRegistration<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SeederRegistration")
			.field("name", &self.name)
			.field("dependencies", &self.dependencies)
			.field("policy", &self.policy)
			.finish()
	}
}

#[async_trait]
impl<S: Seeder> ErasedSeeder for SeederRegistration<S> {
	fn name(&self) -> &str {
		&self.name
	}

	fn dependencies(&self) -> &[String] {
		&self.dependencies
	}

	fn policy(&self) -> &EnvironmentPolicy {
		&self.policy
	}

	fn validate(&self) -> SeedingResult<usize> {
		check_unique_keys(&self.seeder)
	}

	async fn seed(
		&self,
		applier: &BatchApplier,
		observer: &dyn ApplyObserver,
	) -> Result<SeederRun, SeederFailure> {
		let existing = self
			.repository
			.load_all()
			.await
			.map_err(|source| SeedingError::Store {
				seeder: self.name.clone(),
				operation: "load existing records",
				source,
			})?;
		let loaded = existing.len();

		let reconciliation = reconcile(&self.seeder, existing, self.seeder.models())?;
		for warning in &reconciliation.warnings {
			tracing::warn!(seeder = %self.name, "{}", warning);
		}
		tracing::debug!(
			seeder = %self.name,
			existing = loaded,
			inserts = reconciliation.counts.inserted,
			updates = reconciliation.counts.updated,
			unchanged = reconciliation.counts.unchanged,
			"reconciled"
		);

		let counts = reconciliation.counts;
		let warnings = reconciliation.warnings.len();
		match applier
			.apply(
				&self.name,
				self.repository.as_ref(),
				reconciliation.plan,
				observer,
			)
			.await
		{
			Ok(report) => Ok(SeederRun {
				counts,
				report,
				warnings,
			}),
			Err(mut failure) => Err(SeederFailure {
				run: SeederRun {
					counts,
					report: std::mem::take(&mut failure.committed),
					warnings,
				},
				error: failure.into_error(self.name.clone()),
			}),
		}
	}

	async fn clear(&self) -> SeedingResult<usize> {
		self.repository
			.delete_all()
			.await
			.map_err(|source| SeedingError::Store {
				seeder: self.name.clone(),
				operation: "clear records",
				source,
			})
	}
}

/// Registered seeders, in registration order.
#[derive(Clone, Default)]
pub struct SeederCatalog {
	seeders: IndexMap<String, Arc<dyn ErasedSeeder>>,
}

impl fmt::Debug for SeederCatalog {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SeederCatalog")
			.field("seeders", &self.names())
			.finish()
	}
}

impl SeederCatalog {
	/// Creates an empty catalog.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `seeder` writing to `repository`.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::DuplicateSeeder`] if the name is taken.
	pub fn register<S, R>(&mut self, seeder: S, repository: R) -> SeedingResult<()>
	where
		S: Seeder,
		R: Repository<S::Entity> + 'static,
	{
		self.register_erased(Arc::new(SeederRegistration::new(seeder, repository)))
	}

	/// Registers an already erased seeder.
	pub fn register_erased(&mut self, seeder: Arc<dyn ErasedSeeder>) -> SeedingResult<()> {
		let name = seeder.name().to_string();
		if self.seeders.contains_key(&name) {
			return Err(SeedingError::DuplicateSeeder(name));
		}
		self.seeders.insert(name, seeder);
		Ok(())
	}

	/// Builder-style [`register`](Self::register).
	pub fn with<S, R>(mut self, seeder: S, repository: R) -> SeedingResult<Self>
	where
		S: Seeder,
		R: Repository<S::Entity> + 'static,
	{
		self.register(seeder, repository)?;
		Ok(self)
	}

	/// Gets a seeder by name.
	pub fn get(&self, name: &str) -> Option<&Arc<dyn ErasedSeeder>> {
		self.seeders.get(name)
	}

	/// Registration position of a seeder.
	pub fn position(&self, name: &str) -> Option<usize> {
		self.seeders.get_index_of(name)
	}

	/// Checks if a seeder is registered.
	pub fn contains(&self, name: &str) -> bool {
		self.seeders.contains_key(name)
	}

	/// Seeder names in registration order.
	pub fn names(&self) -> Vec<String> {
		self.seeders.keys().cloned().collect()
	}

	/// Iterates seeders in registration order.
	pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ErasedSeeder>> {
		self.seeders.values()
	}

	/// Returns the number of registered seeders.
	pub fn len(&self) -> usize {
		self.seeders.len()
	}

	/// Returns true if no seeders are registered.
	pub fn is_empty(&self) -> bool {
		self.seeders.is_empty()
	}

	/// Deletes every entity owned by every registered seeder.
	///
	/// Seeders are cleared in reverse registration order.
	pub async fn clear_all(&self) -> SeedingResult<usize> {
		let mut removed = 0;
		for seeder in self.seeders.values().rev() {
			removed += seeder.clear().await?;
		}
		Ok(removed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryRepository;
	use rstest::rstest;

	struct NamedSeeder {
		name: &'static str,
		deps: Vec<&'static str>,
		codes: Vec<&'static str>,
	}

	impl Seeder for NamedSeeder {
		type Entity = String;
		type Model = String;
		type Key = String;

		fn name(&self) -> &str {
			self.name
		}

		fn dependencies(&self) -> Vec<String> {
			self.deps.iter().map(|d| d.to_string()).collect()
		}

		fn models(&self) -> Box<dyn Iterator<Item = String> + Send + '_> {
			Box::new(self.codes.iter().map(|c| c.to_string()))
		}

		fn entity_key(&self, entity: &String) -> String {
			entity.clone()
		}

		fn model_key(&self, model: &String) -> String {
			model.clone()
		}

		fn to_entity(&self, model: &String) -> String {
			model.clone()
		}

		fn update_entity(&self, _existing: &mut String, _model: &String) -> bool {
			false
		}
	}

	fn seeder(name: &'static str, deps: Vec<&'static str>) -> NamedSeeder {
		NamedSeeder {
			name,
			deps,
			codes: vec!["x", "y"],
		}
	}

	fn repo() -> MemoryRepository<String, String> {
		MemoryRepository::new(|s: &String| s.clone())
	}

	#[rstest]
	fn test_registration_order_and_lookup() {
		let catalog = SeederCatalog::new()
			.with(seeder("b", vec![]), repo())
			.unwrap()
			.with(seeder("a", vec!["b"]), repo())
			.unwrap();

		assert_eq!(catalog.names(), vec!["b", "a"]);
		assert_eq!(catalog.position("a"), Some(1));
		assert!(catalog.contains("b"));
		assert_eq!(catalog.get("a").unwrap().dependencies(), ["b".to_string()]);
		assert_eq!(catalog.len(), 2);
	}

	#[rstest]
	fn test_duplicate_name_rejected() {
		let mut catalog = SeederCatalog::new();
		catalog.register(seeder("a", vec![]), repo()).unwrap();

		let result = catalog.register(seeder("a", vec![]), repo());
		assert!(matches!(result, Err(SeedingError::DuplicateSeeder(ref n)) if n == "a"));
	}

	#[rstest]
	fn test_duplicate_dependencies_collapsed() {
		let registration = SeederRegistration::new(seeder("a", vec!["b", "b", "c"]), repo());
		assert_eq!(registration.dependencies(), ["b".to_string(), "c".to_string()]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_failed_seed_keeps_committed_progress() {
		// Arrange
		let store = repo();
		store.fail_on_commit(2);
		let mut catalog = SeederCatalog::new();
		catalog
			.register(
				NamedSeeder {
					name: "codes",
					deps: vec![],
					codes: vec!["a", "b", "c", "d", "e"],
				},
				store.clone(),
			)
			.unwrap();

		// Act
		let failure = catalog
			.get("codes")
			.unwrap()
			.seed(&BatchApplier::new(2).unwrap(), &crate::apply::NoopObserver)
			.await
			.unwrap_err();

		// Assert
		assert_eq!(failure.run.counts.inserted, 5);
		assert_eq!(failure.run.committed().inserted, 2);
		assert_eq!(failure.run.report.chunks_committed, 1);
		assert!(matches!(
			failure.error,
			SeedingError::ApplyFailed { chunk: 1, start: 2, end: 4, .. }
		));
		assert_eq!(store.len(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_seed_then_clear() {
		let store = repo();
		let mut catalog = SeederCatalog::new();
		catalog.register(seeder("a", vec![]), store.clone()).unwrap();

		let run = catalog
			.get("a")
			.unwrap()
			.seed(&BatchApplier::default(), &crate::apply::NoopObserver)
			.await
			.unwrap();
		assert_eq!(run.counts.inserted, 2);
		assert_eq!(run.committed(), run.counts);
		assert_eq!(store.len(), 2);

		assert_eq!(catalog.clear_all().await.unwrap(), 2);
		assert!(store.is_empty());
	}
}
