//! The seeder contract.

use std::fmt::Debug;
use std::hash::Hash;

use crate::policy::EnvironmentPolicy;

/// A named unit of seeding logic for one entity type and one model type.
///
/// Seeders are stateless between runs. Matching between desired models and
/// persisted entities uses a business key, never the store's own identity.
///
/// # Example
///
/// ```
/// use seedwork_seeding::{EnvironmentPolicy, Seeder};
///
/// #[derive(Clone)]
/// struct Country { code: String, name: String }
///
/// struct CountrySeeder { countries: Vec<Country> }
///
/// impl Seeder for CountrySeeder {
///     type Entity = Country;
///     type Model = Country;
///     type Key = String;
///
///     fn name(&self) -> &str { "countries" }
///     fn policy(&self) -> EnvironmentPolicy { EnvironmentPolicy::production_safe() }
///
///     fn models(&self) -> Box<dyn Iterator<Item = Country> + Send + '_> {
///         Box::new(self.countries.iter().cloned())
///     }
///     fn entity_key(&self, entity: &Country) -> String { entity.code.clone() }
///     fn model_key(&self, model: &Country) -> String { model.code.clone() }
///     fn to_entity(&self, model: &Country) -> Country { model.clone() }
///     fn update_entity(&self, existing: &mut Country, model: &Country) -> bool {
///         if existing.name == model.name {
///             return false;
///         }
///         existing.name = model.name.clone();
///         true
///     }
/// }
/// ```
pub trait Seeder: Send + Sync + 'static {
	/// Persisted record type.
	type Entity: Send + Sync + 'static;
	/// Desired-state record type.
	type Model: Send + 'static;
	/// Business key shared by entities and models.
	type Key: Eq + Hash + Clone + Debug + Send + Sync + 'static;

	/// Unique seeder name.
	fn name(&self) -> &str;

	/// Names of seeders that must be applied first.
	fn dependencies(&self) -> Vec<String> {
		Vec::new()
	}

	/// Environment policy for this seeder.
	fn policy(&self) -> EnvironmentPolicy {
		EnvironmentPolicy::default()
	}

	/// Desired records, produced lazily.
	fn models(&self) -> Box<dyn Iterator<Item = Self::Model> + Send + '_>;

	/// Business key of a persisted entity.
	fn entity_key(&self, entity: &Self::Entity) -> Self::Key;

	/// Business key of a desired model.
	fn model_key(&self, model: &Self::Model) -> Self::Key;

	/// Builds a new entity from a desired model.
	fn to_entity(&self, model: &Self::Model) -> Self::Entity;

	/// Brings `existing` in line with `model`, returning true if any field changed.
	fn update_entity(&self, existing: &mut Self::Entity, model: &Self::Model) -> bool;
}
