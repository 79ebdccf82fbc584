//! Seeder over a synthetic dataset.

use seedwork_seeding::{EnvironmentPolicy, MemoryRepository, Seeder};
use serde::{Deserialize, Serialize};

use crate::generator::{DatasetGenerator, SyntheticModel};

/// Name the synthetic seeder registers under.
pub const SYNTHETIC_SEEDER: &str = "synthetic_records";

/// Persisted synthetic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticRecord {
	/// Business key.
	pub key: String,
	/// Display name.
	pub name: String,
	/// Contact email.
	pub email: String,
	/// Numeric payload.
	pub score: u32,
	/// Revision of the last write.
	pub revision: u32,
}

/// In-memory store of synthetic records, keyed by business key.
pub type SyntheticRepository = MemoryRepository<SyntheticRecord, String>;

/// Creates an empty synthetic record store.
pub fn synthetic_repository() -> SyntheticRepository {
	MemoryRepository::new(|record: &SyntheticRecord| record.key.clone())
}

/// Seeds the records of a [`DatasetGenerator`].
///
/// The policy is not production-safe.
#[derive(Debug, Clone)]
pub struct SyntheticSeeder {
	generator: DatasetGenerator,
}

impl SyntheticSeeder {
	/// Wraps `generator`.
	pub fn new(generator: DatasetGenerator) -> Self {
		Self { generator }
	}

	/// The wrapped generator.
	pub fn generator(&self) -> &DatasetGenerator {
		&self.generator
	}
}

impl Seeder for SyntheticSeeder {
	type Entity = SyntheticRecord;
	type Model = SyntheticModel;
	type Key = String;

	fn name(&self) -> &str {
		SYNTHETIC_SEEDER
	}

	fn policy(&self) -> EnvironmentPolicy {
		EnvironmentPolicy::new()
	}

	fn models(&self) -> Box<dyn Iterator<Item = SyntheticModel> + Send + '_> {
		Box::new(self.generator.iter())
	}

	fn entity_key(&self, entity: &SyntheticRecord) -> String {
		entity.key.clone()
	}

	fn model_key(&self, model: &SyntheticModel) -> String {
		model.key.clone()
	}

	fn to_entity(&self, model: &SyntheticModel) -> SyntheticRecord {
		SyntheticRecord {
			key: model.key.clone(),
			name: model.name.clone(),
			email: model.email.clone(),
			score: model.score,
			revision: model.revision,
		}
	}

	fn update_entity(&self, existing: &mut SyntheticRecord, model: &SyntheticModel) -> bool {
		let mut changed = false;
		if existing.name != model.name {
			existing.name = model.name.clone();
			changed = true;
		}
		if existing.email != model.email {
			existing.email = model.email.clone();
			changed = true;
		}
		if existing.score != model.score {
			existing.score = model.score;
			changed = true;
		}
		if existing.revision != model.revision {
			existing.revision = model.revision;
			changed = true;
		}
		changed
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_update_detects_changes() {
		let seeder = SyntheticSeeder::new(DatasetGenerator::new(1, 1));
		let model = seeder.generator().model(0);
		let mut record = seeder.to_entity(&model);

		assert!(!seeder.update_entity(&mut record, &model));

		let mut changed = model.clone();
		changed.score += 1;
		assert!(seeder.update_entity(&mut record, &changed));
		assert_eq!(record.score, changed.score);
	}

	#[rstest]
	fn test_not_production_safe() {
		let seeder = SyntheticSeeder::new(DatasetGenerator::new(1, 1));
		assert!(!seeder.policy().production_safe);
		assert_eq!(seeder.name(), SYNTHETIC_SEEDER);
	}
}
