//! End-to-end runs through the `seedwork` facade.

use rstest::rstest;
use seedwork::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Country {
	code: String,
	name: String,
}

struct CountrySeeder;

impl Seeder for CountrySeeder {
	type Entity = Country;
	type Model = (&'static str, &'static str);
	type Key = String;

	fn name(&self) -> &str {
		"countries"
	}

	fn policy(&self) -> EnvironmentPolicy {
		EnvironmentPolicy::production_safe()
	}

	fn models(&self) -> Box<dyn Iterator<Item = Self::Model> + Send + '_> {
		Box::new([("FR", "France"), ("JP", "Japan"), ("PE", "Peru")].into_iter())
	}

	fn entity_key(&self, entity: &Country) -> String {
		entity.code.clone()
	}

	fn model_key(&self, model: &Self::Model) -> String {
		model.0.to_string()
	}

	fn to_entity(&self, model: &Self::Model) -> Country {
		Country {
			code: model.0.to_string(),
			name: model.1.to_string(),
		}
	}

	fn update_entity(&self, existing: &mut Country, model: &Self::Model) -> bool {
		if existing.name == model.1 {
			return false;
		}
		existing.name = model.1.to_string();
		true
	}
}

#[rstest]
#[tokio::test]
async fn test_run_seeding_through_facade() {
	// Arrange
	let store = MemoryRepository::new(|c: &Country| c.code.clone());
	store.seed_rows([Country {
		code: "JP".to_string(),
		name: "Nippon".to_string(),
	}]);
	let catalog = SeederCatalog::new()
		.with(CountrySeeder, store.clone())
		.unwrap();

	// Act
	let summary = run_seeding(catalog, "Production").await.unwrap();

	// Assert
	let outcome = summary.outcome("countries").unwrap();
	assert_eq!(outcome.status, SeederStatus::Applied);
	assert_eq!((outcome.counts.inserted, outcome.counts.updated), (2, 1));
	assert_eq!(store.len(), 3);
	assert_eq!(store.get(&"JP".to_string()).unwrap().name, "Japan");
}

#[rstest]
#[tokio::test]
async fn test_stress_runner_through_facade() {
	let config = StressTestConfiguration::new()
		.with_dataset_size(DatasetSize::Small)
		.with_batch_size(250);

	let report = StressTestRunner::new(config).unwrap().run().await.unwrap();

	assert_eq!(report.metrics.chunks_committed(), 4);
	assert_eq!(report.metrics.records_processed(), 1000);
}
