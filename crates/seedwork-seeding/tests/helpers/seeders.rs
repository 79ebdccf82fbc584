#![allow(dead_code)]

//! Seeders shared by the integration tests.

use seedwork_seeding::{EnvironmentPolicy, MemoryRepository, Seeder};

/// Persisted and desired record used by [`RecordSeeder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
	pub key: String,
	pub value: u32,
}

pub fn record(key: &str, value: u32) -> Record {
	Record {
		key: key.to_string(),
		value,
	}
}

pub fn records(prefix: &str, count: usize) -> Vec<Record> {
	(0..count)
		.map(|i| Record {
			key: format!("{}-{:05}", prefix, i),
			value: i as u32,
		})
		.collect()
}

pub type RecordRepository = MemoryRepository<Record, String>;

pub fn repository() -> RecordRepository {
	MemoryRepository::new(|r: &Record| r.key.clone())
}

/// Seeder over a fixed list of [`Record`]s.
pub struct RecordSeeder {
	pub name: String,
	pub dependencies: Vec<String>,
	pub policy: EnvironmentPolicy,
	pub desired: Vec<Record>,
}

impl RecordSeeder {
	pub fn new(name: &str, desired: Vec<Record>) -> Self {
		Self {
			name: name.to_string(),
			dependencies: Vec::new(),
			policy: EnvironmentPolicy::production_safe(),
			desired,
		}
	}

	pub fn depends_on(mut self, names: &[&str]) -> Self {
		self.dependencies = names.iter().map(|n| n.to_string()).collect();
		self
	}

	pub fn with_policy(mut self, policy: EnvironmentPolicy) -> Self {
		self.policy = policy;
		self
	}
}

impl Seeder for RecordSeeder {
	type Entity = Record;
	type Model = Record;
	type Key = String;

	fn name(&self) -> &str {
		&self.name
	}

	fn dependencies(&self) -> Vec<String> {
		self.dependencies.clone()
	}

	fn policy(&self) -> EnvironmentPolicy {
		self.policy.clone()
	}

	fn models(&self) -> Box<dyn Iterator<Item = Record> + Send + '_> {
		Box::new(self.desired.iter().cloned())
	}

	fn entity_key(&self, entity: &Record) -> String {
		entity.key.clone()
	}

	fn model_key(&self, model: &Record) -> String {
		model.key.clone()
	}

	fn to_entity(&self, model: &Record) -> Record {
		model.clone()
	}

	fn update_entity(&self, existing: &mut Record, model: &Record) -> bool {
		if existing.value == model.value {
			return false;
		}
		existing.value = model.value;
		true
	}
}
