//! Business-key reconciliation between desired models and existing entities.
//!
//! Reconciliation is additive and corrective: unmatched desired models become
//! inserts, matched models whose fields differ become updates, and existing
//! entities without a desired counterpart are left untouched.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{SeedingError, SeedingResult};
use crate::plan::{ApplyPlan, Operation, SeedCounts};
use crate::seeder::Seeder;

/// Non-fatal data problem found while reconciling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityWarning {
	/// Two existing entities share a business key. The first one, in load
	/// order, is matched; the later one is ignored.
	DuplicateExistingKey {
		/// Debug rendering of the key.
		key: String,
		/// Load position of the entity that is matched.
		first_index: usize,
		/// Load position of the ignored entity.
		duplicate_index: usize,
	},
}

impl fmt::Display for IntegrityWarning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::DuplicateExistingKey {
				key,
				first_index,
				duplicate_index,
			} => write!(
				f,
				"existing records {} and {} share business key {}; keeping {}",
				first_index, duplicate_index, key, first_index
			),
		}
	}
}

/// Result of reconciling one seeder.
#[derive(Debug)]
pub struct Reconciliation<E> {
	/// Writes to apply, in desired-model order.
	pub plan: ApplyPlan<E>,
	/// Insert/update/unchanged counts.
	pub counts: SeedCounts,
	/// Integrity problems found among existing entities.
	pub warnings: Vec<IntegrityWarning>,
}

/// Diffs `desired` against `existing` using the seeder's business keys.
///
/// # Errors
///
/// Returns [`SeedingError::DuplicateDesiredKey`] if two desired models share a
/// key. Nothing has been written at that point.
pub fn reconcile<S, I>(
	seeder: &S,
	existing: Vec<S::Entity>,
	desired: I,
) -> SeedingResult<Reconciliation<S::Entity>>
where
	S: Seeder + ?Sized,
	I: IntoIterator<Item = S::Model>,
{
	let mut warnings = Vec::new();
	let mut index: HashMap<S::Key, usize> = HashMap::with_capacity(existing.len());
	for (position, entity) in existing.iter().enumerate() {
		let key = seeder.entity_key(entity);
		if let Some(&first_index) = index.get(&key) {
			warnings.push(IntegrityWarning::DuplicateExistingKey {
				key: format!("{:?}", key),
				first_index,
				duplicate_index: position,
			});
			continue;
		}
		index.insert(key, position);
	}

	// Each key is matched at most once, so entities can be moved out.
	let mut slots: Vec<Option<S::Entity>> = existing.into_iter().map(Some).collect();
	let mut seen: HashSet<S::Key> = HashSet::new();
	let mut plan = ApplyPlan::new();
	let mut counts = SeedCounts::default();

	for (position, model) in desired.into_iter().enumerate() {
		let key = seeder.model_key(&model);
		if seen.contains(&key) {
			return Err(SeedingError::DuplicateDesiredKey {
				seeder: seeder.name().to_string(),
				key: format!("{:?}", key),
				index: position,
			});
		}

		match index.get(&key).and_then(|&slot| slots[slot].take()) {
			Some(mut entity) => {
				if seeder.update_entity(&mut entity, &model) {
					plan.push(Operation::Update(entity));
					counts.updated += 1;
				} else {
					counts.unchanged += 1;
				}
			}
			None => {
				plan.push(Operation::Insert(seeder.to_entity(&model)));
				counts.inserted += 1;
			}
		}
		seen.insert(key);
	}

	Ok(Reconciliation {
		plan,
		counts,
		warnings,
	})
}

/// Verifies that the seeder's desired models have unique business keys.
///
/// Returns the number of desired models.
pub fn check_unique_keys<S: Seeder + ?Sized>(seeder: &S) -> SeedingResult<usize> {
	let mut seen = HashSet::new();
	let mut count = 0;
	for (position, model) in seeder.models().enumerate() {
		let key = seeder.model_key(&model);
		if !seen.insert(key.clone()) {
			return Err(SeedingError::DuplicateDesiredKey {
				seeder: seeder.name().to_string(),
				key: format!("{:?}", key),
				index: position,
			});
		}
		count += 1;
	}
	Ok(count)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::plan::OperationKind;
	use rstest::rstest;

	#[derive(Debug, Clone, PartialEq)]
	struct Product {
		sku: String,
		price: u32,
	}

	struct ProductSeeder {
		desired: Vec<Product>,
	}

	impl Seeder for ProductSeeder {
		type Entity = Product;
		type Model = Product;
		type Key = String;

		fn name(&self) -> &str {
			"products"
		}

		fn models(&self) -> Box<dyn Iterator<Item = Product> + Send + '_> {
			Box::new(self.desired.iter().cloned())
		}

		fn entity_key(&self, entity: &Product) -> String {
			entity.sku.clone()
		}

		fn model_key(&self, model: &Product) -> String {
			model.sku.clone()
		}

		fn to_entity(&self, model: &Product) -> Product {
			model.clone()
		}

		fn update_entity(&self, existing: &mut Product, model: &Product) -> bool {
			if existing.price == model.price {
				return false;
			}
			existing.price = model.price;
			true
		}
	}

	fn product(sku: &str, price: u32) -> Product {
		Product {
			sku: sku.to_string(),
			price,
		}
	}

	#[rstest]
	fn test_update_insert_and_untouched() {
		// Arrange
		let existing = vec![product("key1", 10), product("key2", 20)];
		let desired = vec![product("key1", 11), product("key3", 30)];
		let seeder = ProductSeeder {
			desired: desired.clone(),
		};

		// Act
		let result = reconcile(&seeder, existing, desired).unwrap();

		// Assert
		let ops = result.plan.operations();
		assert_eq!(ops.len(), 2);
		assert_eq!(ops[0], Operation::Update(product("key1", 11)));
		assert_eq!(ops[1], Operation::Insert(product("key3", 30)));
		assert!(ops.iter().all(|op| op.entity().sku != "key2"));
		assert_eq!(
			result.counts,
			SeedCounts {
				inserted: 1,
				updated: 1,
				unchanged: 0
			}
		);
		assert!(result.warnings.is_empty());
	}

	#[rstest]
	fn test_matching_records_are_unchanged() {
		let existing = vec![product("a", 1), product("b", 2)];
		let desired = vec![product("a", 1), product("b", 2)];
		let seeder = ProductSeeder {
			desired: desired.clone(),
		};

		let result = reconcile(&seeder, existing, desired).unwrap();

		assert!(result.plan.is_empty());
		assert_eq!(result.counts.unchanged, 2);
		assert_eq!(result.counts.writes(), 0);
	}

	#[rstest]
	fn test_duplicate_desired_key_is_fatal() {
		let desired = vec![product("a", 1), product("b", 2), product("a", 3)];
		let seeder = ProductSeeder {
			desired: desired.clone(),
		};

		let err = reconcile(&seeder, Vec::new(), desired).unwrap_err();

		match err {
			SeedingError::DuplicateDesiredKey { seeder, key, index } => {
				assert_eq!(seeder, "products");
				assert_eq!(key, "\"a\"");
				assert_eq!(index, 2);
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[rstest]
	fn test_duplicate_existing_key_first_match_wins() {
		// Arrange
		let existing = vec![product("a", 1), product("a", 99)];
		let desired = vec![product("a", 1)];
		let seeder = ProductSeeder {
			desired: desired.clone(),
		};

		// Act
		let result = reconcile(&seeder, existing, desired).unwrap();

		// Assert
		assert!(result.plan.is_empty());
		assert_eq!(result.counts.unchanged, 1);
		assert_eq!(
			result.warnings,
			vec![IntegrityWarning::DuplicateExistingKey {
				key: "\"a\"".to_string(),
				first_index: 0,
				duplicate_index: 1,
			}]
		);
	}

	#[rstest]
	fn test_plan_follows_desired_order() {
		let desired = vec![product("c", 3), product("a", 1), product("b", 2)];
		let seeder = ProductSeeder {
			desired: desired.clone(),
		};

		let result = reconcile(&seeder, vec![product("a", 0)], desired).unwrap();

		let kinds: Vec<_> = result.plan.operations().iter().map(|op| op.kind()).collect();
		assert_eq!(
			kinds,
			vec![
				OperationKind::Insert,
				OperationKind::Update,
				OperationKind::Insert
			]
		);
	}

	#[rstest]
	fn test_check_unique_keys() {
		let ok = ProductSeeder {
			desired: vec![product("a", 1), product("b", 1)],
		};
		assert_eq!(check_unique_keys(&ok).unwrap(), 2);

		let dup = ProductSeeder {
			desired: vec![product("a", 1), product("a", 1)],
		};
		assert!(matches!(
			check_unique_keys(&dup),
			Err(SeedingError::DuplicateDesiredKey { index: 1, .. })
		));
	}
}
