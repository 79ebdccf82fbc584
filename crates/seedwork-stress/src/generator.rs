//! Synthetic dataset generation.
//!
//! Every model is derived from the generator seed and its own index, so a
//! dataset can be produced lazily in any order and is identical across runs.

use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::DatasetSize;

const INDEX_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Business key of the synthetic record at `index`.
pub fn synthetic_key(index: usize) -> String {
	format!("synthetic-{:07}", index)
}

/// One desired synthetic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticModel {
	/// Unique business key.
	pub key: String,
	/// Display name.
	pub name: String,
	/// Contact email.
	pub email: String,
	/// Arbitrary numeric payload.
	pub score: u32,
	/// Mutation revision. Zero for unmutated records.
	pub revision: u32,
}

/// Deterministic, lazily evaluated synthetic dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetGenerator {
	count: usize,
	seed: u64,
	mutate_fraction: f64,
	revision: u32,
}

impl DatasetGenerator {
	/// A generator of `count` records.
	pub fn new(count: usize, seed: u64) -> Self {
		Self {
			count,
			seed,
			mutate_fraction: 0.0,
			revision: 1,
		}
	}

	/// A generator sized for a tier.
	pub fn for_size(size: DatasetSize, seed: u64) -> Self {
		Self::new(size.record_count(), seed)
	}

	/// Changes roughly `fraction` of the records relative to the unmutated
	/// dataset. Which records change depends only on the seed.
	pub fn mutate_fraction(mut self, fraction: f64) -> Self {
		self.mutate_fraction = fraction.clamp(0.0, 1.0);
		self
	}

	/// Sets the revision stamped onto mutated records.
	///
	/// Distinct revisions make consecutive mutated datasets differ from each
	/// other.
	pub fn with_revision(mut self, revision: u32) -> Self {
		self.revision = revision.max(1);
		self
	}

	/// Number of records.
	pub fn count(&self) -> usize {
		self.count
	}

	/// Builds the record at `index`.
	pub fn model(&self, index: usize) -> SyntheticModel {
		let mut rng = StdRng::seed_from_u64(self.seed ^ (index as u64).wrapping_mul(INDEX_MIX));
		let name: String = Name().fake_with_rng(&mut rng);
		let email: String = SafeEmail().fake_with_rng(&mut rng);
		let score = rng.gen_range(0..10_000u32);

		// Drawn after the base fields so mutation never changes them.
		let mutated = self.mutate_fraction > 0.0 && rng.r#gen::<f64>() < self.mutate_fraction;
		let (score, revision) = if mutated {
			(score.wrapping_add(self.revision), self.revision)
		} else {
			(score, 0)
		};

		SyntheticModel {
			key: synthetic_key(index),
			name,
			email,
			score,
			revision,
		}
	}

	/// Iterates the dataset without materializing it.
	pub fn iter(&self) -> DatasetIter {
		DatasetIter {
			generator: self.clone(),
			next: 0,
		}
	}
}

impl IntoIterator for &DatasetGenerator {
	type Item = SyntheticModel;
	type IntoIter = DatasetIter;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Lazy iterator over a [`DatasetGenerator`].
#[derive(Debug, Clone)]
pub struct DatasetIter {
	generator: DatasetGenerator,
	next: usize,
}

impl Iterator for DatasetIter {
	type Item = SyntheticModel;

	fn next(&mut self) -> Option<Self::Item> {
		if self.next >= self.generator.count {
			return None;
		}
		let model = self.generator.model(self.next);
		self.next += 1;
		Some(model)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		let remaining = self.generator.count - self.next;
		(remaining, Some(remaining))
	}
}

impl ExactSizeIterator for DatasetIter {}
