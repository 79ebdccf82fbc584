//! Apply plans produced by reconciliation.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Kind of a planned write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
	/// A new entity.
	Insert,
	/// An existing entity whose fields changed.
	Update,
}

/// A single planned write against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation<E> {
	/// Insert a new entity.
	Insert(E),
	/// Persist changes to an existing entity.
	Update(E),
}

impl<E> Operation<E> {
	/// Returns the operation kind.
	pub fn kind(&self) -> OperationKind {
		match self {
			Self::Insert(_) => OperationKind::Insert,
			Self::Update(_) => OperationKind::Update,
		}
	}

	/// Borrows the entity being written.
	pub fn entity(&self) -> &E {
		match self {
			Self::Insert(entity) | Self::Update(entity) => entity,
		}
	}

	/// Consumes the operation, returning the entity.
	pub fn into_entity(self) -> E {
		match self {
			Self::Insert(entity) | Self::Update(entity) => entity,
		}
	}
}

/// Ordered list of writes for one seeder in one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyPlan<E> {
	operations: Vec<Operation<E>>,
}

impl<E> Default for ApplyPlan<E> {
	fn default() -> Self {
		Self {
			operations: Vec::new(),
		}
	}
}

impl<E> ApplyPlan<E> {
	/// Creates an empty plan.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends an operation.
	pub fn push(&mut self, operation: Operation<E>) {
		self.operations.push(operation);
	}

	/// Planned operations in apply order.
	pub fn operations(&self) -> &[Operation<E>] {
		&self.operations
	}

	/// Consumes the plan.
	pub fn into_operations(self) -> Vec<Operation<E>> {
		self.operations
	}

	/// Number of planned operations.
	pub fn len(&self) -> usize {
		self.operations.len()
	}

	/// Returns true when nothing needs to be written.
	pub fn is_empty(&self) -> bool {
		self.operations.is_empty()
	}

	/// Consecutive chunks of at most `batch_size` operations.
	///
	/// A `batch_size` of zero is treated as one.
	pub fn chunks(&self, batch_size: usize) -> std::slice::Chunks<'_, Operation<E>> {
		self.operations.chunks(batch_size.max(1))
	}

	/// Number of chunks this plan splits into for `batch_size`.
	pub fn chunk_count(&self, batch_size: usize) -> usize {
		if batch_size == 0 {
			return 0;
		}
		self.operations.len().div_ceil(batch_size)
	}
}

impl<E> From<Vec<Operation<E>>> for ApplyPlan<E> {
	fn from(operations: Vec<Operation<E>>) -> Self {
		Self { operations }
	}
}

/// Per-seeder record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCounts {
	/// Records planned for insert.
	pub inserted: usize,
	/// Records planned for update.
	pub updated: usize,
	/// Desired records already matching the store.
	pub unchanged: usize,
}

impl SeedCounts {
	/// Total desired records seen.
	pub fn total(&self) -> usize {
		self.inserted + self.updated + self.unchanged
	}

	/// Records that required a write.
	pub fn writes(&self) -> usize {
		self.inserted + self.updated
	}
}

impl AddAssign for SeedCounts {
	fn add_assign(&mut self, rhs: Self) {
		self.inserted += rhs.inserted;
		self.updated += rhs.updated;
		self.unchanged += rhs.unchanged;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(0, 100, 0)]
	#[case(1, 100, 1)]
	#[case(100, 100, 1)]
	#[case(301, 100, 4)]
	fn test_chunk_count(#[case] len: usize, #[case] batch: usize, #[case] expected: usize) {
		let plan: ApplyPlan<u32> = (0..len as u32).map(Operation::Insert).collect::<Vec<_>>().into();
		assert_eq!(plan.chunk_count(batch), expected);
	}

	#[rstest]
	fn test_chunks_last_holds_remainder() {
		let plan: ApplyPlan<u32> = (0..31).map(Operation::Insert).collect::<Vec<_>>().into();

		let sizes: Vec<usize> = plan.chunks(10).map(|c| c.len()).collect();

		assert_eq!(sizes, vec![10, 10, 10, 1]);
	}

	#[rstest]
	fn test_operation_accessors() {
		let op = Operation::Update("row");
		assert_eq!(op.kind(), OperationKind::Update);
		assert_eq!(*op.entity(), "row");
		assert_eq!(op.into_entity(), "row");
	}

	#[rstest]
	fn test_counts_accumulate() {
		let mut total = SeedCounts::default();
		total += SeedCounts {
			inserted: 2,
			updated: 1,
			unchanged: 3,
		};
		total += SeedCounts {
			inserted: 1,
			updated: 0,
			unchanged: 0,
		};
		assert_eq!(total.total(), 7);
		assert_eq!(total.writes(), 4);
	}
}
