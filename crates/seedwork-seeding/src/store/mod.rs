//! Persistence collaborator contract.
//!
//! A [`Repository`] owns the persisted entities of one seeder's entity type.
//! Writes are staged on a [`UnitOfWork`] and become durable only when the unit
//! of work commits; a failed commit leaves none of its staged writes behind.

mod memory;

pub use memory::{MemoryRepository, MemoryUnitOfWork};

use async_trait::async_trait;

use crate::error::StoreResult;

/// Access to all persisted entities of one type.
#[async_trait]
pub trait Repository<E: Send + 'static>: Send + Sync {
	/// Loads every existing entity, in store order.
	async fn load_all(&self) -> StoreResult<Vec<E>>;

	/// Starts a new unit of work.
	fn begin(&self) -> Box<dyn UnitOfWork<E> + '_>;

	/// Deletes every entity of this type, returning how many were removed.
	async fn delete_all(&self) -> StoreResult<usize>;
}

/// A batch of staged writes committed atomically.
#[async_trait]
pub trait UnitOfWork<E: Send + 'static>: Send {
	/// Stages a new entity.
	fn stage_insert(&mut self, entity: E);

	/// Stages a modified existing entity.
	fn stage_update(&mut self, entity: E);

	/// Number of staged writes.
	fn staged(&self) -> usize;

	/// Commits every staged write, returning how many were applied.
	async fn commit(self: Box<Self>) -> StoreResult<usize>;
}
