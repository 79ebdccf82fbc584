//! In-memory repository backend.
//!
//! Rows are kept in insertion order and indexed by a caller-supplied key
//! function, which plays the role of a unique constraint. Commits are atomic:
//! every staged write is validated before any of them is applied.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::{Repository, UnitOfWork};
use crate::error::{StoreError, StoreResult};
use crate::plan::Operation;

type KeyFn<E, K> = Arc<dyn Fn(&E) -> K + Send + Sync>;

struct MemoryState<E, K> {
	rows: Vec<E>,
	index: HashMap<K, usize>,
}

/// Thread-safe in-memory [`Repository`].
///
/// Clones share the same rows, so a test can keep a handle while the
/// orchestrator owns another.
pub struct MemoryRepository<E, K> {
	state: Arc<RwLock<MemoryState<E, K>>>,
	key_fn: KeyFn<E, K>,
	attempts: Arc<AtomicUsize>,
	commits: Arc<AtomicUsize>,
	failing_attempts: Arc<Mutex<HashSet<usize>>>,
	failing_load: Arc<AtomicBool>,
	latency: Option<Duration>,
}

impl<E, K> Clone for MemoryRepository<E, K> {
	fn clone(&self) -> Self {
		Self {
			state: Arc::clone(&self.state),
			key_fn: Arc::clone(&self.key_fn),
			attempts: Arc::clone(&self.attempts),
			commits: Arc::clone(&self.commits),
			failing_attempts: Arc::clone(&self.failing_attempts),
			failing_load: Arc::clone(&self.failing_load),
			latency: self.latency,
		}
	}
}

impl<E, K> fmt::Debug for MemoryRepository<E, K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryRepository")
			.field("rows", &self.state.read().rows.len())
			.field("commits", &self.commits.load(Ordering::SeqCst))
			.finish()
	}
}

impl<E, K> MemoryRepository<E, K>
where
	E: Clone + Send + Sync + 'static,
	K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
	/// Creates an empty repository keyed by `key_fn`.
	///
	/// # Examples
	///
	/// ```
	/// use seedwork_seeding::{MemoryRepository, Repository};
	///
	/// # tokio_test::block_on(async {
	/// let repository = MemoryRepository::new(|code: &String| code.clone());
	/// repository.seed_rows(["FR".to_string(), "JP".to_string()]);
	///
	/// assert_eq!(repository.load_all().await.unwrap().len(), 2);
	/// # });
	/// ```
	pub fn new(key_fn: impl Fn(&E) -> K + Send + Sync + 'static) -> Self {
		Self {
			state: Arc::new(RwLock::new(MemoryState {
				rows: Vec::new(),
				index: HashMap::new(),
			})),
			key_fn: Arc::new(key_fn),
			attempts: Arc::new(AtomicUsize::new(0)),
			commits: Arc::new(AtomicUsize::new(0)),
			failing_attempts: Arc::new(Mutex::new(HashSet::new())),
			failing_load: Arc::new(AtomicBool::new(false)),
			latency: None,
		}
	}

	/// Sleeps for `latency` before every commit.
	pub fn with_commit_latency(mut self, latency: Duration) -> Self {
		self.latency = Some(latency);
		self
	}

	/// Makes the `attempt`-th commit (1-based, counted across the repository's
	/// lifetime) fail with a backend error.
	pub fn fail_on_commit(&self, attempt: usize) {
		self.failing_attempts.lock().insert(attempt);
	}

	/// Makes every subsequent `load_all` fail with a backend error.
	pub fn fail_on_load(&self) {
		self.failing_load.store(true, Ordering::SeqCst);
	}

	/// Inserts rows directly, bypassing units of work and uniqueness checks.
	///
	/// Rows with an already indexed key are stored but never matched again,
	/// which mimics a store holding corrupt duplicates.
	pub fn seed_rows(&self, rows: impl IntoIterator<Item = E>) {
		let mut state = self.state.write();
		for row in rows {
			let key = (self.key_fn)(&row);
			let position = state.rows.len();
			state.rows.push(row);
			state.index.entry(key).or_insert(position);
		}
	}

	/// Copy of every stored row.
	pub fn snapshot(&self) -> Vec<E> {
		self.state.read().rows.clone()
	}

	/// Looks up a row by key.
	pub fn get(&self, key: &K) -> Option<E> {
		let state = self.state.read();
		state.index.get(key).map(|&i| state.rows[i].clone())
	}

	/// Number of stored rows.
	pub fn len(&self) -> usize {
		self.state.read().rows.len()
	}

	/// Returns true when no rows are stored.
	pub fn is_empty(&self) -> bool {
		self.state.read().rows.is_empty()
	}

	/// Number of successful commits.
	pub fn commits(&self) -> usize {
		self.commits.load(Ordering::SeqCst)
	}

	fn apply(&self, staged: Vec<Operation<E>>) -> StoreResult<usize> {
		let mut state = self.state.write();

		let mut pending_inserts = HashSet::new();
		for operation in &staged {
			let key = (self.key_fn)(operation.entity());
			match operation {
				Operation::Insert(_) => {
					if state.index.contains_key(&key) || !pending_inserts.insert(key.clone()) {
						return Err(StoreError::Conflict(format!(
							"duplicate key {:?} on insert",
							key
						)));
					}
				}
				Operation::Update(_) => {
					if !state.index.contains_key(&key) && !pending_inserts.contains(&key) {
						return Err(StoreError::Conflict(format!(
							"no row with key {:?} to update",
							key
						)));
					}
				}
			}
		}

		let applied = staged.len();
		for operation in staged {
			match operation {
				Operation::Insert(entity) => {
					let key = (self.key_fn)(&entity);
					let position = state.rows.len();
					state.rows.push(entity);
					state.index.insert(key, position);
				}
				Operation::Update(entity) => {
					let key = (self.key_fn)(&entity);
					if let Some(&position) = state.index.get(&key) {
						state.rows[position] = entity;
					}
				}
			}
		}
		Ok(applied)
	}
}

#[async_trait]
impl<E, K> Repository<E> for MemoryRepository<E, K>
where
	E: Clone + Send + Sync + 'static,
	K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
	async fn load_all(&self) -> StoreResult<Vec<E>> {
		if self.failing_load.load(Ordering::SeqCst) {
			return Err(StoreError::Backend("injected failure on load".to_string()));
		}
		Ok(self.snapshot())
	}

	fn begin(&self) -> Box<dyn UnitOfWork<E> + '_> {
		Box::new(MemoryUnitOfWork {
			repository: self,
			staged: Vec::new(),
		})
	}

	async fn delete_all(&self) -> StoreResult<usize> {
		let mut state = self.state.write();
		let removed = state.rows.len();
		state.rows.clear();
		state.index.clear();
		Ok(removed)
	}
}

/// Unit of work staged against a [`MemoryRepository`].
pub struct MemoryUnitOfWork<'a, E, K> {
	repository: &'a MemoryRepository<E, K>,
	staged: Vec<Operation<E>>,
}

#[async_trait]
impl<E, K> UnitOfWork<E> for MemoryUnitOfWork<'_, E, K>
where
	E: Clone + Send + Sync + 'static,
	K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
	fn stage_insert(&mut self, entity: E) {
		self.staged.push(Operation::Insert(entity));
	}

	fn stage_update(&mut self, entity: E) {
		self.staged.push(Operation::Update(entity));
	}

	fn staged(&self) -> usize {
		self.staged.len()
	}

	async fn commit(self: Box<Self>) -> StoreResult<usize> {
		let this = *self;
		let repository = this.repository;
		let attempt = repository.attempts.fetch_add(1, Ordering::SeqCst) + 1;

		if let Some(latency) = repository.latency {
			tokio::time::sleep(latency).await;
		}

		let injected = repository.failing_attempts.lock().contains(&attempt);
		if injected {
			return Err(StoreError::Backend(format!(
				"injected failure on commit {}",
				attempt
			)));
		}

		let applied = repository.apply(this.staged)?;
		repository.commits.fetch_add(1, Ordering::SeqCst);
		Ok(applied)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[derive(Debug, Clone, PartialEq)]
	struct Row {
		code: String,
		value: u32,
	}

	fn row(code: &str, value: u32) -> Row {
		Row {
			code: code.to_string(),
			value,
		}
	}

	fn repository() -> MemoryRepository<Row, String> {
		MemoryRepository::new(|r: &Row| r.code.clone())
	}

	#[rstest]
	#[tokio::test]
	async fn test_commit_applies_inserts_and_updates() {
		// Arrange
		let repo = repository();
		repo.seed_rows([row("a", 1)]);

		// Act
		let mut uow = repo.begin();
		uow.stage_insert(row("b", 2));
		uow.stage_update(row("a", 10));
		assert_eq!(uow.staged(), 2);
		let applied = uow.commit().await.unwrap();

		// Assert
		assert_eq!(applied, 2);
		assert_eq!(repo.snapshot(), vec![row("a", 10), row("b", 2)]);
		assert_eq!(repo.commits(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_conflicting_commit_is_atomic() {
		let repo = repository();
		repo.seed_rows([row("a", 1)]);

		let mut uow = repo.begin();
		uow.stage_insert(row("b", 2));
		uow.stage_insert(row("a", 3));
		let result = uow.commit().await;

		assert!(matches!(result, Err(StoreError::Conflict(_))));
		assert_eq!(repo.snapshot(), vec![row("a", 1)]);
		assert_eq!(repo.commits(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_update_of_missing_row_conflicts() {
		let repo = repository();
		let mut uow = repo.begin();
		uow.stage_update(row("ghost", 1));
		assert!(matches!(uow.commit().await, Err(StoreError::Conflict(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_injected_failure_hits_only_that_attempt() {
		let repo = repository();
		repo.fail_on_commit(2);

		let mut first = repo.begin();
		first.stage_insert(row("a", 1));
		assert!(first.commit().await.is_ok());

		let mut second = repo.begin();
		second.stage_insert(row("b", 2));
		assert!(matches!(second.commit().await, Err(StoreError::Backend(_))));

		let mut third = repo.begin();
		third.stage_insert(row("b", 2));
		assert!(third.commit().await.is_ok());

		assert_eq!(repo.len(), 2);
		assert_eq!(repo.commits(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_injected_load_failure_shared_by_clones() {
		let repo = repository();
		repo.seed_rows([row("a", 1)]);

		repo.clone().fail_on_load();

		assert!(matches!(repo.load_all().await, Err(StoreError::Backend(_))));
		assert_eq!(repo.len(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_all_and_duplicates() {
		let repo = repository();
		repo.seed_rows([row("a", 1), row("a", 2)]);
		assert_eq!(repo.len(), 2);
		assert_eq!(repo.get(&"a".to_string()), Some(row("a", 1)));

		assert_eq!(repo.delete_all().await.unwrap(), 2);
		assert!(repo.is_empty());
		assert!(repo.load_all().await.unwrap().is_empty());
	}
}
