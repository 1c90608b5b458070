use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::entity::{Entity, EntityMeta};
use crate::error::DataError;
use crate::repository::Repository;

struct Store<T> {
    items: Vec<T>,
    last_id: u64,
    last_stamp: Option<DateTime<Utc>>,
}

impl<T: Entity> Store<T> {
    /// Wall-clock time, nudged forward so no two writes share a timestamp.
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::nanoseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    // `build` and `apply` run on a local value; the store only changes once
    // they have returned.
    fn insert(&mut self, draft: T::Draft) -> T {
        let id = self.last_id + 1;
        let meta = EntityMeta::new(id, self.next_stamp());
        let mut item = T::build(meta, draft);
        *item.meta_mut() = meta;
        self.last_id = id;
        self.items.push(item.clone());
        item
    }

    fn patch(&mut self, index: usize, patch: T::Patch) -> T {
        let stamp = self.next_stamp();
        let mut item = self.items[index].clone();
        let kept = *item.meta();
        item.apply(patch);
        *item.meta_mut() = EntityMeta {
            id: kept.id,
            created_at: kept.created_at,
            updated_at: stamp,
        };
        self.items[index] = item.clone();
        item
    }
}

/// Process-local repository guarding its records with a single mutex.
///
/// Ids start at 1 and are never reused, even after deletes. Every operation
/// holds the lock for its whole (short, non-blocking) duration, so id
/// allocation and the collection change are atomic with respect to each other.
pub struct InMemoryRepository<T> {
    inner: Mutex<Store<T>>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Store {
                items: Vec::new(),
                last_id: 0,
                last_stamp: None,
            }),
        }
    }

    // A panic in `build` or `apply` poisons the lock before any record or the
    // id counter changes, so the store behind a poisoned lock is still whole.
    fn lock(&self) -> MutexGuard<'_, Store<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a record unless an existing one `conflicts` with it.
    ///
    /// The check and the insert happen under the same lock.
    pub fn create_unique<F>(&self, draft: T::Draft, conflicts: F) -> Result<T, DataError>
    where
        F: Fn(&T) -> bool,
    {
        let mut store = self.lock();
        if let Some(existing) = store.items.iter().find(|item| conflicts(item)) {
            return Err(DataError::Conflict(format!(
                "conflicts with existing record {}",
                existing.id()
            )));
        }
        Ok(store.insert(draft))
    }

    /// Update the record with `id` unless another record `conflicts` with the change.
    ///
    /// Returns `Ok(None)` when there is no record with `id`.
    pub fn update_unique<F>(&self, id: u64, patch: T::Patch, conflicts: F) -> Result<Option<T>, DataError>
    where
        F: Fn(&T) -> bool,
    {
        let mut store = self.lock();
        let Some(index) = store.position(id) else {
            return Ok(None);
        };
        if let Some(existing) = store
            .items
            .iter()
            .find(|item| item.id() != id && conflicts(item))
        {
            return Err(DataError::Conflict(format!(
                "conflicts with existing record {}",
                existing.id()
            )));
        }
        Ok(Some(store.patch(index, patch)))
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    fn create(&self, draft: T::Draft) -> T {
        self.lock().insert(draft)
    }

    fn get_all(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    fn get_by_id(&self, id: u64) -> Option<T> {
        self.lock().items.iter().find(|item| item.id() == id).cloned()
    }

    fn update(&self, id: u64, patch: T::Patch) -> Option<T> {
        let mut store = self.lock();
        let index = store.position(id)?;
        Some(store.patch(index, patch))
    }

    fn delete(&self, id: u64) -> bool {
        let mut store = self.lock();
        match store.position(id) {
            Some(index) => {
                store.items.remove(index);
                true
            }
            None => false,
        }
    }

    fn count(&self) -> usize {
        self.lock().items.len()
    }
}
