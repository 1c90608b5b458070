use crate::entity::Entity;

/// Generic CRUD repository for one entity kind.
///
/// Every operation is synchronous and bounded; implementations must be safe
/// to call from many request handlers at once.
pub trait Repository<T: Entity>: Send + Sync {
    /// Store a new record, assigning its id and timestamps.
    fn create(&self, draft: T::Draft) -> T;

    /// Snapshot of every record, in creation order.
    fn get_all(&self) -> Vec<T>;

    fn get_by_id(&self, id: u64) -> Option<T>;

    /// Merge `patch` into the record with `id`; `None` if there is no such record.
    fn update(&self, id: u64, patch: T::Patch) -> Option<T>;

    /// Remove the record with `id`; `false` if there is no such record.
    fn delete(&self, id: u64) -> bool;

    fn count(&self) -> usize;
}
