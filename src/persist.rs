use crate::error::PersistError;

use std::sync::Arc;

/// An optional durable collaborator for the cache.
///
/// When configured, the cache asks it to load a value on an in-memory miss
/// before reporting `NeedsRegeneration`, writes values through on `store`,
/// and deletes on removal. With `unlimited_disk_cache` enabled, capacity
/// eviction persists the victim instead of deleting it.
///
/// Failures are isolated: the cache logs them and completes the in-memory
/// operation regardless, so a broken backing store never corrupts the update
/// protocol. Value encoding is the implementor's concern.
pub trait PersistenceStore<K, V>: Send + Sync {
  /// Loads a previously persisted value, or `None` if the key is unknown.
  fn load(&self, key: &K) -> Result<Option<V>, PersistError>;

  /// Durably stores a value.
  fn store(&self, key: &K, value: &V) -> Result<(), PersistError>;

  /// Deletes a persisted value. Unknown keys are not an error.
  fn remove(&self, key: &K) -> Result<(), PersistError>;

  /// Deletes everything.
  fn clear(&self) -> Result<(), PersistError>;
}

impl<K, V, P> PersistenceStore<K, V> for Arc<P>
where
  P: PersistenceStore<K, V> + ?Sized,
{
  fn load(&self, key: &K) -> Result<Option<V>, PersistError> {
    (**self).load(key)
  }

  fn store(&self, key: &K, value: &V) -> Result<(), PersistError> {
    (**self).store(key, value)
  }

  fn remove(&self, key: &K) -> Result<(), PersistError> {
    (**self).remove(key)
  }

  fn clear(&self) -> Result<(), PersistError> {
    (**self).clear()
  }
}
