pub mod fifo;
pub mod lfu;
pub mod lru;
pub mod null;

pub use fifo::Fifo;
pub use lfu::Lfu;
pub use lru::Lru;
pub use null::Unbounded;

/// A capability interface for eviction policies.
///
/// The policy tracks access/insertion order for the keys currently in the
/// cache and selects a victim when the cache is over capacity. All methods
/// are called by the orchestrator while it holds the map-level lock; a policy
/// performs no I/O and never fails for a normal map state.
pub trait EvictionPolicy<K>: Send + Sync {
  /// Records a read of `key` for ordering purposes.
  fn on_access(&self, key: &K);

  /// Records a new or replaced entry.
  fn on_insert(&self, key: &K);

  /// Drops bookkeeping for an entry leaving the map (flush, cancellation
  /// cleanup, eviction).
  fn on_remove(&self, key: &K);

  /// The key that should be evicted next under this policy's ordering, or
  /// `None` when there is nothing to evict. `exclude`, when given, names the
  /// key whose admission triggered the overflow; it must not be chosen, or a
  /// bounded cache would discard the value it was just asked to keep. This
  /// only peeks; the orchestrator removes the entry and follows up with
  /// [`on_remove`](Self::on_remove).
  fn select_victim(&self, exclude: Option<&K>) -> Option<K>;

  /// Clears all state from the policy.
  fn clear(&self);
}
