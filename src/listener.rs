use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

/// A notification about a change to the cache.
///
/// Delivery order for one entry matches the order the operations were applied
/// under that entry's lock; no ordering is guaranteed across entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent<K> {
  /// A value was stored under a key that had none before.
  EntryAdded(K),
  /// A value replaced an existing one.
  EntryUpdated(K),
  /// An entry was removed, e.g. by eviction.
  EntryRemoved(K),
  /// An entry was removed by a flush (cutoff or pattern).
  EntryFlushed(K),
  /// Every member of the named group was flushed.
  GroupFlushed(String),
  /// A cache-wide flush ran.
  CacheWideFlushed,
}

/// A listener that can be registered with the cache to receive change
/// notifications.
///
/// `on_event` is called from a dedicated background thread so listener work
/// never blocks cache operations.
pub trait CacheEventListener<K>: Send + Sync {
  fn on_event(&self, event: CacheEvent<K>);
}

impl<K, L> CacheEventListener<K> for Arc<L>
where
  L: CacheEventListener<K> + ?Sized,
{
  fn on_event(&self, event: CacheEvent<K>) {
    (**self).on_event(event);
  }
}

/// A provided listener that counts events per kind.
///
/// Share it with the cache through an `Arc` and read the counters with
/// [`snapshot`](EventCounts::snapshot).
#[derive(Debug, Default)]
pub struct EventCounts {
  added: CachePadded<AtomicU64>,
  updated: CachePadded<AtomicU64>,
  removed: CachePadded<AtomicU64>,
  flushed: CachePadded<AtomicU64>,
  group_flushes: CachePadded<AtomicU64>,
  cache_flushes: CachePadded<AtomicU64>,
}

impl EventCounts {
  pub fn new() -> Self {
    Self::default()
  }

  /// A point-in-time snapshot of the counters.
  pub fn snapshot(&self) -> EventCountsSnapshot {
    EventCountsSnapshot {
      added: self.added.load(Ordering::Relaxed),
      updated: self.updated.load(Ordering::Relaxed),
      removed: self.removed.load(Ordering::Relaxed),
      flushed: self.flushed.load(Ordering::Relaxed),
      group_flushes: self.group_flushes.load(Ordering::Relaxed),
      cache_flushes: self.cache_flushes.load(Ordering::Relaxed),
    }
  }
}

impl<K: Send + Sync> CacheEventListener<K> for EventCounts {
  fn on_event(&self, event: CacheEvent<K>) {
    let counter = match event {
      CacheEvent::EntryAdded(_) => &self.added,
      CacheEvent::EntryUpdated(_) => &self.updated,
      CacheEvent::EntryRemoved(_) => &self.removed,
      CacheEvent::EntryFlushed(_) => &self.flushed,
      CacheEvent::GroupFlushed(_) => &self.group_flushes,
      CacheEvent::CacheWideFlushed => &self.cache_flushes,
    };
    counter.fetch_add(1, Ordering::Relaxed);
  }
}

/// The counter values captured by [`EventCounts::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCountsSnapshot {
  pub added: u64,
  pub updated: u64,
  pub removed: u64,
  pub flushed: u64,
  pub group_flushes: u64,
  pub cache_flushes: u64,
}
