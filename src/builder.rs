use crate::config::{CacheConfig, EvictionPolicyKind};
use crate::error::BuildError;
use crate::handles::Cache;
use crate::listener::CacheEventListener;
use crate::notifier::Notifier;
use crate::persist::PersistenceStore;
use crate::store::CacheStore;

use core::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// A builder for [`Cache`] instances.
///
/// Defaults: unbounded, blocking mode, no listener, no persistence store.
pub struct CacheBuilder<K: Send, V: Send> {
  capacity: Option<u64>,
  blocking: bool,
  wait_timeout: Option<Duration>,
  memory_caching: bool,
  unlimited_disk_cache: bool,
  policy: Option<EvictionPolicyKind>,
  listener: Option<Arc<dyn CacheEventListener<K>>>,
  persistence: Option<Arc<dyn PersistenceStore<K, V>>>,
  _key_marker: PhantomData<K>,
  _value_marker: PhantomData<V>,
}

impl<K: Send, V: Send> fmt::Debug for CacheBuilder<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("capacity", &self.capacity)
      .field("blocking", &self.blocking)
      .field("wait_timeout", &self.wait_timeout)
      .field("memory_caching", &self.memory_caching)
      .field("unlimited_disk_cache", &self.unlimited_disk_cache)
      .field("policy", &self.policy)
      .field("has_listener", &self.listener.is_some())
      .field("has_persistence", &self.persistence.is_some())
      .finish()
  }
}

impl<K: Send, V: Send> CacheBuilder<K, V> {
  /// Creates a new `CacheBuilder` with default settings.
  pub fn new() -> Self {
    Self {
      capacity: None,
      blocking: true,
      wait_timeout: None,
      memory_caching: true,
      unlimited_disk_cache: false,
      policy: None,
      listener: None,
      persistence: None,
      _key_marker: PhantomData,
      _value_marker: PhantomData,
    }
  }

  /// Starts from a set of recognized configuration options.
  pub fn from_config(config: CacheConfig) -> Self {
    let mut builder = Self::new();
    builder.capacity = config.capacity;
    builder.blocking = config.blocking;
    builder.memory_caching = config.memory_caching;
    builder.unlimited_disk_cache = config.unlimited_disk_cache;
    builder.policy = Some(config.eviction_policy);
    builder
  }

  /// Sets the maximum number of entries.
  pub fn capacity(mut self, capacity: u64) -> Self {
    self.capacity = Some(capacity);
    self
  }

  /// Removes the capacity bound.
  pub fn unbounded(mut self) -> Self {
    self.capacity = None;
    self
  }

  /// Selects blocking (`true`) or stale-serving (`false`) behavior for
  /// `fetch` when another caller holds the regeneration claim.
  pub fn blocking(mut self, blocking: bool) -> Self {
    self.blocking = blocking;
    self
  }

  /// Bounds how long a blocking `fetch` waits for a regeneration in
  /// progress. On expiry the call behaves like the non-blocking path:
  /// the stale value is served if one exists.
  pub fn wait_timeout(mut self, timeout: Duration) -> Self {
    self.wait_timeout = Some(timeout);
    self
  }

  /// Enables or disables the in-memory tier. Disabling it requires a
  /// persistence store.
  pub fn memory_caching(mut self, enabled: bool) -> Self {
    self.memory_caching = enabled;
    self
  }

  /// Treats the persistence store as unbounded overflow: capacity eviction
  /// persists the victim instead of deleting its durable copy.
  pub fn unlimited_disk_cache(mut self, enabled: bool) -> Self {
    self.unlimited_disk_cache = enabled;
    self
  }

  /// Selects the eviction policy.
  ///
  /// Defaults to LRU for a bounded cache and to no eviction otherwise.
  pub fn eviction_policy(mut self, kind: EvictionPolicyKind) -> Self {
    self.policy = Some(kind);
    self
  }

  /// Sets the event listener for the cache.
  pub fn event_listener<L>(mut self, listener: L) -> Self
  where
    L: CacheEventListener<K> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Sets the persistence collaborator.
  pub fn persistence<P>(mut self, persistence: P) -> Self
  where
    P: PersistenceStore<K, V> + 'static,
  {
    self.persistence = Some(Arc::new(persistence));
    self
  }
}

impl<K: Send, V: Send> Default for CacheBuilder<K, V> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K, V> CacheBuilder<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  /// Builds the cache.
  pub fn build(self) -> Result<Cache<K, V>, BuildError> {
    self.validate()?;

    let kind = self.policy.unwrap_or(if self.capacity.is_some() {
      EvictionPolicyKind::Lru
    } else {
      EvictionPolicyKind::Unbounded
    });

    let notifier = self
      .listener
      .map(|listener| {
        let (notifier, tx) = Notifier::spawn(listener);
        (tx, notifier)
      });

    let store = CacheStore::new(
      kind.instantiate(),
      self.capacity,
      self.blocking,
      self.wait_timeout,
      self.memory_caching,
      self.unlimited_disk_cache,
      self.persistence,
      notifier,
    );

    Ok(Cache {
      store: Arc::new(store),
    })
  }

  fn validate(&self) -> Result<(), BuildError> {
    if self.capacity == Some(0) {
      return Err(BuildError::ZeroCapacity);
    }
    if !self.memory_caching && self.persistence.is_none() {
      return Err(BuildError::NoBackingStore);
    }
    Ok(())
  }
}
