use crate::policy::{EvictionPolicy, Fifo, Lfu, Lru, Unbounded};

use std::hash::Hash;

/// The closed set of built-in eviction policies.
///
/// Selection happens here rather than by a runtime-loaded name: each kind
/// maps to one concrete [`EvictionPolicy`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicyKind {
  /// Evict the least recently accessed entry.
  Lru,
  /// Evict the least frequently accessed entry, ties broken by oldest access.
  Lfu,
  /// Evict in insertion order.
  Fifo,
  /// Never evict.
  Unbounded,
}

impl EvictionPolicyKind {
  pub(crate) fn instantiate<K>(self) -> Box<dyn EvictionPolicy<K>>
  where
    K: Eq + Hash + Clone + Send + Sync + 'static,
  {
    match self {
      EvictionPolicyKind::Lru => Box::new(Lru::new()),
      EvictionPolicyKind::Lfu => Box::new(Lfu::new()),
      EvictionPolicyKind::Fifo => Box::new(Fifo::new()),
      EvictionPolicyKind::Unbounded => Box::new(Unbounded),
    }
  }
}

/// The recognized configuration options, consumed by the builder.
///
/// This is the programmatic equivalent of a properties file: construct one,
/// tweak fields, and hand it to [`CacheBuilder::from_config`]
/// (crate::CacheBuilder::from_config).
#[derive(Debug, Clone)]
pub struct CacheConfig {
  /// Keep values in the in-memory tier. Disabling this requires a
  /// persistence store; the in-memory map is then only used to coordinate
  /// regeneration.
  pub memory_caching: bool,
  /// Treat the persistence store as unbounded overflow: capacity eviction
  /// persists the victim instead of deleting it.
  pub unlimited_disk_cache: bool,
  /// Whether `fetch` blocks while another caller regenerates (`true`) or
  /// serves the stale value immediately (`false`).
  pub blocking: bool,
  /// The eviction policy for the bounded in-memory tier.
  pub eviction_policy: EvictionPolicyKind,
  /// Maximum number of entries; `None` means unbounded.
  pub capacity: Option<u64>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      memory_caching: true,
      unlimited_disk_cache: false,
      blocking: true,
      eviction_policy: EvictionPolicyKind::Lru,
      capacity: None,
    }
  }
}
