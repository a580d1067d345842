use crate::error::CacheError;
use crate::refresh::RefreshRule;
use crate::store::CacheStore;
use crate::time;

use core::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// The outcome of a [`Cache::fetch`] call.
///
/// `NeedsRegeneration` is the expected, frequent result of a miss or a stale
/// hit — a protocol signal, not a fault. The caller it is handed to is the
/// sole regenerator for this cycle and must follow up with `store` (or
/// `cancel_update` to pass the claim on).
#[derive(Debug)]
pub enum Lookup<V> {
  /// A usable value.
  Fresh(Arc<V>),
  /// The caller must regenerate. Carries the stale value, if one exists, for
  /// fail-over use should regeneration itself fail.
  NeedsRegeneration(Option<Arc<V>>),
}

impl<V> Lookup<V> {
  pub fn is_fresh(&self) -> bool {
    matches!(self, Lookup::Fresh(_))
  }

  /// The fresh value, or `None` if regeneration is needed.
  pub fn fresh(self) -> Option<Arc<V>> {
    match self {
      Lookup::Fresh(value) => Some(value),
      Lookup::NeedsRegeneration(_) => None,
    }
  }
}

/// A thread-safe handle to one cache instance.
///
/// Handles are cheap to clone and share one underlying store; there is no
/// process-wide implicit cache. Values are held as `Arc<V>`, so `V` needs no
/// `Clone` bound.
pub struct Cache<K: Send, V: Send> {
  pub(crate) store: Arc<CacheStore<K, V>>,
}

impl<K: Send, V: Send> Clone for Cache<K, V> {
  fn clone(&self) -> Self {
    Self {
      store: self.store.clone(),
    }
  }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cache")
      .field("len", &self.store.len())
      .finish()
  }
}

impl<K, V> Cache<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  /// Retrieves the value for `key` under the entry's stored refresh rule.
  pub fn fetch(&self, key: &K) -> Result<Lookup<V>, CacheError> {
    self.store.fetch(key, time::now_duration(), None)
  }

  /// Retrieves the value for `key`, treating it as stale once
  /// `refresh_period` has elapsed since its last update. The period applies
  /// to this call only.
  pub fn fetch_with_period(
    &self,
    key: &K,
    refresh_period: Duration,
  ) -> Result<Lookup<V>, CacheError> {
    let rule = RefreshRule::MaxAge(refresh_period);
    self.store.fetch(key, time::now_duration(), Some(&rule))
  }

  /// Retrieves the value for `key`, treating it as stale once
  /// `refresh_period` has elapsed since its last update or the most recent
  /// boundary of the cron `schedule` has passed since then, whichever comes
  /// first.
  pub fn fetch_with_schedule(
    &self,
    key: &K,
    refresh_period: Duration,
    schedule: &str,
  ) -> Result<Lookup<V>, CacheError> {
    let by_schedule = RefreshRule::schedule(schedule)?;
    let rule = RefreshRule::Predicate(Arc::new(move |last_updated, now| {
      now.saturating_sub(last_updated) >= refresh_period
        || by_schedule.is_stale(last_updated, now)
    }));
    self.store.fetch(key, time::now_duration(), Some(&rule))
  }

  /// Stores a value with no groups and no expiry rule.
  pub fn store(&self, key: K, value: V) -> Result<(), CacheError> {
    self
      .store
      .store(key, value, Vec::new(), RefreshRule::Never, time::now_duration())
  }

  /// Stores a value as a member of the given groups.
  pub fn store_in_groups(&self, key: K, value: V, groups: Vec<String>) -> Result<(), CacheError> {
    self
      .store
      .store(key, value, groups, RefreshRule::Never, time::now_duration())
  }

  /// Stores a value with groups and a refresh rule.
  pub fn store_with_rule(
    &self,
    key: K,
    value: V,
    groups: Vec<String>,
    rule: RefreshRule,
  ) -> Result<(), CacheError> {
    self.store.store(key, value, groups, rule, time::now_duration())
  }

  /// Gives up a regeneration claim so another caller can take over. Valid
  /// only while an update is actually in progress for `key`.
  pub fn cancel_update(&self, key: &K) -> Result<(), CacheError> {
    self.store.cancel_update(key)
  }

  /// Removes every entry last updated before `cutoff`.
  pub fn flush_all(&self, cutoff: SystemTime) {
    self.store.flush_all(time::wall_to_duration(cutoff));
  }

  /// Removes every entry belonging to `group`.
  pub fn flush_group(&self, group: &str) {
    self.store.flush_group(group);
  }

  /// Removes all entries and stops event delivery. Persisted values survive.
  pub fn shutdown(&self) {
    self.store.shutdown();
  }

  /// The number of entries currently in the in-memory map, including
  /// placeholders for regenerations in flight.
  pub fn len(&self) -> usize {
    self.store.len()
  }

  pub fn is_empty(&self) -> bool {
    self.store.len() == 0
  }

  pub fn contains_key(&self, key: &K) -> bool {
    self.store.contains_key(key)
  }
}

impl<K, V> Cache<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + AsRef<str> + 'static,
  V: Send + Sync + 'static,
{
  /// Removes every entry whose key contains `pattern` as a substring.
  /// A plain substring test, not a regular expression.
  pub fn flush_pattern(&self, pattern: &str) {
    self.store.flush_pattern(pattern);
  }
}
