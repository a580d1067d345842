use crate::refresh::RefreshRule;
use crate::update_state::UpdateState;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// A container for one cached value and all of its metadata.
///
/// The value is absent only before the first successful `store`; such
/// placeholder entries exist purely to coordinate the first regeneration.
#[derive(Debug)]
pub(crate) struct CacheEntry<V> {
  /// The user's value, wrapped in an Arc for shared ownership.
  value: Option<Arc<V>>,
  /// Timestamp of the last successful insertion, as a duration since the
  /// cache epoch. `None` until the first `store`.
  last_updated: Option<Duration>,
  /// Group names this entry belongs to. A group flush is a scan over entries
  /// carrying the flushed name.
  groups: HashSet<String, ahash::RandomState>,
  /// The staleness rule installed at insertion time. A per-call rule passed
  /// to `fetch` overrides it for that call only.
  refresh: RefreshRule,
  /// The regeneration state machine for the current cycle. All transitions
  /// happen under the owning cell's lock.
  pub(crate) state: UpdateState,
  /// Set when the entry leaves the map while callers may still hold its
  /// cell. A retired cell must never be claimed or waited on; the map's
  /// current cell for the key is the live one.
  retired: bool,
}

impl<V> CacheEntry<V> {
  /// A placeholder created on first lookup of an unknown key.
  pub(crate) fn placeholder() -> Self {
    Self {
      value: None,
      last_updated: None,
      groups: HashSet::default(),
      refresh: RefreshRule::Never,
      state: UpdateState::new(),
      retired: false,
    }
  }

  #[inline]
  pub(crate) fn value(&self) -> Option<Arc<V>> {
    self.value.clone()
  }

  #[inline]
  pub(crate) fn last_updated(&self) -> Option<Duration> {
    self.last_updated
  }

  pub(crate) fn belongs_to_group(&self, name: &str) -> bool {
    self.groups.contains(name)
  }

  #[inline]
  pub(crate) fn is_retired(&self) -> bool {
    self.retired
  }

  pub(crate) fn mark_retired(&mut self) {
    self.retired = true;
  }

  /// Whether the entry's content needs regeneration at `now`.
  ///
  /// An entry that has never been stored is always stale. Otherwise the
  /// per-call rule, if any, takes precedence over the stored one.
  pub(crate) fn is_stale(&self, now: Duration, rule: Option<&RefreshRule>) -> bool {
    let last_updated = match self.last_updated {
      Some(t) => t,
      None => return true,
    };
    rule.unwrap_or(&self.refresh).is_stale(last_updated, now)
  }

  /// Replaces the entry's content and metadata after a successful
  /// regeneration, installing a fresh `Complete` state. This is the only way
  /// content moves from absent/stale to fresh.
  pub(crate) fn accept(
    &mut self,
    value: Arc<V>,
    groups: Vec<String>,
    refresh: RefreshRule,
    now: Duration,
  ) {
    self.value = Some(value);
    self.last_updated = Some(now);
    self.groups = groups.into_iter().collect();
    self.refresh = refresh;
    self.state = UpdateState::completed();
  }

  /// Begins a new regeneration cycle for an entry whose previous cycle
  /// completed. From `Cancelled` the state is re-claimable as is.
  pub(crate) fn begin_new_cycle(&mut self) {
    if self.state.is_complete() {
      self.state = UpdateState::new();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn placeholder_is_always_stale() {
    let entry: CacheEntry<String> = CacheEntry::placeholder();
    assert!(entry.is_stale(Duration::from_secs(1), None));
    assert!(entry.value().is_none());
    assert!(entry.state.is_awaiting_update());
  }

  #[test]
  fn accept_installs_fresh_complete_state() {
    let mut entry: CacheEntry<&str> = CacheEntry::placeholder();
    entry.state.start_update().unwrap();

    let now = Duration::from_secs(42);
    entry.accept(
      Arc::new("v1"),
      vec!["reports".to_string()],
      RefreshRule::MaxAge(Duration::from_secs(10)),
      now,
    );

    assert!(entry.state.is_complete());
    assert_eq!(entry.last_updated(), Some(now));
    assert_eq!(*entry.value().unwrap(), "v1");
    assert!(entry.belongs_to_group("reports"));
    assert!(!entry.belongs_to_group("users"));
  }

  #[test]
  fn per_call_rule_overrides_stored_rule() {
    let mut entry: CacheEntry<&str> = CacheEntry::placeholder();
    entry.accept(Arc::new("v"), vec![], RefreshRule::Never, Duration::ZERO);

    let now = Duration::from_secs(60);
    assert!(!entry.is_stale(now, None));
    let tight = RefreshRule::MaxAge(Duration::from_secs(1));
    assert!(entry.is_stale(now, Some(&tight)));
  }

  #[test]
  fn begin_new_cycle_resets_only_complete() {
    let mut entry: CacheEntry<&str> = CacheEntry::placeholder();
    entry.accept(Arc::new("v"), vec![], RefreshRule::Never, Duration::ZERO);
    entry.begin_new_cycle();
    assert!(entry.state.is_awaiting_update());

    entry.state.start_update().unwrap();
    entry.state.cancel_update().unwrap();
    entry.begin_new_cycle();
    // Cancelled is directly re-claimable, no reset.
    assert!(entry.state.is_cancelled());
  }
}
