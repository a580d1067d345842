use crate::entry::CacheEntry;
use crate::handles::Lookup;
use crate::listener::CacheEvent;
use crate::notifier::Notifier;
use crate::persist::PersistenceStore;
use crate::policy::EvictionPolicy;
use crate::refresh::RefreshRule;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::error::CacheError;

type EntryMap<K, V> = HashMap<K, Arc<EntryCell<V>>, ahash::RandomState>;

/// One entry's lock and condition.
///
/// The mutex guards the entry's value, metadata and update state; the
/// condvar is the wait/notify point for "regeneration in progress". Waiters
/// never hold the map-level lock while parked here.
pub(crate) struct EntryCell<V> {
  entry: Mutex<CacheEntry<V>>,
  cond: Condvar,
}

impl<V> EntryCell<V> {
  fn new(entry: CacheEntry<V>) -> Self {
    Self {
      entry: Mutex::new(entry),
      cond: Condvar::new(),
    }
  }
}

/// What to do with the persisted copy of an entry leaving the map.
#[derive(Clone, Copy, PartialEq, Eq)]
enum PersistAction {
  /// Delete the durable copy (flush, invalidation).
  Delete,
  /// Persist the value before dropping it from memory (overflow eviction).
  Overflow,
  /// Leave the durable copy alone (shutdown).
  Keep,
}

/// The outcome of admitting a key that was absent from the map.
enum AdmitOutcome<V> {
  /// The persistence store had the value; it is installed and fresh.
  Loaded(Arc<V>),
  /// A placeholder was inserted and the calling thread holds the claim.
  Claimed,
  /// Another thread inserted the cell first; re-run the entry protocol on it.
  Raced(Arc<EntryCell<V>>),
}

/// The orchestrator: owns the key→entry map, the eviction policy, and the
/// per-entry synchronization discipline.
pub(crate) struct CacheStore<K, V> {
  /// Map-level lock. Guards the mapping's structure and the policy's
  /// bookkeeping; held only briefly, never across a wait.
  entries: RwLock<EntryMap<K, V>>,
  policy: Box<dyn EvictionPolicy<K>>,
  capacity: Option<u64>,
  blocking: bool,
  wait_timeout: Option<Duration>,
  memory_caching: bool,
  unlimited_disk_cache: bool,
  persistence: Option<Arc<dyn PersistenceStore<K, V>>>,
  notifier: Mutex<Option<(Sender<CacheEvent<K>>, Notifier)>>,
}

impl<K, V> CacheStore<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  #[allow(clippy::too_many_arguments)]
  pub(crate) fn new(
    policy: Box<dyn EvictionPolicy<K>>,
    capacity: Option<u64>,
    blocking: bool,
    wait_timeout: Option<Duration>,
    memory_caching: bool,
    unlimited_disk_cache: bool,
    persistence: Option<Arc<dyn PersistenceStore<K, V>>>,
    notifier: Option<(Sender<CacheEvent<K>>, Notifier)>,
  ) -> Self {
    Self {
      entries: RwLock::new(EntryMap::default()),
      policy,
      capacity,
      blocking,
      wait_timeout,
      memory_caching,
      unlimited_disk_cache,
      persistence,
      notifier: Mutex::new(notifier),
    }
  }

  /// Retrieves the value for `key`, coordinating regeneration.
  ///
  /// Exactly one caller receives `NeedsRegeneration` per cycle; it must
  /// follow up with `store` (or `cancel_update` to give the claim up).
  /// `rule`, when present, overrides the entry's stored refresh rule for
  /// this call only.
  pub(crate) fn fetch(
    &self,
    key: &K,
    now: Duration,
    rule: Option<&RefreshRule>,
  ) -> Result<Lookup<V>, CacheError> {
    loop {
      let cell = { self.entries.read().get(key).cloned() };
      let cell = match cell {
        Some(cell) => cell,
        None => match self.admit_missing(key, now)? {
          AdmitOutcome::Loaded(value) => return Ok(Lookup::Fresh(value)),
          AdmitOutcome::Claimed => return Ok(Lookup::NeedsRegeneration(None)),
          AdmitOutcome::Raced(cell) => cell,
        },
      };

      let mut entry = cell.entry.lock();

      // The cell may have been flushed out of the map between the lookup
      // and this lock. Claiming or parking on a retired cell would go
      // unnoticed by every future `store`, so restart on the map's current
      // cell instead.
      if entry.is_retired() {
        drop(entry);
        continue;
      }

      if let Some(value) = entry.value() {
        if !entry.is_stale(now, rule) {
          drop(entry);
          let _map = self.entries.read();
          self.policy.on_access(key);
          return Ok(Lookup::Fresh(value));
        }
      }

      // Missing or stale content: claim the update or defer to the claimer.
      let stale_value = entry.value();
      entry.begin_new_cycle();
      if !entry.state.is_updating() {
        entry.state.start_update()?;
        trace!("update claimed for stale entry");
        return Ok(Lookup::NeedsRegeneration(stale_value));
      }

      if !self.blocking {
        // Serve the old value rather than block; an entry with no value yet
        // has nothing to serve, so the caller regenerates without a claim.
        return Ok(match stale_value {
          Some(value) => Lookup::Fresh(value),
          None => Lookup::NeedsRegeneration(None),
        });
      }

      let deadline = self.wait_timeout.map(|t| Instant::now() + t);
      while entry.state.is_updating() {
        match deadline {
          Some(deadline) => {
            let result = cell.cond.wait_until(&mut entry, deadline);
            if result.timed_out() && entry.state.is_updating() {
              // Expiry behaves like the non-blocking path.
              return Ok(match entry.value() {
                Some(value) => Lookup::Fresh(value),
                None => Lookup::NeedsRegeneration(None),
              });
            }
          }
          None => cell.cond.wait(&mut entry),
        }
      }

      if entry.state.is_complete() {
        if let Some(value) = entry.value() {
          return Ok(Lookup::Fresh(value));
        }
      }

      // Cancelled (or flushed out from under the update): another waiter may
      // claim now, so re-run the lookup from the top.
      drop(entry);
    }
  }

  /// Inserts `value` under `key`, completing any claimed update and waking
  /// all waiters on the entry.
  pub(crate) fn store(
    &self,
    key: K,
    value: V,
    groups: Vec<String>,
    refresh: RefreshRule,
    now: Duration,
  ) -> Result<(), CacheError> {
    let cell = {
      let mut map = self.entries.write();
      match map.get(&key) {
        Some(cell) => cell.clone(),
        None => {
          let cell = Arc::new(EntryCell::new(CacheEntry::placeholder()));
          map.insert(key.clone(), cell.clone());
          cell
        }
      }
    };

    let value = Arc::new(value);
    {
      let mut entry = cell.entry.lock();
      let had_value = entry.value().is_some();
      // Completing the claim and installing the fresh Complete state happen
      // under the one entry lock, so no waiter observes the seam.
      if entry.state.is_updating() {
        entry.state.complete_update()?;
      }
      entry.accept(value.clone(), groups, refresh, now);
      cell.cond.notify_all();
      self.dispatch(if had_value {
        CacheEvent::EntryUpdated(key.clone())
      } else {
        CacheEvent::EntryAdded(key.clone())
      });
    }

    {
      let mut map = self.entries.write();
      if self.memory_caching {
        self.policy.on_insert(&key);
        self.evict_over_capacity(&mut map, &key);
      } else {
        // Coordination-only mode: waiters already hold the cell, the value
        // lives in the persistence store.
        map.remove(&key);
        self.policy.on_remove(&key);
      }
    }

    if let Some(persistence) = &self.persistence {
      if let Err(err) = persistence.store(&key, &value) {
        warn!(error = %err, "write-through to persistence store failed");
      }
    }

    Ok(())
  }

  /// Gives up the regeneration claim for `key` and wakes waiters so one of
  /// them can take over. Calling this with no update in progress is a
  /// contract violation.
  pub(crate) fn cancel_update(&self, key: &K) -> Result<(), CacheError> {
    let cell = self
      .entries
      .read()
      .get(key)
      .cloned()
      .ok_or(CacheError::NoPendingUpdate)?;

    let mut entry = cell.entry.lock();
    entry.state.cancel_update()?;
    cell.cond.notify_all();
    debug!("update cancelled; waiters notified");
    Ok(())
  }

  /// Removes every entry last updated before `cutoff`. Removal is immediate,
  /// not a lazy mark: each removed entry dispatches `EntryFlushed`, then one
  /// `CacheWideFlushed` closes the operation.
  pub(crate) fn flush_all(&self, cutoff: Duration) {
    let removed = self.remove_matching(|_, entry| {
      entry.last_updated().map_or(false, |t| t < cutoff)
    });
    debug!(count = removed.len(), "cutoff flush removed entries");
    for (key, cell) in &removed {
      self.retire_cell(key, cell, Some(CacheEvent::EntryFlushed(key.clone())), PersistAction::Delete);
    }
    self.dispatch(CacheEvent::CacheWideFlushed);
  }

  /// Removes every entry belonging to `group`, then dispatches a single
  /// `GroupFlushed` event.
  pub(crate) fn flush_group(&self, group: &str) {
    let removed = self.remove_matching(|_, entry| entry.belongs_to_group(group));
    debug!(group, count = removed.len(), "group flush removed entries");
    for (key, cell) in &removed {
      self.retire_cell(key, cell, None, PersistAction::Delete);
    }
    self.dispatch(CacheEvent::GroupFlushed(group.to_string()));
  }

  /// Removes all entries and stops the notifier, draining queued events.
  /// The persistence store keeps its contents.
  pub(crate) fn shutdown(&self) {
    let removed: Vec<(K, Arc<EntryCell<V>>)> = {
      let mut map = self.entries.write();
      let all = map.drain().collect();
      self.policy.clear();
      all
    };
    for (key, cell) in &removed {
      self.retire_cell(key, cell, None, PersistAction::Keep);
    }
    self.dispatch(CacheEvent::CacheWideFlushed);

    if let Some((tx, notifier)) = self.notifier.lock().take() {
      drop(tx);
      notifier.stop();
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.entries.read().len()
  }

  pub(crate) fn contains_key(&self, key: &K) -> bool {
    self.entries.read().contains_key(key)
  }

  /// Handles a key absent from the map: consult the persistence store, then
  /// insert a placeholder claimed by the calling thread.
  fn admit_missing(&self, key: &K, now: Duration) -> Result<AdmitOutcome<V>, CacheError> {
    if let Some(persistence) = &self.persistence {
      match persistence.load(key) {
        Ok(Some(value)) => {
          let value = Arc::new(value);
          debug!("miss satisfied from persistence store");
          if self.memory_caching {
            let mut map = self.entries.write();
            if let Some(cell) = map.get(key) {
              return Ok(AdmitOutcome::Raced(cell.clone()));
            }
            let mut entry = CacheEntry::placeholder();
            entry.accept(value.clone(), Vec::new(), RefreshRule::Never, now);
            map.insert(key.clone(), Arc::new(EntryCell::new(entry)));
            self.policy.on_insert(key);
            self.evict_over_capacity(&mut map, key);
          }
          return Ok(AdmitOutcome::Loaded(value));
        }
        Ok(None) => {}
        Err(err) => {
          warn!(error = %err, "persistence load failed; regenerating instead");
        }
      }
    }

    let mut map = self.entries.write();
    if let Some(cell) = map.get(key) {
      return Ok(AdmitOutcome::Raced(cell.clone()));
    }
    let mut entry = CacheEntry::placeholder();
    entry.state.start_update()?;
    map.insert(key.clone(), Arc::new(EntryCell::new(entry)));
    self.policy.on_insert(key);
    self.evict_over_capacity(&mut map, key);
    trace!("placeholder inserted; caller claimed the first update");
    Ok(AdmitOutcome::Claimed)
  }

  /// Removes entries matching `predicate` under the map write lock, so the
  /// scan presents one consistent snapshot to concurrent calls.
  fn remove_matching<F>(&self, predicate: F) -> Vec<(K, Arc<EntryCell<V>>)>
  where
    F: Fn(&K, &CacheEntry<V>) -> bool,
  {
    let mut map = self.entries.write();
    let doomed: Vec<K> = map
      .iter()
      .filter(|(key, cell)| predicate(key, &*cell.entry.lock()))
      .map(|(key, _)| key.clone())
      .collect();

    doomed
      .into_iter()
      .filter_map(|key| {
        map.remove(&key).map(|cell| {
          self.policy.on_remove(&key);
          (key, cell)
        })
      })
      .collect()
  }

  /// Evicts victims until the map fits the capacity bound. Runs under the
  /// map write lock, synchronously with the insertion that overflowed.
  /// `admitted` is the just-inserted key; it must survive its own overflow.
  fn evict_over_capacity(&self, map: &mut EntryMap<K, V>, admitted: &K) {
    let Some(capacity) = self.capacity else {
      return;
    };
    while map.len() as u64 > capacity {
      let Some(victim) = self.policy.select_victim(Some(admitted)) else {
        break;
      };
      let cell = map.remove(&victim);
      self.policy.on_remove(&victim);
      let Some(cell) = cell else {
        // Policy bookkeeping referenced a key no longer in the map.
        continue;
      };
      debug!("capacity exceeded; evicting victim");
      let action = if self.unlimited_disk_cache {
        PersistAction::Overflow
      } else {
        PersistAction::Delete
      };
      self.retire_cell(&victim, &cell, Some(CacheEvent::EntryRemoved(victim.clone())), action);
    }
  }

  /// Finalizes an entry that left the map: an in-flight update becomes an
  /// implicit cancellation, waiters are woken, the event (if any) is
  /// dispatched under the entry lock, and the persisted copy is handled
  /// outside it.
  fn retire_cell(
    &self,
    key: &K,
    cell: &Arc<EntryCell<V>>,
    event: Option<CacheEvent<K>>,
    action: PersistAction,
  ) {
    let value = {
      let mut entry = cell.entry.lock();
      entry.mark_retired();
      if entry.state.is_updating() {
        let _ = entry.state.cancel_update();
      }
      cell.cond.notify_all();
      if let Some(event) = event {
        self.dispatch(event);
      }
      entry.value()
    };

    let Some(persistence) = &self.persistence else {
      return;
    };
    let result = match action {
      PersistAction::Delete => persistence.remove(key),
      PersistAction::Overflow => match value {
        Some(value) => persistence.store(key, &value),
        None => Ok(()),
      },
      PersistAction::Keep => Ok(()),
    };
    if let Err(err) = result {
      warn!(error = %err, "persistence cleanup failed for retired entry");
    }
  }

  fn dispatch(&self, event: CacheEvent<K>) {
    if let Some((tx, _)) = &*self.notifier.lock() {
      let _ = tx.send(event);
    }
  }
}

impl<K, V> CacheStore<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + AsRef<str> + 'static,
  V: Send + Sync + 'static,
{
  /// Removes every entry whose key contains `pattern` as a substring,
  /// dispatching `EntryFlushed` per removal.
  pub(crate) fn flush_pattern(&self, pattern: &str) {
    let removed = self.remove_matching(|key, _| key.as_ref().contains(pattern));
    debug!(pattern, count = removed.len(), "pattern flush removed entries");
    for (key, cell) in &removed {
      self.retire_cell(key, cell, Some(CacheEvent::EntryFlushed(key.clone())), PersistAction::Delete);
    }
  }
}

impl<K, V> Drop for CacheStore<K, V> {
  fn drop(&mut self) {
    if let Some((tx, notifier)) = self.notifier.lock().take() {
      drop(tx);
      notifier.stop();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::policy::Unbounded;

  fn blocking_store() -> CacheStore<&'static str, String> {
    CacheStore::new(Box::new(Unbounded), None, true, None, true, false, None, None)
  }

  #[test]
  fn flush_retires_the_cell_and_later_fetches_leave_it_alone() {
    let store = blocking_store();
    let stale = RefreshRule::MaxAge(Duration::ZERO);
    store
      .store(
        "k",
        "v1".to_string(),
        vec!["g".to_string()],
        RefreshRule::Never,
        Duration::from_secs(1),
      )
      .unwrap();

    // Claim the refresh, then keep a reference to the cell across the flush,
    // like a caller that looked the key up just before the group was flushed.
    assert!(matches!(
      store.fetch(&"k", Duration::from_secs(2), Some(&stale)).unwrap(),
      Lookup::NeedsRegeneration(Some(_))
    ));
    let old_cell = cell_for(&store, &"k");

    store.flush_group("g");
    {
      let entry = old_cell.entry.lock();
      assert!(entry.is_retired());
      // The in-flight claim became an implicit cancellation.
      assert!(entry.state.is_cancelled());
    }

    // The next fetch must claim a brand-new cell; the retired one stays
    // cancelled forever, so nothing can end up parked on it.
    assert!(matches!(
      store.fetch(&"k", Duration::from_secs(3), Some(&stale)).unwrap(),
      Lookup::NeedsRegeneration(None)
    ));
    let new_cell = cell_for(&store, &"k");
    assert!(!Arc::ptr_eq(&old_cell, &new_cell));
    assert!(old_cell.entry.lock().state.is_cancelled());
    assert!(!new_cell.entry.lock().is_retired());
  }

  fn cell_for(
    store: &CacheStore<&'static str, String>,
    key: &&'static str,
  ) -> Arc<EntryCell<String>> {
    store.entries.read().get(key).cloned().unwrap()
  }
}
