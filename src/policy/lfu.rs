use super::EvictionPolicy;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct LfuInner<K> {
  // Per-key access count and the sequence number of the most recent access.
  // The sequence breaks frequency ties in favor of the oldest access.
  items: HashMap<K, (u64, u64), ahash::RandomState>,
  next_seq: u64,
}

/// An eviction policy that evicts the least frequently accessed entry,
/// breaking ties by oldest access.
#[derive(Debug)]
pub struct Lfu<K> {
  inner: Mutex<LfuInner<K>>,
}

impl<K> Lfu<K> {
  pub fn new() -> Self {
    Self {
      inner: Mutex::new(LfuInner {
        items: HashMap::default(),
        next_seq: 0,
      }),
    }
  }
}

impl<K> Default for Lfu<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K> EvictionPolicy<K> for Lfu<K>
where
  K: Eq + Hash + Clone + Send + Sync,
{
  fn on_access(&self, key: &K) {
    let mut inner = self.inner.lock();
    let seq = inner.next_seq;
    inner.next_seq += 1;
    if let Some((count, last_seq)) = inner.items.get_mut(key) {
      *count += 1;
      *last_seq = seq;
    }
  }

  /// Begins tracking a new key; insertion counts as one access. A replaced
  /// key keeps its accumulated count.
  fn on_insert(&self, key: &K) {
    let mut inner = self.inner.lock();
    let seq = inner.next_seq;
    inner.next_seq += 1;
    inner
      .items
      .entry(key.clone())
      .and_modify(|(_, last_seq)| *last_seq = seq)
      .or_insert((1, seq));
  }

  fn on_remove(&self, key: &K) {
    self.inner.lock().items.remove(key);
  }

  fn select_victim(&self, exclude: Option<&K>) -> Option<K> {
    let inner = self.inner.lock();
    inner
      .items
      .iter()
      .filter(|(key, _)| exclude.map_or(true, |e| *key != e))
      .min_by_key(|(_, (count, last_seq))| (*count, *last_seq))
      .map(|(key, _)| key.clone())
  }

  fn clear(&self) {
    let mut inner = self.inner.lock();
    inner.items.clear();
    inner.next_seq = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn victim_is_least_frequently_accessed() {
    let policy = Lfu::new();
    policy.on_insert(&"a");
    policy.on_insert(&"b");
    policy.on_access(&"a");
    policy.on_access(&"a");
    policy.on_access(&"b");
    assert_eq!(policy.select_victim(None), Some("b"));
  }

  #[test]
  fn frequency_ties_break_by_oldest_access() {
    let policy = Lfu::new();
    policy.on_insert(&"a");
    policy.on_insert(&"b");
    policy.on_access(&"a");
    policy.on_access(&"b");
    // Both have one access; "a" was touched longest ago.
    assert_eq!(policy.select_victim(None), Some("a"));
  }

  #[test]
  fn excluded_key_is_never_the_victim() {
    let policy = Lfu::new();
    policy.on_insert(&"a");
    policy.on_access(&"a");
    policy.on_insert(&"b");
    // "b" has the lowest count, but it is the key being admitted.
    assert_eq!(policy.select_victim(Some(&"b")), Some("a"));
    // With nothing else to choose, exclusion yields no victim at all.
    policy.on_remove(&"a");
    assert_eq!(policy.select_victim(Some(&"b")), None);
  }

  #[test]
  fn remove_and_clear() {
    let policy = Lfu::new();
    policy.on_insert(&1);
    policy.on_insert(&2);
    policy.on_remove(&1);
    assert_eq!(policy.select_victim(None), Some(2));
    policy.clear();
    assert_eq!(policy.select_victim(None), None);
  }
}
