use super::EvictionPolicy;

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::hash::Hash;

/// An eviction policy that evicts entries in insertion order.
#[derive(Debug)]
pub struct Fifo<K> {
  // Keys in insertion order (front is oldest).
  order: Mutex<VecDeque<K>>,
}

impl<K> Fifo<K> {
  pub fn new() -> Self {
    Self {
      order: Mutex::new(VecDeque::new()),
    }
  }
}

impl<K> Default for Fifo<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K> EvictionPolicy<K> for Fifo<K>
where
  K: Eq + Hash + Clone + Send + Sync,
{
  /// FIFO does not care about access patterns.
  fn on_access(&self, _key: &K) {}

  /// A replaced key keeps its original position; that preserves the
  /// "first-in" ordering across value updates.
  fn on_insert(&self, key: &K) {
    let mut order = self.order.lock();
    if !order.contains(key) {
      order.push_back(key.clone());
    }
  }

  fn on_remove(&self, key: &K) {
    self.order.lock().retain(|k| k != key);
  }

  /// The earliest-inserted still-present key.
  fn select_victim(&self, exclude: Option<&K>) -> Option<K> {
    let order = self.order.lock();
    order
      .iter()
      .find(|k| exclude.map_or(true, |e| *k != e))
      .cloned()
  }

  fn clear(&self) {
    self.order.lock().clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn victim_is_earliest_inserted() {
    let policy = Fifo::new();
    policy.on_insert(&"a");
    policy.on_insert(&"b");
    policy.on_insert(&"c");
    assert_eq!(policy.select_victim(None), Some("a"));
  }

  #[test]
  fn access_does_not_reorder() {
    let policy = Fifo::new();
    policy.on_insert(&"a");
    policy.on_insert(&"b");
    policy.on_access(&"a");
    assert_eq!(policy.select_victim(None), Some("a"));
  }

  #[test]
  fn excluded_key_yields_the_next_in_line() {
    let policy = Fifo::new();
    policy.on_insert(&"a");
    policy.on_insert(&"b");
    assert_eq!(policy.select_victim(Some(&"a")), Some("b"));
  }

  #[test]
  fn reinsert_keeps_original_position() {
    let policy = Fifo::new();
    policy.on_insert(&"a");
    policy.on_insert(&"b");
    policy.on_insert(&"a");
    assert_eq!(policy.select_victim(None), Some("a"));
  }
}
