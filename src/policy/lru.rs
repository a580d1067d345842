use super::EvictionPolicy;

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::hash::Hash;

/// An eviction policy that evicts the least recently accessed entry.
#[derive(Debug)]
pub struct Lru<K> {
  // A queue of keys ordered by recent use (front is most recent).
  order: Mutex<VecDeque<K>>,
}

impl<K> Lru<K> {
  pub fn new() -> Self {
    Self {
      order: Mutex::new(VecDeque::new()),
    }
  }
}

impl<K> Default for Lru<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K> EvictionPolicy<K> for Lru<K>
where
  K: Eq + Hash + Clone + Send + Sync,
{
  /// When an item is accessed, move it to the front of the usage queue.
  fn on_access(&self, key: &K) {
    let mut order = self.order.lock();
    if let Some(pos) = order.iter().position(|k| k == key) {
      if let Some(key) = order.remove(pos) {
        order.push_front(key);
      }
    }
  }

  /// A new or replaced item is the most recently used.
  fn on_insert(&self, key: &K) {
    let mut order = self.order.lock();
    if let Some(pos) = order.iter().position(|k| k == key) {
      order.remove(pos);
    }
    order.push_front(key.clone());
  }

  fn on_remove(&self, key: &K) {
    self.order.lock().retain(|k| k != key);
  }

  /// The least recently used key sits at the back of the queue.
  fn select_victim(&self, exclude: Option<&K>) -> Option<K> {
    let order = self.order.lock();
    order
      .iter()
      .rev()
      .find(|k| exclude.map_or(true, |e| *k != e))
      .cloned()
  }

  fn clear(&self) {
    self.order.lock().clear();
  }
}
