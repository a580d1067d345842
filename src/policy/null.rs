use super::EvictionPolicy;

/// A no-op policy for unbounded caches. It tracks nothing and never selects
/// a victim.
#[derive(Debug, Default)]
pub struct Unbounded;

impl<K> EvictionPolicy<K> for Unbounded
where
  K: Send + Sync,
{
  fn on_access(&self, _key: &K) {}

  fn on_insert(&self, _key: &K) {}

  fn on_remove(&self, _key: &K) {}

  fn select_victim(&self, _exclude: Option<&K>) -> Option<K> {
    None
  }

  fn clear(&self) {}
}
