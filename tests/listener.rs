use coalesce_cache::{CacheBuilder, CacheEvent, CacheEventListener, EventCounts, Lookup};

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Records every event in arrival order.
#[derive(Default)]
struct Recorder {
  events: Mutex<Vec<CacheEvent<&'static str>>>,
}

impl CacheEventListener<&'static str> for Recorder {
  fn on_event(&self, event: CacheEvent<&'static str>) {
    self.events.lock().push(event);
  }
}

#[test]
fn test_per_entry_event_order() {
  let recorder = Arc::new(Recorder::default());
  let cache = CacheBuilder::new()
    .event_listener(recorder.clone())
    .build()
    .unwrap();

  cache.store("k", 1).unwrap();
  cache.store("k", 2).unwrap();
  cache.flush_pattern("k");
  // Shutdown drains the notifier queue before returning.
  cache.shutdown();

  let events = recorder.events.lock();
  assert_eq!(
    *events,
    vec![
      CacheEvent::EntryAdded("k"),
      CacheEvent::EntryUpdated("k"),
      CacheEvent::EntryFlushed("k"),
      CacheEvent::CacheWideFlushed,
    ]
  );
}

#[test]
fn test_placeholder_store_counts_as_added() {
  let recorder = Arc::new(Recorder::default());
  let cache = CacheBuilder::new()
    .event_listener(recorder.clone())
    .build()
    .unwrap();

  // The fetch-created placeholder carries no value, so the first real store
  // is an add, not an update.
  assert!(matches!(
    cache.fetch(&"k").unwrap(),
    Lookup::NeedsRegeneration(None)
  ));
  cache.store("k", 1).unwrap();
  cache.shutdown();

  let events = recorder.events.lock();
  assert_eq!(
    *events,
    vec![CacheEvent::EntryAdded("k"), CacheEvent::CacheWideFlushed]
  );
}

#[test]
fn test_group_flush_emits_one_event() {
  let recorder = Arc::new(Recorder::default());
  let cache = CacheBuilder::new()
    .event_listener(recorder.clone())
    .build()
    .unwrap();

  cache
    .store_in_groups("a", 1, vec!["g".to_string()])
    .unwrap();
  cache
    .store_in_groups("b", 2, vec!["g".to_string()])
    .unwrap();
  cache.flush_group("g");
  cache.shutdown();

  let events = recorder.events.lock();
  let group_events: Vec<_> = events
    .iter()
    .filter(|e| matches!(e, CacheEvent::GroupFlushed(_)))
    .collect();
  assert_eq!(group_events, vec![&CacheEvent::GroupFlushed("g".to_string())]);
  // The member removals themselves emit no per-entry flush events.
  assert!(!events.iter().any(|e| matches!(e, CacheEvent::EntryFlushed(_))));
}

#[test]
fn test_eviction_emits_entry_removed() {
  let recorder = Arc::new(Recorder::default());
  let cache = CacheBuilder::new()
    .capacity(1)
    .event_listener(recorder.clone())
    .build()
    .unwrap();

  cache.store("a", 1).unwrap();
  cache.store("b", 2).unwrap();
  cache.shutdown();

  let events = recorder.events.lock();
  assert!(events.contains(&CacheEvent::EntryRemoved("a")));
}

#[test]
fn test_event_counts_listener() {
  let counts = Arc::new(EventCounts::new());
  let cache = CacheBuilder::new()
    .event_listener(counts.clone())
    .build()
    .unwrap();

  cache.store("a", 1).unwrap();
  cache.store("a", 2).unwrap();
  cache
    .store_in_groups("b", 3, vec!["g".to_string()])
    .unwrap();
  cache.flush_group("g");
  cache.flush_all(std::time::SystemTime::now() + Duration::from_secs(60));
  cache.shutdown();

  let snapshot = counts.snapshot();
  assert_eq!(snapshot.added, 2);
  assert_eq!(snapshot.updated, 1);
  assert_eq!(snapshot.group_flushes, 1);
  // flush_all removed the surviving entry and closed with a cache-wide
  // event; shutdown adds a second one.
  assert_eq!(snapshot.flushed, 1);
  assert_eq!(snapshot.cache_flushes, 2);
}
