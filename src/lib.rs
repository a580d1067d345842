//! An in-process cache with coordinated regeneration.
//!
//! When a cached value is missing or stale, exactly one caller is handed the
//! job of recomputing it; everyone else either waits for that result
//! (blocking mode) or is served the old value (non-blocking mode), instead of
//! the whole herd racing to recompute at once.
//!
//! # Features
//! - **Single-flight refresh**: one regenerator per key per cycle, enforced
//!   by a per-entry state machine and condition variable.
//! - **Stale fail-over**: the regenerator receives the previous value, so it
//!   can fall back to it if recomputation fails, or cancel and hand the claim
//!   to a waiter.
//! - **Refresh rules**: fixed max-age, cron schedule expressions, or a
//!   caller-supplied predicate.
//! - **Bulk invalidation**: by cutoff time, by group label, or by key
//!   substring pattern.
//! - **Bounded memory**: pluggable LRU / LFU / FIFO eviction, or unbounded.
//! - **Observability**: a closed event type delivered to a listener on a
//!   dedicated thread, plus a ready-made counting listener.
//! - **Optional persistence**: a durable collaborator consulted on miss,
//!   written through on store, with overflow-to-disk eviction.
//!
//! This is not a distributed cache: consistency guarantees apply only within
//! one process's shared memory.
//!
//! # Example
//! ```
//! use coalesce_cache::{CacheBuilder, Lookup};
//! use std::time::Duration;
//!
//! let cache = CacheBuilder::new().capacity(1024).build().unwrap();
//!
//! let value = match cache.fetch_with_period(&"report", Duration::from_secs(60)).unwrap() {
//!   Lookup::Fresh(value) => value,
//!   Lookup::NeedsRegeneration(stale) => {
//!     // This caller won the claim; recompute and store, or fall back to
//!     // `stale` and cancel if recomputation fails.
//!     match expensive_render() {
//!       Ok(rendered) => {
//!         cache.store("report", rendered.clone()).unwrap();
//!         std::sync::Arc::new(rendered)
//!       }
//!       Err(_) => {
//!         cache.cancel_update(&"report").unwrap();
//!         stale.expect("no previous value to fail over to")
//!       }
//!     }
//!   }
//! };
//! # fn expensive_render() -> Result<String, ()> { Ok("rendered".to_string()) }
//! # drop(value);
//! ```

// Public modules that form the API
pub mod builder;
pub mod config;
pub mod error;
pub mod handles;
pub mod listener;
pub mod persist;
pub mod policy;
pub mod refresh;
pub mod update_state;

// Internal, crate-only modules
mod entry;
mod notifier;
mod store;
mod time;

// Re-export the primary user-facing types for convenience
pub use builder::CacheBuilder;
pub use config::{CacheConfig, EvictionPolicyKind};
pub use error::{BuildError, CacheError, PersistError};
pub use handles::{Cache, Lookup};
pub use listener::{CacheEvent, CacheEventListener, EventCounts, EventCountsSnapshot};
pub use persist::PersistenceStore;
pub use refresh::RefreshRule;
pub use update_state::{Phase, UpdateState};
