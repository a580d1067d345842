use crate::update_state::Phase;

use std::fmt;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
  /// The cache was configured with a capacity of zero, which is not allowed
  /// for a bounded cache. Use `unbounded()` for an unbounded cache.
  ZeroCapacity,
  /// In-memory caching was disabled but no persistence store was configured,
  /// leaving the cache with nowhere to keep values.
  NoBackingStore,
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildError::ZeroCapacity => write!(f, "bounded cache capacity cannot be zero"),
      BuildError::NoBackingStore => write!(
        f,
        "disabling memory caching requires a persistence store"
      ),
    }
  }
}

impl std::error::Error for BuildError {}

/// Errors surfaced by cache operations.
///
/// These are contract violations on the caller's side, not protocol
/// outcomes: a miss or a stale hit is reported through
/// [`Lookup::NeedsRegeneration`](crate::Lookup::NeedsRegeneration), never
/// through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
  /// An update-state transition was attempted from an invalid phase, e.g.
  /// cancelling an update another caller already completed.
  StateViolation {
    from: Phase,
    attempted: &'static str,
  },
  /// `cancel_update` was called for a key with no update in progress.
  NoPendingUpdate,
  /// A schedule expression could not be parsed.
  InvalidSchedule(String),
}

impl fmt::Display for CacheError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CacheError::StateViolation { from, attempted } => write!(
        f,
        "cannot {} - current update state is {:?}",
        attempted, from
      ),
      CacheError::NoPendingUpdate => {
        write!(f, "no update is in progress for this key")
      }
      CacheError::InvalidSchedule(expr) => {
        write!(f, "invalid schedule expression: {}", expr)
      }
    }
  }
}

impl std::error::Error for CacheError {}

/// An error reported by a persistence collaborator.
///
/// Persistence failures are isolated: the cache logs them and carries on,
/// they never disturb the in-memory update protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistError {
  message: String,
}

impl PersistError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

impl fmt::Display for PersistError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "persistence failure: {}", self.message)
  }
}

impl std::error::Error for PersistError {}
