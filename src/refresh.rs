use crate::error::CacheError;
use crate::time;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use cron::Schedule;

/// The staleness test applied to a cache entry.
///
/// Timestamps are `Duration`s since the cache epoch; the orchestrator passes
/// the entry's last-update time and the current time.
#[derive(Clone)]
pub enum RefreshRule {
  /// The entry never goes stale on its own; only an explicit flush or
  /// eviction removes it.
  Never,
  /// Stale once the given duration has elapsed since the last update.
  MaxAge(Duration),
  /// Stale once the most recent matching schedule boundary has passed since
  /// the last update.
  Schedule(Box<Schedule>),
  /// An externally supplied staleness predicate `f(last_updated, now)`.
  Predicate(Arc<dyn Fn(Duration, Duration) -> bool + Send + Sync>),
}

impl RefreshRule {
  /// Parses a cron expression (seconds-resolution, `sec min hour dom month
  /// dow [year]`) into a schedule rule.
  pub fn schedule(expr: &str) -> Result<Self, CacheError> {
    Schedule::from_str(expr)
      .map(|schedule| RefreshRule::Schedule(Box::new(schedule)))
      .map_err(|_| CacheError::InvalidSchedule(expr.to_string()))
  }

  pub(crate) fn is_stale(&self, last_updated: Duration, now: Duration) -> bool {
    match self {
      RefreshRule::Never => false,
      RefreshRule::MaxAge(max_age) => now.saturating_sub(last_updated) >= *max_age,
      RefreshRule::Schedule(schedule) => {
        let last = time::duration_to_datetime(last_updated);
        let now = time::duration_to_datetime(now);
        schedule
          .after(&last)
          .next()
          .map_or(false, |boundary| boundary <= now)
      }
      RefreshRule::Predicate(test) => test(last_updated, now),
    }
  }
}

impl fmt::Debug for RefreshRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RefreshRule::Never => f.write_str("Never"),
      RefreshRule::MaxAge(d) => f.debug_tuple("MaxAge").field(d).finish(),
      RefreshRule::Schedule(s) => f.debug_tuple("Schedule").field(s).finish(),
      RefreshRule::Predicate(_) => f.write_str("Predicate(..)"),
    }
  }
}
