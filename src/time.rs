use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::time::{Duration, Instant, SystemTime};

// The single, static reference point for all time calculations in the cache.
// The monotonic and wall-clock anchors are captured together so that epoch
// durations can be mapped back onto the wall clock for schedule rules.
struct Epoch {
  instant: Instant,
  wall: SystemTime,
}

static CACHE_EPOCH: Lazy<Epoch> = Lazy::new(|| Epoch {
  instant: Instant::now(),
  wall: SystemTime::now(),
});

/// The current time as a `Duration` since the cache's epoch.
#[inline]
pub(crate) fn now_duration() -> Duration {
  Instant::now().saturating_duration_since(CACHE_EPOCH.instant)
}

/// Converts a wall-clock time into a `Duration` since the cache's epoch.
/// Times that predate the epoch clamp to zero.
#[inline]
pub(crate) fn wall_to_duration(time: SystemTime) -> Duration {
  time
    .duration_since(CACHE_EPOCH.wall)
    .unwrap_or(Duration::ZERO)
}

/// Converts a `Duration` since the cache's epoch into a UTC timestamp.
/// Schedule rules are evaluated on the wall clock.
#[inline]
pub(crate) fn duration_to_datetime(duration: Duration) -> DateTime<Utc> {
  DateTime::<Utc>::from(CACHE_EPOCH.wall + duration)
}
