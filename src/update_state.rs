use crate::error::CacheError;

/// The phase of one regeneration cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// The entry needs updating, but no caller has claimed responsibility yet.
  AwaitingUpdate,
  /// The caller that won the claim is generating a new value.
  Updating,
  /// The regeneration finished and the entry holds the new value.
  Complete,
  /// The claiming caller gave up; waiters are free to re-claim.
  Cancelled,
}

/// Tracks the state of a cache entry that is in the process of being
/// (re)generated.
///
/// This type holds no lock of its own; every call must be made while holding
/// the owning entry's lock. Enforcing "only one caller wins the claim" is the
/// orchestrator's job, done by calling [`start_update`](Self::start_update)
/// under that lock.
#[derive(Debug)]
pub struct UpdateState {
  phase: Phase,
}

impl UpdateState {
  /// A fresh state at the start of a regeneration cycle.
  pub(crate) fn new() -> Self {
    Self {
      phase: Phase::AwaitingUpdate,
    }
  }

  /// A state for an entry whose value was just installed. Used by `accept`
  /// so that no waiter ever observes a half-finished transition.
  pub(crate) fn completed() -> Self {
    Self {
      phase: Phase::Complete,
    }
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn is_awaiting_update(&self) -> bool {
    self.phase == Phase::AwaitingUpdate
  }

  pub fn is_updating(&self) -> bool {
    self.phase == Phase::Updating
  }

  pub fn is_complete(&self) -> bool {
    self.phase == Phase::Complete
  }

  pub fn is_cancelled(&self) -> bool {
    self.phase == Phase::Cancelled
  }

  /// Claims the update. Valid only from `AwaitingUpdate` or `Cancelled`.
  pub(crate) fn start_update(&mut self) -> Result<(), CacheError> {
    match self.phase {
      Phase::AwaitingUpdate | Phase::Cancelled => {
        self.phase = Phase::Updating;
        Ok(())
      }
      from => Err(CacheError::StateViolation {
        from,
        attempted: "begin cache update",
      }),
    }
  }

  /// Marks the update as finished. Valid only from `Updating`.
  pub(crate) fn complete_update(&mut self) -> Result<(), CacheError> {
    match self.phase {
      Phase::Updating => {
        self.phase = Phase::Complete;
        Ok(())
      }
      from => Err(CacheError::StateViolation {
        from,
        attempted: "complete cache update",
      }),
    }
  }

  /// Gives up the claim. Valid only from `Updating`.
  pub(crate) fn cancel_update(&mut self) -> Result<(), CacheError> {
    match self.phase {
      Phase::Updating => {
        self.phase = Phase::Cancelled;
        Ok(())
      }
      from => Err(CacheError::StateViolation {
        from,
        attempted: "cancel cache update",
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assert_exactly_one(state: &UpdateState) {
    let flags = [
      state.is_awaiting_update(),
      state.is_updating(),
      state.is_complete(),
      state.is_cancelled(),
    ];
    assert_eq!(flags.iter().filter(|f| **f).count(), 1);
  }

  #[test]
  fn full_cycle_to_complete() {
    let mut state = UpdateState::new();
    assert!(state.is_awaiting_update());
    assert_exactly_one(&state);

    state.start_update().unwrap();
    assert!(state.is_updating());
    assert_exactly_one(&state);

    state.complete_update().unwrap();
    assert!(state.is_complete());
    assert_exactly_one(&state);
  }

  #[test]
  fn cancel_and_reclaim() {
    let mut state = UpdateState::new();
    state.start_update().unwrap();
    state.cancel_update().unwrap();
    assert!(state.is_cancelled());

    // A cancelled claim can be taken over by another caller.
    state.start_update().unwrap();
    assert!(state.is_updating());
  }

  #[test]
  fn start_fails_while_updating() {
    let mut state = UpdateState::new();
    state.start_update().unwrap();
    let err = state.start_update().unwrap_err();
    assert_eq!(
      err,
      CacheError::StateViolation {
        from: Phase::Updating,
        attempted: "begin cache update",
      }
    );
    // The failed call must not have clobbered the phase.
    assert!(state.is_updating());
  }

  #[test]
  fn start_fails_from_complete() {
    let mut state = UpdateState::completed();
    assert!(state.start_update().is_err());
    assert!(state.is_complete());
  }

  #[test]
  fn complete_fails_unless_updating() {
    let mut state = UpdateState::new();
    assert!(state.complete_update().is_err());

    state.start_update().unwrap();
    state.complete_update().unwrap();
    assert!(state.complete_update().is_err());
  }

  #[test]
  fn cancel_fails_unless_updating() {
    let mut state = UpdateState::new();
    assert!(state.cancel_update().is_err());

    state.start_update().unwrap();
    state.cancel_update().unwrap();
    assert!(state.cancel_update().is_err());
  }
}
