use crate::listener::{CacheEvent, CacheEventListener};

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

/// The background thread responsible for calling the user-provided event
/// listener. A single queue keeps per-entry delivery order intact.
pub(crate) struct Notifier {
  handle: JoinHandle<()>,
}

impl Notifier {
  /// Spawns a new notifier thread feeding `listener`.
  pub(crate) fn spawn<K: Send + 'static>(
    listener: Arc<dyn CacheEventListener<K>>,
  ) -> (Self, Sender<CacheEvent<K>>) {
    let (tx, rx): (Sender<CacheEvent<K>>, Receiver<CacheEvent<K>>) = crossbeam_channel::unbounded();

    let handle = thread::spawn(move || {
      // Ends when the channel disconnects, i.e. when the cache drops its
      // sender on shutdown. Queued events are drained first.
      while let Ok(event) = rx.recv() {
        listener.on_event(event);
      }
    });

    (Self { handle }, tx)
  }

  /// Waits for the notifier thread to drain and exit. The caller must have
  /// dropped the sender first, or this blocks forever.
  pub(crate) fn stop(self) {
    let _ = self.handle.join();
  }
}
