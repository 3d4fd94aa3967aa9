//! One-slot observable state cells.
//!
//! Each observable stream exposed by the service is an independent cell
//! holding the last value published to it. Publications within a cell are
//! ordered; no ordering is guaranteed across cells. Built on
//! `tokio::sync::watch`: an atomic slot swap plus notify-on-change, so
//! publishing `None` to clear a prior value is itself an event subscribers
//! observe.

use tokio::sync::watch;

/// Last-value cell readable from any thread.
///
/// `publish` wakes every subscriber even when the new value equals the old
/// one; a cleared cell and a never-published cell both sample as `None`,
/// but only the former bumps the channel version.
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> Observable<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Publish a value (or an explicit `None`) to all subscribers.
    pub fn publish(&self, value: Option<T>) {
        self.tx.send_replace(value);
    }

    /// Sample the last published value.
    pub fn get(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// Subscribe to future publications. The receiver initially sees the
    /// current value without a pending change notification.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}
