//! Action dispatch boundary between the service and the rewind backend.
//!
//! The dispatcher is a one-way channel: requests are fire-and-forget, and
//! completion is reported asynchronously through a broadcast notification
//! stream the service subscribes to on `start`.

use tokio::sync::broadcast;

use crate::error::{RewindError, RewindStatusFetchError};
use crate::model::Site;

/// A request against the rewind backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewindAction {
    /// Fetch the current rewind status for a site.
    FetchStatus { site: Site },
    /// Start a rewind to the point identified by `rewind_id`.
    Rewind { site: Site, rewind_id: String },
}

/// Asynchronous completion notification for a previously dispatched action.
#[derive(Debug, Clone)]
pub enum RewindNotification {
    /// A status fetch completed; `error` is `None` on success.
    StatusFetched {
        error: Option<RewindStatusFetchError>,
    },
    /// A rewind request completed. `restore_id` is present once the backend
    /// has accepted the job.
    RewindCompleted {
        error: Option<RewindError>,
        rewind_id: String,
        restore_id: Option<i64>,
    },
}

/// One-way request channel to the rewind backend.
///
/// Implementations perform the actual transport; completion must be
/// delivered on the notification stream, never synchronously inside
/// `dispatch`.
pub trait ActionDispatcher: Send + Sync {
    /// Fire-and-forget request. Must not block.
    fn dispatch(&self, action: RewindAction);

    /// Subscribe to completion notifications.
    fn subscribe(&self) -> broadcast::Receiver<RewindNotification>;
}
