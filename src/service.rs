//! Rewind status synchronization service.
//!
//! `RewindStatusService` owns all mutable tracking state for one site's
//! rewind lifecycle. Foreground commands (`start`, `stop`, `rewind`,
//! `request_status_update`) and the background notification worker fold
//! their inputs into four independent observable streams: availability,
//! rewind error, status-fetch error, and progress. Each stream is
//! last-write-wins on its own; cross-stream atomicity is intentionally not
//! provided.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dispatcher::{ActionDispatcher, RewindAction, RewindNotification};
use crate::error::{RewindError, RewindStatusFetchError};
use crate::model::{
    ActivityLogEntry, RewindProgress, RewindState, RewindStatus, RewindStatusState, Site,
};
use crate::observable::Observable;
use crate::poller::ProgressPoller;
use crate::store::ActivityLogStore;

/// Tracks the lifecycle of a server-side rewind for one site.
///
/// Cheap to clone; clones share the same underlying state. `start` must be
/// called from within a Tokio runtime — it spawns the notification worker
/// that drains the dispatcher's completion stream.
#[derive(Clone)]
pub struct RewindStatusService {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn ActivityLogStore>,
    poller: Arc<dyn ProgressPoller>,
    dispatcher: Arc<dyn ActionDispatcher>,

    site: Mutex<Option<Site>>,
    cached_entry: Mutex<Option<ActivityLogEntry>>,
    worker: Mutex<Option<JoinHandle<()>>>,

    rewind_available: Observable<bool>,
    rewind_error: Observable<RewindError>,
    status_fetch_error: Observable<RewindStatusFetchError>,
    progress: Observable<RewindProgress>,
}

impl RewindStatusService {
    pub fn new(
        store: Arc<dyn ActivityLogStore>,
        poller: Arc<dyn ProgressPoller>,
        dispatcher: Arc<dyn ActionDispatcher>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                poller,
                dispatcher,
                site: Mutex::new(None),
                cached_entry: Mutex::new(None),
                worker: Mutex::new(None),
                rewind_available: Observable::new(),
                rewind_error: Observable::new(),
                status_fetch_error: Observable::new(),
                progress: Observable::new(),
            }),
        }
    }

    /// Begin tracking `site`.
    ///
    /// Subscribes to backend notifications, requests a status fetch, then
    /// reloads from any status already cached in the store so callers see
    /// something immediately instead of waiting for the fetch to complete.
    /// Callers must pair with [`stop`](Self::stop); a second `start`
    /// replaces the tracked site and the notification subscription.
    pub fn start(&self, site: Site) {
        debug!(site = site.id, "starting rewind status tracking");
        *self.inner.site.lock() = Some(site);
        self.spawn_notification_worker();
        self.request_status_update();
        self.reload_rewind_status();
    }

    /// Stop tracking.
    ///
    /// Unsubscribes from notifications and clears the site; any in-flight
    /// notification after this point is a no-op. The poller is deliberately
    /// left alone — its lifetime is driven by status transitions, not by
    /// `stop`.
    pub fn stop(&self) {
        debug!("stopping rewind status tracking");
        if let Some(worker) = self.inner.worker.lock().take() {
            worker.abort();
        }
        *self.inner.site.lock() = None;
    }

    /// Dispatch a status-fetch request for the active site. No-op without
    /// an active site; mutates no local state.
    pub fn request_status_update(&self) {
        let site = self.inner.site.lock().clone();
        if let Some(site) = site {
            debug!(site = site.id, "requesting rewind status update");
            self.inner
                .dispatcher
                .dispatch(RewindAction::FetchStatus { site });
        }
    }

    /// Start a rewind to the point identified by `rewind_id`.
    ///
    /// Publishes optimistic state synchronously, before any backend
    /// acknowledgement: progress (0, Running) for `rewind_id`, availability
    /// false, and an explicit clear of any previous rewind error.
    pub fn rewind(&self, rewind_id: &str, site: Site) {
        debug!(site = site.id, rewind_id, "dispatching rewind");
        self.inner.dispatcher.dispatch(RewindAction::Rewind {
            site,
            rewind_id: rewind_id.to_string(),
        });
        self.update_rewind_progress(Some(rewind_id), Some(0), RewindState::Running, None);
        self.inner.rewind_available.publish(Some(false));
        self.inner.rewind_error.publish(None);
    }

    /// Handle a status-fetch completion delivered by the dispatcher.
    pub fn on_status_fetched(&self, error: Option<RewindStatusFetchError>) {
        if self.inner.site.lock().is_none() {
            debug!("ignoring status fetch result: no active site");
            return;
        }
        debug!(is_error = error.is_some(), "rewind status fetched");
        self.inner.status_fetch_error.publish(error.clone());
        if error.is_some() {
            // Whatever progress tracking was in flight is now suspect.
            self.inner.poller.cancel();
        }
        // The fetch error and the reload are independent; even on error
        // there may be a usable cached snapshot.
        self.reload_rewind_status();
    }

    /// Handle a rewind-request completion delivered by the dispatcher.
    pub fn on_rewind(
        &self,
        error: Option<RewindError>,
        rewind_id: &str,
        restore_id: Option<i64>,
    ) {
        if self.inner.site.lock().is_none() {
            debug!("ignoring rewind result: no active site");
            return;
        }
        debug!(rewind_id, is_error = error.is_some(), "rewind completed");
        self.inner.rewind_error.publish(error.clone());
        if let Some(error) = error {
            // Undo the optimistic availability flip and synthesize a FAILED
            // progress entry with the reason derived from the error kind.
            self.inner.rewind_available.publish(Some(true));
            self.reload_rewind_status();
            self.update_rewind_progress(
                Some(rewind_id),
                Some(0),
                RewindState::Failed,
                Some(error.kind.to_string()),
            );
            return;
        }
        let site = self.inner.site.lock().clone();
        if let (Some(site), Some(restore_id)) = (site, restore_id) {
            self.inner.poller.start(site, restore_id);
        }
    }

    /// Reload status from the store's cache, folding it into observable
    /// state. Returns false without an active site or a cached status.
    fn reload_rewind_status(&self) -> bool {
        let site = self.inner.site.lock().clone();
        if let Some(site) = site {
            if let Some(status) = self.inner.store.rewind_status_for_site(&site) {
                debug!(site = site.id, "reloading cached rewind status");
                self.update_rewind_status(&status);
                return true;
            }
        }
        false
    }

    /// Fold one `RewindStatus` snapshot into observable state.
    fn update_rewind_status(&self, status: &RewindStatus) {
        let available = status.state == RewindStatusState::Active
            && status
                .rewind
                .as_ref()
                .map_or(true, |rewind| rewind.status != RewindState::Running);
        self.inner.rewind_available.publish(Some(available));

        match &status.rewind {
            None => {
                // Nothing in flight.
                self.inner.progress.publish(None);
            }
            Some(rewind) => {
                if !self.inner.poller.is_running() {
                    if let Some(restore_id) = rewind.restore_id {
                        // A rewind discovered already running: poll without
                        // the initial delay.
                        let site = self.inner.site.lock().clone();
                        if let Some(site) = site {
                            self.inner.poller.start_now(site, restore_id);
                        }
                    }
                }
                self.update_rewind_progress(
                    Some(&rewind.rewind_id),
                    rewind.progress,
                    rewind.status,
                    rewind.reason.clone(),
                );
                if rewind.status != RewindState::Running {
                    // Terminal observations always win, even over the
                    // force-start just above.
                    self.inner.poller.cancel();
                }
            }
        }
    }

    /// Build and publish a `RewindProgress`, enriching it with the best
    /// available activity-log entry for `rewind_id`.
    fn update_rewind_progress(
        &self,
        rewind_id: Option<&str>,
        progress: Option<u8>,
        status: RewindState,
        failure_reason: Option<String>,
    ) {
        let entry = self.resolve_entry(rewind_id);
        let progress = RewindProgress {
            date: entry.as_ref().map(|e| e.published_at),
            activity_log_entry: entry,
            progress,
            status,
            failure_reason,
        };
        debug!(
            status = progress.status.as_str(),
            progress = progress.progress,
            "publishing rewind progress"
        );
        self.inner.progress.publish(Some(progress));
    }

    /// Resolve the activity-log entry for a progress update.
    ///
    /// Store lookup first; on a miss, fall back to the cached entry when it
    /// carries the same rewind id (the entry may not have appeared in the
    /// log yet). Any successful resolution refreshes the cache.
    fn resolve_entry(&self, rewind_id: Option<&str>) -> Option<ActivityLogEntry> {
        let rewind_id = rewind_id?;
        let fresh = self.inner.store.entry_for_rewind_id(rewind_id);
        let mut cached = self.inner.cached_entry.lock();
        let resolved = fresh.or_else(|| {
            cached
                .as_ref()
                .filter(|entry| entry.rewind_id.as_deref() == Some(rewind_id))
                .cloned()
        });
        if let Some(entry) = &resolved {
            *cached = Some(entry.clone());
        }
        resolved
    }

    fn spawn_notification_worker(&self) {
        let mut worker = self.inner.worker.lock();
        if let Some(previous) = worker.take() {
            previous.abort();
        }
        let mut notifications = self.inner.dispatcher.subscribe();
        let service = self.clone();
        *worker = Some(tokio::spawn(async move {
            loop {
                match notifications.recv().await {
                    Ok(RewindNotification::StatusFetched { error }) => {
                        service.on_status_fetched(error);
                    }
                    Ok(RewindNotification::RewindCompleted {
                        error,
                        rewind_id,
                        restore_id,
                    }) => {
                        service.on_rewind(error, &rewind_id, restore_id);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "rewind notification stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }

    // --- Observable surface ---

    /// Last published availability. `Some(true)` only when the subsystem is
    /// active and no rewind is running.
    pub fn rewind_available(&self) -> Option<bool> {
        self.inner.rewind_available.get()
    }

    /// Last published rewind-command error; `None` is both "never failed"
    /// and "explicitly cleared".
    pub fn rewind_error(&self) -> Option<RewindError> {
        self.inner.rewind_error.get()
    }

    /// Last published status-fetch error.
    pub fn rewind_status_fetch_error(&self) -> Option<RewindStatusFetchError> {
        self.inner.status_fetch_error.get()
    }

    /// Last published progress.
    pub fn rewind_progress(&self) -> Option<RewindProgress> {
        self.inner.progress.get()
    }

    pub fn subscribe_rewind_available(&self) -> watch::Receiver<Option<bool>> {
        self.inner.rewind_available.subscribe()
    }

    pub fn subscribe_rewind_error(&self) -> watch::Receiver<Option<RewindError>> {
        self.inner.rewind_error.subscribe()
    }

    pub fn subscribe_rewind_status_fetch_error(
        &self,
    ) -> watch::Receiver<Option<RewindStatusFetchError>> {
        self.inner.status_fetch_error.subscribe()
    }

    pub fn subscribe_rewind_progress(&self) -> watch::Receiver<Option<RewindProgress>> {
        self.inner.progress.subscribe()
    }

    /// Whether the last published progress says a rewind is running.
    pub fn is_rewind_in_progress(&self) -> bool {
        self.rewind_progress()
            .map_or(false, |p| p.status == RewindState::Running)
    }

    /// Whether the last published availability is `true`.
    pub fn is_rewind_available(&self) -> bool {
        self.rewind_available() == Some(true)
    }
}
