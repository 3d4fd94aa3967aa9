//! Background progress polling while a rewind is active.
//!
//! The service starts, force-starts, cancels, and queries the poller; it
//! never inspects the polling cadence. `IntervalPoller` is the default
//! implementation: bound to one (site, restore id) pair at a time, it
//! repeatedly dispatches status-fetch requests so fresh status flows back
//! through the normal notification path.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::PollerConfig;
use crate::dispatcher::{ActionDispatcher, RewindAction};
use crate::model::Site;

/// Polling collaborator contract.
pub trait ProgressPoller: Send + Sync {
    /// Whether a poll loop is currently active.
    fn is_running(&self) -> bool;

    /// Begin polling if not already active for this pair. An initial delay
    /// may elapse before the first poll.
    fn start(&self, site: Site, restore_id: i64);

    /// Begin polling immediately, bypassing the initial delay. Used when a
    /// running rewind is discovered rather than freshly initiated.
    fn start_now(&self, site: Site, restore_id: i64);

    /// Stop any active poll loop. Idempotent.
    fn cancel(&self);
}

struct ActivePoll {
    site: Site,
    restore_id: i64,
    task: JoinHandle<()>,
}

/// Interval-based poller dispatching periodic status fetches.
///
/// Must be driven from within a Tokio runtime.
pub struct IntervalPoller {
    dispatcher: Arc<dyn ActionDispatcher>,
    initial_delay: Duration,
    interval: Duration,
    active: Mutex<Option<ActivePoll>>,
}

impl IntervalPoller {
    pub fn new(dispatcher: Arc<dyn ActionDispatcher>, config: &PollerConfig) -> Self {
        Self {
            dispatcher,
            initial_delay: config.initial_delay(),
            interval: config.interval(),
            active: Mutex::new(None),
        }
    }

    fn spawn(&self, site: Site, restore_id: i64, delay: Duration) {
        let mut active = self.active.lock();
        if let Some(poll) = &*active {
            if !poll.task.is_finished() {
                if poll.site == site && poll.restore_id == restore_id {
                    return;
                }
                poll.task.abort();
            }
        }

        debug!(
            site = site.id,
            restore_id,
            delay_ms = delay.as_millis() as u64,
            "starting rewind progress poll"
        );
        let dispatcher = Arc::clone(&self.dispatcher);
        let interval = self.interval;
        let poll_site = site.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            loop {
                debug!(site = poll_site.id, restore_id, "polling rewind status");
                dispatcher.dispatch(RewindAction::FetchStatus {
                    site: poll_site.clone(),
                });
                tokio::time::sleep(interval).await;
            }
        });
        *active = Some(ActivePoll {
            site,
            restore_id,
            task,
        });
    }
}

impl ProgressPoller for IntervalPoller {
    fn is_running(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .map_or(false, |poll| !poll.task.is_finished())
    }

    fn start(&self, site: Site, restore_id: i64) {
        self.spawn(site, restore_id, self.initial_delay);
    }

    fn start_now(&self, site: Site, restore_id: i64) {
        self.spawn(site, restore_id, Duration::ZERO);
    }

    fn cancel(&self) {
        if let Some(poll) = self.active.lock().take() {
            debug!(
                site = poll.site.id,
                restore_id = poll.restore_id,
                "cancelling rewind progress poll"
            );
            poll.task.abort();
        }
    }
}
