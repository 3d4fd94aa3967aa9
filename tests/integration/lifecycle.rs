//! Service lifecycle: start, stop, and the no-active-site guard.

use std::time::Duration;

use backspin::dispatcher::{RewindAction, RewindNotification};
use backspin::error::{RewindStatusErrorKind, RewindStatusFetchError};
use backspin::model::Site;

use super::test_utils::{active_status, fixture};

#[tokio::test]
async fn start_fetches_and_reloads_from_the_cache() {
    let f = fixture();
    let site = Site::new(7);
    f.store
        .put_rewind_status(site.clone(), active_status(None));

    f.service.start(site.clone());

    // The initial fetch request went out...
    assert_eq!(
        f.dispatcher.actions(),
        vec![RewindAction::FetchStatus { site }]
    );
    // ...and the cached snapshot was folded synchronously: rewinding is
    // possible, nothing is in flight.
    assert_eq!(f.service.rewind_available(), Some(true));
    assert!(f.service.is_rewind_available());
    assert_eq!(f.service.rewind_progress(), None);
    assert!(!f.service.is_rewind_in_progress());
}

#[tokio::test]
async fn start_without_a_cached_status_publishes_nothing() {
    let f = fixture();
    f.service.start(Site::new(7));

    assert_eq!(f.service.rewind_available(), None);
    assert_eq!(f.service.rewind_progress(), None);
    assert!(!f.service.is_rewind_available());
}

#[tokio::test]
async fn request_status_update_is_a_no_op_before_start() {
    let f = fixture();
    f.service.request_status_update();
    assert!(f.dispatcher.actions().is_empty());
}

#[tokio::test]
async fn stop_detaches_the_site() {
    let f = fixture();
    let site = Site::new(7);
    f.store
        .put_rewind_status(site.clone(), active_status(None));
    f.service.start(site);
    let dispatched = f.dispatcher.actions().len();

    f.service.stop();

    f.service.request_status_update();
    assert_eq!(f.dispatcher.actions().len(), dispatched);
}

#[tokio::test]
async fn in_flight_notifications_after_stop_mutate_nothing() {
    let f = fixture();
    let site = Site::new(7);
    f.store
        .put_rewind_status(site.clone(), active_status(None));
    f.service.start(site);
    f.service.stop();

    let available_before = f.service.rewind_available();

    // Simulate a notification that was already in flight when stop ran.
    f.service.on_status_fetched(Some(RewindStatusFetchError::new(
        RewindStatusErrorKind::Generic,
    )));
    // And one delivered through the (now aborted) worker channel.
    f.dispatcher
        .notify(RewindNotification::StatusFetched { error: None });
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(f.service.rewind_status_fetch_error(), None);
    assert_eq!(f.service.rewind_available(), available_before);
    assert_eq!(f.poller.cancel_count(), 0);
}

#[tokio::test]
async fn the_service_can_be_restarted() -> anyhow::Result<()> {
    let f = fixture();
    let site = Site::new(7);
    f.store
        .put_rewind_status(site.clone(), active_status(None));

    f.service.start(site.clone());
    f.service.stop();
    f.service.start(site);

    // The fresh subscription still delivers notifications.
    let mut available = f.service.subscribe_rewind_available();
    f.dispatcher
        .notify(RewindNotification::StatusFetched { error: None });
    tokio::time::timeout(Duration::from_secs(5), available.changed()).await??;
    assert_eq!(*available.borrow(), Some(true));
    Ok(())
}
