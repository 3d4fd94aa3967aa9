//! Property-based tests for status-fold guarantees: the availability
//! formula and fold idempotence hold for arbitrary status snapshots.

use std::sync::Arc;

use backspin::dispatcher::{ActionDispatcher, RewindAction, RewindNotification};
use backspin::model::{Rewind, RewindState, RewindStatus, RewindStatusState, Site};
use backspin::poller::ProgressPoller;
use backspin::service::RewindStatusService;
use backspin::store::MemoryActivityLogStore;
use proptest::prelude::*;
use tokio::sync::broadcast;

struct NullPoller;

impl ProgressPoller for NullPoller {
    fn is_running(&self) -> bool {
        false
    }

    fn start(&self, _site: Site, _restore_id: i64) {}

    fn start_now(&self, _site: Site, _restore_id: i64) {}

    fn cancel(&self) {}
}

struct NullDispatcher {
    tx: broadcast::Sender<RewindNotification>,
}

impl NullDispatcher {
    fn new() -> Self {
        let (tx, _rx) = broadcast::channel(4);
        Self { tx }
    }
}

impl ActionDispatcher for NullDispatcher {
    fn dispatch(&self, _action: RewindAction) {}

    fn subscribe(&self) -> broadcast::Receiver<RewindNotification> {
        self.tx.subscribe()
    }
}

fn arb_rewind_state() -> impl Strategy<Value = RewindState> {
    prop_oneof![
        Just(RewindState::Queued),
        Just(RewindState::Running),
        Just(RewindState::Finished),
        Just(RewindState::Failed),
    ]
}

fn arb_status_state() -> impl Strategy<Value = RewindStatusState> {
    prop_oneof![
        Just(RewindStatusState::Active),
        Just(RewindStatusState::Inactive),
        Just(RewindStatusState::Unavailable),
    ]
}

fn arb_rewind() -> impl Strategy<Value = Rewind> {
    (
        "[a-z0-9]{1,8}",
        proptest::option::of(0i64..1_000),
        proptest::option::of(0u8..=100),
        arb_rewind_state(),
        proptest::option::of("[a-z ]{1,16}"),
    )
        .prop_map(|(rewind_id, restore_id, progress, status, reason)| Rewind {
            rewind_id,
            restore_id,
            progress,
            status,
            reason,
        })
}

fn arb_rewind_status() -> impl Strategy<Value = RewindStatus> {
    (arb_status_state(), proptest::option::of(arb_rewind()))
        .prop_map(|(state, rewind)| RewindStatus { state, rewind })
}

fn folded_service(status: &RewindStatus) -> (tokio::runtime::Runtime, RewindStatusService) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(MemoryActivityLogStore::new());
    let site = Site::new(1);
    store.put_rewind_status(site.clone(), status.clone());
    let service = RewindStatusService::new(
        store,
        Arc::new(NullPoller),
        Arc::new(NullDispatcher::new()),
    );
    runtime.block_on(async {
        service.start(site);
    });
    (runtime, service)
}

/// The published availability always matches the fold formula:
/// active subsystem and no running rewind.
#[test]
fn availability_matches_the_fold_formula() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&arb_rewind_status(), |status| {
            let (_runtime, service) = folded_service(&status);

            let expected = status.state == RewindStatusState::Active
                && status
                    .rewind
                    .as_ref()
                    .map_or(true, |r| r.status != RewindState::Running);
            assert_eq!(service.rewind_available(), Some(expected));
            assert_eq!(service.is_rewind_available(), expected);

            match &status.rewind {
                None => assert!(service.rewind_progress().is_none()),
                Some(rewind) => {
                    let progress = service.rewind_progress().unwrap();
                    assert_eq!(progress.status, rewind.status);
                    assert_eq!(progress.progress, rewind.progress);
                    assert_eq!(progress.failure_reason, rewind.reason);
                    // No activity-log entry exists for the generated ids.
                    assert!(progress.activity_log_entry.is_none());
                    assert!(progress.date.is_none());
                }
            }

            Ok(())
        })
        .unwrap();
}

/// Folding an identical snapshot twice publishes identical state: the fold
/// keeps no hidden counters.
#[test]
fn folding_twice_is_idempotent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&arb_rewind_status(), |status| {
            let (runtime, service) = folded_service(&status);
            let first_available = service.rewind_available();
            let first_progress = service.rewind_progress();

            runtime.block_on(async {
                service.on_status_fetched(None);
            });

            assert_eq!(service.rewind_available(), first_available);
            assert_eq!(service.rewind_progress(), first_progress);

            Ok(())
        })
        .unwrap();
}
