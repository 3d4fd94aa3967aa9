//! Activity log read boundary.
//!
//! The service only ever reads from the activity log: the cached rewind
//! status for the active site, and individual entries by rewind id to
//! enrich progress updates. Both lookups are local cached reads, never
//! network calls.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::model::{ActivityLogEntry, RewindStatus, Site};

/// Read-only lookup of rewind status and activity-log entries.
pub trait ActivityLogStore: Send + Sync {
    /// The most recently cached rewind status for `site`, if any.
    fn rewind_status_for_site(&self, site: &Site) -> Option<RewindStatus>;

    /// The activity-log entry corresponding to `rewind_id`, if it has
    /// appeared in the log yet.
    fn entry_for_rewind_id(&self, rewind_id: &str) -> Option<ActivityLogEntry>;
}

/// In-process activity log cache.
///
/// Embedders populate it from whatever transport they use; a missing entry
/// is a degraded-data condition for the service, not an error.
#[derive(Default)]
pub struct MemoryActivityLogStore {
    statuses: RwLock<HashMap<Site, RewindStatus>>,
    entries: RwLock<Vec<ActivityLogEntry>>,
}

impl MemoryActivityLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached rewind status for a site.
    pub fn put_rewind_status(&self, site: Site, status: RewindStatus) {
        self.statuses.write().insert(site, status);
    }

    /// Drop the cached rewind status for a site.
    pub fn remove_rewind_status(&self, site: &Site) {
        self.statuses.write().remove(site);
    }

    /// Append an activity-log entry.
    pub fn put_entry(&self, entry: ActivityLogEntry) {
        self.entries.write().push(entry);
    }

    /// Remove every entry carrying `rewind_id`.
    pub fn remove_entries_for_rewind_id(&self, rewind_id: &str) {
        self.entries
            .write()
            .retain(|e| e.rewind_id.as_deref() != Some(rewind_id));
    }
}

impl ActivityLogStore for MemoryActivityLogStore {
    fn rewind_status_for_site(&self, site: &Site) -> Option<RewindStatus> {
        self.statuses.read().get(site).cloned()
    }

    fn entry_for_rewind_id(&self, rewind_id: &str) -> Option<ActivityLogEntry> {
        self.entries
            .read()
            .iter()
            .find(|e| e.rewind_id.as_deref() == Some(rewind_id))
            .cloned()
    }
}
