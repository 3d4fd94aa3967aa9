//! Data model for rewind status tracking.
//!
//! Snapshots of the server-side rewind subsystem (`RewindStatus`,
//! `Rewind`), the activity-log records used to enrich progress updates, and
//! the service-owned `RewindProgress` value observers actually see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the site whose rewind status is being tracked. Exactly one
/// site is active per service instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Site {
    pub id: u64,
}

impl Site {
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

/// Whether the rewind subsystem can accept rewinds for the site at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewindStatusState {
    Active,
    Inactive,
    Unavailable,
}

/// Lifecycle state of a single restore job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewindState {
    Queued,
    Running,
    Finished,
    Failed,
}

impl RewindState {
    pub fn as_str(self) -> &'static str {
        match self {
            RewindState::Queued => "queued",
            RewindState::Running => "running",
            RewindState::Finished => "finished",
            RewindState::Failed => "failed",
        }
    }
}

/// One in-flight or just-finished restore as reported by the backend.
///
/// `restore_id` is assigned only once the backend has accepted the job;
/// `progress` is a 0–100 percentage when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewind {
    pub rewind_id: String,
    pub restore_id: Option<i64>,
    pub progress: Option<u8>,
    pub status: RewindState,
    pub reason: Option<String>,
}

/// Snapshot of the server-side rewind subsystem for a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewindStatus {
    pub state: RewindStatusState,
    pub rewind: Option<Rewind>,
}

/// Immutable historical event record. Not every entry corresponds to a
/// rewind; the ones that do carry the matching `rewind_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: String,
    pub rewind_id: Option<String>,
    pub published_at: DateTime<Utc>,
    pub summary: Option<String>,
}

/// The externally observed progress value, constructed fresh on every
/// update. `date` comes from the resolved activity-log entry, never from
/// the server payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewindProgress {
    pub activity_log_entry: Option<ActivityLogEntry>,
    pub progress: Option<u8>,
    pub date: Option<DateTime<Utc>>,
    pub status: RewindState,
    pub failure_reason: Option<String>,
}
