//! Merge a batch of feed records into the calendar store.
//!
//! Known UIDs are updated in place, unknown ones appended. Nothing is ever
//! removed. Persisting the store is left to the caller so a run writes the
//! file exactly once, after the whole batch went through.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ShowcalError, ShowcalResult};
use crate::event::CalendarEvent;
use crate::feed::FeedRecord;
use crate::mapper::EventMapper;
use crate::store::CalendarStore;

/// What to do with a record that cannot be mapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRecordPolicy {
    /// Fail the whole run on the first bad record
    #[default]
    Abort,
    /// Log it, report it and carry on with the rest of the batch
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Unchanged,
}

impl ChangeKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ChangeKind::Added => "+",
            ChangeKind::Updated => "~",
            ChangeKind::Unchanged => "=",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "Added"),
            ChangeKind::Updated => write!(f, "Updated"),
            ChangeKind::Unchanged => write!(f, "Unchanged"),
        }
    }
}

/// One feed record applied to the store
#[derive(Debug, Clone)]
pub struct Change {
    pub uid: String,
    pub summary: String,
    pub kind: ChangeKind,
}

impl Change {
    fn new(event: &CalendarEvent, kind: ChangeKind) -> Self {
        Change {
            uid: event.uid.clone(),
            summary: event.display_title().to_string(),
            kind,
        }
    }
}

/// A record the skip policy left out
#[derive(Debug)]
pub struct SkippedRecord {
    /// Position in the feed
    pub index: usize,
    pub event: String,
    pub error: ShowcalError,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub fetched: usize,
    pub changes: Vec<Change>,
    pub skipped: Vec<SkippedRecord>,
}

impl SyncReport {
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    /// True when the store differs from what was loaded
    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| c.kind != ChangeKind::Unchanged)
    }
}

/// Apply every record to `store`.
///
/// With `InvalidRecordPolicy::Abort` the first record error is returned and
/// the caller is expected not to save the store.
pub fn sync(
    store: &mut CalendarStore,
    records: &[FeedRecord],
    mapper: &EventMapper,
    policy: InvalidRecordPolicy,
) -> ShowcalResult<SyncReport> {
    let mut report = SyncReport {
        fetched: records.len(),
        ..SyncReport::default()
    };

    for (index, record) in records.iter().enumerate() {
        match apply_record(store, record, mapper) {
            Ok(change) => {
                tracing::debug!(uid = %change.uid, kind = %change.kind, "record applied");
                report.changes.push(change);
            }
            Err(error) if policy == InvalidRecordPolicy::Skip && error.is_record_error() => {
                tracing::warn!(index, event = %record.label(), %error, "skipping record");
                report.skipped.push(SkippedRecord {
                    index,
                    event: record.label(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    Ok(report)
}

fn apply_record(
    store: &mut CalendarStore,
    record: &FeedRecord,
    mapper: &EventMapper,
) -> ShowcalResult<Change> {
    let uid = mapper.uid_for(record)?;

    if let Some(existing) = store.get_mut(&uid) {
        let before = existing.clone();
        mapper.update(record, existing)?;
        let kind = if *existing == before {
            ChangeKind::Unchanged
        } else {
            ChangeKind::Updated
        };
        return Ok(Change::new(existing, kind));
    }

    let event = store.insert(mapper.create(record)?);
    Ok(Change::new(event, ChangeKind::Added))
}
