//! Core types for showcal.
//!
//! This crate turns a venue's JSON event feed into iCalendar events:
//! - `feed` holds the feed record types and the HTTP feed source
//! - `mapper` converts one feed record into one `CalendarEvent`
//! - `store` loads, indexes and writes the `.ics` calendar
//! - `sync` merges a batch of feed records into the store

pub mod error;
pub mod event;
pub mod feed;
pub mod mapper;
pub mod store;
pub mod sync;
pub mod time;

pub use error::{ShowcalError, ShowcalResult};
pub use event::{AllDaySpan, CalendarEvent, RawProperty, Reminder, ReminderTrigger};
pub use feed::{Feed, FeedRecord, FeedSource, HttpFeed};
pub use mapper::{EventMapper, MapperOptions, TimeSource};
pub use store::{CalendarStore, LoadOutcome};
pub use sync::{Change, ChangeKind, InvalidRecordPolicy, SkippedRecord, SyncReport, sync};
