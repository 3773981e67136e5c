//! The persisted calendar.
//!
//! `CalendarStore` owns every event for the duration of a run. Events are kept
//! in file order and indexed by UID. There is no way to remove an
//! event: events that drop out of the feed stay in the calendar as history.

mod generate;
mod parse;

use std::collections::HashMap;
use std::path::Path;

use crate::error::ShowcalResult;
use crate::event::{CalendarEvent, RawProperty};

pub use generate::generate_calendar;
pub use parse::parse_calendar;

pub const DEFAULT_PRODUCT_ID: &str = "-//TheNationalVA//ConcertSchedule//EN";

/// Whether `load_or_create` found an existing calendar file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Created,
}

#[derive(Debug, Clone)]
pub struct CalendarStore {
    pub product_id: String,
    pub version: String,
    pub calscale: Option<String>,
    /// Calendar-level properties other than PRODID/VERSION/CALSCALE
    pub properties: Vec<RawProperty>,
    events: Vec<CalendarEvent>,
    index: HashMap<String, usize>,
}

impl CalendarStore {
    /// An empty Gregorian calendar
    pub fn new(product_id: impl Into<String>) -> Self {
        CalendarStore {
            product_id: product_id.into(),
            version: "2.0".to_string(),
            calscale: Some("GREGORIAN".to_string()),
            properties: Vec::new(),
            events: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn from_ics(content: &str) -> ShowcalResult<Self> {
        parse_calendar(content)
    }

    /// Read the calendar at `path`, or start an empty one if the file does not exist
    pub fn load_or_create(
        path: &Path,
        product_id: &str,
    ) -> ShowcalResult<(Self, LoadOutcome)> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no calendar file, starting empty");
            return Ok((Self::new(product_id), LoadOutcome::Created));
        }

        let content = std::fs::read_to_string(path)?;
        let store = Self::from_ics(&content)?;
        tracing::debug!(path = %path.display(), events = store.len(), "calendar loaded");

        Ok((store, LoadOutcome::Loaded))
    }

    pub fn to_ics(&self) -> String {
        generate_calendar(self)
    }

    /// Write the whole calendar to `path`
    pub fn save(&self, path: &Path) -> ShowcalResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, self.to_ics())?;
        Ok(())
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.index.contains_key(uid)
    }

    pub fn get(&self, uid: &str) -> Option<&CalendarEvent> {
        self.index.get(uid).map(|&i| &self.events[i])
    }

    pub fn get_mut(&mut self, uid: &str) -> Option<&mut CalendarEvent> {
        self.index.get(uid).map(|&i| &mut self.events[i])
    }

    /// Append `event`, or replace the entry with the same UID in place.
    pub fn insert(&mut self, event: CalendarEvent) -> &mut CalendarEvent {
        let position = match self.index.get(&event.uid) {
            Some(&i) => {
                self.events[i] = event;
                i
            }
            None => {
                let i = self.events.len();
                self.index.insert(event.uid.clone(), i);
                self.events.push(event);
                i
            }
        };

        &mut self.events[position]
    }

    /// Used by the parser: keeps every event, duplicates included, and
    /// points the index at the last occurrence of a UID.
    pub(crate) fn push_loaded(&mut self, event: CalendarEvent) {
        let i = self.events.len();
        if let Some(previous) = self.index.insert(event.uid.clone(), i) {
            tracing::warn!(
                uid = %event.uid,
                first = previous,
                "duplicate UID in calendar file, later entry wins"
            );
        }
        self.events.push(event);
    }
}
