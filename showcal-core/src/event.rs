//! Calendar event model.
//!
//! A `CalendarEvent` is what the store keeps for each UID. The mapper owns the
//! typed fields; everything else found on disk rides along in
//! `extra_properties` so it survives a rewrite.

use chrono::{DateTime, Days, NaiveDate, Utc};

/// One VEVENT in the calendar
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub uid: String,
    /// DTSTAMP
    pub stamp: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub span: Option<AllDaySpan>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Ticket link
    pub url: Option<String>,
    pub reminders: Vec<Reminder>,
    /// Properties not modelled above, in file order
    pub extra_properties: Vec<RawProperty>,
}

impl CalendarEvent {
    pub fn new(uid: impl Into<String>) -> Self {
        CalendarEvent {
            uid: uid.into(),
            stamp: None,
            last_modified: None,
            created: None,
            span: None,
            summary: None,
            location: None,
            description: None,
            url: None,
            reminders: Vec::new(),
            extra_properties: Vec::new(),
        }
    }

    /// Set the all-day span, dropping any timed DTSTART/DTEND carried over from disk
    pub fn set_span(&mut self, span: AllDaySpan) {
        self.extra_properties
            .retain(|p| p.name != "DTSTART" && p.name != "DTEND");
        self.span = Some(span);
    }

    /// Set DTSTAMP and LAST-MODIFIED to `modified`, dropping verbatim copies of
    /// the stamp properties carried over from disk
    pub fn set_stamps(&mut self, modified: DateTime<Utc>, created: Option<DateTime<Utc>>) {
        self.extra_properties
            .retain(|p| !matches!(p.name.as_str(), "DTSTAMP" | "LAST-MODIFIED" | "CREATED"));
        self.stamp = Some(modified);
        self.last_modified = Some(modified);
        self.created = created;
    }

    /// Title for console output
    pub fn display_title(&self) -> &str {
        self.summary.as_deref().unwrap_or("(No title)")
    }
}

/// An all-day range: `start` inclusive, `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllDaySpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AllDaySpan {
    /// A single all-day event on `date`
    pub fn single_day(date: NaiveDate) -> Self {
        AllDaySpan {
            start: date,
            end: date.checked_add_days(Days::new(1)).unwrap_or(date),
        }
    }
}

/// A VALARM with a DISPLAY action
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub label: String,
    pub trigger: ReminderTrigger,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReminderTrigger {
    /// Absolute instant (`TRIGGER;VALUE=DATE-TIME:...Z`)
    At(DateTime<Utc>),
    /// Relative to the event start, e.g. `-PT30M` is 30 minutes before
    BeforeStart { minutes: i64 },
}

/// A property kept verbatim (unescaped value, parameters in file order)
#[derive(Debug, Clone, PartialEq)]
pub struct RawProperty {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub value: String,
}

impl RawProperty {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        RawProperty {
            name: name.into(),
            params: Vec::new(),
            value: value.into(),
        }
    }
}
