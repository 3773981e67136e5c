//! Feed record → calendar event mapping.
//!
//! Create and update share one code path: every value is derived from the
//! record first (`MappedFields`), and only then written onto the event. A
//! record that fails to map never leaves an existing event half-updated.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{ShowcalError, ShowcalResult};
use crate::event::{AllDaySpan, CalendarEvent, Reminder, ReminderTrigger};
use crate::feed::FeedRecord;
use crate::time::{format_time, parse_timestamp, placeholder_instant};

const DOORS_REMINDER_LABEL: &str = "30 Minutes to Doors";
const SHOW_REMINDER_LABEL: &str = "15 Minutes to Show";
const DOORS_LEAD_MINUTES: i64 = 30;
const SHOW_LEAD_MINUTES: i64 = 15;

/// Which pair of feed fields carries the show and door times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSource {
    /// `eventDateTimeUTC` / `doorDateTimeUTC`
    #[default]
    Utc,
    /// `eventDateTime` / `doorDateTime`, read in the configured timezone
    Local,
}

#[derive(Debug, Clone)]
pub struct MapperOptions {
    /// Domain part of every UID (`{eventId}@{namespace}`)
    pub namespace: String,
    pub time_source: TimeSource,
    /// Zone for naive local timestamps and for displayed times/dates
    pub timezone: Tz,
    pub reminders: bool,
}

impl Default for MapperOptions {
    fn default() -> Self {
        MapperOptions {
            namespace: "thenationalva.com".to_string(),
            time_source: TimeSource::Utc,
            timezone: Tz::UTC,
            reminders: true,
        }
    }
}

pub struct EventMapper {
    options: MapperOptions,
}

/// Everything the mapper writes onto an event
struct MappedFields {
    uid: String,
    modified: DateTime<Utc>,
    created: Option<DateTime<Utc>>,
    span: AllDaySpan,
    summary: String,
    location: String,
    description: String,
    url: String,
    reminders: Vec<Reminder>,
}

impl EventMapper {
    pub fn new(options: MapperOptions) -> Self {
        EventMapper { options }
    }

    /// `{eventId}@{namespace}`
    pub fn uid_for(&self, record: &FeedRecord) -> ShowcalResult<String> {
        let id = record
            .event_id
            .as_ref()
            .ok_or_else(|| missing(record, "eventId"))?;
        Ok(format!("{}@{}", id, self.options.namespace))
    }

    /// Build a fresh event from a record
    pub fn create(&self, record: &FeedRecord) -> ShowcalResult<CalendarEvent> {
        let fields = self.map_fields(record)?;
        let mut event = CalendarEvent::new(fields.uid.clone());
        apply(&mut event, fields);
        Ok(event)
    }

    /// Rewrite the mapped fields of an existing event; anything else on it is kept
    pub fn update(&self, record: &FeedRecord, event: &mut CalendarEvent) -> ShowcalResult<()> {
        let fields = self.map_fields(record)?;
        apply(event, fields);
        Ok(())
    }

    /// Create when `existing` is `None`, otherwise update it in place and hand it back
    pub fn map(
        &self,
        record: &FeedRecord,
        existing: Option<CalendarEvent>,
    ) -> ShowcalResult<CalendarEvent> {
        match existing {
            Some(mut event) => {
                self.update(record, &mut event)?;
                Ok(event)
            }
            None => self.create(record),
        }
    }

    fn map_fields(&self, record: &FeedRecord) -> ShowcalResult<MappedFields> {
        let uid = self.uid_for(record)?;
        let zone = self.options.timezone;

        let modified = self
            .timestamp(record, "modifiedUTC", record.modified_utc.as_deref(), Tz::UTC)?
            .unwrap_or_else(placeholder_instant);
        let created =
            self.timestamp(record, "createdUTC", record.created_utc.as_deref(), Tz::UTC)?;

        let (show_field, show_value, door_field, door_value, naive_zone) =
            match self.options.time_source {
                TimeSource::Utc => (
                    "eventDateTimeUTC",
                    record.event_date_time_utc.as_deref(),
                    "doorDateTimeUTC",
                    record.door_date_time_utc.as_deref(),
                    Tz::UTC,
                ),
                TimeSource::Local => (
                    "eventDateTime",
                    record.event_date_time.as_deref(),
                    "doorDateTime",
                    record.door_date_time.as_deref(),
                    zone,
                ),
            };

        let show = self.timestamp(record, show_field, show_value, naive_zone)?;
        let doors = self.timestamp(record, door_field, door_value, naive_zone)?;

        if show.is_none() {
            tracing::warn!(
                event = %record.label(),
                field = show_field,
                "show time missing, using placeholder date"
            );
        }
        let show_or_placeholder = show.unwrap_or_else(placeholder_instant);
        let span = AllDaySpan::single_day(show_or_placeholder.with_timezone(&zone).date_naive());

        let title = record.title.as_ref();
        let summary = title
            .and_then(|t| t.event_title_text.clone())
            .ok_or_else(|| missing(record, "title.eventTitleText"))?;

        let venue = record.venue.as_ref();
        let venue_title = venue
            .and_then(|v| v.title.as_deref())
            .ok_or_else(|| missing(record, "venue.title"))?;
        let venue_address = venue
            .and_then(|v| v.address_line.as_deref())
            .ok_or_else(|| missing(record, "venue.address_line"))?;
        let location = format!("{}, {}", venue_title, venue_address);

        let mut lines = Vec::new();
        if let Some(doors) = doors {
            lines.push(format!("Doors: {}", format_time(&doors, zone)));
        }
        lines.push(format!("Show: {}", format_time(&show_or_placeholder, zone)));
        if let Some(support) = title.and_then(|t| t.supporting_text.as_deref()) {
            lines.push(format!("Support: {}", support));
        }
        if let Some(headliner) = record.headliners().first() {
            let age = if headliner.under21.unwrap_or(false) {
                "21+ Only"
            } else {
                "All Ages"
            };
            let genre = headliner
                .minor_category_text
                .as_deref()
                .unwrap_or("Unknown Genre");
            lines.push(format!("Age: {}", age));
            lines.push(format!("Genre: {}", genre));
        }

        let url = record
            .ticketing
            .as_ref()
            .and_then(|t| t.url.clone())
            .ok_or_else(|| missing(record, "ticketing.url"))?;

        let mut reminders = Vec::new();
        if self.options.reminders {
            if let Some(doors) = doors {
                reminders.push(Reminder {
                    label: DOORS_REMINDER_LABEL.to_string(),
                    trigger: ReminderTrigger::At(doors - Duration::minutes(DOORS_LEAD_MINUTES)),
                });
            }
            if let Some(show) = show {
                reminders.push(Reminder {
                    label: SHOW_REMINDER_LABEL.to_string(),
                    trigger: ReminderTrigger::At(show - Duration::minutes(SHOW_LEAD_MINUTES)),
                });
            }
        }

        Ok(MappedFields {
            uid,
            modified,
            created,
            span,
            summary,
            location,
            description: lines.join("\n"),
            url,
            reminders,
        })
    }

    fn timestamp(
        &self,
        record: &FeedRecord,
        field: &'static str,
        value: Option<&str>,
        naive_zone: Tz,
    ) -> ShowcalResult<Option<DateTime<Utc>>> {
        let Some(value) = value else {
            return Ok(None);
        };

        parse_timestamp(value, naive_zone)
            .map(Some)
            .ok_or_else(|| ShowcalError::InvalidTimestamp {
                event: record.label(),
                field,
                value: value.to_string(),
            })
    }
}

fn apply(event: &mut CalendarEvent, fields: MappedFields) {
    event.uid = fields.uid;
    event.set_stamps(fields.modified, fields.created);
    event.set_span(fields.span);
    event.summary = Some(fields.summary);
    event.location = Some(fields.location);
    event.description = Some(fields.description);
    event.url = Some(fields.url);
    event.reminders = fields.reminders;
}

fn missing(record: &FeedRecord, field: &'static str) -> ShowcalError {
    ShowcalError::MissingField {
        event: record.label(),
        field,
    }
}
