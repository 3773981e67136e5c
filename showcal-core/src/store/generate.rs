//! ICS generation.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use icalendar::{Alarm, Calendar, Component, EventLike, Property, Trigger, ValueType};

use super::CalendarStore;
use crate::event::{CalendarEvent, RawProperty, ReminderTrigger};
use crate::time::placeholder_instant;

/// Serialize the whole store as one VCALENDAR document
pub fn generate_calendar(store: &CalendarStore) -> String {
    let mut cal = Calendar::new();

    for prop in &store.properties {
        cal.append_property(to_property(prop));
    }

    for event in store.events() {
        cal.push(build_event(event));
    }

    let cal = cal.done();

    finish_output(&cal.to_string(), store)
}

fn build_event(event: &CalendarEvent) -> icalendar::Event {
    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.uid);

    // Without an explicit DTSTAMP the builder stamps the current time
    let stamp = event
        .stamp
        .or(event.last_modified)
        .or(event.created)
        .unwrap_or_else(placeholder_instant);
    ics_event.add_property("DTSTAMP", format_utc(&stamp));
    if let Some(modified) = event.last_modified {
        ics_event.add_property("LAST-MODIFIED", format_utc(&modified));
    }
    if let Some(created) = event.created {
        ics_event.add_property("CREATED", format_utc(&created));
    }

    if let Some(span) = event.span {
        for (name, date) in [("DTSTART", span.start), ("DTEND", span.end)] {
            let mut prop = Property::new(name, date.format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            ics_event.append_property(prop);
        }
    }

    if let Some(ref summary) = event.summary {
        ics_event.summary(summary);
    }
    if let Some(ref loc) = event.location {
        ics_event.location(loc);
    }
    if let Some(ref desc) = event.description {
        ics_event.description(desc);
    }
    if let Some(ref url) = event.url {
        ics_event.add_property("URL", url);
    }

    for reminder in &event.reminders {
        let trigger = match reminder.trigger {
            ReminderTrigger::At(at) => Trigger::from(at),
            ReminderTrigger::BeforeStart { minutes } => {
                Trigger::before_start(Duration::minutes(minutes))
            }
        };
        ics_event.alarm(Alarm::display(&reminder.label, trigger));
    }

    // Repeated names (ATTENDEE, EXDATE, ...) must not overwrite each other
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for prop in &event.extra_properties {
        *counts.entry(prop.name.as_str()).or_default() += 1;
    }
    for prop in &event.extra_properties {
        if counts[prop.name.as_str()] > 1 {
            ics_event.append_multi_property(to_property(prop));
        } else {
            ics_event.append_property(to_property(prop));
        }
    }

    ics_event.done()
}

fn to_property(raw: &RawProperty) -> Property {
    let mut prop = Property::new(&raw.name, &raw.value);
    for (key, value) in &raw.params {
        prop.add_parameter(key, value);
    }
    prop
}

fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Clean up ICS output from the icalendar crate
/// - Write our own VERSION / PRODID / CALSCALE header instead of the crate's
/// - Remove DTSTAMP and UID inside VALARM sections (not required by RFC 5545,
///   and regenerated on every run)
fn finish_output(ics: &str, store: &CalendarStore) -> String {
    let mut result = String::with_capacity(ics.len());
    let mut depth = 0usize;
    let mut in_valarm = false;

    for line in ics.lines() {
        if line.starts_with("BEGIN:") {
            depth += 1;
            if line == "BEGIN:VALARM" {
                in_valarm = true;
            }
            push_line(&mut result, line);

            if line == "BEGIN:VCALENDAR" {
                push_line(&mut result, &format!("VERSION:{}", store.version));
                push_line(&mut result, &format!("PRODID:{}", store.product_id));
                if let Some(ref calscale) = store.calscale {
                    push_line(&mut result, &format!("CALSCALE:{}", calscale));
                }
            }
            continue;
        }

        if line.starts_with("END:") {
            depth = depth.saturating_sub(1);
            if line == "END:VALARM" {
                in_valarm = false;
            }
            push_line(&mut result, line);
            continue;
        }

        let calendar_level = depth == 1;
        if calendar_level
            && (line.starts_with("VERSION:")
                || line.starts_with("PRODID:")
                || line.starts_with("CALSCALE:"))
        {
            continue;
        }

        if in_valarm && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) {
            continue;
        }

        push_line(&mut result, line);
    }

    result
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push_str("\r\n");
}
