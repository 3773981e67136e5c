//! ICS parsing using the icalendar crate's parser.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use icalendar::{
    DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

use super::{CalendarStore, DEFAULT_PRODUCT_ID};
use crate::error::{ShowcalError, ShowcalResult};
use crate::event::{AllDaySpan, CalendarEvent, RawProperty, Reminder, ReminderTrigger};

/// Parse a whole VCALENDAR document into a store
pub fn parse_calendar(content: &str) -> ShowcalResult<CalendarStore> {
    if !content.trim_start().starts_with("BEGIN:VCALENDAR") {
        return Err(ShowcalError::IcsParse(
            "document does not start with BEGIN:VCALENDAR".to_string(),
        ));
    }

    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| ShowcalError::IcsParse(e.to_string()))?;

    let mut store = CalendarStore::new(DEFAULT_PRODUCT_ID);
    store.calscale = None;

    for prop in &calendar.properties {
        match prop.name.as_ref() {
            "PRODID" => store.product_id = prop.val.to_string(),
            "VERSION" => store.version = prop.val.to_string(),
            "CALSCALE" => store.calscale = Some(prop.val.to_string()),
            _ => store.properties.push(to_raw(prop)),
        }
    }

    for component in &calendar.components {
        if component.name == "VEVENT" {
            store.push_loaded(parse_event(component)?);
        } else {
            tracing::warn!(component = %component.name, "dropping unsupported calendar component");
        }
    }

    Ok(store)
}

/// Parse one VEVENT. Properties the event model does not know are kept raw.
fn parse_event(vevent: &Component) -> ShowcalResult<CalendarEvent> {
    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .ok_or_else(|| ShowcalError::IcsParse("VEVENT without UID".to_string()))?;

    let mut event = CalendarEvent::new(uid);
    let mut start: Option<(NaiveDate, RawProperty)> = None;
    let mut end: Option<(NaiveDate, RawProperty)> = None;

    for prop in &vevent.properties {
        match prop.name.as_ref() {
            "UID" => {}
            "DTSTAMP" => set_utc(&mut event, prop, |e, dt| e.stamp = Some(dt)),
            "LAST-MODIFIED" => set_utc(&mut event, prop, |e, dt| e.last_modified = Some(dt)),
            "CREATED" => set_utc(&mut event, prop, |e, dt| e.created = Some(dt)),
            "DTSTART" => match as_date(prop) {
                Some(d) => start = Some((d, to_raw(prop))),
                None => event.extra_properties.push(to_raw(prop)),
            },
            "DTEND" => match as_date(prop) {
                Some(d) => end = Some((d, to_raw(prop))),
                None => event.extra_properties.push(to_raw(prop)),
            },
            "SUMMARY" => event.summary = Some(unescape_ics_value(prop.val.as_ref())),
            "LOCATION" => event.location = Some(unescape_ics_value(prop.val.as_ref())),
            "DESCRIPTION" => event.description = Some(unescape_ics_value(prop.val.as_ref())),
            "URL" => event.url = Some(prop.val.to_string()),
            _ => event.extra_properties.push(to_raw(prop)),
        }
    }

    // Only a full date/date pair is an all-day span; anything else stays verbatim
    match (start, end) {
        (Some((start, _)), Some((end, _))) => event.span = Some(AllDaySpan { start, end }),
        (start, end) => {
            event
                .extra_properties
                .extend(start.into_iter().chain(end).map(|(_, raw)| raw));
        }
    }

    for sub in &vevent.components {
        if sub.name != "VALARM" {
            tracing::warn!(uid = %event.uid, component = %sub.name, "dropping unsupported sub-component");
            continue;
        }
        match parse_alarm(&event.uid, sub) {
            Some(reminder) => event.reminders.push(reminder),
            None => tracing::warn!(uid = %event.uid, "dropping alarm with unreadable TRIGGER"),
        }
    }

    Ok(event)
}

/// Every alarm is read as a DISPLAY alarm relative to the event start
fn parse_alarm(uid: &str, alarm: &Component) -> Option<Reminder> {
    let trigger_prop = alarm.find_prop("TRIGGER")?;
    let trigger = parse_trigger(trigger_prop.val.as_ref())?;

    let related_end = trigger_prop
        .params
        .iter()
        .any(|p| p.key == "RELATED" && p.val.as_ref().map(|v| v.as_ref()) == Some("END"));
    if related_end {
        tracing::debug!(uid, "alarm TRIGGER;RELATED=END will be written relative to the start");
    }
    if let Some(action) = alarm.find_prop("ACTION").filter(|p| p.val != "DISPLAY") {
        tracing::debug!(uid, action = %action.val, "alarm ACTION will be written as DISPLAY");
    }

    let label = alarm
        .find_prop("DESCRIPTION")
        .map(|p| unescape_ics_value(p.val.as_ref()))
        .unwrap_or_else(|| "Reminder".to_string());

    Some(Reminder { label, trigger })
}

/// `20250131T183000Z` is absolute; `-PT30M`, `-P1D`, ... are relative to the start
fn parse_trigger(value: &str) -> Option<ReminderTrigger> {
    if let Some(dt) = parse_utc(value) {
        return Some(ReminderTrigger::At(dt));
    }

    let is_before = value.starts_with('-');
    let duration_str = value.trim_start_matches(['-', '+']);
    let duration = iso8601::duration(duration_str).ok()?;
    let std_duration: std::time::Duration = duration.into();
    let minutes = (std_duration.as_secs() / 60) as i64;

    Some(ReminderTrigger::BeforeStart {
        minutes: if is_before { minutes } else { -minutes },
    })
}

fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    let naive = value.strip_suffix('Z')?;
    NaiveDateTime::parse_from_str(naive, "%Y%m%dT%H%M%S")
        .ok()
        .map(|dt| dt.and_utc())
}

/// Stamp properties are UTC by definition; older files write them without the `Z`
fn parse_stamp(prop: &Property) -> Option<DateTime<Utc>> {
    let value = prop.val.as_ref();
    if let Some(dt) = parse_utc(value) {
        return Some(dt);
    }
    if prop.params.iter().any(|p| p.key == "TZID") {
        return None;
    }
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .ok()
        .map(|dt| dt.and_utc())
}

fn set_utc(event: &mut CalendarEvent, prop: &Property, set: impl FnOnce(&mut CalendarEvent, DateTime<Utc>)) {
    match parse_stamp(prop) {
        Some(dt) => set(event, dt),
        None => event.extra_properties.push(to_raw(prop)),
    }
}

fn as_date(prop: &Property) -> Option<NaiveDate> {
    match DatePerhapsTime::try_from(prop).ok()? {
        DatePerhapsTime::Date(d) => Some(d),
        DatePerhapsTime::DateTime(_) => None,
    }
}

fn to_raw(prop: &Property) -> RawProperty {
    let params = prop
        .params
        .iter()
        .filter_map(|p| Some((p.key.to_string(), p.val.as_ref()?.to_string())))
        .collect();

    RawProperty {
        name: prop.name.to_string(),
        params,
        value: unescape_ics_value(prop.val.as_ref()),
    }
}

/// Unescape ICS property values per RFC 5545
/// Reverses: \, → , and \; → ; and \\ → \ and \n → newline
fn unescape_ics_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some(&escaped @ (',' | ';' | '\\')) => {
                result.push(escaped);
                chars.next();
            }
            Some('n') | Some('N') => {
                result.push('\n');
                chars.next();
            }
            _ => result.push(c),
        }
    }

    result
}
