use std::path::Path;

use showcal_core::store::DEFAULT_PRODUCT_ID;
use showcal_core::{
    CalendarStore, ChangeKind, EventMapper, Feed, FeedRecord, FeedSource, InvalidRecordPolicy,
    LoadOutcome, MapperOptions, ReminderTrigger, ShowcalError, ShowcalResult, SyncReport, sync,
};

const FEED: &str = r#"{
    "meta": {"total": 2},
    "events": [
        {
            "eventId": "765964",
            "title": {"eventTitleText": "The Band", "supportingText": "Foo"},
            "venue": {"title": "The National", "address_line": "708 E Broad St, Richmond, VA 23219"},
            "eventDateTime": "2025-01-31T20:00:00",
            "eventDateTimeUTC": "2025-01-31T20:00:00Z",
            "doorDateTime": "2025-01-31T19:00:00",
            "doorDateTimeUTC": "2025-01-31T19:00:00Z",
            "createdUTC": "2024-11-02T14:00:00Z",
            "modifiedUTC": "2025-01-10T09:30:00Z",
            "associations": {"headliners": [{"under21": true, "minorCategoryText": "Rock"}]},
            "ticketing": {"url": "https://tickets.example.com/765964"}
        },
        {
            "eventId": 770001,
            "title": {"eventTitleText": "Quiet Night; Acoustic Set"},
            "venue": {"title": "The National", "address_line": "708 E Broad St, Richmond, VA 23219"},
            "eventDateTimeUTC": "2025-02-14T01:30:00Z",
            "associations": {"headliners": [{"under21": false}]},
            "ticketing": {"url": "https://tickets.example.com/770001?utm=feed&x=1"}
        }
    ]
}"#;

/// Feed served from memory
struct StaticFeed(&'static str);

impl FeedSource for StaticFeed {
    fn fetch(&self) -> ShowcalResult<Vec<FeedRecord>> {
        Ok(Feed::from_json(self.0)?.events)
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// One full run: fetch, load, merge, save once
fn run(source: &dyn FeedSource, path: &Path, policy: InvalidRecordPolicy) -> ShowcalResult<SyncReport> {
    let records = source.fetch()?;
    let mapper = EventMapper::new(MapperOptions::default());
    let (mut store, _) = CalendarStore::load_or_create(path, DEFAULT_PRODUCT_ID)?;
    let report = sync(&mut store, &records, &mapper, policy)?;
    store.save(path)?;
    Ok(report)
}

#[test]
fn test_second_run_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concert_schedule.ics");
    let source = StaticFeed(FEED);

    let first = run(&source, &path, InvalidRecordPolicy::Abort).unwrap();
    assert_eq!(first.count(ChangeKind::Added), 2);
    let first_output = std::fs::read_to_string(&path).unwrap();

    let second = run(&source, &path, InvalidRecordPolicy::Abort).unwrap();
    assert_eq!(second.count(ChangeKind::Unchanged), 2, "Changes: {:?}", second.changes);
    let second_output = std::fs::read_to_string(&path).unwrap();

    assert_eq!(first_output, second_output);
    assert_eq!(first_output.matches("BEGIN:VEVENT").count(), 2);
    assert_eq!(first_output.matches("BEGIN:VALARM").count(), 3);
}

#[test]
fn test_saved_calendar_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concert_schedule.ics");
    run(&StaticFeed(FEED), &path, InvalidRecordPolicy::Abort).unwrap();

    let (store, outcome) = CalendarStore::load_or_create(&path, DEFAULT_PRODUCT_ID).unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded);
    assert_eq!(store.product_id, DEFAULT_PRODUCT_ID);
    assert_eq!(store.calscale.as_deref(), Some("GREGORIAN"));

    let band = store.get("765964@thenationalva.com").expect("Should have the first event");
    assert_eq!(
        band.description.as_deref(),
        Some("Doors: 7:00 PM\nShow: 8:00 PM\nSupport: Foo\nAge: 21+ Only\nGenre: Rock")
    );
    assert_eq!(
        band.location.as_deref(),
        Some("The National, 708 E Broad St, Richmond, VA 23219")
    );
    let triggers: Vec<String> = band
        .reminders
        .iter()
        .map(|r| match r.trigger {
            ReminderTrigger::At(at) => at.to_rfc3339(),
            ReminderTrigger::BeforeStart { minutes } => format!("-{}m", minutes),
        })
        .collect();
    assert_eq!(
        triggers,
        vec!["2025-01-31T18:30:00+00:00", "2025-01-31T19:45:00+00:00"]
    );

    let quiet = store.get("770001@thenationalva.com").expect("Numeric id should map");
    assert_eq!(quiet.summary.as_deref(), Some("Quiet Night; Acoustic Set"));
    assert_eq!(
        quiet.description.as_deref(),
        Some("Show: 1:30 AM\nAge: All Ages\nGenre: Unknown Genre")
    );
    assert_eq!(quiet.reminders.len(), 1);
}

#[test]
fn test_events_missing_from_feed_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concert_schedule.ics");
    std::fs::write(
        &path,
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//TheNationalVA//ConcertSchedule//EN\r\n\
BEGIN:VEVENT\r\n\
UID:1@thenationalva.com\r\n\
DTSTAMP:20240101T000000Z\r\n\
DTSTART;VALUE=DATE:20240315\r\n\
DTEND;VALUE=DATE:20240316\r\n\
SUMMARY:Last Year's Show\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
    )
    .unwrap();

    let report = run(&StaticFeed(FEED), &path, InvalidRecordPolicy::Abort).unwrap();
    assert_eq!(report.count(ChangeKind::Added), 2);

    let (store, _) = CalendarStore::load_or_create(&path, DEFAULT_PRODUCT_ID).unwrap();
    let uids: Vec<&str> = store.events().iter().map(|e| e.uid.as_str()).collect();
    assert_eq!(
        uids,
        vec![
            "1@thenationalva.com",
            "765964@thenationalva.com",
            "770001@thenationalva.com"
        ]
    );
    assert_eq!(
        store.get("1@thenationalva.com").unwrap().summary.as_deref(),
        Some("Last Year's Show")
    );
}

#[test]
fn test_bad_record_aborts_without_writing() {
    const BAD_FEED: &str = r#"{"events": [
        {
            "eventId": "1",
            "title": {"eventTitleText": "Fine"},
            "venue": {"title": "V", "address_line": "A"},
            "eventDateTimeUTC": "2025-01-31T20:00:00Z",
            "ticketing": {"url": "https://t.example.com/1"}
        },
        {
            "eventId": "2",
            "title": {"eventTitleText": "No tickets"},
            "venue": {"title": "V", "address_line": "A"},
            "eventDateTimeUTC": "2025-01-31T20:00:00Z"
        }
    ]}"#;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concert_schedule.ics");

    let err = run(&StaticFeed(BAD_FEED), &path, InvalidRecordPolicy::Abort).unwrap_err();
    assert!(
        matches!(err, ShowcalError::MissingField { field: "ticketing.url", .. }),
        "Got {:?}",
        err
    );
    assert!(!path.exists(), "Nothing should be written on abort");

    let report = run(&StaticFeed(BAD_FEED), &path, InvalidRecordPolicy::Skip).unwrap();
    assert_eq!(report.count(ChangeKind::Added), 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(path.exists());
}

#[test]
fn test_naive_stamps_from_older_files_are_replaced_on_update() {
    const FEED_MARCH: &str = r#"{"events": [{
        "eventId": "765964",
        "title": {"eventTitleText": "The Band"},
        "venue": {"title": "The National", "address_line": "708 E Broad St"},
        "eventDateTimeUTC": "2025-03-20T00:00:00Z",
        "modifiedUTC": "2025-03-05T10:00:00Z",
        "ticketing": {"url": "https://tickets.example.com/765964"}
    }]}"#;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concert_schedule.ics");
    std::fs::write(
        &path,
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//TheNationalVA//ConcertSchedule//EN\r\n\
BEGIN:VEVENT\r\n\
UID:765964@thenationalva.com\r\n\
DTSTAMP:20250101T000000\r\n\
LAST-MODIFIED:20250101T000000\r\n\
DTSTART;VALUE=DATE:20250319\r\n\
DTEND;VALUE=DATE:20250320\r\n\
SUMMARY:The Band\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
    )
    .unwrap();

    let first = run(&StaticFeed(FEED_MARCH), &path, InvalidRecordPolicy::Abort).unwrap();
    assert_eq!(first.count(ChangeKind::Updated), 1);
    let output = std::fs::read_to_string(&path).unwrap();

    assert!(output.contains("DTSTAMP:20250305T100000Z\r\n"), "ICS:\n{}", output);
    assert!(output.contains("LAST-MODIFIED:20250305T100000Z\r\n"), "ICS:\n{}", output);
    assert!(!output.contains("20250101T000000"), "Stale stamp kept. ICS:\n{}", output);

    let second = run(&StaticFeed(FEED_MARCH), &path, InvalidRecordPolicy::Abort).unwrap();
    assert_eq!(second.count(ChangeKind::Unchanged), 1, "Changes: {:?}", second.changes);
    assert_eq!(output, std::fs::read_to_string(&path).unwrap());
}

#[test]
fn test_event_without_dtstamp_is_written_identically_every_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concert_schedule.ics");
    std::fs::write(
        &path,
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//TheNationalVA//ConcertSchedule//EN\r\n\
BEGIN:VEVENT\r\n\
UID:hand-made@calendar\r\n\
DTSTART;VALUE=DATE:20240315\r\n\
DTEND;VALUE=DATE:20240316\r\n\
SUMMARY:Added by hand\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
    )
    .unwrap();

    run(&StaticFeed(FEED), &path, InvalidRecordPolicy::Abort).unwrap();
    let first_output = std::fs::read_to_string(&path).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(1100));
    run(&StaticFeed(FEED), &path, InvalidRecordPolicy::Abort).unwrap();
    let second_output = std::fs::read_to_string(&path).unwrap();

    assert_eq!(first_output, second_output);
    let (store, _) = CalendarStore::load_or_create(&path, DEFAULT_PRODUCT_ID).unwrap();
    let hand_made = store.get("hand-made@calendar").expect("Should be preserved");
    assert_eq!(hand_made.summary.as_deref(), Some("Added by hand"));
}
