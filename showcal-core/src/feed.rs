//! Venue event feed: record types and the HTTP source.
//!
//! The feed is a JSON document shaped `{ "meta": ..., "events": [ ... ] }`.
//! Records are loosely structured; every field is optional at the type level
//! and the mapper decides which ones are mandatory.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Deserializer};

use crate::error::{ShowcalError, ShowcalResult};

/// A complete feed document
#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
    pub events: Vec<FeedRecord>,
}

impl Feed {
    pub fn from_json(body: &str) -> ShowcalResult<Self> {
        serde_json::from_str(body).map_err(|e| ShowcalError::FeedParse(e.to_string()))
    }
}

/// One event as published by the venue
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    pub event_id: Option<EventId>,
    pub title: Option<TitleBlock>,
    pub venue: Option<VenueBlock>,

    #[serde(default, deserialize_with = "non_empty")]
    pub event_date_time: Option<String>,
    #[serde(rename = "eventDateTimeUTC", default, deserialize_with = "non_empty")]
    pub event_date_time_utc: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub door_date_time: Option<String>,
    #[serde(rename = "doorDateTimeUTC", default, deserialize_with = "non_empty")]
    pub door_date_time_utc: Option<String>,
    #[serde(rename = "createdUTC", default, deserialize_with = "non_empty")]
    pub created_utc: Option<String>,
    #[serde(rename = "modifiedUTC", default, deserialize_with = "non_empty")]
    pub modified_utc: Option<String>,

    pub associations: Option<Associations>,
    pub ticketing: Option<TicketingBlock>,
}

impl FeedRecord {
    /// Headliners in feed order (empty when the association block is missing)
    pub fn headliners(&self) -> &[Headliner] {
        self.associations
            .as_ref()
            .map(|a| a.headliners.as_slice())
            .unwrap_or_default()
    }

    /// Identifier used in log lines and errors, even when `eventId` is missing
    pub fn label(&self) -> String {
        match &self.event_id {
            Some(id) => id.to_string(),
            None => "<no eventId>".to_string(),
        }
    }
}

/// `eventId` is published as a string by some feeds and as a number by others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventId(String);

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        EventId(value.to_string())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => EventId(s),
            Raw::Number(n) => EventId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleBlock {
    pub event_title_text: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub supporting_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VenueBlock {
    pub title: Option<String>,
    pub address_line: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Associations {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub headliners: Vec<Headliner>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headliner {
    #[serde(default)]
    pub under21: Option<bool>,
    #[serde(default, deserialize_with = "non_empty")]
    pub minor_category_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketingBlock {
    pub url: Option<String>,
}

/// Treat `""` (and whitespace-only strings) the same as a missing field.
fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// `null` reads the same as a missing list.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Something that can produce the current list of feed records
pub trait FeedSource {
    fn fetch(&self) -> ShowcalResult<Vec<FeedRecord>>;

    /// Human readable origin, for progress output
    fn describe(&self) -> String;
}

/// Feed downloaded with a single blocking GET
pub struct HttpFeed {
    url: String,
    client: Client,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> ShowcalResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("showcal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ShowcalError::Transport(e.to_string()))?;

        Ok(HttpFeed {
            url: url.into(),
            client,
        })
    }
}

impl FeedSource for HttpFeed {
    fn fetch(&self) -> ShowcalResult<Vec<FeedRecord>> {
        tracing::debug!(url = %self.url, "fetching feed");

        let body = self
            .client
            .get(&self.url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|e| ShowcalError::Transport(e.to_string()))?;

        let feed = Feed::from_json(&body)?;
        tracing::debug!(count = feed.events.len(), "feed parsed");

        Ok(feed.events)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_accepts_string_and_number() {
        let feed = Feed::from_json(r#"{"events": [{"eventId": "765964"}, {"eventId": 42}]}"#)
            .expect("Should parse");

        let ids: Vec<String> = feed.events.iter().map(|r| r.label()).collect();
        assert_eq!(ids, vec!["765964", "42"]);
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        let feed = Feed::from_json(
            r#"{"events": [{
                "eventId": "1",
                "doorDateTime": "",
                "title": {"eventTitleText": "Band", "supportingText": "  "}
            }]}"#,
        )
        .expect("Should parse");

        let record = &feed.events[0];
        assert!(record.door_date_time.is_none());
        assert!(record.title.as_ref().unwrap().supporting_text.is_none());
    }

    #[test]
    fn test_null_blocks_are_tolerated() {
        let feed = Feed::from_json(
            r#"{"meta": {"total": 1}, "events": [{"eventId": "1", "associations": null, "ticketing": null}]}"#,
        )
        .expect("Should parse");

        let record = &feed.events[0];
        assert!(record.headliners().is_empty());
        assert!(record.ticketing.is_none());
    }

    #[test]
    fn test_null_headliners_mean_no_headliners() {
        let feed = Feed::from_json(
            r#"{"events": [{"eventId": "1", "associations": {"headliners": null}}]}"#,
        )
        .expect("Should parse");

        assert!(feed.events[0].headliners().is_empty());
    }

    #[test]
    fn test_feed_without_events_is_a_parse_error() {
        let err = Feed::from_json(r#"{"meta": {}}"#).unwrap_err();
        assert!(matches!(err, ShowcalError::FeedParse(_)), "Got {:?}", err);

        let err = Feed::from_json("<html>").unwrap_err();
        assert!(matches!(err, ShowcalError::FeedParse(_)), "Got {:?}", err);
    }

    #[test]
    fn test_headliner_fields() {
        let feed = Feed::from_json(
            r#"{"events": [{"eventId": "1", "associations": {"headliners": [
                {"under21": true, "minorCategoryText": "Rock"},
                {"under21": false}
            ]}}]}"#,
        )
        .expect("Should parse");

        let headliners = feed.events[0].headliners();
        assert_eq!(headliners.len(), 2);
        assert_eq!(headliners[0].under21, Some(true));
        assert_eq!(headliners[0].minor_category_text.as_deref(), Some("Rock"));
        assert_eq!(headliners[1].minor_category_text, None);
    }
}
