//! Trip event types and normalization.
//!
//! Timestamps are kept as the strings they were entered with so that exported
//! files round-trip untouched. They are parsed on demand as local wall-clock
//! times, the way a `datetime-local` form field reads them.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{TripCalError, TripCalResult};

/// Length given to events that have no usable end time.
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Format used when tripcal writes a timestamp itself.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// One item of the trip itinerary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default, skip_serializing_if = "String::is_empty", deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub end: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: Notes,

    /// Fields tripcal does not know about, kept so they survive a save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Free-form notes attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notes {
    #[serde(default, deserialize_with = "lenient_string")]
    pub reservation: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cost: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub directions: String,
    #[serde(
        rename = "toBring",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_opt_string"
    )]
    pub to_bring: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Vec<String>,
    /// Attached images as `data:` URIs.
    #[serde(default, deserialize_with = "null_as_default")]
    pub photos: Vec<String>,
}

impl EventRecord {
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.start)
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.end.as_deref().and_then(parse_timestamp)
    }

    /// Fill in whatever a stored record may be missing: an id, and an end
    /// time one hour after the start. Returns true if anything changed.
    ///
    /// Running it a second time never changes the record again.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;

        if self.id.trim().is_empty() {
            self.id = new_id();
            changed = true;
        }

        if self.end_time().is_none() {
            if let Some(start) = self.start_time() {
                let end = start + Duration::minutes(DEFAULT_DURATION_MINUTES);
                self.end = Some(format_timestamp(end));
                changed = true;
            }
        }

        changed
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Only the start time is required to be meaningful.
    pub fn validate(&self) -> TripCalResult<()> {
        if self.start_time().is_none() {
            return Err(TripCalError::Validation(format!(
                "start time '{}' of '{}' is not a valid date and time",
                self.start, self.title
            )));
        }
        Ok(())
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.title.is_empty() {
            write!(f, "(untitled)")
        } else {
            write!(f, "{}", self.title)
        }
    }
}

/// Normalize every record of a collection, also re-assigning ids that are
/// already taken by an earlier record. Returns true if anything changed.
pub fn normalize_all(records: &mut [EventRecord]) -> bool {
    let mut changed = false;
    let mut seen = HashSet::new();

    for record in records.iter_mut() {
        changed |= record.normalize();
        if !seen.insert(record.id.clone()) {
            record.id = new_id();
            seen.insert(record.id.clone());
            changed = true;
        }
    }

    changed
}

/// Sort by start time, oldest first. Records whose start cannot be parsed go
/// last, in their existing order.
pub fn sort_by_start(records: &mut [EventRecord]) {
    records.sort_by_key(|r| match r.start_time() {
        Some(start) => (0, Some(start)),
        None => (1, None),
    });
}

pub fn new_id() -> String {
    format!("evt-{}", Uuid::new_v4())
}

pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn format_timestamp(dt: NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Split a comma separated list of links, dropping empty entries.
pub fn split_links(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// A partial record, as submitted by an edit form. `None` leaves the field
/// as it is.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start: Option<String>,
    /// An empty string clears the end, so it gets recomputed from the start.
    pub end: Option<String>,
    pub address: Option<String>,
    pub reservation: Option<String>,
    pub cost: Option<String>,
    pub directions: Option<String>,
    pub to_bring: Option<String>,
    pub links: Option<Vec<String>>,
    pub photos: Option<Vec<String>>,
}

impl EventPatch {
    pub fn apply(&self, record: &mut EventRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(start) = &self.start {
            record.start = start.clone();
        }
        if let Some(end) = &self.end {
            record.end = if end.trim().is_empty() { None } else { Some(end.clone()) };
        }
        if let Some(address) = &self.address {
            record.address = address.clone();
        }

        let notes = &mut record.notes;
        if let Some(reservation) = &self.reservation {
            notes.reservation = reservation.clone();
        }
        if let Some(cost) = &self.cost {
            notes.cost = cost.clone();
        }
        if let Some(directions) = &self.directions {
            notes.directions = directions.clone();
        }
        if let Some(to_bring) = &self.to_bring {
            notes.to_bring = if to_bring.is_empty() { None } else { Some(to_bring.clone()) };
        }
        if let Some(links) = &self.links {
            notes.links = links.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).map(String::from).collect();
        }
        if let Some(photos) = &self.photos {
            notes.photos = photos.clone();
        }
    }

    pub fn into_record(self) -> EventRecord {
        let mut record = EventRecord::default();
        self.apply(&mut record);
        record
    }
}

/// Accept strings, and turn null into an empty string and numbers or
/// booleans into their text.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(serde::de::Error::custom(format!("expected a string, got {other}"))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(start: &str) -> EventRecord {
        EventRecord {
            title: "A".into(),
            start: start.into(),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_assigns_id_and_one_hour_end() {
        let mut r = record("2026-01-01T10:00");
        assert!(r.normalize());

        assert!(r.id.starts_with("evt-"));
        assert_eq!(r.end.as_deref(), Some("2026-01-01T11:00"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = record("2026-01-26T18:50:00").normalized();
        let mut twice = once.clone();

        assert!(!twice.normalize());
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_keeps_existing_id_and_end() {
        let mut r = EventRecord {
            id: "e1".into(),
            start: "2026-01-26T15:20:00".into(),
            end: Some("2026-01-26T17:15:00".into()),
            ..Default::default()
        };

        assert!(!r.normalize());
        assert_eq!(r.id, "e1");
        assert_eq!(r.end.as_deref(), Some("2026-01-26T17:15:00"));
    }

    #[test]
    fn normalize_replaces_unparseable_end() {
        let mut r = record("2026-01-31T23:30");
        r.end = Some("later".into());

        r.normalize();
        assert_eq!(r.end.as_deref(), Some("2026-02-01T00:30"));
    }

    #[test]
    fn normalize_leaves_end_alone_when_start_is_invalid() {
        let mut r = record("not a date");
        r.normalize();

        assert!(!r.id.is_empty());
        assert_eq!(r.end, None);
        assert!(r.validate().is_err());
    }

    #[test]
    fn normalize_all_reassigns_duplicate_ids() {
        let mut records = vec![record("2026-01-01T10:00"), record("2026-01-02T10:00")];
        records[0].id = "same".into();
        records[1].id = "same".into();

        assert!(normalize_all(&mut records));
        assert_eq!(records[0].id, "same");
        assert_ne!(records[1].id, "same");
        assert!(!normalize_all(&mut records));
    }

    #[test]
    fn parses_common_timestamp_shapes() {
        let expected = NaiveDate::from_ymd_opt(2026, 1, 26)
            .unwrap()
            .and_hms_opt(15, 20, 0)
            .unwrap();

        assert_eq!(parse_timestamp("2026-01-26T15:20:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-01-26T15:20"), Some(expected));
        assert_eq!(parse_timestamp("2026-01-26 15:20"), Some(expected));
        assert!(parse_timestamp("2026-01-26T15:20:00Z").is_some());
        assert!(parse_timestamp("2026-01-26").is_some());
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("01-26-2026 3:20 PM"), None);
    }

    #[test]
    fn deserializes_loosely_typed_records() {
        let value = json!({
            "title": null,
            "start": "2026-01-27T12:00:00",
            "address": "Waunn.Tokyo",
            "notes": { "cost": 3000, "links": null },
            "color": "#ff0000"
        });

        let r: EventRecord = serde_json::from_value(value).unwrap();
        assert_eq!(r.title, "");
        assert_eq!(r.notes.cost, "3000");
        assert!(r.notes.links.is_empty());
        assert_eq!(r.extra.get("color"), Some(&json!("#ff0000")));

        let back = serde_json::to_value(&r).unwrap();
        assert_eq!(back["color"], json!("#ff0000"));
        assert!(back.get("id").is_none());
        assert!(back["notes"].get("toBring").is_none());
    }

    #[test]
    fn split_links_drops_empty_entries() {
        assert_eq!(
            split_links(" https://a.example , ,https://b.example,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(split_links("").is_empty());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut r = EventRecord {
            id: "e1".into(),
            title: "A".into(),
            start: "2026-01-01T10:00".into(),
            end: Some("2026-01-01T11:00".into()),
            address: "Hotel A".into(),
            ..Default::default()
        };

        let patch = EventPatch {
            title: Some("B".into()),
            to_bring: Some("Passport".into()),
            ..Default::default()
        };
        patch.apply(&mut r);

        assert_eq!(r.title, "B");
        assert_eq!(r.address, "Hotel A");
        assert_eq!(r.end.as_deref(), Some("2026-01-01T11:00"));
        assert_eq!(r.notes.to_bring.as_deref(), Some("Passport"));
    }

    #[test]
    fn patch_with_empty_end_recomputes_it() {
        let mut r = EventRecord {
            start: "2026-01-01T10:00".into(),
            end: Some("2026-01-01T18:00".into()),
            ..Default::default()
        };

        EventPatch {
            start: Some("2026-01-01T12:00".into()),
            end: Some(String::new()),
            ..Default::default()
        }
        .apply(&mut r);
        r.normalize();

        assert_eq!(r.end.as_deref(), Some("2026-01-01T13:00"));
    }

    #[test]
    fn sort_by_start_puts_invalid_starts_last() {
        let mut records = vec![
            record("garbage"),
            record("2026-02-01T09:00"),
            record("2026-01-26T15:20:00"),
        ];
        sort_by_start(&mut records);

        assert_eq!(records[0].start, "2026-01-26T15:20:00");
        assert_eq!(records[1].start, "2026-02-01T09:00");
        assert_eq!(records[2].start, "garbage");
    }
}
