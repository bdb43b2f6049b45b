//! Directions deep links between consecutive stops.

use std::fmt;
use std::str::FromStr;

use crate::error::TripCalError;
use crate::event::{EventRecord, sort_by_start};

const DIRECTIONS_BASE: &str = "https://www.google.com/maps/dir/?api=1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelMode {
    Driving,
    Walking,
    Transit,
}

impl TravelMode {
    pub const ALL: [TravelMode; 3] = [TravelMode::Driving, TravelMode::Walking, TravelMode::Transit];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Transit => "transit",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = TripCalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "driving" | "drive" | "car" => Ok(TravelMode::Driving),
            "walking" | "walk" => Ok(TravelMode::Walking),
            "transit" | "train" => Ok(TravelMode::Transit),
            other => Err(TripCalError::Validation(format!(
                "unknown travel mode '{other}' (expected driving, walking or transit)"
            ))),
        }
    }
}

/// Directions URL from `origin` to `destination`. Addresses are free text and
/// only percent-encoded.
pub fn directions_url(origin: &str, destination: &str, mode: TravelMode) -> String {
    format!(
        "{DIRECTIONS_BASE}&origin={}&destination={}&travelmode={}",
        urlencoding::encode(origin),
        urlencoding::encode(destination),
        mode.as_str()
    )
}

/// Links from one event to the event that follows it in time.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelLinks {
    pub next: EventRecord,
    pub links: Vec<(TravelMode, String)>,
}

/// Build the links from the event `id` to the next one by start time. `None`
/// when `id` is unknown or is the last stop.
pub fn links_to_next(events: &[EventRecord], id: &str) -> Option<TravelLinks> {
    let mut ordered = events.to_vec();
    sort_by_start(&mut ordered);

    let position = ordered.iter().position(|e| e.id == id)?;
    let from = &ordered[position];
    let next = ordered.get(position + 1)?.clone();

    let links = TravelMode::ALL
        .iter()
        .map(|mode| (*mode, directions_url(&from.address, &next.address, *mode)))
        .collect();

    Some(TravelLinks { next, links })
}
