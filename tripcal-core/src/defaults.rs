//! Seed itinerary used when no other source has any events.
//!
//! The bundled `events.json` is compiled into the binary, so the embedded
//! fallback is the very same file a deployment ships next to the data.

use std::path::PathBuf;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::{TripCalError, TripCalResult};
use crate::event::EventRecord;

/// The bundled default itinerary, byte for byte.
pub const EMBEDDED_EVENTS_JSON: &str = include_str!("../assets/events.json");

/// Where the default itinerary is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultsSource {
    Url(url::Url),
    File(PathBuf),
    Embedded,
}

impl DefaultsSource {
    /// Interpret a configured location: `http(s)` URLs are fetched, anything
    /// else is a path, resolved against `base_dir` when relative.
    pub fn parse(location: &str, base_dir: &std::path::Path) -> Self {
        if let Ok(url) = url::Url::parse(location) {
            if matches!(url.scheme(), "http" | "https") {
                return DefaultsSource::Url(url);
            }
        }

        let path = PathBuf::from(shellexpand::tilde(location).into_owned());
        if path.is_absolute() {
            DefaultsSource::File(path)
        } else {
            DefaultsSource::File(base_dir.join(path))
        }
    }
}

/// Supplies the seed collection. A successful fetch is cached for the life of
/// the provider; failures are retried on the next call.
pub struct DefaultDataset {
    source: DefaultsSource,
    cache: OnceCell<Vec<EventRecord>>,
}

impl DefaultDataset {
    pub fn new(source: DefaultsSource) -> Self {
        DefaultDataset {
            source,
            cache: OnceCell::new(),
        }
    }

    pub fn embedded_only() -> Self {
        Self::new(DefaultsSource::Embedded)
    }

    pub fn source(&self) -> &DefaultsSource {
        &self.source
    }

    /// Never fails: any problem with the configured source yields the
    /// embedded itinerary instead.
    pub async fn load(&self) -> Vec<EventRecord> {
        if self.source == DefaultsSource::Embedded {
            return embedded_events();
        }

        let fetched = self
            .cache
            .get_or_try_init(|| fetch(&self.source))
            .await;

        match fetched {
            Ok(events) => {
                info!(count = events.len(), "Loaded default events from {:?}", self.source);
                events.clone()
            }
            Err(e) => {
                warn!("Could not load default events, using embedded set: {e}");
                embedded_events()
            }
        }
    }
}

/// Parse the embedded itinerary.
pub fn embedded_events() -> Vec<EventRecord> {
    match parse_events(EMBEDDED_EVENTS_JSON) {
        Ok(events) => events,
        Err(e) => {
            warn!("Embedded default events are unreadable: {e}");
            Vec::new()
        }
    }
}

async fn fetch(source: &DefaultsSource) -> TripCalResult<Vec<EventRecord>> {
    let body = match source {
        DefaultsSource::Url(url) => {
            let response = reqwest::get(url.clone()).await?;
            if !response.status().is_success() {
                return Err(TripCalError::Transport(format!(
                    "GET {} returned HTTP {}",
                    url,
                    response.status()
                )));
            }
            response.text().await?
        }
        DefaultsSource::File(path) => std::fs::read_to_string(path)?,
        DefaultsSource::Embedded => EMBEDDED_EVENTS_JSON.to_string(),
    };

    parse_events(&body)
}

fn parse_events(content: &str) -> TripCalResult<Vec<EventRecord>> {
    Ok(serde_json::from_str(content)?)
}
