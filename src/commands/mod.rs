pub mod add;
pub mod delete;
pub mod edit;
pub mod export;
pub mod import;
pub mod list;
pub mod reset;
pub mod show;
pub mod status;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tripcal_core::config::TripCalConfig;
use tripcal_core::event::split_links;
use tripcal_core::{EventPatch, Itinerary};

use crate::utils::{photo, tui};

/// Event fields shared by `add` and `edit`.
#[derive(Args, Debug, Default)]
pub struct EventFields {
    /// Event title
    #[arg(short, long)]
    pub title: Option<String>,

    /// Start date/time (e.g. "2026-01-26T15:20")
    #[arg(short, long)]
    pub start: Option<String>,

    /// End date/time. Defaults to one hour after the start; pass "" to recompute it
    #[arg(short, long)]
    pub end: Option<String>,

    /// Where it happens, used for directions
    #[arg(short, long)]
    pub address: Option<String>,

    /// Booking or confirmation details
    #[arg(long)]
    pub reservation: Option<String>,

    /// Price, as free text
    #[arg(long)]
    pub cost: Option<String>,

    /// How to get there
    #[arg(long)]
    pub directions: Option<String>,

    /// Things to bring along
    #[arg(long)]
    pub to_bring: Option<String>,

    /// Comma separated list of links
    #[arg(long)]
    pub links: Option<String>,

    /// Image file to attach (repeatable)
    #[arg(long = "photo")]
    pub photos: Vec<PathBuf>,
}

impl EventFields {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.address.is_none()
            && self.reservation.is_none()
            && self.cost.is_none()
            && self.directions.is_none()
            && self.to_bring.is_none()
            && self.links.is_none()
            && self.photos.is_empty()
    }

    /// New photos are added after `existing_photos`.
    pub fn into_patch(self, existing_photos: &[String]) -> Result<EventPatch> {
        let photos = if self.photos.is_empty() {
            None
        } else {
            let mut all = existing_photos.to_vec();
            for path in &self.photos {
                all.push(photo::data_uri(path)?);
            }
            Some(all)
        };

        Ok(EventPatch {
            title: self.title,
            start: self.start,
            end: self.end,
            address: self.address,
            reservation: self.reservation,
            cost: self.cost,
            directions: self.directions,
            to_bring: self.to_bring,
            links: self.links.as_deref().map(split_links),
            photos,
        })
    }
}

/// Load the itinerary from whichever source is available.
pub async fn open(config: &TripCalConfig) -> Result<Itinerary> {
    let mut itinerary = Itinerary::from_config(config);

    let spinner = tui::create_spinner("Loading itinerary".to_string());
    let result = itinerary.initialize().await;
    spinner.finish_and_clear();

    result?;
    Ok(itinerary)
}
