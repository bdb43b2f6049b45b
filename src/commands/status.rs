use anyhow::Result;
use owo_colors::OwoColorize;
use tripcal_core::Mode;
use tripcal_core::config::TripCalConfig;
use tripcal_core::defaults::DefaultsSource;

use crate::render::{Render, pluralize};

pub async fn run(config: &TripCalConfig) -> Result<()> {
    let itinerary = super::open(config).await?;
    let events = itinerary.events();

    println!("Mode:      {}", itinerary.mode().render());

    if itinerary.mode() == Mode::Collaborative {
        if let Some(remote) = &config.remote {
            println!("Database:  {}", remote.database_url);
            println!("Path:      /{}", remote.collection_path);
        }
    } else {
        println!("Storage:   {}", config.local_store().dir().display());
        if config.remote.as_ref().is_some_and(|r| !r.is_placeholder()) {
            println!("{}", "           realtime database configured but unreachable".yellow());
        }
    }

    let defaults = match config.default_dataset().source() {
        DefaultsSource::Url(url) => url.to_string(),
        DefaultsSource::File(path) => path.display().to_string(),
        DefaultsSource::Embedded => "built-in".to_string(),
    };
    println!("Defaults:  {}", defaults.dimmed());
    println!("Events:    {} {}", events.len(), pluralize("event", events.len()));

    Ok(())
}
