use anyhow::Result;
use chrono::Local;
use owo_colors::OwoColorize;
use tripcal_core::config::TripCalConfig;
use tripcal_core::event::sort_by_start;
use tripcal_core::{Itinerary, Mode};

use crate::render::pluralize;

use super::list::print_events;

pub async fn run(config: &TripCalConfig) -> Result<()> {
    let mut itinerary = Itinerary::from_config(config)
        .on_refresh(|events| {
            let mut events = events.to_vec();
            sort_by_start(&mut events);

            println!(
                "\n{} {} {}",
                Local::now().format("%H:%M:%S").dimmed(),
                events.len(),
                pluralize("event", events.len())
            );
            print_events(&events);
        })
        .on_connection_change(|connected| {
            let status = if connected {
                "connected".green().to_string()
            } else {
                "offline".yellow().to_string()
            };
            println!("{} {}", Local::now().format("%H:%M:%S").dimmed(), status);
        });

    itinerary.initialize().await?;

    if itinerary.mode() == Mode::Local {
        println!("\n{}", "No realtime database in use; nothing else will change.".dimmed());
        return Ok(());
    }

    println!("{}", "Watching for changes, press Ctrl-C to stop".dimmed());
    tokio::signal::ctrl_c().await?;
    itinerary.shutdown();

    Ok(())
}
