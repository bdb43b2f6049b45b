use anyhow::Result;
use owo_colors::OwoColorize;
use tracing::info;
use tripcal_core::config::TripCalConfig;
use tripcal_core::travel::TravelMode;

use crate::render::{Render, render_details};

pub async fn run(config: &TripCalConfig, id: &str, open_mode: Option<TravelMode>) -> Result<()> {
    let itinerary = super::open(config).await?;

    let Some(event) = itinerary.get(id) else {
        anyhow::bail!("Event '{id}' not found. Run `tripcal list` to see event ids.");
    };

    println!("{}", render_details(&event));

    let Some(travel) = itinerary.travel_links(id) else {
        println!("\n{}", "Last stop of the trip".dimmed());
        return Ok(());
    };

    println!("\n{}", travel.render());

    if let Some(mode) = open_mode {
        if let Some((_, url)) = travel.links.iter().find(|(m, _)| *m == mode) {
            info!(%url, "Opening {mode} directions");
            open::that(url)?;
        }
    }

    Ok(())
}
