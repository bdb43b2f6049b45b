use anyhow::Result;
use owo_colors::OwoColorize;
use tripcal_core::config::TripCalConfig;

use crate::utils::tui;

pub async fn run(config: &TripCalConfig, id: &str, yes: bool) -> Result<()> {
    let itinerary = super::open(config).await?;

    let Some(event) = itinerary.get(id) else {
        anyhow::bail!("Event '{id}' not found");
    };

    if !tui::confirm(format!("Delete \"{event}\"?"), yes)? {
        return Ok(());
    }

    itinerary.remove(id).await?;
    println!("{}", format!("  Deleted: {event}").red());

    Ok(())
}
