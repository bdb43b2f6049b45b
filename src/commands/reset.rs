use anyhow::Result;
use owo_colors::OwoColorize;
use tripcal_core::Mode;
use tripcal_core::config::TripCalConfig;

use crate::utils::tui;

pub async fn run(config: &TripCalConfig, yes: bool) -> Result<()> {
    let itinerary = super::open(config).await?;

    if itinerary.mode() != Mode::Collaborative {
        anyhow::bail!(
            "Reset only applies to a shared itinerary.\n\n\
            Configure a realtime database in {} to collaborate, or use\n  \
            tripcal import <file>\n\
            to replace the local itinerary.",
            TripCalConfig::config_path()?.display()
        );
    }

    let prompt = "Replace the shared itinerary with the default one? This affects everyone editing it.";
    if !tui::confirm(prompt.to_string(), yes)? {
        return Ok(());
    }

    let events = itinerary.reset_to_defaults().await?;
    println!("{}", format!("  Reset to {} default events", events.len()).green());

    Ok(())
}
