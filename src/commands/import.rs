use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tripcal_core::config::TripCalConfig;
use tripcal_core::{Itinerary, Mode};

use crate::render::pluralize;
use crate::utils::tui;

pub async fn run(config: &TripCalConfig, file: &Path, yes: bool) -> Result<()> {
    let blob = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Could not read {}", file.display()))?;

    // Refuse bad files before asking anything.
    let incoming = Itinerary::parse_import(&blob)?;

    let itinerary = super::open(config).await?;
    let current = itinerary.events().len();

    let prompt = match itinerary.mode() {
        Mode::Collaborative => format!(
            "Replace the shared itinerary ({} {}) with {} imported? Everyone editing it will see the change.",
            current,
            pluralize("event", current),
            incoming.len()
        ),
        Mode::Local => format!(
            "Replace all {} {} with {} imported?",
            current,
            pluralize("event", current),
            incoming.len()
        ),
    };

    if !tui::confirm(prompt, yes)? {
        return Ok(());
    }

    let events = itinerary.import(&blob).await?;
    println!(
        "{}",
        format!("  Imported {} {}", events.len(), pluralize("event", events.len())).green()
    );

    Ok(())
}
