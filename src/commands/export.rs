use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use tripcal_core::Itinerary;
use tripcal_core::config::TripCalConfig;

use crate::render::pluralize;

pub async fn run(config: &TripCalConfig, output: Option<PathBuf>) -> Result<()> {
    let itinerary = super::open(config).await?;
    let blob = itinerary.export()?;

    let path = output
        .unwrap_or_else(|| PathBuf::from(Itinerary::export_file_name(Utc::now().date_naive())));

    if path.as_os_str() == "-" {
        println!("{blob}");
        return Ok(());
    }

    std::fs::write(&path, blob).with_context(|| format!("Could not write {}", path.display()))?;

    let count = itinerary.events().len();
    println!("Exported {} {} to {}", count, pluralize("event", count), path.display());
    Ok(())
}
