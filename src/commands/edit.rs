use anyhow::Result;
use dialoguer::Input;
use owo_colors::OwoColorize;
use tripcal_core::EventRecord;
use tripcal_core::config::TripCalConfig;

use super::EventFields;

pub async fn run(config: &TripCalConfig, id: &str, fields: EventFields) -> Result<()> {
    let itinerary = super::open(config).await?;

    let Some(current) = itinerary.get(id) else {
        anyhow::bail!("Event '{id}' not found. Run `tripcal list` to see event ids.");
    };

    let fields = if fields.is_empty() {
        prompt_fields(&current)?
    } else {
        fields
    };

    let patch = fields.into_patch(&current.notes.photos)?;
    let event = itinerary.update(id, patch).await?;
    println!("{}", format!("  Updated: {event}").yellow());

    Ok(())
}

/// Ask for every field, offering the current value as the default.
fn prompt_fields(current: &EventRecord) -> Result<EventFields> {
    let notes = &current.notes;

    Ok(EventFields {
        title: Some(prompt("  Title", &current.title)?),
        start: Some(prompt("  Start", &current.start)?),
        end: Some(prompt("  End", current.end.as_deref().unwrap_or_default())?),
        address: Some(prompt("  Address", &current.address)?),
        reservation: Some(prompt("  Reservation", &notes.reservation)?),
        cost: Some(prompt("  Cost", &notes.cost)?),
        directions: Some(prompt("  Directions", &notes.directions)?),
        to_bring: Some(prompt("  To bring", notes.to_bring.as_deref().unwrap_or_default())?),
        links: Some(prompt("  Links (comma separated)", &notes.links.join(", "))?),
        photos: Vec::new(),
    })
}

fn prompt(label: &str, current: &str) -> Result<String> {
    Ok(Input::new()
        .with_prompt(label)
        .with_initial_text(current)
        .allow_empty(true)
        .interact_text()?)
}
