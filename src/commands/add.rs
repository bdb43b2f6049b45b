use anyhow::Result;
use dialoguer::Input;
use owo_colors::OwoColorize;
use tripcal_core::config::TripCalConfig;
use tripcal_core::event::parse_timestamp;

use super::EventFields;

pub async fn run(config: &TripCalConfig, mut fields: EventFields) -> Result<()> {
    let interactive = fields.title.is_none() || fields.start.is_none();

    if fields.title.is_none() {
        fields.title = Some(Input::<String>::new().with_prompt("  Title").interact_text()?);
    }
    if fields.start.is_none() {
        fields.start = Some(prompt_start()?);
    }
    if interactive && fields.address.is_none() {
        fields.address = Some(prompt_optional("  Where? (skip)")?);
    }

    let patch = fields.into_patch(&[])?;
    let itinerary = super::open(config).await?;
    let event = itinerary.create(patch).await?;

    if interactive {
        println!();
    }
    println!("{}", format!("  Created: {event} [{}]", event.id).green());

    Ok(())
}

/// Ask for a start time until one parses.
fn prompt_start() -> Result<String> {
    loop {
        let input: String = Input::new()
            .with_prompt("  Start (YYYY-MM-DDTHH:MM)")
            .interact_text()?;
        if parse_timestamp(&input).is_some() {
            return Ok(input);
        }
        eprintln!("  {}", format!("Could not parse date/time: \"{input}\"").red());
    }
}

fn prompt_optional(prompt: &str) -> Result<String> {
    Ok(Input::new()
        .with_prompt(prompt)
        .default(String::new())
        .show_default(false)
        .interact_text()?)
}
