use anyhow::Result;
use owo_colors::OwoColorize;
use tripcal_core::EventRecord;
use tripcal_core::config::TripCalConfig;

use crate::render::{Render, format_date_label};

pub async fn run(config: &TripCalConfig) -> Result<()> {
    let itinerary = super::open(config).await?;
    print_events(&itinerary.sorted_by_start());
    Ok(())
}

/// Print events grouped by day. Expects them sorted by start.
pub fn print_events(events: &[EventRecord]) {
    if events.is_empty() {
        println!("{}", "No events".dimmed());
        return;
    }

    let mut current_date: Option<String> = None;

    for event in events {
        let date_label = match event.start_time() {
            Some(start) => format_date_label(start.date()),
            None => "Unscheduled".to_string(),
        };

        if current_date.as_ref() != Some(&date_label) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", date_label.bold());
            current_date = Some(date_label);
        }

        println!("{}", event.render());
    }
}
