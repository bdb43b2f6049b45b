//! Terminal rendering for itinerary types, colored with owo_colors.

use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;
use tripcal_core::travel::TravelLinks;
use tripcal_core::{EventRecord, Mode};

pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventRecord {
    /// One line for list views: time range, title and id.
    fn render(&self) -> String {
        let time = match (self.start_time(), self.end_time()) {
            (Some(start), Some(end)) if start.date() == end.date() => {
                format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
            }
            (Some(start), _) => format!("{:>11}", start.format("%H:%M")),
            (None, _) => format!("{:>11}", "??:??"),
        };
        let id = format!("[{}]", self.id);

        format!("  {} {} {}", time, self, id.dimmed())
    }
}

impl Render for Mode {
    fn render(&self) -> String {
        match self {
            Mode::Collaborative => "collaborative".green().to_string(),
            Mode::Local => "local".yellow().to_string(),
        }
    }
}

impl Render for TravelLinks {
    fn render(&self) -> String {
        let mut lines = vec![format!("Next stop: {}", self.next.title.bold())];
        for (mode, url) in &self.links {
            lines.push(format!("  {:<8} {}", mode.as_str(), url.dimmed()));
        }
        lines.join("\n")
    }
}

/// Render every field of an event, skipping empty ones.
pub fn render_details(event: &EventRecord) -> String {
    let mut lines = vec![event.title.bold().to_string()];

    let mut field = |label: &str, value: &str| {
        if !value.is_empty() {
            lines.push(format!("  {:<12} {}", label.dimmed(), value));
        }
    };

    field("id", &event.id);
    field("start", &event.start);
    field("end", event.end.as_deref().unwrap_or_default());
    field("address", &event.address);
    field("reservation", &event.notes.reservation);
    field("cost", &event.notes.cost);
    field("directions", &event.notes.directions);
    field("to bring", event.notes.to_bring.as_deref().unwrap_or_default());

    for link in &event.notes.links {
        lines.push(format!("  {:<12} {}", "link".dimmed(), link.blue()));
    }
    if !event.notes.photos.is_empty() {
        lines.push(format!(
            "  {:<12} {} attached",
            "photos".dimmed(),
            event.notes.photos.len()
        ));
    }

    lines.join("\n")
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn format_date_label(date: NaiveDate) -> String {
    let today = Local::now().date_naive();

    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> EventRecord {
        EventRecord {
            id: "e1".into(),
            title: "teamLab Planets".into(),
            start: "2026-01-27T12:00".into(),
            end: Some("2026-01-27T14:00".into()),
            ..Default::default()
        }
    }

    #[test]
    fn list_line_shows_time_range_and_id() {
        let line = event().render();
        assert!(line.contains("12:00-14:00"));
        assert!(line.contains("teamLab Planets"));
        assert!(line.contains("[e1]"));
    }

    #[test]
    fn details_skip_empty_fields() {
        let mut e = event();
        e.notes.cost = "3800 JPY".into();

        let details = render_details(&e);
        assert!(details.contains("3800 JPY"));
        assert!(!details.contains("reservation"));
    }

    #[test]
    fn pluralizes_counts() {
        assert_eq!(pluralize("event", 1), "event");
        assert_eq!(pluralize("event", 31), "events");
    }
}
