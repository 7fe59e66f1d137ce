use std::path::Path;

use anyhow::{Context, Result};
use calbus_core::format::{RelativeStyle, format_absolute, format_time_until};
use calbus_core::ics::parse_blocks;
use calbus_core::sort_by_start;
use chrono::Local;
use owo_colors::OwoColorize;

/// Print every event of a local .ics file with its display strings.
pub fn run(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Could not read {}", file.display()))?;
    let now = Local::now().naive_local();

    let mut events = Vec::new();
    let mut failures = 0;
    for result in parse_blocks(&text) {
        match result {
            Ok(event) => events.push(event),
            Err(failure) => {
                failures += 1;
                eprintln!("{} {failure}", "skipped".yellow());
            }
        }
    }
    sort_by_start(&mut events);

    for event in &events {
        let title = if event.title.is_empty() {
            "(no title)"
        } else {
            event.title.as_str()
        };
        println!(
            "{:<18} {:<20} {}",
            format_absolute(&event.start),
            format_time_until(event, now, RelativeStyle::Tiered).dimmed(),
            title.bold()
        );
    }

    println!();
    println!("{} events, {} skipped", events.len(), failures);
    Ok(())
}
