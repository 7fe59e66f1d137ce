//! VEVENT block splitting and per-block event mapping.

use std::fmt;

use crate::event::{Event, EventTime, sort_by_start};

use super::line::{ContentLine, unfold};
use super::value::{parse_date_time, parse_duration, unescape_text};

/// A VEVENT block that could not be turned into an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Zero-based index of the block within the feed
    pub block: usize,
    pub reason: String,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VEVENT #{}: {}", self.block, self.reason)
    }
}

impl std::error::Error for ParseFailure {}

struct RawBlock {
    lines: Vec<String>,
    terminated: bool,
}

/// Parse every VEVENT block independently.
///
/// One entry per block, in feed order. A broken block never affects its
/// siblings.
pub fn parse_blocks(text: &str) -> Vec<Result<Event, ParseFailure>> {
    split_vevents(&unfold(text))
        .into_iter()
        .enumerate()
        .map(|(block, raw)| {
            if !raw.terminated {
                return Err(ParseFailure {
                    block,
                    reason: "missing END:VEVENT".to_string(),
                });
            }
            event_from_block(&raw.lines).map_err(|reason| ParseFailure { block, reason })
        })
        .collect()
}

/// Parse a feed into events sorted by start.
///
/// Blocks that fail to parse are logged and skipped.
pub fn parse_feed(text: &str) -> Vec<Event> {
    let mut events: Vec<Event> = parse_blocks(text)
        .into_iter()
        .filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(failure) => {
                tracing::warn!(block = failure.block, reason = %failure.reason, "Skipping VEVENT");
                None
            }
        })
        .collect();

    sort_by_start(&mut events);
    events
}

fn split_vevents(lines: &[String]) -> Vec<RawBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<RawBlock> = None;
    // Nesting depth of sub-components (VALARM etc.) inside the current VEVENT
    let mut depth = 0usize;

    for line in lines {
        let trimmed = line.trim();
        let (name, value) = match trimmed.split_once(':') {
            Some((name, value)) => (name.trim().to_ascii_uppercase(), value.trim()),
            None => (String::new(), ""),
        };

        let is_vevent = value.eq_ignore_ascii_case("VEVENT");

        match (name.as_str(), current.is_some()) {
            ("BEGIN", _) if is_vevent => {
                // A VEVENT opening inside another one: the first is broken.
                if let Some(broken) = current.take() {
                    blocks.push(broken);
                }
                current = Some(RawBlock {
                    lines: Vec::new(),
                    terminated: false,
                });
                depth = 0;
            }
            ("END", true) if is_vevent => {
                if let Some(mut block) = current.take() {
                    block.terminated = true;
                    blocks.push(block);
                }
            }
            ("BEGIN", true) => depth += 1,
            ("END", true) if depth > 0 => depth -= 1,
            (_, true) if depth == 0 && !trimmed.is_empty() => {
                if let Some(block) = current.as_mut() {
                    block.lines.push(line.clone());
                }
            }
            _ => {}
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }

    blocks
}

fn event_from_block(lines: &[String]) -> Result<Event, String> {
    let mut title = String::new();
    let mut start: Option<Result<EventTime, String>> = None;
    let mut end: Option<EventTime> = None;
    let mut duration = None;
    let mut location = None;
    let mut description = None;
    let mut attendees = Vec::new();

    for raw in lines {
        let Some(line) = ContentLine::parse(raw) else {
            continue;
        };

        match line.name.as_str() {
            "SUMMARY" => title = text_value(line.value),
            "DTSTART" => {
                start = Some(
                    date_value(&line).ok_or_else(|| format!("invalid DTSTART '{}'", line.value)),
                );
            }
            "DTEND" => end = date_value(&line),
            "DURATION" => duration = parse_duration(line.value),
            "LOCATION" => location = non_empty(text_value(line.value)),
            "DESCRIPTION" => description = non_empty(text_value(line.value)),
            "ATTENDEE" => attendees.extend(attendee_value(&line)),
            _ => {}
        }
    }

    let start = start.ok_or_else(|| "missing DTSTART".to_string())??;

    if end.is_none() {
        if let (Some(duration), EventTime::DateTime(at)) = (duration, start) {
            // An end past the representable range is left unset.
            end = at.checked_add_signed(duration).map(EventTime::DateTime);
        }
    }

    Ok(Event {
        title,
        start,
        end,
        location,
        description,
        attendees,
    })
}

fn text_value(value: &str) -> String {
    unescape_text(value.trim()).trim().to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn date_value(line: &ContentLine<'_>) -> Option<EventTime> {
    let parsed = parse_date_time(line.value)?;
    match line.param("VALUE") {
        Some(kind) if kind.eq_ignore_ascii_case("DATE") => Some(EventTime::Date(parsed.date())),
        _ => Some(parsed),
    }
}

fn attendee_value(line: &ContentLine<'_>) -> Option<String> {
    let value = line.value.trim();
    let address = value
        .get(..7)
        .filter(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
        .map(|_| &value[7..])
        .unwrap_or(value)
        .trim();

    if !address.is_empty() {
        return Some(address.to_string());
    }
    line.param("CN")
        .map(|cn| cn.trim().to_string())
        .filter(|cn| !cn.is_empty())
}
