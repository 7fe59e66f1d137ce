//! Provider-neutral event types.
//!
//! Every source (Google API, CalDAV, raw ICS feed) converts its payload into
//! these types. Times are naive wall-clock values: offsets reported by the
//! upstream are dropped, not resolved.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A calendar event (provider-neutral)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Display name, empty when the upstream has none
    pub title: String,
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub location: Option<String>,
    /// Stored untouched; display truncation happens at publish time
    pub description: Option<String>,
    /// Attendee identifiers (usually email addresses)
    pub attendees: Vec<String>,
}

/// Start or end of an event: a precise wall-clock time or a whole civil day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTime {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
}

impl EventTime {
    /// The value as a point in time. All-day values map to local midnight.
    pub fn to_naive(&self) -> NaiveDateTime {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => d.and_time(NaiveTime::MIN),
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::DateTime(dt) => dt.date(),
            EventTime::Date(d) => *d,
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Event {
    pub fn new(title: impl Into<String>, start: EventTime) -> Self {
        Event {
            title: title.into(),
            start,
            end: None,
            location: None,
            description: None,
            attendees: Vec::new(),
        }
    }

    pub fn with_end(mut self, end: EventTime) -> Self {
        self.end = Some(end);
        self
    }

    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }

    /// Whether the event has started at `now`.
    pub fn has_begun(&self, now: NaiveDateTime) -> bool {
        self.start.to_naive() <= now
    }

    /// Whether the event still counts as "next" at `now`.
    ///
    /// Future events always do. A timed event that has begun stays upcoming
    /// until its end; all-day events drop out once their day has started.
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        if !self.has_begun(now) {
            return true;
        }
        match (&self.start, &self.end) {
            (EventTime::DateTime(_), Some(end)) => end.to_naive() > now,
            _ => false,
        }
    }

    /// Whether the event overlaps `[from, to]`.
    pub fn overlaps(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        let start = self.start.to_naive();
        if start > to {
            return false;
        }
        if start >= from {
            return true;
        }
        match &self.end {
            Some(end) => end.to_naive() > from,
            None => false,
        }
    }

    /// Attendees joined for display.
    pub fn attendee_list(&self) -> String {
        self.attendees.join(", ")
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.start)
    }
}

/// Ordering used for every event list: ascending by start, all-day values
/// comparing as midnight of their date.
pub fn compare_by_start(a: &Event, b: &Event) -> Ordering {
    a.start.to_naive().cmp(&b.start.to_naive())
}

/// Stable in-place sort by [`compare_by_start`].
pub fn sort_by_start(events: &mut [Event]) {
    events.sort_by(compare_by_start);
}
