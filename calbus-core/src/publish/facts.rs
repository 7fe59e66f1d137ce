use std::fmt;

use chrono::NaiveDateTime;

use crate::constants::DESCRIPTION_DISPLAY_LIMIT;
use crate::error::CalBusError;
use crate::event::Event;
use crate::format::{RelativeStyle, clean_text, format_absolute, format_time_until, truncate_chars};
use crate::window::EventWindow;

/// Every key calbus publishes, relative to the configured topic prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    NextTitle,
    NextStart,
    NextEnd,
    NextLocation,
    NextDescription,
    NextAttendees,
    NextTimeUntil,
    /// `"{title} ({time_until})"`
    NextSummary,
    TodayCount,
    TodayList,
    /// Wall clock `HH:MM`, refreshed every minute
    TodayTime,
    Status,
}

impl Topic {
    pub const ALL: [Topic; 12] = [
        Topic::NextTitle,
        Topic::NextStart,
        Topic::NextEnd,
        Topic::NextLocation,
        Topic::NextDescription,
        Topic::NextAttendees,
        Topic::NextTimeUntil,
        Topic::NextSummary,
        Topic::TodayCount,
        Topic::TodayList,
        Topic::TodayTime,
        Topic::Status,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Topic::NextTitle => "next/title",
            Topic::NextStart => "next/start",
            Topic::NextEnd => "next/end",
            Topic::NextLocation => "next/location",
            Topic::NextDescription => "next/description",
            Topic::NextAttendees => "next/attendees",
            Topic::NextTimeUntil => "next/time_until",
            Topic::NextSummary => "next/summary",
            Topic::TodayCount => "today/count",
            Topic::TodayList => "today/list",
            Topic::TodayTime => "today/time",
            Topic::Status => "status",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One key/value pair for the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub topic: Topic,
    pub value: String,
    pub retained: bool,
}

impl Fact {
    /// A retained fact. Every calbus topic is retained.
    pub fn retained(topic: Topic, value: impl Into<String>) -> Self {
        Fact {
            topic,
            value: value.into(),
            retained: true,
        }
    }
}

/// Value of the `status` topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Initializing,
    Running,
    AuthenticationRequired,
    Error(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Initializing => f.write_str("initializing"),
            Status::Running => f.write_str("running"),
            Status::AuthenticationRequired => f.write_str("authentication_required"),
            Status::Error(message) => write!(f, "error: {message}"),
        }
    }
}

impl From<&CalBusError> for Status {
    fn from(err: &CalBusError) -> Self {
        if err.is_auth() {
            Status::AuthenticationRequired
        } else {
            Status::Error(err.to_string())
        }
    }
}

pub fn status_fact(status: &Status) -> Fact {
    Fact::retained(Topic::Status, status.to_string())
}

/// The full `next/*` fact set. With no event every value is `""`, so stale
/// retained values are cleared rather than left behind.
pub fn next_event_facts(event: Option<&Event>, now: NaiveDateTime, style: RelativeStyle) -> Vec<Fact> {
    let Some(event) = event else {
        return [
            Topic::NextTitle,
            Topic::NextStart,
            Topic::NextEnd,
            Topic::NextLocation,
            Topic::NextDescription,
            Topic::NextAttendees,
            Topic::NextTimeUntil,
            Topic::NextSummary,
        ]
        .into_iter()
        .map(|topic| Fact::retained(topic, ""))
        .collect();
    };

    let description = event
        .description
        .as_deref()
        .map(|d| truncate_chars(&clean_text(d), DESCRIPTION_DISPLAY_LIMIT))
        .unwrap_or_default();

    let mut facts = vec![
        Fact::retained(Topic::NextTitle, event.title.clone()),
        Fact::retained(Topic::NextStart, format_absolute(&event.start)),
        Fact::retained(
            Topic::NextEnd,
            event.end.as_ref().map(format_absolute).unwrap_or_default(),
        ),
        Fact::retained(
            Topic::NextLocation,
            event.location.clone().unwrap_or_default(),
        ),
        Fact::retained(Topic::NextDescription, description),
        Fact::retained(Topic::NextAttendees, event.attendee_list()),
    ];
    facts.extend(time_facts(Some(event), now, style));
    facts
}

/// Only the facts that change with the clock: `next/time_until` and
/// `next/summary`.
pub fn time_facts(event: Option<&Event>, now: NaiveDateTime, style: RelativeStyle) -> Vec<Fact> {
    let (time_until, summary) = match event {
        Some(event) => {
            let time_until = format_time_until(event, now, style);
            let summary = format!("{} ({})", event.title, time_until);
            (time_until, summary)
        }
        None => (String::new(), String::new()),
    };

    vec![
        Fact::retained(Topic::NextTimeUntil, time_until),
        Fact::retained(Topic::NextSummary, summary),
    ]
}

/// `today/time` for the minute containing `now`.
pub fn clock_fact(now: NaiveDateTime) -> Fact {
    Fact::retained(Topic::TodayTime, now.format("%H:%M").to_string())
}

/// `today/count` and `today/list`.
pub fn today_facts(today: &EventWindow, no_events_text: &str) -> Vec<Fact> {
    let list = if today.is_empty() {
        no_events_text.to_string()
    } else {
        today
            .events()
            .iter()
            .map(|e| format!("{} - {}", format_absolute(&e.start), e.title))
            .collect::<Vec<_>>()
            .join("\n")
    };

    vec![
        Fact::retained(Topic::TodayCount, today.len().to_string()),
        Fact::retained(Topic::TodayList, list),
    ]
}
