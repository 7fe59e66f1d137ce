//! Ordered event windows and the snapshot the scheduler holds between fetches.

use chrono::{NaiveDateTime, TimeDelta};

use crate::date_range::{DateRange, add_saturating};
use crate::event::{Event, sort_by_start};

/// Events ascending by start, restricted to one range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventWindow {
    events: Vec<Event>,
}

impl EventWindow {
    /// Events starting on the same calendar day as `now`.
    pub fn today(now: NaiveDateTime, events: impl IntoIterator<Item = Event>) -> Self {
        let range = DateRange::today(now);
        Self::sorted(
            events
                .into_iter()
                .filter(|e| range.contains(e.start.to_naive()))
                .collect(),
        )
    }

    /// Events still upcoming at `now` that start within `horizon`, capped at `max`.
    pub fn upcoming(
        now: NaiveDateTime,
        horizon: TimeDelta,
        max: usize,
        events: impl IntoIterator<Item = Event>,
    ) -> Self {
        let limit = add_saturating(now, horizon);
        let mut window = Self::sorted(
            events
                .into_iter()
                .filter(|e| e.is_upcoming(now) && e.start.to_naive() <= limit)
                .collect(),
        );
        window.events.truncate(max);
        window
    }

    fn sorted(mut events: Vec<Event>) -> Self {
        sort_by_start(&mut events);
        EventWindow { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn first(&self) -> Option<&Event> {
        self.events.first()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Result of one slow fetch. Replaced wholesale by the next successful one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub upcoming: EventWindow,
    pub today: EventWindow,
    pub fetched_at: NaiveDateTime,
}

impl Snapshot {
    /// Split one fetched event list into the upcoming and today windows.
    pub fn from_events(
        now: NaiveDateTime,
        horizon: TimeDelta,
        max_upcoming: usize,
        events: Vec<Event>,
    ) -> Self {
        let today = EventWindow::today(now, events.iter().cloned());
        let upcoming = EventWindow::upcoming(now, horizon, max_upcoming, events);
        Snapshot {
            upcoming,
            today,
            fetched_at: now,
        }
    }

    /// The event the "next" facts describe.
    pub fn next(&self) -> Option<&Event> {
        self.upcoming.first()
    }
}
