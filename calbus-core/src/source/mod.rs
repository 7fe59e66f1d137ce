//! Event sources.
//!
//! Every upstream implements [`EventSource::fetch_range`]; the windowed
//! fetches are derived from it. [`Source`] picks the implementation from
//! configuration.

mod caldav;
mod google;
mod http;
mod ics_feed;

pub use caldav::{CalDavSource, calendar_query_body, parse_multistatus};
pub use google::{GoogleSource, events_from_page};
pub use http::HttpClient;
pub use ics_feed::IcsFeedSource;

use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};

use crate::config::SourceConfig;
use crate::date_range::DateRange;
use crate::error::CalBusResult;
use crate::event::Event;
use crate::window::{EventWindow, Snapshot};

/// Something that can list events in a time range.
#[allow(async_fn_in_trait)]
pub trait EventSource {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Events overlapping `range`, in any order.
    async fn fetch_range(&self, range: DateRange) -> CalBusResult<Vec<Event>>;

    /// Upcoming events within `horizon`, at most `max` of them.
    async fn fetch_upcoming(
        &self,
        now: NaiveDateTime,
        horizon: TimeDelta,
        max: usize,
    ) -> CalBusResult<EventWindow> {
        let events = self.fetch_range(DateRange::upcoming(now, horizon)).await?;
        Ok(EventWindow::upcoming(now, horizon, max, events))
    }

    /// Events starting today.
    async fn fetch_today(&self, now: NaiveDateTime) -> CalBusResult<EventWindow> {
        let events = self.fetch_range(DateRange::today(now)).await?;
        Ok(EventWindow::today(now, events))
    }

    /// Both windows from a single upstream request.
    async fn fetch_snapshot(
        &self,
        now: NaiveDateTime,
        horizon: TimeDelta,
        max: usize,
    ) -> CalBusResult<Snapshot> {
        let events = self
            .fetch_range(DateRange::snapshot(now, horizon))
            .await?;
        Ok(Snapshot::from_events(now, horizon, max, events))
    }
}

/// The configured upstream.
pub enum Source {
    Google(GoogleSource),
    CalDav(CalDavSource),
    Ics(IcsFeedSource),
}

impl Source {
    /// Build the source described by `config`.
    ///
    /// Credentials are resolved here so a missing one fails at startup.
    pub fn from_config(config: &SourceConfig, timeout: Duration) -> CalBusResult<Self> {
        let http = HttpClient::new(timeout)?;
        Ok(match config {
            SourceConfig::Google(google) => Source::Google(GoogleSource::new(http, google)?),
            SourceConfig::Caldav(caldav) => Source::CalDav(CalDavSource::new(http, caldav)?),
            SourceConfig::Ics(ics) => Source::Ics(IcsFeedSource::new(http, ics)?),
        })
    }
}

impl EventSource for Source {
    fn name(&self) -> &str {
        match self {
            Source::Google(s) => s.name(),
            Source::CalDav(s) => s.name(),
            Source::Ics(s) => s.name(),
        }
    }

    async fn fetch_range(&self, range: DateRange) -> CalBusResult<Vec<Event>> {
        match self {
            Source::Google(s) => s.fetch_range(range).await,
            Source::CalDav(s) => s.fetch_range(range).await,
            Source::Ics(s) => s.fetch_range(range).await,
        }
    }
}
