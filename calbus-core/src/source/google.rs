//! Google Calendar API v3 events list.
//!
//! Only reads. The bearer token comes from configuration or from a file an
//! external tool keeps refreshed; it is re-read on every fetch.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use url::Url;

use crate::config::{GoogleSourceConfig, credential_error, read_secret_file};
use crate::date_range::DateRange;
use crate::error::{CalBusError, CalBusResult};
use crate::event::{Event, EventTime};

use super::EventSource;
use super::http::HttpClient;

const PAGE_SIZE: &str = "250";
/// Upper bound on followed `nextPageToken`s per fetch.
const MAX_PAGES: usize = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    status: Option<String>,
    summary: Option<String>,
    location: Option<String>,
    description: Option<String>,
    start: Option<GoogleTime>,
    end: Option<GoogleTime>,
    #[serde(default)]
    attendees: Vec<GoogleAttendee>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTime {
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleAttendee {
    email: Option<String>,
    display_name: Option<String>,
}

/// Token file contents: a bare token or an OAuth token JSON document.
#[derive(Debug, Deserialize)]
struct TokenFile {
    #[serde(alias = "token")]
    access_token: String,
}

enum Token {
    Inline(String),
    File(PathBuf),
}

pub struct GoogleSource {
    http: HttpClient,
    events_url: Url,
    token: Token,
}

impl GoogleSource {
    pub fn new(http: HttpClient, config: &GoogleSourceConfig) -> CalBusResult<Self> {
        let token = match (&config.token_file, &config.access_token) {
            (Some(path), _) => {
                // Fail at startup rather than on the first fetch.
                read_token_file(path).map_err(credential_error)?;
                Token::File(path.clone())
            }
            (None, Some(token)) if !token.trim().is_empty() => Token::Inline(token.trim().into()),
            _ => {
                return Err(CalBusError::Credentials(
                    "Google source needs token_file or access_token".into(),
                ));
            }
        };

        Ok(GoogleSource {
            http,
            events_url: events_url(&config.api_base, &config.calendar_id)?,
            token,
        })
    }

    fn access_token(&self) -> CalBusResult<String> {
        match &self.token {
            Token::Inline(token) => Ok(token.clone()),
            Token::File(path) => {
                read_token_file(path).map_err(|e| CalBusError::Auth(e.to_string()))
            }
        }
    }

    async fn fetch_page(
        &self,
        range: &DateRange,
        token: &str,
        page_token: Option<&str>,
    ) -> CalBusResult<EventsPage> {
        let time_min = range.from_rfc3339();
        let time_max = range.to_rfc3339();
        let mut query = vec![
            ("timeMin", time_min.as_str()),
            ("timeMax", time_max.as_str()),
            ("singleEvents", "true"),
            ("orderBy", "startTime"),
            ("maxResults", PAGE_SIZE),
        ];
        if let Some(page_token) = page_token {
            query.push(("pageToken", page_token));
        }

        let request = self
            .http
            .client()
            .get(self.events_url.clone())
            .bearer_auth(token)
            .query(&query);
        let body = self.http.text(request).await?;

        serde_json::from_str(&body)
            .map_err(|e| CalBusError::Serialization(format!("Invalid events response: {e}")))
    }
}

impl EventSource for GoogleSource {
    fn name(&self) -> &str {
        "google"
    }

    async fn fetch_range(&self, range: DateRange) -> CalBusResult<Vec<Event>> {
        let token = self.access_token()?;
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self
                .fetch_page(&range, &token, page_token.as_deref())
                .await?;
            page_token = page.next_page_token.clone();
            events.extend(map_page(page));

            if page_token.is_none() {
                break;
            }
        }

        tracing::debug!(source = "google", events = events.len(), "Fetched events");
        Ok(events)
    }
}

/// Map a raw events-list JSON page to events.
///
/// Cancelled items and items without a usable start are skipped.
pub fn events_from_page(body: &str) -> CalBusResult<Vec<Event>> {
    let page: EventsPage = serde_json::from_str(body)
        .map_err(|e| CalBusError::Serialization(format!("Invalid events response: {e}")))?;
    Ok(map_page(page))
}

fn map_page(page: EventsPage) -> Vec<Event> {
    page.items.into_iter().filter_map(map_event).collect()
}

fn map_event(item: GoogleEvent) -> Option<Event> {
    if item.status.as_deref() == Some("cancelled") {
        return None;
    }

    let Some(start) = item.start.as_ref().and_then(map_time) else {
        tracing::warn!(source = "google", summary = ?item.summary, "Skipping event without start");
        return None;
    };

    let attendees = item
        .attendees
        .into_iter()
        .filter_map(|a| a.email.or(a.display_name))
        .filter(|a| !a.is_empty())
        .collect();

    Some(Event {
        title: item.summary.unwrap_or_default().trim().to_string(),
        start,
        end: item.end.as_ref().and_then(map_time),
        location: item.location.filter(|l| !l.trim().is_empty()),
        description: item.description.filter(|d| !d.trim().is_empty()),
        attendees,
    })
}

/// `dateTime` keeps its wall-clock part, the offset is dropped; `date` is
/// an all-day value.
fn map_time(time: &GoogleTime) -> Option<EventTime> {
    if let Some(date_time) = &time.date_time {
        let naive = DateTime::parse_from_rfc3339(date_time)
            .map(|dt| dt.naive_local())
            .or_else(|_| NaiveDateTime::parse_from_str(date_time, "%Y-%m-%dT%H:%M:%S"))
            .ok()?;
        return Some(EventTime::DateTime(naive));
    }
    let date = time.date.as_deref()?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(EventTime::Date)
}

fn events_url(api_base: &str, calendar_id: &str) -> CalBusResult<Url> {
    let mut url = Url::parse(api_base)
        .map_err(|e| CalBusError::Config(format!("Invalid api_base '{api_base}': {e}")))?;
    url.path_segments_mut()
        .map_err(|_| CalBusError::Config(format!("Invalid api_base '{api_base}'")))?
        .pop_if_empty()
        .extend(["calendars", calendar_id, "events"]);
    Ok(url)
}

fn read_token_file(path: &std::path::Path) -> CalBusResult<String> {
    let contents = read_secret_file(path)?;
    if contents.starts_with('{') {
        let parsed: TokenFile = serde_json::from_str(&contents).map_err(|e| {
            CalBusError::Config(format!("Invalid token file {}: {e}", path.display()))
        })?;
        return Ok(parsed.access_token);
    }
    Ok(contents)
}
