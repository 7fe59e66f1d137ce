//! Raw iCal feed over HTTP.

use crate::config::IcsSourceConfig;
use crate::date_range::DateRange;
use crate::error::CalBusResult;
use crate::event::Event;
use crate::ics::parse_feed;

use super::EventSource;
use super::http::HttpClient;

pub struct IcsFeedSource {
    http: HttpClient,
    url: String,
    credentials: Option<(String, Option<String>)>,
}

impl IcsFeedSource {
    pub fn new(http: HttpClient, config: &IcsSourceConfig) -> CalBusResult<Self> {
        let credentials = config
            .username
            .as_ref()
            .filter(|u| !u.trim().is_empty())
            .map(|u| (u.clone(), config.password.clone()));

        Ok(IcsFeedSource {
            http,
            url: config.resolve_url()?,
            credentials,
        })
    }
}

impl EventSource for IcsFeedSource {
    fn name(&self) -> &str {
        "ics"
    }

    /// The feed is fetched whole; events outside `range` are dropped here.
    async fn fetch_range(&self, range: DateRange) -> CalBusResult<Vec<Event>> {
        let mut request = self.http.client().get(&self.url);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, password.as_ref());
        }

        let body = self.http.text(request).await?;
        let events: Vec<Event> = parse_feed(&body)
            .into_iter()
            .filter(|e| range.overlaps(e))
            .collect();

        tracing::debug!(source = "ics", events = events.len(), "Fetched events");
        Ok(events)
    }
}
