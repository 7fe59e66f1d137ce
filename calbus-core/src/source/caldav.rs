//! CalDAV calendar-query with a server-side time-range filter.

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;

use crate::config::CalDavSourceConfig;
use crate::date_range::DateRange;
use crate::error::{CalBusError, CalBusResult};
use crate::event::{Event, sort_by_start};
use crate::ics::parse_feed;

use super::EventSource;
use super::http::HttpClient;

pub struct CalDavSource {
    http: HttpClient,
    url: String,
    username: String,
    password: String,
}

impl CalDavSource {
    pub fn new(http: HttpClient, config: &CalDavSourceConfig) -> CalBusResult<Self> {
        if config.url.trim().is_empty() {
            return Err(CalBusError::Config("CalDAV source needs a url".into()));
        }
        Ok(CalDavSource {
            http,
            url: config.url.trim().to_string(),
            username: config.username.clone(),
            password: config.resolve_password()?,
        })
    }
}

impl EventSource for CalDavSource {
    fn name(&self) -> &str {
        "caldav"
    }

    async fn fetch_range(&self, range: DateRange) -> CalBusResult<Vec<Event>> {
        let method = Method::from_bytes(b"REPORT")
            .map_err(|e| CalBusError::Fetch(format!("Invalid method: {e}")))?;

        let request = self
            .http
            .client()
            .request(method, &self.url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Depth", "1")
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(calendar_query_body(&range));
        let body = self.http.text(request).await?;

        let mut events: Vec<Event> = parse_multistatus(&body)?
            .iter()
            .flat_map(|data| parse_feed(data))
            .collect();
        sort_by_start(&mut events);

        tracing::debug!(source = "caldav", events = events.len(), "Fetched events");
        Ok(events)
    }
}

/// REPORT body selecting VEVENTs that overlap `range`.
pub fn calendar_query_body(range: &DateRange) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <D:prop>
        <D:getetag/>
        <C:calendar-data/>
    </D:prop>
    <C:filter>
        <C:comp-filter name="VCALENDAR">
            <C:comp-filter name="VEVENT">
                <C:time-range start="{}" end="{}"/>
            </C:comp-filter>
        </C:comp-filter>
    </C:filter>
</C:calendar-query>"#,
        range.caldav_start(),
        range.caldav_end()
    )
}

/// The `calendar-data` payloads of a multistatus response.
///
/// Responses without calendar data (the collection itself, 404 propstats)
/// are skipped.
pub fn parse_multistatus(body: &str) -> CalBusResult<Vec<String>> {
    let doc = roxmltree::Document::parse(body)
        .map_err(|e| CalBusError::Serialization(format!("Invalid multistatus response: {e}")))?;

    let payloads = doc
        .root_element()
        .descendants()
        .filter(|n| n.tag_name().name() == "response")
        .filter_map(|response| {
            response
                .descendants()
                .find(|n| n.tag_name().name() == "calendar-data")
                .and_then(|n| n.text())
                .map(str::to_string)
        })
        .filter(|data| !data.trim().is_empty())
        .collect();

    Ok(payloads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    const MULTISTATUS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/calendars/me/personal/</d:href>
    <d:propstat>
      <d:prop/>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/calendars/me/personal/a.ics</d:href>
    <d:propstat>
      <d:prop>
        <d:getetag>"1"</d:getetag>
        <cal:calendar-data>BEGIN:VCALENDAR
BEGIN:VEVENT
SUMMARY:Dentist
DTSTART:20240312T150000Z
END:VEVENT
END:VCALENDAR
</cal:calendar-data>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/calendars/me/personal/b.ics</d:href>
    <d:propstat>
      <d:prop>
        <cal:calendar-data><![CDATA[BEGIN:VCALENDAR
BEGIN:VEVENT
SUMMARY:Standup
DTSTART:20240310T090000
END:VEVENT
END:VCALENDAR
]]></cal:calendar-data>
      </d:prop>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn test_parse_multistatus() {
        let payloads = parse_multistatus(MULTISTATUS).unwrap();
        assert_eq!(payloads.len(), 2);

        let titles: Vec<String> = payloads
            .iter()
            .flat_map(|p| parse_feed(p))
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, ["Dentist", "Standup"]);
    }

    #[test]
    fn test_invalid_xml() {
        let err = parse_multistatus("<multistatus>").unwrap_err();
        assert!(matches!(err, CalBusError::Serialization(_)));
    }

    #[test]
    fn test_query_body_has_time_range() {
        let from = NaiveDateTime::parse_from_str("2024-03-10 00:00", "%Y-%m-%d %H:%M").unwrap();
        let to = NaiveDateTime::parse_from_str("2024-04-09 09:15", "%Y-%m-%d %H:%M").unwrap();
        let body = calendar_query_body(&DateRange::new(from, to));

        assert!(body.contains(r#"<C:time-range start="20240310T000000Z" end="20240409T091500Z"/>"#));
        assert!(body.contains(r#"<C:comp-filter name="VEVENT">"#));
    }
}
