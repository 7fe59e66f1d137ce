use calbus_core::ics::{parse_blocks, parse_feed};
use calbus_core::{Event, EventTime};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

const MIXED_FEED: &str = include_str!("fixtures/mixed_feed.ics");

fn dt(s: &str) -> EventTime {
    EventTime::DateTime(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap())
}

fn titles(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.title.as_str()).collect()
}

#[test]
fn test_blocks_without_start_are_dropped() {
    let results = parse_blocks(MIXED_FEED);
    assert_eq!(results.len(), 6);

    let failures: Vec<usize> = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .map(|f| f.block)
        .collect();
    assert_eq!(failures, [1, 3]);

    assert_eq!(parse_feed(MIXED_FEED).len(), 4);
}

#[test]
fn test_events_come_back_sorted() {
    let events = parse_feed(MIXED_FEED);
    assert_eq!(titles(&events), ["Standup", "", "Public holiday", "Quarterly review"]);
}

#[test]
fn test_field_mapping() {
    let events = parse_feed(MIXED_FEED);
    let review = events.iter().find(|e| e.title == "Quarterly review").unwrap();

    assert_eq!(review.start, dt("2024-03-12 14:00"));
    assert_eq!(review.end, Some(dt("2024-03-12 15:30")));
    assert_eq!(review.location.as_deref(), Some("Board room, 3rd floor"));
    assert_eq!(
        review.description.as_deref(),
        Some("Agenda:\n1. Numbers\n2. Hiring plan that runs long enough to be folded onto a second line")
    );
    assert_eq!(review.attendees, ["jan.novak@example.com", "eva@example.com"]);
}

#[test]
fn test_dialects() {
    let events = parse_feed(MIXED_FEED);

    let standup = &events[0];
    assert_eq!(standup.start, dt("2024-03-10 09:05"));
    assert_eq!(
        standup.end,
        Some(EventTime::DateTime(
            standup.start.to_naive() + TimeDelta::minutes(15)
        ))
    );

    let lenient = &events[1];
    assert_eq!(lenient.start, dt("2024-03-10 12:00"));
    assert_eq!(lenient.end, Some(dt("2024-03-10 13:00")));

    let holiday = &events[2];
    assert_eq!(
        holiday.start,
        EventTime::Date(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap())
    );
}

#[test]
fn test_crlf_feed_matches_lf_feed() {
    let crlf = MIXED_FEED.replace('\n', "\r\n");
    assert_eq!(parse_feed(&crlf), parse_feed(MIXED_FEED));
}

#[test]
fn test_malformed_block_does_not_affect_next_one() {
    let valid = "BEGIN:VEVENT\nSUMMARY:Valid\nDTSTART:20240310T100000\nEND:VEVENT\n";
    let alone = parse_feed(valid);

    let preceded = format!(
        "BEGIN:VEVENT\nSUMMARY:Bad\nDTSTART:20241399T000000\nEND:VEVENT\n\
         BEGIN:VEVENT\nSUMMARY:Cut off\nDTSTART:20240310T080000\n{valid}"
    );
    assert_eq!(parse_feed(&preceded), alone);
}

#[test]
fn test_empty_and_garbage_input() {
    assert!(parse_feed("").is_empty());
    assert!(parse_feed("this is not a calendar").is_empty());
    assert!(parse_blocks("END:VEVENT\nEND:VCALENDAR").is_empty());
}
