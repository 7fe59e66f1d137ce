use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use calbus_core::date_range::DateRange;
use calbus_core::publish::MemorySink;
use calbus_core::scheduler::{PublishScheduler, ScheduleConfig, TickOutcome};
use calbus_core::source::EventSource;
use calbus_core::{CalBusError, CalBusResult, Event, EventTime};
use chrono::NaiveDateTime;

/// Replays prepared fetch results in order, then fails.
struct ScriptedSource {
    responses: Mutex<VecDeque<CalBusResult<Vec<Event>>>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    fn new(responses: Vec<CalBusResult<Vec<Event>>>) -> Self {
        ScriptedSource {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl EventSource for &ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_range(&self, _range: DateRange) -> CalBusResult<Vec<Event>> {
        *self.calls.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CalBusError::Fetch("script exhausted".into())))
    }
}

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn timed(title: &str, start: &str, end: &str) -> Event {
    Event::new(title, EventTime::DateTime(dt(start))).with_end(EventTime::DateTime(dt(end)))
}

fn day_events() -> Vec<Event> {
    vec![
        timed("Lunch", "2024-03-10 12:00:00", "2024-03-10 13:00:00"),
        timed("Standup", "2024-03-10 09:05:00", "2024-03-10 09:20:00"),
        timed("Review", "2024-03-11 09:30:00", "2024-03-11 10:30:00"),
    ]
}

fn scheduler<'a>(
    source: &'a ScriptedSource,
    sink: &'a MemorySink,
) -> PublishScheduler<&'a ScriptedSource, &'a MemorySink> {
    PublishScheduler::new(source, sink, ScheduleConfig::default())
}

#[tokio::test]
async fn test_first_tick_publishes_everything() {
    let source = ScriptedSource::new(vec![Ok(day_events())]);
    let sink = MemorySink::new();
    let mut scheduler = scheduler(&source, &sink);

    scheduler.announce();
    assert_eq!(sink.latest("status").as_deref(), Some("initializing"));

    let outcome = scheduler.tick(dt("2024-03-10 09:00:00")).await;
    assert_eq!(outcome, TickOutcome::Refreshed);

    assert_eq!(sink.latest("next/title").as_deref(), Some("Standup"));
    assert_eq!(sink.latest("next/start").as_deref(), Some("10.03.2024 09:05"));
    assert_eq!(sink.latest("next/end").as_deref(), Some("10.03.2024 09:20"));
    assert_eq!(sink.latest("next/time_until").as_deref(), Some("in 5m"));
    assert_eq!(sink.latest("next/summary").as_deref(), Some("Standup (in 5m)"));
    assert_eq!(sink.latest("today/count").as_deref(), Some("2"));
    assert_eq!(
        sink.latest("today/list").as_deref(),
        Some("10.03.2024 09:05 - Standup\n10.03.2024 12:00 - Lunch")
    );
    assert_eq!(sink.latest("today/time").as_deref(), Some("09:00"));
    assert_eq!(sink.latest("status").as_deref(), Some("running"));
    assert!(sink.facts().iter().all(|f| f.retained));
    assert!(scheduler.state().connected);
}

#[tokio::test]
async fn test_fast_tick_only_touches_countdown() {
    let source = ScriptedSource::new(vec![Ok(day_events())]);
    let sink = MemorySink::new();
    let mut scheduler = scheduler(&source, &sink);

    scheduler.tick(dt("2024-03-10 09:00:00")).await;
    assert_eq!(scheduler.tick(dt("2024-03-10 09:00:30")).await, TickOutcome::Idle);

    sink.clear();
    let outcome = scheduler.tick(dt("2024-03-10 09:01:00")).await;
    assert_eq!(outcome, TickOutcome::Countdown);

    let topics: Vec<String> = sink.facts().into_iter().map(|f| f.topic).collect();
    assert_eq!(topics, ["next/time_until", "next/summary", "today/time"]);
    assert_eq!(sink.latest("next/time_until").as_deref(), Some("in 4m"));
    assert_eq!(sink.latest("today/time").as_deref(), Some("09:01"));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_clock_ticks_without_any_snapshot() {
    let source = ScriptedSource::new(vec![Err(CalBusError::Timeout(20))]);
    let sink = MemorySink::new();
    let mut scheduler = scheduler(&source, &sink);

    scheduler.tick(dt("2024-03-10 09:00:00")).await;
    assert_eq!(sink.latest("today/time").as_deref(), Some("09:00"));

    sink.clear();
    let outcome = scheduler.tick(dt("2024-03-10 09:01:02")).await;
    assert_eq!(outcome, TickOutcome::Countdown);

    let topics: Vec<String> = sink.facts().into_iter().map(|f| f.topic).collect();
    assert_eq!(topics, ["today/time"]);
    assert_eq!(sink.latest("today/time").as_deref(), Some("09:01"));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_failed_fetch_keeps_snapshot_and_countdown() {
    let source = ScriptedSource::new(vec![
        Ok(day_events()),
        Err(CalBusError::Fetch("connection refused".into())),
    ]);
    let sink = MemorySink::new();
    let mut scheduler = scheduler(&source, &sink);

    scheduler.tick(dt("2024-03-10 09:00:00")).await;
    let before = scheduler.state().snapshot.clone();

    let outcome = scheduler.tick(dt("2024-03-10 09:05:00")).await;
    assert_eq!(outcome, TickOutcome::FetchFailed);
    assert_eq!(
        sink.latest("status").as_deref(),
        Some("error: Fetch failed: connection refused")
    );
    assert_eq!(scheduler.state().snapshot, before);
    assert_eq!(sink.latest("next/time_until").as_deref(), Some("over in 15m"));

    let outcome = scheduler.tick(dt("2024-03-10 09:06:00")).await;
    assert_eq!(outcome, TickOutcome::Countdown);
    assert_eq!(sink.latest("next/time_until").as_deref(), Some("over in 14m"));
    assert_eq!(sink.latest("next/title").as_deref(), Some("Standup"));
}

#[tokio::test]
async fn test_recovery_publishes_running_again() {
    let source = ScriptedSource::new(vec![
        Err(CalBusError::Timeout(20)),
        Ok(day_events()),
    ]);
    let sink = MemorySink::new();
    let mut scheduler = scheduler(&source, &sink);

    scheduler.tick(dt("2024-03-10 08:50:00")).await;
    assert_eq!(
        sink.latest("status").as_deref(),
        Some("error: Request timed out after 20s")
    );
    assert_eq!(sink.latest("next/title"), None);
    assert!(!scheduler.state().connected);

    scheduler.tick(dt("2024-03-10 08:55:00")).await;
    assert_eq!(sink.latest("status").as_deref(), Some("running"));
    assert_eq!(sink.latest("next/time_until").as_deref(), Some("in 10m"));
}

#[tokio::test]
async fn test_auth_failure_status() {
    let source = ScriptedSource::new(vec![Err(CalBusError::Auth("HTTP 401".into()))]);
    let sink = MemorySink::new();
    let mut scheduler = scheduler(&source, &sink);

    scheduler.tick(dt("2024-03-10 09:00:00")).await;
    assert_eq!(sink.latest("status").as_deref(), Some("authentication_required"));
}

#[tokio::test]
async fn test_no_events_clears_next_topics() {
    let source = ScriptedSource::new(vec![Ok(day_events()), Ok(Vec::new())]);
    let sink = MemorySink::new();
    let mut scheduler = scheduler(&source, &sink);

    scheduler.tick(dt("2024-03-10 09:00:00")).await;
    scheduler.tick(dt("2024-03-10 09:05:00")).await;

    for topic in [
        "next/title",
        "next/start",
        "next/end",
        "next/location",
        "next/description",
        "next/attendees",
        "next/time_until",
        "next/summary",
    ] {
        assert_eq!(sink.latest(topic).as_deref(), Some(""), "{topic}");
    }
    assert_eq!(sink.latest("today/count").as_deref(), Some("0"));
    assert_eq!(sink.latest("today/list").as_deref(), Some("No events today"));
}

#[tokio::test]
async fn test_custom_no_events_text() {
    let source = ScriptedSource::new(vec![Ok(Vec::new())]);
    let sink = MemorySink::new();
    let config = ScheduleConfig {
        no_events_text: "Free day".into(),
        ..ScheduleConfig::default()
    };
    let mut scheduler = PublishScheduler::new(&source, &sink, config);

    scheduler.tick(dt("2024-03-10 09:00:00")).await;
    assert_eq!(sink.latest("today/list").as_deref(), Some("Free day"));
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let source = ScriptedSource::new(vec![Ok(day_events())]);
    let sink = MemorySink::new();
    let config = ScheduleConfig {
        tick_interval: Duration::from_secs(3600),
        ..ScheduleConfig::default()
    };
    let mut scheduler = PublishScheduler::new(&source, &sink, config);

    scheduler.run(async {}).await;

    assert_eq!(source.calls(), 1);
    assert_eq!(sink.latest("status").as_deref(), Some("running"));
}
