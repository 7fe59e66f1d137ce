//! The publish loop.
//!
//! Two triggers share one control loop. The slow trigger re-fetches the
//! source and publishes every fact; the fast trigger fires when the
//! wall-clock minute changes and only refreshes the clock and the countdown
//! facts from the snapshot already held.

use std::future::Future;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeDelta, Timelike};

use crate::config::CalBusConfig;
use crate::format::RelativeStyle;
use crate::publish::{
    Fact, FactSink, Status, clock_fact, next_event_facts, publish_all, status_fact, time_facts,
    today_facts,
};
use crate::source::EventSource;
use crate::window::Snapshot;

/// Timing and presentation settings for [`PublishScheduler`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    pub refresh_interval: Duration,
    pub tick_interval: Duration,
    pub horizon: TimeDelta,
    pub max_upcoming: usize,
    pub relative_style: RelativeStyle,
    pub no_events_text: String,
}

impl From<&CalBusConfig> for ScheduleConfig {
    fn from(config: &CalBusConfig) -> Self {
        ScheduleConfig {
            refresh_interval: config.refresh_interval(),
            tick_interval: config.tick_interval(),
            horizon: config.horizon(),
            max_upcoming: config.max_upcoming,
            relative_style: config.relative_style,
            no_events_text: config.no_events_text.clone(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig::from(&CalBusConfig::default())
    }
}

/// Everything the loop remembers between ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleState {
    /// When the last slow fetch was attempted, successful or not
    pub last_slow_fetch: Option<NaiveDateTime>,
    /// Minute-of-hour the countdown facts were last published for
    pub last_fast_minute: Option<u32>,
    /// Last successful fetch; kept when a later fetch fails
    pub snapshot: Option<Snapshot>,
    /// Whether any fetch has succeeded yet
    pub connected: bool,
}

impl ScheduleState {
    pub fn slow_due(&self, now: NaiveDateTime, interval: Duration) -> bool {
        let Some(last) = self.last_slow_fetch else {
            return true;
        };
        let interval = TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX);
        // A clock stepping backwards also forces a refresh.
        now < last || now - last >= interval
    }

    pub fn fast_due(&self, now: NaiveDateTime) -> bool {
        self.last_fast_minute != Some(now.minute())
    }
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was due
    Idle,
    /// Fetched and published the full fact set
    Refreshed,
    /// The fetch failed; status and countdown were republished
    FetchFailed,
    /// The clock and, with a snapshot held, the countdown were republished
    Countdown,
}

pub struct PublishScheduler<S, P> {
    source: S,
    sink: P,
    config: ScheduleConfig,
    state: ScheduleState,
}

impl<S: EventSource, P: FactSink> PublishScheduler<S, P> {
    pub fn new(source: S, sink: P, config: ScheduleConfig) -> Self {
        PublishScheduler {
            source,
            sink,
            config,
            state: ScheduleState::default(),
        }
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    /// Publish `status = initializing`.
    pub fn announce(&self) {
        self.publish(&[status_fact(&Status::Initializing)]);
    }

    /// Run whichever trigger is due at `now`.
    pub async fn tick(&mut self, now: NaiveDateTime) -> TickOutcome {
        if self.state.slow_due(now, self.config.refresh_interval) {
            self.slow_tick(now).await
        } else if self.state.fast_due(now) {
            self.fast_tick(now)
        } else {
            TickOutcome::Idle
        }
    }

    /// Fetch and publish everything. On failure the held snapshot stays.
    pub async fn slow_tick(&mut self, now: NaiveDateTime) -> TickOutcome {
        let result = self
            .source
            .fetch_snapshot(now, self.config.horizon, self.config.max_upcoming)
            .await;

        self.state.last_slow_fetch = Some(now);
        self.state.last_fast_minute = Some(now.minute());

        match result {
            Ok(snapshot) => {
                if !self.state.connected {
                    tracing::info!(source = self.source.name(), "Connected to calendar source");
                    self.state.connected = true;
                }
                tracing::info!(
                    source = self.source.name(),
                    upcoming = snapshot.upcoming.len(),
                    today = snapshot.today.len(),
                    next = ?snapshot.next().map(|e| e.title.as_str()),
                    "Refreshed events"
                );

                let mut facts = next_event_facts(snapshot.next(), now, self.config.relative_style);
                facts.extend(today_facts(&snapshot.today, &self.config.no_events_text));
                facts.push(clock_fact(now));
                facts.push(status_fact(&Status::Running));
                self.publish(&facts);

                self.state.snapshot = Some(snapshot);
                TickOutcome::Refreshed
            }
            Err(e) => {
                tracing::error!(source = self.source.name(), error = %e, "Fetch failed");

                let mut facts = vec![status_fact(&Status::from(&e))];
                if let Some(snapshot) = &self.state.snapshot {
                    facts.extend(time_facts(
                        snapshot.next(),
                        now,
                        self.config.relative_style,
                    ));
                }
                facts.push(clock_fact(now));
                self.publish(&facts);
                TickOutcome::FetchFailed
            }
        }
    }

    /// Republish the clock, and the countdown facts for the held snapshot.
    pub fn fast_tick(&mut self, now: NaiveDateTime) -> TickOutcome {
        self.state.last_fast_minute = Some(now.minute());

        let mut facts = match &self.state.snapshot {
            Some(snapshot) => time_facts(snapshot.next(), now, self.config.relative_style),
            None => Vec::new(),
        };
        facts.push(clock_fact(now));
        self.publish(&facts);
        TickOutcome::Countdown
    }

    /// Tick on the local wall clock until `shutdown` resolves.
    ///
    /// An in-flight fetch is awaited (bounded by the HTTP timeout) before
    /// shutdown is noticed.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            self.tick(Local::now().naive_local()).await;

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down publish loop");
                    break;
                }
                _ = tokio::time::sleep(self.config.tick_interval) => {}
            }
        }
    }

    fn publish(&self, facts: &[Fact]) {
        let accepted = publish_all(&self.sink, facts);
        if accepted < facts.len() {
            tracing::warn!(
                accepted,
                total = facts.len(),
                "Some facts were not handed to the sink"
            );
        }
    }
}
