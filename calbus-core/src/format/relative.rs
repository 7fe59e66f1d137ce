use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::constants::MORNING_CUTOFF_HOUR;
use crate::event::{Event, EventTime};

/// Which relative-time algorithm drives the countdown text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelativeStyle {
    /// Calendar-day aware: "in 2h 30m", "09:30 tomorrow", "on Friday"
    #[default]
    Tiered,
    /// Elapsed-time buckets: "in 45m", "in 5h", "in 3d"
    Simple,
}

/// Tiered relative label for a timed event.
///
/// Tiers, first match wins:
/// 1. started: `over in …` while `end` is ahead, else `now`
/// 2. same calendar day: `in {m}m` or `in {h}h {m}m`
/// 3. next calendar day: `tomorrow`, prefixed with `HH:MM` before 11:00
/// 4. later: `on {DayName}`, same prefix rule
pub fn format_relative(
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> String {
    if start <= now {
        return match end {
            Some(end) if end > now => {
                // Round up so a running event never reads "over in 0m".
                let seconds = (end - now).num_seconds();
                format!("over in {}", hours_minutes((seconds + 59) / 60))
            }
            _ => "now".to_string(),
        };
    }

    let today = now.date();
    let day = start.date();

    if day == today {
        // Truncates: a start under a minute away reads "in 0m".
        return format!("in {}", hours_minutes((start - now).num_minutes()));
    }

    let label = if Some(day) == today.succ_opt() {
        "tomorrow".to_string()
    } else {
        format!("on {}", start.format("%A"))
    };

    if start.hour() < MORNING_CUTOFF_HOUR {
        format!("{} {}", start.format("%H:%M"), label)
    } else {
        label
    }
}

/// Bucketed relative label: `now`, `in {m}m`, `in {h}h` or `in {d}d`.
///
/// No calendar-day awareness; values truncate toward zero.
pub fn format_relative_simple(start: NaiveDateTime, now: NaiveDateTime) -> String {
    let seconds = (start - now).num_seconds();
    match seconds {
        s if s < 0 => "now".to_string(),
        s if s < 3_600 => format!("in {}m", s / 60),
        s if s < 86_400 => format!("in {}h", s / 3_600),
        s => format!("in {}d", s / 86_400),
    }
}

/// The `next/time_until` text for an event in the chosen style.
pub fn format_time_until(event: &Event, now: NaiveDateTime, style: RelativeStyle) -> String {
    match (style, &event.start) {
        (RelativeStyle::Simple, start) => format_relative_simple(start.to_naive(), now),
        (RelativeStyle::Tiered, EventTime::DateTime(start)) => {
            format_relative(*start, event.end.map(|e| e.to_naive()), now)
        }
        (RelativeStyle::Tiered, EventTime::Date(day)) => all_day_label(*day, now.date()),
    }
}

fn all_day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day < today {
        "now".to_string()
    } else if day == today {
        "today".to_string()
    } else if Some(day) == today.succ_opt() {
        "tomorrow".to_string()
    } else {
        format!("on {}", day.and_time(NaiveTime::MIN).format("%A"))
    }
}

fn hours_minutes(total_minutes: i64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    match (hours, minutes) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}
