//! Shared defaults.

/// Slow trigger period: how often the source is re-fetched.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Control loop granularity.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
pub const MIN_FETCH_TIMEOUT_SECS: u64 = 10;
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 30;

/// How far ahead "upcoming" looks.
pub const DEFAULT_UPCOMING_DAYS: i64 = 30;
pub const MAX_UPCOMING_DAYS: i64 = 3660;

pub const DEFAULT_MAX_UPCOMING: usize = 10;

/// Display limit for `next/description`, in characters.
pub const DESCRIPTION_DISPLAY_LIMIT: usize = 500;

pub const DEFAULT_NO_EVENTS_TEXT: &str = "No events today";

pub const DEFAULT_TOPIC_PREFIX: &str = "calendar";

pub const DEFAULT_GOOGLE_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Events before this hour get their time printed next to "tomorrow"/"on {day}".
pub const MORNING_CUTOFF_HOUR: u32 = 11;
