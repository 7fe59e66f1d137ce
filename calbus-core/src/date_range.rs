//! Date range for fetching and filtering events.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};

use crate::event::Event;

/// Inclusive wall-clock range `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl DateRange {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        DateRange { from, to }
    }

    /// `[00:00:00, 23:59:59]` of the day containing `now`.
    pub fn today(now: NaiveDateTime) -> Self {
        let date = now.date();
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        DateRange {
            from: date.and_time(NaiveTime::MIN),
            to: date.and_time(end_of_day),
        }
    }

    /// `[now, now + horizon]`, saturating at [`NaiveDateTime::MAX`].
    pub fn upcoming(now: NaiveDateTime, horizon: TimeDelta) -> Self {
        DateRange {
            from: now,
            to: add_saturating(now, horizon),
        }
    }

    /// The union of [`DateRange::today`] and [`DateRange::upcoming`], so a
    /// single upstream request serves both windows.
    pub fn snapshot(now: NaiveDateTime, horizon: TimeDelta) -> Self {
        let today = Self::today(now);
        let upcoming = Self::upcoming(now, horizon);
        DateRange {
            from: today.from,
            to: today.to.max(upcoming.to),
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.from && at <= self.to
    }

    /// Whether the event overlaps this range (running events included).
    pub fn overlaps(&self, event: &Event) -> bool {
        event.overlaps(self.from, self.to)
    }

    /// `from` formatted for a CalDAV time-range filter: `YYYYMMDDTHHMMSSZ`.
    ///
    /// The wall-clock value is sent as if it were UTC.
    pub fn caldav_start(&self) -> String {
        self.from.format("%Y%m%dT%H%M%SZ").to_string()
    }

    pub fn caldav_end(&self) -> String {
        self.to.format("%Y%m%dT%H%M%SZ").to_string()
    }

    /// `from` as an RFC 3339 timestamp with a `Z` suffix.
    pub fn from_rfc3339(&self) -> String {
        self.from.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    pub fn to_rfc3339(&self) -> String {
        self.to.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

pub(crate) fn add_saturating(at: NaiveDateTime, delta: TimeDelta) -> NaiveDateTime {
    at.checked_add_signed(delta).unwrap_or(if delta < TimeDelta::zero() {
        NaiveDateTime::MIN
    } else {
        NaiveDateTime::MAX
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_today_covers_whole_day() {
        let range = DateRange::today(dt("2024-03-10 09:15:00"));
        assert_eq!(range.from, dt("2024-03-10 00:00:00"));
        assert_eq!(range.to, dt("2024-03-10 23:59:59"));
        assert!(range.contains(dt("2024-03-10 23:59:59")));
        assert!(!range.contains(dt("2024-03-11 00:00:00")));
    }

    #[test]
    fn test_snapshot_spans_today_and_horizon() {
        let now = dt("2024-03-10 09:15:00");
        let range = DateRange::snapshot(now, TimeDelta::days(30));
        assert_eq!(range.from, dt("2024-03-10 00:00:00"));
        assert_eq!(range.to, dt("2024-04-09 09:15:00"));
    }

    #[test]
    fn test_snapshot_with_short_horizon_still_covers_today() {
        let now = dt("2024-03-10 09:15:00");
        let range = DateRange::snapshot(now, TimeDelta::hours(1));
        assert_eq!(range.to, dt("2024-03-10 23:59:59"));
    }

    #[test]
    fn test_huge_horizon_saturates() {
        let now = dt("2024-03-10 09:15:00");
        let range = DateRange::snapshot(now, TimeDelta::MAX);
        assert_eq!(range.from, dt("2024-03-10 00:00:00"));
        assert_eq!(range.to, NaiveDateTime::MAX);
    }

    #[test]
    fn test_query_formats() {
        let range = DateRange::new(dt("2024-03-10 00:00:00"), dt("2024-04-09 09:15:00"));
        assert_eq!(range.caldav_start(), "20240310T000000Z");
        assert_eq!(range.caldav_end(), "20240409T091500Z");
        assert_eq!(range.from_rfc3339(), "2024-03-10T00:00:00Z");
        assert_eq!(range.to_rfc3339(), "2024-04-09T09:15:00Z");
    }
}
