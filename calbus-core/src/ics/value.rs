//! Property value decoding: text escapes, dates, datetimes and durations.

use chrono::{NaiveDate, NaiveTime, TimeDelta};

use crate::event::EventTime;

/// Undo ICS text escaping (`\n`, `\N`, `\,`, `\;`, `\\`).
///
/// Unknown escapes are kept verbatim.
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(',') => out.push(','),
            Some(';') => out.push(';'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

/// Parse a DTSTART/DTEND value.
///
/// A value with a `T` is a datetime, anything else a date-only (all-day)
/// value. Trailing `Z` and numeric offsets are dropped: the wall-clock part
/// is kept as a naive time. Accepts the basic (`20240310T090000`) and
/// extended (`2024-03-10T09:00:00`) forms, and minutes-only times.
pub fn parse_date_time(value: &str) -> Option<EventTime> {
    let mut value = value.trim();

    // Some generators leak the TZID parameter into the value itself.
    if let Some((head, rest)) = value.split_once(':') {
        if head.contains('=') {
            value = rest.trim();
        }
    }

    match value.split_once(['T', 't']) {
        None => parse_date_digits(value).map(EventTime::Date),
        Some((date, time)) => {
            let date = parse_date_digits(date)?;
            let time = parse_time_digits(time)?;
            Some(EventTime::DateTime(date.and_time(time)))
        }
    }
}

fn parse_date_digits(value: &str) -> Option<NaiveDate> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 8 || value.chars().any(|c| !c.is_ascii_digit() && c != '-') {
        return None;
    }
    let year = digits[0..4].parse().ok()?;
    let month = digits[4..6].parse().ok()?;
    let day = digits[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_time_digits(value: &str) -> Option<NaiveTime> {
    // Cut off `Z`, a numeric offset, or fractional seconds.
    let clock = value
        .split(['Z', 'z', '+', '-', '.', ','])
        .next()
        .unwrap_or_default();
    if clock.chars().any(|c| !c.is_ascii_digit() && c != ':') {
        return None;
    }
    let digits: String = clock.chars().filter(|c| c.is_ascii_digit()).collect();

    let hour = digits.get(0..2)?.parse().ok()?;
    let minute = digits.get(2..4)?.parse().ok()?;
    let second = match digits.len() {
        4 => 0,
        6 => digits[4..6].parse().ok()?,
        _ => return None,
    };
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Parse a positive ISO 8601 duration (`PT1H30M`, `P1D`, `P2W`).
pub fn parse_duration(value: &str) -> Option<TimeDelta> {
    let value = value.trim();
    if value.starts_with('-') {
        return None;
    }
    let value = value.trim_start_matches('+');

    let duration = iso8601::duration(value).ok()?;
    let std_duration: std::time::Duration = duration.into();
    TimeDelta::from_std(std_duration).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> EventTime {
        EventTime::DateTime(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap())
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape_text(r"Line one\nLine two"), "Line one\nLine two");
        assert_eq!(unescape_text(r"Room 1\, floor 2\; east"), "Room 1, floor 2; east");
        assert_eq!(unescape_text(r"C:\\temp"), r"C:\temp");
        assert_eq!(unescape_text(r"keep \x as is"), r"keep \x as is");
    }

    #[test]
    fn test_datetime_forms() {
        assert_eq!(parse_date_time("20240310T090000"), Some(dt("2024-03-10 09:00:00")));
        assert_eq!(parse_date_time("20240310T090000Z"), Some(dt("2024-03-10 09:00:00")));
        assert_eq!(parse_date_time("20240310T0930"), Some(dt("2024-03-10 09:30:00")));
        assert_eq!(parse_date_time("2024-03-10T09:00:00"), Some(dt("2024-03-10 09:00:00")));
        assert_eq!(
            parse_date_time("2024-03-10T09:00:00+01:00"),
            Some(dt("2024-03-10 09:00:00"))
        );
        assert_eq!(parse_date_time(" 20240310T090000 "), Some(dt("2024-03-10 09:00:00")));
    }

    #[test]
    fn test_date_only_is_all_day() {
        assert_eq!(
            parse_date_time("20240310"),
            Some(EventTime::Date(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()))
        );
    }

    #[test]
    fn test_leaked_tzid_is_ignored() {
        assert_eq!(
            parse_date_time("TZID=Europe/Prague:20240310T090000"),
            Some(dt("2024-03-10 09:00:00"))
        );
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(parse_date_time(""), None);
        assert_eq!(parse_date_time("tomorrow"), None);
        assert_eq!(parse_date_time("20241310T090000"), None);
        assert_eq!(parse_date_time("20240310T250000"), None);
        assert_eq!(parse_date_time("2024031"), None);
    }

    #[test]
    fn test_duration() {
        assert_eq!(parse_duration("PT1H30M"), Some(TimeDelta::minutes(90)));
        assert_eq!(parse_duration("P1D"), Some(TimeDelta::days(1)));
        assert_eq!(parse_duration("-PT15M"), None);
        assert_eq!(parse_duration("soon"), None);
    }
}
