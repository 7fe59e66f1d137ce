use crate::event::EventTime;

/// `DD.MM.YYYY HH:MM` for timed values, `DD.MM.YYYY` for all-day values.
pub fn format_absolute(value: &EventTime) -> String {
    match value {
        EventTime::DateTime(dt) => dt.format("%d.%m.%Y %H:%M").to_string(),
        EventTime::Date(d) => d.format("%d.%m.%Y").to_string(),
    }
}
