//! Display strings derived from events.
//!
//! Everything here is a pure function of its inputs. `now` is always passed
//! in explicitly so the same inputs always yield the same text.

mod absolute;
mod relative;
mod text;

pub use absolute::format_absolute;
pub use relative::{RelativeStyle, format_relative, format_relative_simple, format_time_until};
pub use text::{clean_text, truncate_chars};
