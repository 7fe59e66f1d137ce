//! iCal/ICS parsing.
//!
//! Feeds seen in the wild only loosely follow RFC 5545, so this parser is
//! deliberately forgiving: it understands line folding, property parameters
//! and the common escape sequences, and skips anything it does not know.

mod line;
mod parse;
mod value;

pub use line::{ContentLine, unfold};
pub use parse::{ParseFailure, parse_blocks, parse_feed};
pub use value::{parse_date_time, parse_duration, unescape_text};
