//! Core library for calbus.
//!
//! calbus reads calendar events from a Google Calendar API account, a CalDAV
//! collection or a raw ICS feed, normalizes them into one [`Event`] model and
//! publishes a small set of retained key/value facts ("next event", "today's
//! events", "status") to a publish/subscribe bus.
//!
//! - [`ics`] parses iCal/ICS text in its various dialects
//! - [`format`] derives display strings (absolute dates, "in 12m", "tomorrow")
//! - [`source`] fetches events from the supported upstreams
//! - [`scheduler`] keeps the slow snapshot and the fast countdown in step

pub mod config;
pub mod constants;
pub mod date_range;
pub mod error;
pub mod event;
pub mod format;
pub mod ics;
pub mod publish;
pub mod scheduler;
pub mod source;
pub mod window;

pub use error::{CalBusError, CalBusResult};
pub use event::*;
