//! Facts published to the bus and the sinks that deliver them.

mod facts;
mod sink;

pub use facts::{
    Fact, Status, Topic, clock_fact, next_event_facts, status_fact, time_facts, today_facts,
};
pub use sink::{FactSink, MemorySink, RecordedFact, StdoutSink, publish_all};
