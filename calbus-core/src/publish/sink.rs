use std::io::Write;
use std::sync::Mutex;

use crate::error::{CalBusError, CalBusResult};

use super::facts::Fact;

/// Where published facts go.
///
/// `publish` must not block: delivery happens in the background and there is
/// no acknowledgment contract.
pub trait FactSink {
    fn publish(&self, topic: &str, value: &str, retained: bool) -> CalBusResult<()>;
}

impl<S: FactSink + ?Sized> FactSink for Box<S> {
    fn publish(&self, topic: &str, value: &str, retained: bool) -> CalBusResult<()> {
        (**self).publish(topic, value, retained)
    }
}

impl<S: FactSink + ?Sized> FactSink for &S {
    fn publish(&self, topic: &str, value: &str, retained: bool) -> CalBusResult<()> {
        (**self).publish(topic, value, retained)
    }
}

/// Publish facts in order. Failures are logged and never stop the batch.
///
/// Returns how many facts the sink accepted.
pub fn publish_all<S: FactSink + ?Sized>(sink: &S, facts: &[Fact]) -> usize {
    let mut accepted = 0;
    for fact in facts {
        match sink.publish(fact.topic.key(), &fact.value, fact.retained) {
            Ok(()) => {
                tracing::debug!(topic = fact.topic.key(), value = %fact.value, "Published");
                accepted += 1;
            }
            Err(e) => {
                tracing::warn!(topic = fact.topic.key(), error = %e, "Publish failed");
            }
        }
    }
    accepted
}

/// A fact as a sink received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFact {
    pub topic: String,
    pub value: String,
    pub retained: bool,
}

/// Keeps every published fact in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    facts: Mutex<Vec<RecordedFact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, oldest first.
    pub fn facts(&self) -> Vec<RecordedFact> {
        self.facts.lock().map(|f| f.clone()).unwrap_or_default()
    }

    /// The latest value published for `topic`, like a retained subscriber
    /// would see it.
    pub fn latest(&self, topic: &str) -> Option<String> {
        self.facts
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|f| f.topic == topic)
            .map(|f| f.value.clone())
    }

    /// How many times `topic` was published.
    pub fn count(&self, topic: &str) -> usize {
        self.facts
            .lock()
            .map(|f| f.iter().filter(|f| f.topic == topic).count())
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut facts) = self.facts.lock() {
            facts.clear();
        }
    }
}

impl FactSink for MemorySink {
    fn publish(&self, topic: &str, value: &str, retained: bool) -> CalBusResult<()> {
        let mut facts = self
            .facts
            .lock()
            .map_err(|_| CalBusError::Publish("memory sink poisoned".into()))?;
        facts.push(RecordedFact {
            topic: topic.to_string(),
            value: value.to_string(),
            retained,
        });
        Ok(())
    }
}

/// Prints `topic<TAB>value` lines; newlines inside values are shown as `\n`.
#[derive(Debug, Default)]
pub struct StdoutSink {
    prefix: String,
}

impl StdoutSink {
    pub fn new(prefix: impl Into<String>) -> Self {
        StdoutSink {
            prefix: prefix.into(),
        }
    }
}

impl FactSink for StdoutSink {
    fn publish(&self, topic: &str, value: &str, _retained: bool) -> CalBusResult<()> {
        let topic = if self.prefix.is_empty() {
            topic.to_string()
        } else {
            format!("{}/{}", self.prefix, topic)
        };
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}\t{}", topic, value.replace('\n', "\\n"))?;
        Ok(())
    }
}
