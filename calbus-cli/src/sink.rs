use calbus_core::CalBusResult;
use calbus_core::publish::{FactSink, StdoutSink};

use crate::mqtt::MqttSink;

/// Where `calbus run` sends facts.
pub enum Sink {
    Mqtt(MqttSink),
    Stdout(StdoutSink),
}

impl Sink {
    pub async fn shutdown(self) {
        if let Sink::Mqtt(mqtt) = self {
            mqtt.shutdown().await;
        }
    }
}

impl FactSink for Sink {
    fn publish(&self, topic: &str, value: &str, retained: bool) -> CalBusResult<()> {
        match self {
            Sink::Mqtt(sink) => sink.publish(topic, value, retained),
            Sink::Stdout(sink) => sink.publish(topic, value, retained),
        }
    }
}
