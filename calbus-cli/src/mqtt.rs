//! MQTT delivery for published facts.

use std::time::Duration;

use calbus_core::config::MqttConfig;
use calbus_core::publish::{FactSink, Status, Topic};
use calbus_core::{CalBusError, CalBusResult};
use rumqttc::{AsyncClient, Event, LastWill, MqttOptions, Outgoing, Packet, QoS};
use tokio::task::JoinHandle;

/// Pending publishes buffered while the broker is unreachable.
const REQUEST_CAPACITY: usize = 64;
const MIN_KEEP_ALIVE_SECS: u64 = 5;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Publishes facts as retained QoS 1 messages under a topic prefix.
///
/// The connection is driven by a background task; `publish` only queues.
pub struct MqttSink {
    client: AsyncClient,
    prefix: String,
    event_loop: JoinHandle<()>,
}

impl MqttSink {
    /// Start the connection task. Must be called inside a Tokio runtime.
    pub fn connect(config: &MqttConfig) -> Self {
        let prefix = config.topic_prefix.trim_end_matches('/').to_string();

        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(
            config.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS),
        ));
        if let Some(username) = &config.username {
            options.set_credentials(username, config.password.clone().unwrap_or_default());
        }
        // Subscribers learn about a vanished publisher through the retained status.
        options.set_last_will(LastWill::new(
            prefixed(&prefix, Topic::Status.key()),
            Status::Error("publisher offline".into()).to_string(),
            QoS::AtLeastOnce,
            true,
        ));

        let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let host = config.host.clone();
        let port = config.port;

        let event_loop = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        tracing::info!(host = %host, port, "Connected to MQTT broker");
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(host = %host, port, error = %e, "MQTT connection error");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        });

        MqttSink {
            client,
            prefix,
            event_loop,
        }
    }

    /// Disconnect and wait briefly for queued messages to go out.
    pub async fn shutdown(self) {
        if let Err(e) = self.client.disconnect().await {
            tracing::warn!(error = %e, "MQTT disconnect failed");
        }
        if tokio::time::timeout(SHUTDOWN_GRACE, self.event_loop)
            .await
            .is_err()
        {
            tracing::debug!("MQTT event loop did not stop in time");
        }
    }
}

impl FactSink for MqttSink {
    fn publish(&self, topic: &str, value: &str, retained: bool) -> CalBusResult<()> {
        self.client
            .try_publish(
                prefixed(&self.prefix, topic),
                QoS::AtLeastOnce,
                retained,
                value.as_bytes().to_vec(),
            )
            .map_err(|e| CalBusError::Publish(e.to_string()))
    }
}

fn prefixed(prefix: &str, topic: &str) -> String {
    if prefix.is_empty() {
        topic.to_string()
    } else {
        format!("{prefix}/{topic}")
    }
}
