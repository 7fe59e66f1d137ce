use std::path::Path;

use anyhow::Result;
use calbus_core::publish::{StdoutSink, Status, publish_all, status_fact};
use calbus_core::scheduler::{PublishScheduler, ScheduleConfig};
use calbus_core::source::EventSource;

use crate::mqtt::MqttSink;
use crate::sink::Sink;

pub async fn run(config_path: Option<&Path>, dry_run: bool) -> Result<()> {
    let config = super::load_config(config_path)?;

    let sink = if dry_run {
        Sink::Stdout(StdoutSink::new(config.mqtt.topic_prefix.clone()))
    } else {
        Sink::Mqtt(MqttSink::connect(&config.mqtt))
    };

    publish_all(&sink, &[status_fact(&Status::Initializing)]);

    let source = match super::build_source(&config) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %e, "Calendar source unavailable");
            publish_all(&sink, &[status_fact(&Status::from(&e))]);
            sink.shutdown().await;
            return Err(e.into());
        }
    };

    tracing::info!(
        source = source.name(),
        refresh = %humantime::format_duration(config.refresh_interval()),
        "Starting publish loop"
    );

    let mut scheduler = PublishScheduler::new(source, &sink, ScheduleConfig::from(&config));
    scheduler.run(shutdown_signal()).await;
    drop(scheduler);

    sink.shutdown().await;
    tracing::info!("Stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
