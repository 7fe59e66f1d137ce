use std::path::Path;

use anyhow::Result;
use calbus_core::publish::MemorySink;
use calbus_core::scheduler::{PublishScheduler, ScheduleConfig, TickOutcome};
use chrono::Local;

/// One slow cycle against the configured source, facts printed to stdout.
pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let source = super::build_source(&config)?;

    let sink = MemorySink::new();
    let mut scheduler = PublishScheduler::new(source, &sink, ScheduleConfig::from(&config));
    let outcome = scheduler.slow_tick(Local::now().naive_local()).await;

    for fact in sink.facts() {
        println!("{}\t{}", fact.topic, fact.value.replace('\n', "\\n"));
    }

    if outcome == TickOutcome::FetchFailed {
        anyhow::bail!("Fetching events failed");
    }
    Ok(())
}
