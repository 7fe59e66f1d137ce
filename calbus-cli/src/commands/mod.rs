pub mod config;
pub mod once;
pub mod parse;
pub mod run;

use std::path::Path;

use anyhow::{Context, Result};
use calbus_core::config::CalBusConfig;
use calbus_core::source::Source;

fn load_config(path: Option<&Path>) -> Result<CalBusConfig> {
    CalBusConfig::load(path).context("Failed to load configuration")
}

/// Validate the config and build its source.
fn build_source(config: &CalBusConfig) -> calbus_core::CalBusResult<Source> {
    config.validate()?;
    Source::from_config(config.source()?, config.fetch_timeout())
}
