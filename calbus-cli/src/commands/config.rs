use std::path::{Path, PathBuf};

use anyhow::Result;
use calbus_core::config::{CalBusConfig, expand_path};
use owo_colors::OwoColorize;

fn resolve(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(expand_path(path)),
        None => Ok(CalBusConfig::config_path()?),
    }
}

pub fn init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = resolve(config_path)?;

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }

    CalBusConfig::create_default_config(&path)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}

pub fn path(config_path: Option<&Path>) -> Result<()> {
    println!("{}", resolve(config_path)?.display());
    Ok(())
}
