mod commands;
mod logging;
mod mqtt;
mod sink;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "calbus", version)]
#[command(about = "Publish your calendar as retained MQTT facts")]
struct Cli {
    /// Config file (default: ~/.config/calbus/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the publish loop until interrupted
    Run {
        /// Print facts to stdout instead of publishing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch once, print the resulting facts and exit
    Once,
    /// Parse a local .ics file and show how each event would be displayed
    Parse { file: PathBuf },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print where the config file is read from
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run { dry_run } => commands::run::run(config_path, dry_run).await,
        Commands::Once => commands::once::run(config_path).await,
        Commands::Parse { file } => commands::parse::run(&file),
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config::init(config_path, force),
            ConfigAction::Path => commands::config::path(config_path),
        },
    }
}
