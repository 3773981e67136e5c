mod commands;
mod config;
mod logging;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::sync::SyncArgs;
use crate::config::Settings;

#[derive(Parser)]
#[command(name = "showcal")]
#[command(version, about = "Keep a local concert calendar in sync with a venue's event feed")]
struct Cli {
    /// Config file (defaults to ~/.config/showcal/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging and list unchanged events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feed and merge it into the calendar file (default)
    Sync(SyncArgs),
    /// Show config path and effective settings
    Config {
        /// Write a commented default config file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => Settings::config_path()?,
    };
    let mut settings = Settings::load(&config_path)?;

    match cli.command.unwrap_or_else(|| Commands::Sync(SyncArgs::default())) {
        Commands::Sync(args) => {
            args.apply(&mut settings);
            commands::sync::run(&settings, args.dry_run, cli.verbose)
        }
        Commands::Config { init } => commands::config::run(&config_path, &settings, init),
    }
}
