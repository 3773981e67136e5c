use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::Settings;

pub fn run(config_path: &Path, settings: &Settings, init: bool) -> Result<()> {
    if init {
        if config_path.exists() {
            anyhow::bail!("Config file already exists at {}", config_path.display());
        }
        Settings::create_default_config(config_path)?;
        println!("Created {}", config_path.display());
        return Ok(());
    }

    let status = if config_path.exists() {
        String::new()
    } else {
        " (not found, using defaults)".dimmed().to_string()
    };

    println!("{}", "Paths".bold());
    println!("  Config:    {}{}", config_path.display(), status);
    println!("  Calendar:  {}", settings.calendar_path().display());
    println!();
    println!("{}", "Settings".bold());
    for line in settings.to_toml()?.lines() {
        println!("  {}", line);
    }

    Ok(())
}
