//! Settings CLI commands.
//!
//! Provides `config path` and `config check` for locating and validating
//! the console settings file.

use std::path::PathBuf;

use clap::Subcommand;
use mavconsole::config::config_file_path;
use mavconsole::ConsoleSettings;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the settings file path
    Path,

    /// Load a settings file and print the effective settings
    Check {
        /// Settings file (default: the user settings file)
        file: Option<PathBuf>,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Check { file } => run_check(file),
    }
}

/// Show the settings file path.
fn run_path() -> Result<(), CliError> {
    let path = config_file_path()
        .ok_or_else(|| CliError::Config("No configuration directory on this system".to_string()))?;
    println!("{}", path.display());
    Ok(())
}

/// Load settings and print them.
fn run_check(file: Option<PathBuf>) -> Result<(), CliError> {
    let settings = match &file {
        Some(path) => ConsoleSettings::load(path)?,
        None => ConsoleSettings::load_default()?,
    };

    for line in describe(&settings) {
        println!("{}", line);
    }
    Ok(())
}

/// Effective settings as `[section]` / `key = value` lines.
fn describe(settings: &ConsoleSettings) -> Vec<String> {
    let mut lines = vec![
        "[console]".to_string(),
        format!("  announce_interval = {}", settings.announce_interval),
        format!("  basealt = {}", settings.basealt),
        format!(
            "  vehicle_name = {}",
            settings.vehicle_name.as_deref().unwrap_or("(not set)")
        ),
        format!("  debug_level = {}", settings.debug_level),
        format!("  check_delay = {}", settings.check_delay),
        String::new(),
        "[units]".to_string(),
        format!("  distance = {}", settings.units.distance),
        format!("  height = {}", settings.units.height),
        format!("  speed = {}", settings.units.speed),
    ];

    if !settings.display_items.is_empty() {
        lines.push(String::new());
        lines.push("[display]".to_string());
        for item in &settings.display_items {
            lines.push(format!("  {}", item));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_defaults() {
        let lines = describe(&ConsoleSettings::default());
        assert!(lines.contains(&"  announce_interval = 30".to_string()));
        assert!(lines.contains(&"  vehicle_name = (not set)".to_string()));
        assert!(lines.contains(&"  speed = m/s".to_string()));
        assert!(!lines.contains(&"[display]".to_string()));
    }

    #[test]
    fn test_describe_display_items() {
        let settings = ConsoleSettings::from_ini_str(
            "[display.Gs]\nformat = %.1f\nexpression = VFR_HUD.groundspeed\n",
        )
        .unwrap();
        let lines = describe(&settings);
        assert!(lines.contains(&"  Gs : FMT=%.1f EXPR=VFR_HUD.groundspeed ROW=4".to_string()));
    }
}
