//! Console settings.
//!
//! Settings are read from an INI file. Every key is optional; missing keys
//! keep their defaults.
//!
//! ```text
//! [console]
//! announce_interval = 30
//! basealt = 0
//! vehicle_name =
//! debug_level = 0
//! check_delay = true
//!
//! [units]
//! distance = m
//! height = m
//! speed = m/s
//!
//! [display.Batt]
//! format = %.2fV
//! expression = SYS_STATUS.voltage_battery*0.001
//! row = 4
//! ```
//!
//! Settings are only read here. Writing them back is left to the host.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};

use crate::error::ConfigError;
use crate::expression::{DisplayItem, DEFAULT_DISPLAY_ROW};
use crate::units::Units;

/// Default seconds between repeated critical failure announcements.
pub const DEFAULT_ANNOUNCE_INTERVAL: f64 = 30.0;

const CONSOLE_SECTION: &str = "console";
const UNITS_SECTION: &str = "units";
const DISPLAY_PREFIX: &str = "display.";

/// Path of the settings file: `<config dir>/mavconsole/console.ini`.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mavconsole").join("console.ini"))
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleSettings {
    /// Minimum seconds between critical failure announcements.
    pub announce_interval: f64,
    /// Base altitude for AGL estimates in metres; 0 uses the home elevation.
    pub basealt: f64,
    /// Optional prefix for the flight mode display.
    pub vehicle_name: Option<String>,
    /// Verbosity of custom expression failure logging.
    pub debug_level: u8,
    /// Whether link delay is measured and shown.
    pub check_delay: bool,
    pub units: Units,
    /// Custom display items to register at startup.
    pub display_items: Vec<DisplayItem>,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            announce_interval: DEFAULT_ANNOUNCE_INTERVAL,
            basealt: 0.0,
            vehicle_name: None,
            debug_level: 0,
            check_delay: true,
            units: Units::default(),
            display_items: Vec::new(),
        }
    }
}

impl ConsoleSettings {
    /// Create default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_announce_interval(mut self, seconds: f64) -> Self {
        self.announce_interval = seconds;
        self
    }

    pub fn with_basealt(mut self, meters: f64) -> Self {
        self.basealt = meters;
        self
    }

    pub fn with_vehicle_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.vehicle_name = (!name.is_empty()).then_some(name);
        self
    }

    pub fn with_debug_level(mut self, level: u8) -> Self {
        self.debug_level = level;
        self
    }

    pub fn with_check_delay(mut self, enabled: bool) -> Self {
        self.check_delay = enabled;
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn with_display_item(mut self, item: DisplayItem) -> Self {
        self.display_items.push(item);
        self
    }

    /// Load settings from an INI file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)?;
        tracing::debug!(path = %path.display(), "Loaded console settings");
        Self::from_ini(&ini)
    }

    /// Load settings from the default path, falling back to defaults when
    /// the file does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        match config_file_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse settings from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(console) = ini.section(Some(CONSOLE_SECTION)) {
            if let Some(v) = parse_key::<f64>(console, CONSOLE_SECTION, "announce_interval")? {
                settings.announce_interval = v;
            }
            if let Some(v) = parse_key::<f64>(console, CONSOLE_SECTION, "basealt")? {
                settings.basealt = v;
            }
            if let Some(v) = parse_key::<u8>(console, CONSOLE_SECTION, "debug_level")? {
                settings.debug_level = v;
            }
            if let Some(v) = console.get("check_delay") {
                settings.check_delay = parse_bool(v)
                    .ok_or_else(|| ConfigError::invalid("console.check_delay", v))?;
            }
            if let Some(v) = console.get("vehicle_name") {
                settings = settings.with_vehicle_name(v.trim());
            }
        }

        if let Some(units) = ini.section(Some(UNITS_SECTION)) {
            if let Some(v) = units.get("distance") {
                settings.units.distance = v.parse()?;
            }
            if let Some(v) = units.get("height") {
                settings.units.height = v.parse()?;
            }
            if let Some(v) = units.get("speed") {
                settings.units.speed = v.parse()?;
            }
        }

        for (section, props) in ini.iter() {
            let Some(id) = section.and_then(|s| s.strip_prefix(DISPLAY_PREFIX)) else {
                continue;
            };
            settings.display_items.push(display_item(id, props)?);
        }

        Ok(settings)
    }
}

fn parse_key<T: FromStr>(
    props: &Properties,
    section: &str,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    props
        .get(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::invalid(format!("{}.{}", section, key), v))
        })
        .transpose()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn display_item(id: &str, props: &Properties) -> Result<DisplayItem, ConfigError> {
    let format = props.get("format").ok_or(ConfigError::MissingKey {
        id: id.to_string(),
        key: "format",
    })?;
    let expression = props.get("expression").ok_or(ConfigError::MissingKey {
        id: id.to_string(),
        key: "expression",
    })?;
    let section = format!("{}{}", DISPLAY_PREFIX, id);
    let row = parse_key::<u8>(props, &section, "row")?.unwrap_or(DEFAULT_DISPLAY_ROW);

    DisplayItem::new(id, format, expression, row).map_err(|source| ConfigError::DisplayItem {
        id: id.to_string(),
        source,
    })
}
