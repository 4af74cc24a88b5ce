//! Display units for distances, heights and speeds.
//!
//! Whole-unit values are truncated toward zero, matching how ground stations
//! traditionally print integer fields.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

const METERS_TO_NM: f64 = 0.000_539_957;
const METERS_TO_MILES: f64 = 0.000_621_371;
const METERS_TO_FEET: f64 = 3.280_84;
const MS_TO_KNOTS: f64 = 1.943_84;
const MS_TO_MPH: f64 = 2.236_94;

/// Unit for horizontal distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    #[default]
    Meters,
    NauticalMiles,
    Miles,
}

/// Unit for heights and altitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeightUnit {
    #[default]
    Meters,
    Feet,
}

/// Unit for speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedUnit {
    #[default]
    MetersPerSecond,
    Knots,
    Mph,
}

impl FromStr for DistanceUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" => Ok(DistanceUnit::Meters),
            "nm" => Ok(DistanceUnit::NauticalMiles),
            "miles" => Ok(DistanceUnit::Miles),
            other => Err(ConfigError::invalid("units.distance", other)),
        }
    }
}

impl FromStr for HeightUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" => Ok(HeightUnit::Meters),
            "feet" | "ft" => Ok(HeightUnit::Feet),
            other => Err(ConfigError::invalid("units.height", other)),
        }
    }
}

impl FromStr for SpeedUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m/s" => Ok(SpeedUnit::MetersPerSecond),
            "knots" | "kn" => Ok(SpeedUnit::Knots),
            "mph" => Ok(SpeedUnit::Mph),
            other => Err(ConfigError::invalid("units.speed", other)),
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::NauticalMiles => "nm",
            DistanceUnit::Miles => "miles",
        })
    }
}

impl fmt::Display for HeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HeightUnit::Meters => "m",
            HeightUnit::Feet => "feet",
        })
    }
}

impl fmt::Display for SpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpeedUnit::MetersPerSecond => "m/s",
            SpeedUnit::Knots => "knots",
            SpeedUnit::Mph => "mph",
        })
    }
}

/// Unit selection for all formatted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Units {
    pub distance: DistanceUnit,
    pub height: HeightUnit,
    pub speed: SpeedUnit,
}

impl Units {
    /// Format a distance given in metres.
    pub fn dist_string(&self, meters: f64) -> String {
        match self.distance {
            DistanceUnit::Meters => format!("{}m", meters as i64),
            DistanceUnit::NauticalMiles => format!("{:.1}nm", meters * METERS_TO_NM),
            DistanceUnit::Miles => format!("{:.1}miles", meters * METERS_TO_MILES),
        }
    }

    /// Format a height given in metres.
    pub fn height_string(&self, meters: f64) -> String {
        match self.height {
            HeightUnit::Meters => format!("{}m", meters as i64),
            HeightUnit::Feet => format!("{}ft", (meters * METERS_TO_FEET) as i64),
        }
    }

    /// Format a speed given in metres per second.
    pub fn speed_string(&self, meters_per_second: f64) -> String {
        match self.speed {
            SpeedUnit::MetersPerSecond => format!("{}m/s", meters_per_second as i64),
            SpeedUnit::Knots => format!("{}kn", (meters_per_second * MS_TO_KNOTS) as i64),
            SpeedUnit::Mph => format!("{}mph", (meters_per_second * MS_TO_MPH) as i64),
        }
    }
}
