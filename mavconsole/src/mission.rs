//! Mission time-remaining estimation.
//!
//! Walks the loaded waypoint sequence from the active item, summing the
//! great-circle distance between navigation waypoints, and divides by a
//! smoothed speed.
//!
//! # Walk Rules
//!
//! ```text
//! DO_JUMP          -> continue at param1 (no distance)
//! nav item, x/y≠0  -> add distance, move "current position" there
//! LAND             -> stop after adding its leg
//! revisited index  -> stop (malformed or looping jump chains)
//! ```
//!
//! The visited set lives only for one call; nothing is persisted.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::protocol::cmd;

/// Earth radius used for great-circle distances, metres.
pub const EARTH_RADIUS_M: f64 = 6_378_100.0;

/// Readings further than this from the estimate replace it outright (m/s).
pub const SPEED_SNAP_THRESHOLD: f64 = 5.0;

/// Weight of the previous estimate when blending.
pub const SPEED_DECAY: f64 = 0.98;

/// Lower bound of the speed estimate (m/s).
pub const MIN_SPEED: f64 = 1.0;

/// Speed assumed when no airspeed reading is available (m/s).
pub const DEFAULT_SPEED_READING: f64 = 30.0;

/// One mission item as downloaded from the vehicle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionItem {
    pub seq: u16,
    /// `MAV_CMD` of the item.
    pub command: u16,
    pub param1: f32,
    pub param2: f32,
    pub param3: f32,
    pub param4: f32,
    /// Latitude, degrees.
    pub x: f64,
    /// Longitude, degrees.
    pub y: f64,
    /// Altitude, metres.
    pub z: f32,
}

impl MissionItem {
    /// Create a navigation item at a position.
    pub fn nav(command: u16, lat: f64, lon: f64) -> Self {
        Self {
            command,
            x: lat,
            y: lon,
            ..Default::default()
        }
    }

    /// Create a DO_JUMP to `target`.
    pub fn jump(target: u16) -> Self {
        Self {
            command: cmd::DO_JUMP,
            param1: f32::from(target),
            ..Default::default()
        }
    }

    /// Whether the item moves the vehicle to its position.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self.command,
            cmd::NAV_WAYPOINT
                | cmd::NAV_LOITER_UNLIM
                | cmd::NAV_LOITER_TURNS
                | cmd::NAV_LOITER_TIME
                | cmd::NAV_LAND
                | cmd::NAV_TAKEOFF
        )
    }

    /// Whether the item carries a position.
    pub fn has_position(&self) -> bool {
        self.x != 0.0 || self.y != 0.0
    }
}

/// Read access to the loaded mission.
pub trait MissionStore {
    /// Number of items.
    fn count(&self) -> usize;

    /// Item at `index`.
    fn item(&self, index: usize) -> Option<&MissionItem>;

    /// Home position as (lat, lon) degrees.
    fn home(&self) -> Option<(f64, f64)>;
}

/// A mission held in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub items: Vec<MissionItem>,
    /// Explicit home position; item 0 is used when absent.
    #[serde(default)]
    pub home: Option<(f64, f64)>,
}

impl Mission {
    /// Create a mission from items.
    pub fn new(items: Vec<MissionItem>) -> Self {
        Self { items, home: None }
    }

    /// Set an explicit home position.
    pub fn with_home(mut self, lat: f64, lon: f64) -> Self {
        self.home = Some((lat, lon));
        self
    }
}

impl MissionStore for Mission {
    fn count(&self) -> usize {
        self.items.len()
    }

    fn item(&self, index: usize) -> Option<&MissionItem> {
        self.items.get(index)
    }

    fn home(&self) -> Option<(f64, f64)> {
        self.home.or_else(|| {
            self.items
                .first()
                .filter(|item| item.has_position())
                .map(|item| (item.x, item.y))
        })
    }
}

/// Great-circle distance between two positions in metres (haversine).
pub fn gps_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (lon2 - lon1).to_radians();

    let a = (0.5 * dlat).sin().powi(2) + (0.5 * dlon).sin().powi(2) * lat1.cos() * lat2.cos();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Result of walking the mission from one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionWalk {
    /// Accumulated path length, metres.
    pub distance: f64,
    /// Number of items visited.
    pub steps: usize,
}

/// Walk the mission from `from`, starting at (`lat`, `lon`).
pub fn walk_mission(mission: &dyn MissionStore, lat: f64, lon: f64, from: usize) -> MissionWalk {
    let count = mission.count();
    let mut visited = HashSet::new();
    let mut distance = 0.0;
    let (mut lat, mut lon) = (lat, lon);
    let mut index = from;

    while index < count {
        if !visited.insert(index) {
            break;
        }
        let Some(item) = mission.item(index) else {
            break;
        };

        if item.command == cmd::DO_JUMP {
            // negative or NaN targets end the walk
            if !(item.param1 >= 0.0) {
                break;
            }
            index = item.param1 as usize;
            continue;
        }
        index += 1;

        if item.has_position() && item.is_navigation() {
            distance += gps_distance(lat, lon, item.x, item.y);
            lat = item.x;
            lon = item.y;
            if item.command == cmd::NAV_LAND {
                break;
            }
        }
    }

    MissionWalk {
        distance,
        steps: visited.len(),
    }
}

/// Estimated seconds to finish the mission from item `from`.
///
/// Returns 0 without a mission or when `from` is past the end. `speed` must
/// already be clamped to a positive minimum by the caller.
pub fn estimate_seconds_remaining(
    mission: Option<&dyn MissionStore>,
    lat: f64,
    lon: f64,
    from: usize,
    speed: f64,
) -> f64 {
    let Some(mission) = mission else {
        return 0.0;
    };
    if from >= mission.count() {
        return 0.0;
    }
    walk_mission(mission, lat, lon, from).distance / speed
}

/// Exponentially smoothed speed used for time-remaining estimates.
///
/// Large steps (more than [`SPEED_SNAP_THRESHOLD`]) snap to the new reading
/// so mode changes show up immediately; small ones are blended with
/// [`SPEED_DECAY`]. The estimate never drops below [`MIN_SPEED`].
#[derive(Debug, Clone, Default)]
pub struct SpeedEstimator {
    speed: f64,
}

impl SpeedEstimator {
    /// Create an estimator starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current estimate.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Fold in a new reading and return the clamped estimate.
    pub fn update(&mut self, reading: f64) -> f64 {
        if (reading - self.speed).abs() > SPEED_SNAP_THRESHOLD {
            self.speed = reading;
        } else {
            self.speed = SPEED_DECAY * self.speed + (1.0 - SPEED_DECAY) * reading;
        }
        self.speed = self.speed.max(MIN_SPEED);
        self.speed
    }
}
