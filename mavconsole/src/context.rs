//! Host queries.
//!
//! The engine does not own the mission, the terrain database, the parameter
//! cache or the links. It asks the host through [`VehicleContext`] while
//! handling a message. All queries are read-only.

use crate::flight_timer::VehicleClass;
use crate::link::LinkStats;
use crate::message::VehicleIdentity;
use crate::mission::{Mission, MissionStore};

/// Terrain elevation lookup.
pub trait TerrainModel {
    /// Ground elevation above mean sea level in metres, if known.
    fn elevation(&self, lat: f64, lon: f64) -> Option<f64>;
}

impl<F> TerrainModel for F
where
    F: Fn(f64, f64) -> Option<f64>,
{
    fn elevation(&self, lat: f64, lon: f64) -> Option<f64> {
        self(lat, lon)
    }
}

/// Read-only view of host state consulted during dispatch.
pub trait VehicleContext {
    /// Whether `source` is the vehicle the operator is looking at.
    fn is_primary(&self, source: VehicleIdentity) -> bool;

    /// Class of the primary vehicle, for the flying predicate.
    fn vehicle_class(&self) -> VehicleClass {
        VehicleClass::Other
    }

    /// Flight mode name for a vehicle of `mav_type` in `custom_mode`.
    fn flight_mode(&self, mav_type: u8, custom_mode: u32) -> String;

    /// The loaded mission, if any.
    fn mission(&self) -> Option<&dyn MissionStore> {
        None
    }

    /// Home position (lat, lon) degrees.
    fn home(&self) -> Option<(f64, f64)> {
        self.mission().and_then(|m| m.home())
    }

    fn terrain(&self) -> Option<&dyn TerrainModel> {
        None
    }

    /// Parameters (received, total).
    fn param_status(&self) -> (u32, u32) {
        (0, 0)
    }

    /// Marker that changes whenever a new component appears in parameter
    /// downloads.
    fn param_epoch(&self) -> u64 {
        0
    }

    /// Component ids the host knows for a system.
    fn component_ids(&self, _system_id: u8) -> Vec<u8> {
        Vec::new()
    }

    /// Per-link counters.
    fn links(&self) -> Vec<LinkStats> {
        Vec::new()
    }
}

/// In-memory [`VehicleContext`] with plain fields.
///
/// Suitable for replays and tests. With no primary set, every source is
/// treated as primary.
#[derive(Default)]
pub struct SimpleContext {
    pub primary: Option<VehicleIdentity>,
    pub class: VehicleClass,
    pub mission: Option<Mission>,
    pub home: Option<(f64, f64)>,
    pub terrain: Option<Box<dyn TerrainModel>>,
    pub params: (u32, u32),
    pub param_epoch: u64,
    pub components: Vec<(u8, u8)>,
    pub links: Vec<LinkStats>,
}

impl SimpleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary(mut self, identity: VehicleIdentity) -> Self {
        self.primary = Some(identity);
        self
    }

    pub fn with_class(mut self, class: VehicleClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_mission(mut self, mission: Mission) -> Self {
        self.mission = Some(mission);
        self
    }

    pub fn with_home(mut self, lat: f64, lon: f64) -> Self {
        self.home = Some((lat, lon));
        self
    }

    pub fn with_terrain(mut self, terrain: impl TerrainModel + 'static) -> Self {
        self.terrain = Some(Box::new(terrain));
        self
    }

    pub fn with_links(mut self, links: Vec<LinkStats>) -> Self {
        self.links = links;
        self
    }
}

impl VehicleContext for SimpleContext {
    fn is_primary(&self, source: VehicleIdentity) -> bool {
        self.primary.map_or(true, |p| p == source)
    }

    fn vehicle_class(&self) -> VehicleClass {
        self.class
    }

    fn flight_mode(&self, _mav_type: u8, custom_mode: u32) -> String {
        format!("Mode({})", custom_mode)
    }

    fn mission(&self) -> Option<&dyn MissionStore> {
        self.mission.as_ref().map(|m| m as &dyn MissionStore)
    }

    fn home(&self) -> Option<(f64, f64)> {
        self.home.or_else(|| self.mission().and_then(|m| m.home()))
    }

    fn terrain(&self) -> Option<&dyn TerrainModel> {
        self.terrain.as_deref()
    }

    fn param_status(&self) -> (u32, u32) {
        self.params
    }

    fn param_epoch(&self) -> u64 {
        self.param_epoch
    }

    fn component_ids(&self, system_id: u8) -> Vec<u8> {
        self.components
            .iter()
            .filter(|(s, _)| *s == system_id)
            .map(|(_, c)| *c)
            .collect()
    }

    fn links(&self) -> Vec<LinkStats> {
        self.links.clone()
    }
}
