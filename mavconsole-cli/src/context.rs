//! Host state for offline replay.
//!
//! A capture has no live link, parameter cache or terrain database, so the
//! replay context answers host queries from command-line options and from
//! what it learns while the capture plays.

use mavconsole::flight_timer::VehicleClass;
use mavconsole::mission::{Mission, MissionStore};
use mavconsole::protocol::mav_type;
use mavconsole::{TerrainModel, VehicleContext, VehicleIdentity};

const COPTER_MODES: &[(u32, &str)] = &[
    (0, "STABILIZE"),
    (1, "ACRO"),
    (2, "ALT_HOLD"),
    (3, "AUTO"),
    (4, "GUIDED"),
    (5, "LOITER"),
    (6, "RTL"),
    (7, "CIRCLE"),
    (9, "LAND"),
    (11, "DRIFT"),
    (13, "SPORT"),
    (14, "FLIP"),
    (15, "AUTOTUNE"),
    (16, "POSHOLD"),
    (17, "BRAKE"),
    (18, "THROW"),
    (19, "AVOID_ADSB"),
    (20, "GUIDED_NOGPS"),
    (21, "SMART_RTL"),
    (22, "FLOWHOLD"),
    (23, "FOLLOW"),
    (24, "ZIGZAG"),
    (25, "SYSTEMID"),
    (26, "AUTOROTATE"),
    (27, "AUTO_RTL"),
];

const PLANE_MODES: &[(u32, &str)] = &[
    (0, "MANUAL"),
    (1, "CIRCLE"),
    (2, "STABILIZE"),
    (3, "TRAINING"),
    (4, "ACRO"),
    (5, "FBWA"),
    (6, "FBWB"),
    (7, "CRUISE"),
    (8, "AUTOTUNE"),
    (10, "AUTO"),
    (11, "RTL"),
    (12, "LOITER"),
    (13, "TAKEOFF"),
    (14, "AVOID_ADSB"),
    (15, "GUIDED"),
    (17, "QSTABILIZE"),
    (18, "QHOVER"),
    (19, "QLOITER"),
    (20, "QLAND"),
    (21, "QRTL"),
    (22, "QAUTOTUNE"),
    (23, "QACRO"),
    (24, "THERMAL"),
];

const ROVER_MODES: &[(u32, &str)] = &[
    (0, "MANUAL"),
    (1, "ACRO"),
    (3, "STEERING"),
    (4, "HOLD"),
    (5, "LOITER"),
    (6, "FOLLOW"),
    (7, "SIMPLE"),
    (8, "DOCK"),
    (9, "CIRCLE"),
    (10, "AUTO"),
    (11, "RTL"),
    (12, "SMART_RTL"),
    (15, "GUIDED"),
];

/// Whether a vehicle type flies like a multirotor.
pub fn is_copter_type(type_code: u8) -> bool {
    matches!(
        type_code,
        mav_type::QUADROTOR
            | mav_type::COAXIAL
            | mav_type::HELICOPTER
            | mav_type::HEXAROTOR
            | mav_type::OCTOROTOR
            | mav_type::TRICOPTER
            | mav_type::DODECAROTOR
    )
}

/// ArduPilot mode name for a vehicle type and custom mode.
pub fn mode_name(type_code: u8, custom_mode: u32) -> String {
    let table: &[(u32, &str)] = match type_code {
        t if is_copter_type(t) => COPTER_MODES,
        mav_type::FIXED_WING
        | mav_type::VTOL_DUOROTOR
        | mav_type::VTOL_QUADROTOR
        | mav_type::VTOL_TILTROTOR => PLANE_MODES,
        mav_type::GROUND_ROVER | mav_type::SURFACE_BOAT => ROVER_MODES,
        _ => &[],
    };
    table
        .iter()
        .find(|(mode, _)| *mode == custom_mode)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| format!("Mode({})", custom_mode))
}

/// Host context for replaying a capture.
#[derive(Default)]
pub struct ReplayContext {
    /// Requested primary system id; the first vehicle seen when `None`.
    requested_system: Option<u8>,
    primary: Option<VehicleIdentity>,
    /// Class forced on the command line.
    class_override: Option<VehicleClass>,
    class: VehicleClass,
    mission: Option<Mission>,
    terrain: Option<FlatTerrain>,
}

/// Terrain at a constant elevation.
#[derive(Debug, Clone, Copy)]
pub struct FlatTerrain(pub f64);

impl TerrainModel for FlatTerrain {
    fn elevation(&self, _lat: f64, _lon: f64) -> Option<f64> {
        Some(self.0)
    }
}

impl ReplayContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary_system(mut self, system_id: Option<u8>) -> Self {
        self.requested_system = system_id;
        self
    }

    pub fn with_class(mut self, class: Option<VehicleClass>) -> Self {
        self.class_override = class;
        self
    }

    pub fn with_mission(mut self, mission: Option<Mission>) -> Self {
        self.mission = mission;
        self
    }

    /// Use a flat terrain at `elevation` metres.
    pub fn with_ground_elevation(mut self, elevation: Option<f64>) -> Self {
        self.terrain = elevation.map(FlatTerrain);
        self
    }

    pub fn primary(&self) -> Option<VehicleIdentity> {
        self.primary
    }

    /// Pick the primary vehicle from a heartbeat if none is chosen yet.
    ///
    /// Ground stations never become primary. Returns `true` when `source`
    /// was selected.
    pub fn observe_heartbeat(&mut self, source: VehicleIdentity, type_code: u8) -> bool {
        if self.primary.is_some() || type_code == mav_type::GCS {
            return false;
        }
        if self.requested_system.is_some_and(|sysid| sysid != source.system_id) {
            return false;
        }

        self.primary = Some(source);
        self.class = self.class_override.unwrap_or(if is_copter_type(type_code) {
            VehicleClass::Copter
        } else {
            VehicleClass::Other
        });
        tracing::info!(primary = %source, class = ?self.class, "Primary vehicle selected");
        true
    }
}

impl VehicleContext for ReplayContext {
    fn is_primary(&self, source: VehicleIdentity) -> bool {
        self.primary == Some(source)
    }

    fn vehicle_class(&self) -> VehicleClass {
        self.class
    }

    fn flight_mode(&self, mav_type: u8, custom_mode: u32) -> String {
        mode_name(mav_type, custom_mode)
    }

    fn mission(&self) -> Option<&dyn MissionStore> {
        self.mission.as_ref().map(|m| m as &dyn MissionStore)
    }

    fn terrain(&self) -> Option<&dyn TerrainModel> {
        self.terrain.as_ref().map(|t| t as &dyn TerrainModel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names() {
        assert_eq!(mode_name(mav_type::QUADROTOR, 5), "LOITER");
        assert_eq!(mode_name(mav_type::FIXED_WING, 10), "AUTO");
        assert_eq!(mode_name(mav_type::GROUND_ROVER, 4), "HOLD");
        assert_eq!(mode_name(mav_type::QUADROTOR, 99), "Mode(99)");
        assert_eq!(mode_name(mav_type::SUBMARINE, 0), "Mode(0)");
    }

    #[test]
    fn test_first_vehicle_becomes_primary() {
        let mut ctx = ReplayContext::new();
        assert!(!ctx.observe_heartbeat(VehicleIdentity::new(255, 190), mav_type::GCS));
        assert!(ctx.observe_heartbeat(VehicleIdentity::new(1, 1), mav_type::HEXAROTOR));
        assert!(!ctx.observe_heartbeat(VehicleIdentity::new(2, 1), mav_type::FIXED_WING));

        assert!(ctx.is_primary(VehicleIdentity::new(1, 1)));
        assert!(!ctx.is_primary(VehicleIdentity::new(1, 154)));
        assert_eq!(ctx.vehicle_class(), VehicleClass::Copter);
    }

    #[test]
    fn test_requested_system_and_class_override() {
        let mut ctx = ReplayContext::new()
            .with_primary_system(Some(2))
            .with_class(Some(VehicleClass::Copter));
        assert!(!ctx.observe_heartbeat(VehicleIdentity::new(1, 1), mav_type::QUADROTOR));
        assert!(ctx.observe_heartbeat(VehicleIdentity::new(2, 1), mav_type::FIXED_WING));
        assert_eq!(ctx.primary(), Some(VehicleIdentity::new(2, 1)));
        assert_eq!(ctx.vehicle_class(), VehicleClass::Copter);
    }

    #[test]
    fn test_flat_terrain() {
        let ctx = ReplayContext::new().with_ground_elevation(Some(42.0));
        let ground = ctx.terrain().and_then(|t| t.elevation(1.0, 2.0));
        assert_eq!(ground, Some(42.0));
    }
}
