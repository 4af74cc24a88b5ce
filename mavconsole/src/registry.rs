//! Vehicle and component identity tracking.
//!
//! The registry learns which systems and components exist from heartbeats
//! and device-information messages, and assigns each a human label.
//!
//! # Labelling rules
//!
//! - A system is registered at most once, on its first non-GCS heartbeat,
//!   and labelled from the vehicle-type table ("Copter", "Plane", ...).
//! - A component label is assigned on first sight and never overwritten.
//!   Component labels prefer specific roles (GCS, Gimbal, CC, ...) over the
//!   vehicle-type table.
//!
//! Every mutating call reports whether anything changed; a change is the
//! only reason to rebuild vehicle menus.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::message::{Heartbeat, VehicleIdentity};
use crate::protocol::mav_type;

/// Vehicle-type label for a `MAV_TYPE` code.
pub fn vehicle_type_label(type_code: u8) -> String {
    let label = match type_code {
        mav_type::FIXED_WING
        | mav_type::VTOL_DUOROTOR
        | mav_type::VTOL_QUADROTOR
        | mav_type::VTOL_TILTROTOR => "Plane",
        mav_type::GROUND_ROVER => "Rover",
        mav_type::SURFACE_BOAT => "Boat",
        mav_type::SUBMARINE => "Sub",
        mav_type::QUADROTOR
        | mav_type::COAXIAL
        | mav_type::HEXAROTOR
        | mav_type::OCTOROTOR
        | mav_type::TRICOPTER
        | mav_type::DODECAROTOR => "Copter",
        mav_type::HELICOPTER => "Heli",
        mav_type::ANTENNA_TRACKER => "Tracker",
        mav_type::AIRSHIP => "Blimp",
        mav_type::ADSB => "ADSB",
        mav_type::ODID => "ODID",
        other => return format!("UNKNOWN({})", other),
    };
    label.to_string()
}

/// Component label for a `MAV_TYPE` code, preferring component roles.
pub fn component_type_label(type_code: u8) -> String {
    match type_code {
        mav_type::GCS => "GCS".to_string(),
        mav_type::GIMBAL => "Gimbal".to_string(),
        mav_type::ONBOARD_CONTROLLER => "CC".to_string(),
        mav_type::ADSB => "ADSB".to_string(),
        mav_type::ODID => "ODID".to_string(),
        mav_type::GENERIC => "Generic".to_string(),
        other => vehicle_type_label(other),
    }
}

/// One entry of the vehicle selection menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleMenuEntry {
    /// Display label, e.g. `"SysID 1: Copter"` or `"SysID 1[154]: Gimbal"`.
    pub label: String,
    pub system_id: u8,
    /// Set when the menu lists components of a multi-component system.
    pub component_id: Option<u8>,
}

impl fmt::Display for VehicleMenuEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Known vehicles, component labels and last heartbeat per identity.
#[derive(Debug, Default)]
pub struct VehicleRegistry {
    /// Vehicle label per system id.
    vehicles: BTreeMap<u8, String>,
    /// Component labels per system id.
    components: BTreeMap<u8, BTreeMap<u8, String>>,
    /// Most recent HEARTBEAT per identity.
    heartbeats: HashMap<VehicleIdentity, Heartbeat>,
}

impl VehicleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a heartbeat-family message announcing `type_code`.
    ///
    /// Registers the system on first sight (unless the sender is a ground
    /// station) and assigns the component label. Returns `true` if the
    /// registry changed.
    pub fn on_heartbeat(&mut self, identity: VehicleIdentity, type_code: u8) -> bool {
        let mut changed = false;

        if type_code != mav_type::GCS && !self.vehicles.contains_key(&identity.system_id) {
            let label = vehicle_type_label(type_code);
            tracing::info!(sysid = identity.system_id, label = %label, "New vehicle");
            self.vehicles.insert(identity.system_id, label);
            changed = true;
        }

        changed |= self.on_component_seen(identity, component_type_label(type_code));
        changed
    }

    /// Record a label for a component the first time it is seen.
    ///
    /// Existing labels are never overwritten. Returns `true` only on first
    /// assignment.
    pub fn on_component_seen(
        &mut self,
        identity: VehicleIdentity,
        label: impl Into<String>,
    ) -> bool {
        let labels = self.components.entry(identity.system_id).or_default();
        if labels.contains_key(&identity.component_id) {
            return false;
        }

        let label = label.into();
        tracing::debug!(
            sysid = identity.system_id,
            compid = identity.component_id,
            label = %label,
            "New component"
        );
        labels.insert(identity.component_id, label);
        true
    }

    /// Remember the latest HEARTBEAT from `identity`.
    pub fn record_heartbeat(&mut self, identity: VehicleIdentity, heartbeat: Heartbeat) {
        self.heartbeats.insert(identity, heartbeat);
    }

    /// Latest HEARTBEAT from `identity`.
    pub fn heartbeat(&self, identity: VehicleIdentity) -> Option<&Heartbeat> {
        self.heartbeats.get(&identity)
    }

    /// Label of a known vehicle.
    pub fn vehicle_label(&self, system_id: u8) -> Option<&str> {
        self.vehicles.get(&system_id).map(String::as_str)
    }

    /// Label of a known component.
    pub fn component_label(&self, identity: VehicleIdentity) -> Option<&str> {
        self.components
            .get(&identity.system_id)?
            .get(&identity.component_id)
            .map(String::as_str)
    }

    /// Whether a system has been registered as a vehicle.
    pub fn contains_vehicle(&self, system_id: u8) -> bool {
        self.vehicles.contains_key(&system_id)
    }

    /// Number of registered vehicles.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Registered system ids, ascending.
    pub fn systems(&self) -> impl Iterator<Item = u8> + '_ {
        self.vehicles.keys().copied()
    }

    /// Build the vehicle menu.
    ///
    /// `component_ids` reports the components the host knows for a system
    /// (for example from parameter downloads). When it reports none, the
    /// components seen by the registry are used instead. A system with a
    /// single component gets one entry; otherwise each component is listed.
    pub fn menu_entries<F>(&self, component_ids: F) -> Vec<VehicleMenuEntry>
    where
        F: Fn(u8) -> Vec<u8>,
    {
        let mut entries = Vec::new();

        for (&sysid, vehicle_label) in &self.vehicles {
            let mut compids = component_ids(sysid);
            if compids.is_empty() {
                compids = self
                    .components
                    .get(&sysid)
                    .map(|c| c.keys().copied().collect())
                    .unwrap_or_default();
            }
            compids.sort_unstable();
            compids.dedup();

            if compids.len() <= 1 {
                entries.push(VehicleMenuEntry {
                    label: format!("SysID {}: {}", sysid, vehicle_label),
                    system_id: sysid,
                    component_id: None,
                });
                continue;
            }

            for compid in compids {
                let label = self
                    .component_label(VehicleIdentity::new(sysid, compid))
                    .unwrap_or("?");
                entries.push(VehicleMenuEntry {
                    label: format!("SysID {}[{}]: {}", sysid, compid, label),
                    system_id: sysid,
                    component_id: Some(compid),
                });
            }
        }

        entries
    }
}
