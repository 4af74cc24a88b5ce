//! Sensor health from SYS_STATUS and HIGH_LATENCY2 failure flags.
//!
//! # Colors
//!
//! ```text
//! not present   black   (PRE, PRX, FLO are hidden instead)
//! disabled      grey
//! unhealthy     red
//! healthy       green   (TERR yellow while terrain tiles are pending)
//! ```
//!
//! Announcements fire on health edges of enabled sensors only, so the first
//! SYS_STATUS just records the starting health.

use super::{emit, green_if, Frame, StatusDeriver};
use crate::message::{HighLatency2, SysStatus, VehicleIdentity};
use crate::protocol::{hl_failure, sensor, AUTOPILOT_ARDUPILOTMEGA};
use crate::registry::VehicleRegistry;
use crate::sink::{StatusColor, StatusSink};

/// Display key and sensor bits, in display order.
pub const SENSOR_TABLE: &[(&str, u32)] = &[
    ("AS", sensor::DIFFERENTIAL_PRESSURE),
    ("MAG", sensor::MAG_3D),
    ("INS", sensor::ACCEL_3D | sensor::GYRO_3D),
    ("AHRS", sensor::AHRS),
    ("RC", sensor::RC_RECEIVER),
    ("TERR", sensor::TERRAIN),
    ("RNG", sensor::LASER_POSITION),
    ("LOG", sensor::LOGGING),
    ("PRX", sensor::PROXIMITY),
    ("PRE", sensor::PREARM_CHECK),
    ("FLO", sensor::OPTICAL_FLOW),
];

const HIDE_IF_ABSENT: &[&str] = &["PRE", "PRX", "FLO"];

/// Announced on a healthy to unhealthy edge.
const ANNOUNCE_FAIL: &[(u32, &str)] = &[
    (sensor::RC_RECEIVER, "RC fail"),
    (sensor::PREARM_CHECK, "pre-arm fail"),
];

/// Announced on an unhealthy to healthy edge.
const ANNOUNCE_GOOD: &[(u32, &str)] = &[(sensor::PREARM_CHECK, "pre-arm good")];

/// HIGH_LATENCY2 failure bits mapped onto the sensor keys.
const HL_SENSOR_TABLE: &[(&str, u16)] = &[
    ("AS", hl_failure::DIFFERENTIAL_PRESSURE),
    ("MAG", hl_failure::MAG_3D),
    ("INS", hl_failure::ACCEL_3D | hl_failure::GYRO_3D),
    ("AHRS", hl_failure::ESTIMATOR),
    ("RC", hl_failure::RC_RECEIVER),
    ("TERR", hl_failure::TERRAIN),
];

fn all_set<T>(value: T, bits: T) -> bool
where
    T: std::ops::BitAnd<Output = T> + PartialEq + Copy,
{
    value & bits == bits
}

impl StatusDeriver {
    pub(super) fn on_sys_status(
        &mut self,
        frame: &Frame<'_>,
        msg: &SysStatus,
        sink: &mut dyn StatusSink,
    ) {
        let terrain_pending = frame.store.terrain_report().is_some_and(|t| t.pending != 0);

        for &(key, bits) in SENSOR_TABLE {
            let present = all_set(msg.onboard_control_sensors_present, bits);
            let enabled = all_set(msg.onboard_control_sensors_enabled, bits);
            let healthy = all_set(msg.onboard_control_sensors_health, bits);

            if !present && HIDE_IF_ABSENT.contains(&key) {
                continue;
            }
            let mut color = if !present {
                StatusColor::Black
            } else if !enabled {
                StatusColor::Grey
            } else if !healthy {
                StatusColor::Red
            } else {
                StatusColor::Green
            };
            if key == "TERR" && color == StatusColor::Green && terrain_pending {
                color = StatusColor::Yellow;
            }
            emit(sink, key, key, color);
        }

        if let Some(previous) = self.last_sensor_health {
            let enabled = msg.onboard_control_sensors_enabled;
            let health = msg.onboard_control_sensors_health;

            for &(bits, text) in ANNOUNCE_FAIL {
                if all_set(enabled, bits) && !all_set(health, bits) && all_set(previous, bits) {
                    tracing::info!(sysid = frame.source.system_id, text, "Sensor failure");
                    sink.announce(text);
                }
            }
            for &(bits, text) in ANNOUNCE_GOOD {
                if all_set(enabled, bits) && all_set(health, bits) && !all_set(previous, bits) {
                    sink.announce(text);
                }
            }
        }
        self.last_sensor_health = Some(msg.onboard_control_sensors_health);

        self.safety_on = msg.onboard_control_sensors_enabled & sensor::MOTOR_OUTPUTS == 0;
    }
}

/// Sensor and subsystem fields from HIGH_LATENCY2 failure flags.
pub(super) fn on_high_latency_failures(msg: &HighLatency2, sink: &mut dyn StatusSink) {
    let flags = msg.failure_flags;

    for &(key, bits) in HL_SENSOR_TABLE {
        emit(sink, key, key, green_if(!all_set(flags, bits)));
    }

    emit(sink, "Fence", "FEN", green_if(!all_set(flags, hl_failure::GEOFENCE)));

    if all_set(flags, hl_failure::GPS) {
        emit(sink, "GPS", "GPS FAILED", StatusColor::Red);
    } else {
        emit(sink, "GPS", "GPS OK", StatusColor::Green);
    }

    if all_set(flags, hl_failure::BATTERY) {
        emit(sink, "PWR", "PWR FAILED", StatusColor::Red);
    } else {
        emit(sink, "PWR", "PWR OK", StatusColor::Green);
    }
}

/// Announces internal error bits that ArduPilot reports in SYS_STATUS.
///
/// Runs for every source. One announcement at most per interval, shared
/// across sources.
#[derive(Debug, Default)]
pub struct CriticalErrorMonitor {
    last_announce: Option<f64>,
}

impl CriticalErrorMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a SYS_STATUS from `source`; returns the announcement if one is due.
    pub fn check(
        &mut self,
        source: VehicleIdentity,
        msg: &SysStatus,
        registry: &VehicleRegistry,
        interval: f64,
        now: f64,
    ) -> Option<String> {
        let heartbeat = registry.heartbeat(source)?;
        if heartbeat.autopilot != AUTOPILOT_ARDUPILOTMEGA {
            return None;
        }

        let errors = u32::from(msg.errors_count1) | (u32::from(msg.errors_count2) << 16);
        if errors == 0 {
            return None;
        }
        if self.last_announce.is_some_and(|last| now - last <= interval) {
            return None;
        }
        self.last_announce = Some(now);

        tracing::warn!(
            sysid = source.system_id,
            compid = source.component_id,
            errors,
            "Critical failure reported"
        );
        Some(format!(
            "Critical failure 0x{:x} sysid={} compid={}",
            errors, source.system_id, source.component_id
        ))
    }
}
