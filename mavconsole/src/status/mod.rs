//! Status derivation.
//!
//! Each primary-vehicle message type maps to one handler that projects the
//! message, plus a little remembered state, onto [`StatusField`] updates.
//!
//! # Handlers
//!
//! ```text
//! GPS_RAW_INT / GPS2_RAW   gps.rs          GPS fix, heading
//! SYS_STATUS               sensors.rs      sensor table, announcements
//! HEARTBEAT                heartbeat.rs    mode, arm state, links
//! MISSION_CURRENT          navigation.rs   waypoint, ETR
//! NAV_CONTROLLER_OUTPUT    navigation.rs   waypoint distance and errors
//! HIGH_LATENCY2            heartbeat.rs + navigation.rs
//! VFR_HUD, ATTITUDE, ...   instruments.rs
//! ```
//!
//! Handlers never fail. Missing dependent data shows as `---`.

mod gps;
mod heartbeat;
mod instruments;
mod navigation;
mod sensors;

pub use sensors::{CriticalErrorMonitor, SENSOR_TABLE};

use crate::config::ConsoleSettings;
use crate::context::VehicleContext;
use crate::flight_timer::FlightTimer;
use crate::link::LinkMonitor;
use crate::message::{MessagePayload, VehicleIdentity};
use crate::mission::SpeedEstimator;
use crate::registry::VehicleRegistry;
use crate::sink::{StatusColor, StatusField, StatusSink};
use crate::store::MessageStore;

/// Placeholder for unknown values.
pub const UNKNOWN_TEXT: &str = "---";

/// Initial fields: key, text, color, row.
const DEFAULT_FIELDS: &[(&str, &str, StatusColor, u8)] = &[
    ("Mode", "UNKNOWN", StatusColor::Blue, 0),
    ("SysID", "", StatusColor::Blue, 0),
    ("ARM", "ARM", StatusColor::Grey, 0),
    ("GPS", "GPS: --", StatusColor::Red, 0),
    ("GPS2", "", StatusColor::Red, 0),
    ("Vcc", "Vcc: --", StatusColor::Red, 0),
    ("Radio", "Radio: --", StatusColor::Black, 0),
    ("INS", "INS", StatusColor::Grey, 0),
    ("MAG", "MAG", StatusColor::Grey, 0),
    ("AS", "AS", StatusColor::Grey, 0),
    ("RNG", "RNG", StatusColor::Grey, 0),
    ("AHRS", "AHRS", StatusColor::Grey, 0),
    ("EKF", "EKF", StatusColor::Grey, 0),
    ("LOG", "LOG", StatusColor::Grey, 0),
    ("Heading", "Hdg ---/---", StatusColor::Black, 2),
    ("Alt", "Alt ---", StatusColor::Black, 2),
    ("AGL", "AGL ---/---", StatusColor::Black, 2),
    ("AirSpeed", "AirSpeed --", StatusColor::Black, 2),
    ("GPSSpeed", "GPSSpeed --", StatusColor::Black, 2),
    ("Thr", "Thr ---", StatusColor::Black, 2),
    ("Roll", "Roll ---", StatusColor::Black, 2),
    ("Pitch", "Pitch ---", StatusColor::Black, 2),
    ("Wind", "Wind ---/---", StatusColor::Black, 2),
    ("WP", "WP --", StatusColor::Black, 3),
    ("WPDist", "Distance ---", StatusColor::Black, 3),
    ("WPBearing", "Bearing ---", StatusColor::Black, 3),
    ("AltError", "AltError --", StatusColor::Black, 3),
    ("AspdError", "AspdError --", StatusColor::Black, 3),
    ("FlightTime", "FlightTime --", StatusColor::Black, 3),
    ("ETR", "ETR --", StatusColor::Black, 3),
    ("Params", "Param ---/---", StatusColor::Black, 3),
    ("Mission", "Mission --/--", StatusColor::Black, 3),
];

/// Fields shown before any telemetry arrives.
pub fn initial_fields() -> Vec<StatusField> {
    DEFAULT_FIELDS
        .iter()
        .map(|&(key, text, color, row)| StatusField::new(key, text, color, row))
        .collect()
}

/// Display row of a built-in key; keys created later sit on row 0.
pub fn default_row(key: &str) -> u8 {
    DEFAULT_FIELDS
        .iter()
        .find(|(k, ..)| *k == key)
        .map_or(0, |&(.., row)| row)
}

fn emit(sink: &mut dyn StatusSink, key: &str, text: impl Into<String>, color: StatusColor) {
    sink.set_status(StatusField::new(key, text, color, default_row(key)));
}

fn green_if(ok: bool) -> StatusColor {
    if ok {
        StatusColor::Green
    } else {
        StatusColor::Red
    }
}

/// Read-only inputs for one handler call.
pub struct Frame<'a> {
    /// Message timestamp.
    pub now: f64,
    pub source: VehicleIdentity,
    pub settings: &'a ConsoleSettings,
    pub store: &'a MessageStore,
    pub registry: &'a VehicleRegistry,
    pub context: &'a dyn VehicleContext,
    /// Whether the source system streams FLIGHT_INFORMATION.
    pub flight_information_supported: bool,
}

impl Frame<'_> {
    /// Armed flag from the source's latest HEARTBEAT.
    fn motors_armed(&self) -> bool {
        self.registry
            .heartbeat(self.source)
            .is_some_and(|hb| hb.is_armed())
    }
}

/// Per-type handlers and the state they remember between messages.
#[derive(Debug, Default)]
pub struct StatusDeriver {
    /// Sensor health of the previous SYS_STATUS; `None` until the first.
    last_sensor_health: Option<u32>,
    /// Motor outputs disabled by the safety switch.
    safety_on: bool,
    /// AGL is shown once any source for it was available.
    shown_agl: bool,
    speed: SpeedEstimator,
    flight_timer: FlightTimer,
    links: LinkMonitor,
}

impl StatusDeriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the safety switch is engaged, as of the last SYS_STATUS.
    pub fn safety_on(&self) -> bool {
        self.safety_on
    }

    pub fn flight_timer(&self) -> &FlightTimer {
        &self.flight_timer
    }

    /// Run the handler for a primary-vehicle message.
    pub fn handle(
        &mut self,
        frame: &Frame<'_>,
        payload: &MessagePayload,
        sink: &mut dyn StatusSink,
    ) {
        match payload {
            MessagePayload::GpsRawInt(m) => gps::on_gps_raw(frame, m, false, sink),
            MessagePayload::Gps2Raw(m) => gps::on_gps_raw(frame, m, true, sink),
            MessagePayload::VfrHud(m) => self.on_vfr_hud(frame, m, sink),
            MessagePayload::Attitude(m) => instruments::on_attitude(m, sink),
            MessagePayload::SysStatus(m) => self.on_sys_status(frame, m, sink),
            MessagePayload::Wind(m) => instruments::on_wind(frame, m, sink),
            MessagePayload::EkfStatusReport(m) => instruments::on_ekf_status(m, sink),
            MessagePayload::PowerStatus(m) => instruments::on_power_status(m, sink),
            MessagePayload::Heartbeat(m) => {
                self.on_heartbeat(frame, m.mav_type, m.custom_mode, sink)
            }
            MessagePayload::MissionCurrent(m) => self.on_mission_current(frame, m, sink),
            MessagePayload::NavControllerOutput(m) => navigation::on_nav_controller(frame, m, sink),
            MessagePayload::ParamValue(_) => instruments::on_param_value(frame, sink),
            MessagePayload::HighLatency2(m) => {
                self.on_heartbeat(frame, m.mav_type, u32::from(m.custom_mode), sink);
                navigation::on_high_latency2(frame, m, sink);
            }
            MessagePayload::FlightInformation(m) => instruments::on_flight_information(m, sink),
            _ => {}
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::context::SimpleContext;

    /// Owned inputs from which a [`Frame`] can be borrowed.
    pub struct Harness {
        pub settings: ConsoleSettings,
        pub store: MessageStore,
        pub registry: VehicleRegistry,
        pub context: SimpleContext,
        pub now: f64,
        pub source: VehicleIdentity,
        pub supported: bool,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                settings: ConsoleSettings::default(),
                store: MessageStore::new(),
                registry: VehicleRegistry::new(),
                context: SimpleContext::new(),
                now: 0.0,
                source: VehicleIdentity::new(1, 1),
                supported: false,
            }
        }

        pub fn frame(&self) -> Frame<'_> {
            Frame {
                now: self.now,
                source: self.source,
                settings: &self.settings,
                store: &self.store,
                registry: &self.registry,
                context: &self.context,
                flight_information_supported: self.supported,
            }
        }

        /// Record and handle one payload.
        pub fn run(
            &mut self,
            deriver: &mut StatusDeriver,
            payload: MessagePayload,
            sink: &mut dyn StatusSink,
        ) {
            self.store.record(&payload);
            let frame = self.frame();
            deriver.handle(&frame, &payload, sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_fields_unique_keys() {
        let fields = initial_fields();
        let mut keys: Vec<_> = fields.iter().map(|f| f.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), fields.len());
    }

    #[test]
    fn test_default_rows() {
        assert_eq!(default_row("Mode"), 0);
        assert_eq!(default_row("Heading"), 2);
        assert_eq!(default_row("ETR"), 3);
        assert_eq!(default_row("PRE"), 0);
    }

    #[test]
    fn test_initial_text() {
        let fields = initial_fields();
        let mode = fields.iter().find(|f| f.key == "Mode").unwrap();
        assert_eq!(mode.text, "UNKNOWN");
        assert_eq!(mode.color, StatusColor::Blue);
        let params = fields.iter().find(|f| f.key == "Params").unwrap();
        assert_eq!(params.text, "Param ---/---");
        assert_eq!(params.row, 3);
    }
}
