//! Decoded telemetry message model.
//!
//! The engine consumes messages that a transport layer has already decoded
//! into typed records. Each [`TelemetryMessage`] carries the receive time,
//! the source identity and one [`MessagePayload`] variant.
//!
//! # Capture format
//!
//! Messages deserialize from JSON with the payload tagged by its MAVLink
//! message name:
//!
//! ```text
//! {"timestamp": 12.5,
//!  "source": {"system_id": 1, "component_id": 1},
//!  "message": {"type": "HEARTBEAT", "mav_type": 2, "autopilot": 3, "base_mode": 209}}
//! ```
//!
//! Fields absent from the capture take their zero value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Two-level MAVLink address: a vehicle (system) and a subsystem within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleIdentity {
    /// MAVLink system id.
    pub system_id: u8,
    /// MAVLink component id.
    pub component_id: u8,
}

impl VehicleIdentity {
    /// Create a new identity.
    pub fn new(system_id: u8, component_id: u8) -> Self {
        Self {
            system_id,
            component_id,
        }
    }
}

impl fmt::Display for VehicleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.system_id, self.component_id)
    }
}

/// A decoded message together with its source and receive time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMessage {
    /// Receive time in seconds. Only differences between timestamps matter.
    pub timestamp: f64,
    /// Sending system and component.
    pub source: VehicleIdentity,
    /// The typed message body.
    pub message: MessagePayload,
}

impl TelemetryMessage {
    /// Create a new message.
    pub fn new(timestamp: f64, source: VehicleIdentity, message: MessagePayload) -> Self {
        Self {
            timestamp,
            source,
            message,
        }
    }

    /// The type tag of the payload.
    pub fn kind(&self) -> MessageKind {
        self.message.kind()
    }
}

/// Closed set of message types the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    Heartbeat,
    HighLatency2,
    GimbalDeviceInformation,
    Radio,
    RadioStatus,
    SysStatus,
    GpsRawInt,
    Gps2Raw,
    GlobalPositionInt,
    VfrHud,
    Attitude,
    Wind,
    EkfStatusReport,
    PowerStatus,
    MissionCurrent,
    NavControllerOutput,
    ParamValue,
    FlightInformation,
    CommandAck,
    TerrainReport,
}

impl MessageKind {
    /// Every kind, in declaration order.
    pub const ALL: [MessageKind; 20] = [
        MessageKind::Heartbeat,
        MessageKind::HighLatency2,
        MessageKind::GimbalDeviceInformation,
        MessageKind::Radio,
        MessageKind::RadioStatus,
        MessageKind::SysStatus,
        MessageKind::GpsRawInt,
        MessageKind::Gps2Raw,
        MessageKind::GlobalPositionInt,
        MessageKind::VfrHud,
        MessageKind::Attitude,
        MessageKind::Wind,
        MessageKind::EkfStatusReport,
        MessageKind::PowerStatus,
        MessageKind::MissionCurrent,
        MessageKind::NavControllerOutput,
        MessageKind::ParamValue,
        MessageKind::FlightInformation,
        MessageKind::CommandAck,
        MessageKind::TerrainReport,
    ];

    /// MAVLink message name, e.g. `"VFR_HUD"`.
    pub fn name(&self) -> &'static str {
        match self {
            MessageKind::Heartbeat => "HEARTBEAT",
            MessageKind::HighLatency2 => "HIGH_LATENCY2",
            MessageKind::GimbalDeviceInformation => "GIMBAL_DEVICE_INFORMATION",
            MessageKind::Radio => "RADIO",
            MessageKind::RadioStatus => "RADIO_STATUS",
            MessageKind::SysStatus => "SYS_STATUS",
            MessageKind::GpsRawInt => "GPS_RAW_INT",
            MessageKind::Gps2Raw => "GPS2_RAW",
            MessageKind::GlobalPositionInt => "GLOBAL_POSITION_INT",
            MessageKind::VfrHud => "VFR_HUD",
            MessageKind::Attitude => "ATTITUDE",
            MessageKind::Wind => "WIND",
            MessageKind::EkfStatusReport => "EKF_STATUS_REPORT",
            MessageKind::PowerStatus => "POWER_STATUS",
            MessageKind::MissionCurrent => "MISSION_CURRENT",
            MessageKind::NavControllerOutput => "NAV_CONTROLLER_OUTPUT",
            MessageKind::ParamValue => "PARAM_VALUE",
            MessageKind::FlightInformation => "FLIGHT_INFORMATION",
            MessageKind::CommandAck => "COMMAND_ACK",
            MessageKind::TerrainReport => "TERRAIN_REPORT",
        }
    }

    /// Look up a kind by its MAVLink message name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed message bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessagePayload {
    #[serde(rename = "HEARTBEAT")]
    Heartbeat(Heartbeat),
    #[serde(rename = "HIGH_LATENCY2")]
    HighLatency2(HighLatency2),
    #[serde(rename = "GIMBAL_DEVICE_INFORMATION")]
    GimbalDeviceInformation(GimbalDeviceInformation),
    #[serde(rename = "RADIO")]
    Radio(RadioStatus),
    #[serde(rename = "RADIO_STATUS")]
    RadioStatus(RadioStatus),
    #[serde(rename = "SYS_STATUS")]
    SysStatus(SysStatus),
    #[serde(rename = "GPS_RAW_INT")]
    GpsRawInt(GpsRaw),
    #[serde(rename = "GPS2_RAW")]
    Gps2Raw(GpsRaw),
    #[serde(rename = "GLOBAL_POSITION_INT")]
    GlobalPositionInt(GlobalPositionInt),
    #[serde(rename = "VFR_HUD")]
    VfrHud(VfrHud),
    #[serde(rename = "ATTITUDE")]
    Attitude(Attitude),
    #[serde(rename = "WIND")]
    Wind(Wind),
    #[serde(rename = "EKF_STATUS_REPORT")]
    EkfStatusReport(EkfStatusReport),
    #[serde(rename = "POWER_STATUS")]
    PowerStatus(PowerStatus),
    #[serde(rename = "MISSION_CURRENT")]
    MissionCurrent(MissionCurrent),
    #[serde(rename = "NAV_CONTROLLER_OUTPUT")]
    NavControllerOutput(NavControllerOutput),
    #[serde(rename = "PARAM_VALUE")]
    ParamValue(ParamValue),
    #[serde(rename = "FLIGHT_INFORMATION")]
    FlightInformation(FlightInformation),
    #[serde(rename = "COMMAND_ACK")]
    CommandAck(CommandAck),
    #[serde(rename = "TERRAIN_REPORT")]
    TerrainReport(TerrainReport),
}

impl MessagePayload {
    /// The type tag of this payload.
    pub fn kind(&self) -> MessageKind {
        match self {
            MessagePayload::Heartbeat(_) => MessageKind::Heartbeat,
            MessagePayload::HighLatency2(_) => MessageKind::HighLatency2,
            MessagePayload::GimbalDeviceInformation(_) => MessageKind::GimbalDeviceInformation,
            MessagePayload::Radio(_) => MessageKind::Radio,
            MessagePayload::RadioStatus(_) => MessageKind::RadioStatus,
            MessagePayload::SysStatus(_) => MessageKind::SysStatus,
            MessagePayload::GpsRawInt(_) => MessageKind::GpsRawInt,
            MessagePayload::Gps2Raw(_) => MessageKind::Gps2Raw,
            MessagePayload::GlobalPositionInt(_) => MessageKind::GlobalPositionInt,
            MessagePayload::VfrHud(_) => MessageKind::VfrHud,
            MessagePayload::Attitude(_) => MessageKind::Attitude,
            MessagePayload::Wind(_) => MessageKind::Wind,
            MessagePayload::EkfStatusReport(_) => MessageKind::EkfStatusReport,
            MessagePayload::PowerStatus(_) => MessageKind::PowerStatus,
            MessagePayload::MissionCurrent(_) => MessageKind::MissionCurrent,
            MessagePayload::NavControllerOutput(_) => MessageKind::NavControllerOutput,
            MessagePayload::ParamValue(_) => MessageKind::ParamValue,
            MessagePayload::FlightInformation(_) => MessageKind::FlightInformation,
            MessagePayload::CommandAck(_) => MessageKind::CommandAck,
            MessagePayload::TerrainReport(_) => MessageKind::TerrainReport,
        }
    }
}

/// HEARTBEAT.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heartbeat {
    /// `MAV_TYPE` of the sender.
    pub mav_type: u8,
    /// `MAV_AUTOPILOT` of the sender.
    pub autopilot: u8,
    pub base_mode: u8,
    pub custom_mode: u32,
    pub system_status: u8,
}

impl Heartbeat {
    /// Whether the safety-armed flag is set in `base_mode`.
    pub fn is_armed(&self) -> bool {
        self.base_mode & crate::protocol::MODE_FLAG_SAFETY_ARMED != 0
    }
}

/// HIGH_LATENCY2: compressed composite telemetry for low-bandwidth links.
///
/// Several fields are scaled: headings are in 2-degree units, speeds in
/// 0.2 m/s units and `target_distance` in decametres.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighLatency2 {
    pub timestamp: u32,
    pub mav_type: u8,
    pub autopilot: u8,
    pub custom_mode: u16,
    /// Latitude, degE7.
    pub latitude: i32,
    /// Longitude, degE7.
    pub longitude: i32,
    /// Altitude above mean sea level, metres.
    pub altitude: i16,
    pub target_altitude: i16,
    pub heading: u8,
    pub target_heading: u8,
    pub target_distance: u16,
    pub throttle: u8,
    pub airspeed: u8,
    pub airspeed_sp: u8,
    pub groundspeed: u8,
    pub windspeed: u8,
    pub wind_heading: u8,
    pub eph: u8,
    pub epv: u8,
    pub temperature_air: i8,
    pub climb_rate: i8,
    pub battery: i8,
    pub wp_num: u16,
    pub failure_flags: u16,
}

/// GIMBAL_DEVICE_INFORMATION (only the naming fields are used).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GimbalDeviceInformation {
    pub vendor_name: String,
    pub model_name: String,
}

/// RADIO / RADIO_STATUS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioStatus {
    pub rssi: u8,
    pub remrssi: u8,
    pub txbuf: u8,
    pub noise: u8,
    pub remnoise: u8,
    pub rxerrors: u16,
    pub fixed: u16,
}

/// SYS_STATUS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysStatus {
    pub onboard_control_sensors_present: u32,
    pub onboard_control_sensors_enabled: u32,
    pub onboard_control_sensors_health: u32,
    pub load: u16,
    /// Battery voltage, millivolts.
    pub voltage_battery: u16,
    pub current_battery: i16,
    pub battery_remaining: i8,
    pub drop_rate_comm: u16,
    pub errors_comm: u16,
    pub errors_count1: u16,
    pub errors_count2: u16,
    pub errors_count3: u16,
    pub errors_count4: u16,
}

/// GPS_RAW_INT and GPS2_RAW share this layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsRaw {
    pub fix_type: u8,
    pub lat: i32,
    pub lon: i32,
    /// Altitude, millimetres.
    pub alt: i32,
    pub eph: u16,
    pub epv: u16,
    pub vel: u16,
    /// Course over ground, centidegrees.
    pub cog: u16,
    pub satellites_visible: u8,
}

/// GLOBAL_POSITION_INT.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalPositionInt {
    pub time_boot_ms: u32,
    /// Latitude, degE7.
    pub lat: i32,
    /// Longitude, degE7.
    pub lon: i32,
    /// Altitude MSL, millimetres.
    pub alt: i32,
    /// Altitude above home, millimetres.
    pub relative_alt: i32,
    pub vx: i16,
    pub vy: i16,
    pub vz: i16,
    /// Heading, centidegrees; `u16::MAX` when unknown.
    pub hdg: u16,
}

/// VFR_HUD.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VfrHud {
    pub airspeed: f32,
    pub groundspeed: f32,
    pub heading: i16,
    pub throttle: u16,
    pub alt: f32,
    pub climb: f32,
}

/// ATTITUDE (radians).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attitude {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub rollspeed: f32,
    pub pitchspeed: f32,
    pub yawspeed: f32,
}

/// WIND (ArduPilot dialect).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wind {
    pub direction: f32,
    pub speed: f32,
    pub speed_z: f32,
}

/// EKF_STATUS_REPORT.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EkfStatusReport {
    pub flags: u16,
    pub velocity_variance: f32,
    pub pos_horiz_variance: f32,
    pub pos_vert_variance: f32,
    pub compass_variance: f32,
    pub terrain_alt_variance: f32,
}

impl EkfStatusReport {
    /// Largest of the reported variances.
    pub fn highest_variance(&self) -> f32 {
        [
            self.velocity_variance,
            self.pos_horiz_variance,
            self.pos_vert_variance,
            self.compass_variance,
            self.terrain_alt_variance,
        ]
        .into_iter()
        .fold(0.0, f32::max)
    }
}

/// POWER_STATUS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerStatus {
    /// Board 5V rail, millivolts.
    #[serde(rename = "Vcc")]
    pub vcc: u16,
    /// Servo rail, millivolts.
    #[serde(rename = "Vservo")]
    pub vservo: u16,
    pub flags: u16,
}

/// MISSION_CURRENT.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionCurrent {
    pub seq: u16,
}

/// NAV_CONTROLLER_OUTPUT.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavControllerOutput {
    pub nav_roll: f32,
    pub nav_pitch: f32,
    pub nav_bearing: i16,
    pub target_bearing: i16,
    /// Distance to active waypoint, metres.
    pub wp_dist: u16,
    /// Altitude error, metres (positive: below target).
    pub alt_error: f32,
    /// Airspeed error, cm/s (positive: slower than target).
    pub aspd_error: f32,
    pub xtrack_error: f32,
}

/// PARAM_VALUE.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamValue {
    pub param_id: String,
    pub param_value: f32,
    pub param_type: u8,
    pub param_count: u16,
    pub param_index: u16,
}

/// FLIGHT_INFORMATION.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightInformation {
    pub time_boot_ms: u32,
    pub arming_time_utc: u64,
    /// Takeoff time in microseconds since boot despite the name; 0 while landed.
    pub takeoff_time_utc: u64,
    pub flight_uuid: u64,
}

/// COMMAND_ACK.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandAck {
    pub command: u16,
    pub result: u8,
}

/// TERRAIN_REPORT.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainReport {
    pub lat: i32,
    pub lon: i32,
    pub spacing: u16,
    pub terrain_height: f32,
    /// Vehicle height above terrain, metres.
    pub current_height: f32,
    pub pending: u16,
    pub loaded: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_name_roundtrip() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(MessageKind::from_name("NOT_A_MESSAGE"), None);
    }

    #[test]
    fn test_deserialize_tagged_capture_line() {
        let line = r#"{"timestamp": 3.5,
            "source": {"system_id": 1, "component_id": 1},
            "message": {"type": "HEARTBEAT", "mav_type": 2, "base_mode": 128}}"#;
        let msg: TelemetryMessage = serde_json::from_str(line).unwrap();

        assert_eq!(msg.source, VehicleIdentity::new(1, 1));
        assert_eq!(msg.kind(), MessageKind::Heartbeat);
        match msg.message {
            MessagePayload::Heartbeat(hb) => {
                assert_eq!(hb.mav_type, 2);
                assert!(hb.is_armed());
                assert_eq!(hb.custom_mode, 0, "missing fields default to zero");
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_radio_variants_share_layout() {
        let radio: MessagePayload =
            serde_json::from_str(r#"{"type": "RADIO", "rssi": 100, "noise": 40}"#).unwrap();
        let radio_status: MessagePayload =
            serde_json::from_str(r#"{"type": "RADIO_STATUS", "rssi": 100, "noise": 40}"#)
                .unwrap();
        assert_eq!(radio.kind(), MessageKind::Radio);
        assert_eq!(radio_status.kind(), MessageKind::RadioStatus);
    }

    #[test]
    fn test_power_status_uses_mavlink_field_names() {
        let payload: MessagePayload =
            serde_json::from_str(r#"{"type": "POWER_STATUS", "Vcc": 5000, "Vservo": 4900}"#)
                .unwrap();
        match payload {
            MessagePayload::PowerStatus(p) => {
                assert_eq!(p.vcc, 5000);
                assert_eq!(p.vservo, 4900);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_ekf_highest_variance() {
        let report = EkfStatusReport {
            velocity_variance: 0.2,
            compass_variance: 0.7,
            ..Default::default()
        };
        assert!((report.highest_variance() - 0.7).abs() < 1e-6);
    }
}
