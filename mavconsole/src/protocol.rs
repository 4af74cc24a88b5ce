//! MAVLink enumeration values the console engine interprets.
//!
//! Only the subset of the common dialect that drives status derivation is
//! listed here. Messages arrive already decoded, so these are plain numeric
//! constants rather than a full dialect binding.

/// `MAV_TYPE` vehicle and component type codes.
pub mod mav_type {
    pub const GENERIC: u8 = 0;
    pub const FIXED_WING: u8 = 1;
    pub const QUADROTOR: u8 = 2;
    pub const COAXIAL: u8 = 3;
    pub const HELICOPTER: u8 = 4;
    pub const ANTENNA_TRACKER: u8 = 5;
    pub const GCS: u8 = 6;
    pub const AIRSHIP: u8 = 7;
    pub const GROUND_ROVER: u8 = 10;
    pub const SURFACE_BOAT: u8 = 11;
    pub const SUBMARINE: u8 = 12;
    pub const HEXAROTOR: u8 = 13;
    pub const OCTOROTOR: u8 = 14;
    pub const TRICOPTER: u8 = 15;
    pub const ONBOARD_CONTROLLER: u8 = 18;
    pub const VTOL_DUOROTOR: u8 = 19;
    pub const VTOL_QUADROTOR: u8 = 20;
    pub const VTOL_TILTROTOR: u8 = 21;
    pub const GIMBAL: u8 = 26;
    pub const ADSB: u8 = 27;
    pub const DODECAROTOR: u8 = 29;
    pub const ODID: u8 = 34;
}

/// `MAV_AUTOPILOT_ARDUPILOTMEGA`.
pub const AUTOPILOT_ARDUPILOTMEGA: u8 = 3;

/// `MAV_MODE_FLAG_SAFETY_ARMED` bit of the heartbeat `base_mode`.
pub const MODE_FLAG_SAFETY_ARMED: u8 = 0x80;

/// `MAV_SYS_STATUS_SENSOR` bits of the SYS_STATUS sensor bitmasks.
pub mod sensor {
    pub const GYRO_3D: u32 = 0x01;
    pub const ACCEL_3D: u32 = 0x02;
    pub const MAG_3D: u32 = 0x04;
    pub const DIFFERENTIAL_PRESSURE: u32 = 0x10;
    pub const OPTICAL_FLOW: u32 = 0x40;
    pub const LASER_POSITION: u32 = 0x100;
    pub const MOTOR_OUTPUTS: u32 = 0x8000;
    pub const RC_RECEIVER: u32 = 0x10000;
    pub const AHRS: u32 = 0x200000;
    pub const TERRAIN: u32 = 0x400000;
    pub const LOGGING: u32 = 0x1000000;
    pub const PROXIMITY: u32 = 0x10000000;
    pub const PREARM_CHECK: u32 = 0x40000000;
}

/// `HL_FAILURE_FLAG` bits of HIGH_LATENCY2 `failure_flags`.
pub mod hl_failure {
    pub const GPS: u16 = 1;
    pub const DIFFERENTIAL_PRESSURE: u16 = 2;
    pub const ABSOLUTE_PRESSURE: u16 = 4;
    pub const ACCEL_3D: u16 = 8;
    pub const GYRO_3D: u16 = 16;
    pub const MAG_3D: u16 = 32;
    pub const TERRAIN: u16 = 64;
    pub const BATTERY: u16 = 128;
    pub const RC_RECEIVER: u16 = 256;
    pub const OFFBOARD_LINK: u16 = 512;
    pub const ENGINE: u16 = 1024;
    pub const GEOFENCE: u16 = 2048;
    pub const ESTIMATOR: u16 = 4096;
    pub const MISSION: u16 = 8192;
}

/// `MAV_POWER_STATUS` flag bits.
pub mod power {
    pub const BRICK_VALID: u16 = 1;
    pub const SERVO_VALID: u16 = 2;
    pub const USB_CONNECTED: u16 = 4;
    pub const PERIPH_OVERCURRENT: u16 = 8;
    pub const PERIPH_HIPOWER_OVERCURRENT: u16 = 16;
    pub const CHANGED: u16 = 32;
}

/// `MAV_CMD` command identifiers used by mission items and the probe.
pub mod cmd {
    pub const NAV_WAYPOINT: u16 = 16;
    pub const NAV_LOITER_UNLIM: u16 = 17;
    pub const NAV_LOITER_TURNS: u16 = 18;
    pub const NAV_LOITER_TIME: u16 = 19;
    pub const NAV_RETURN_TO_LAUNCH: u16 = 20;
    pub const NAV_LAND: u16 = 21;
    pub const NAV_TAKEOFF: u16 = 22;
    pub const DO_JUMP: u16 = 177;
    pub const SET_MESSAGE_INTERVAL: u16 = 511;
}

/// `MAV_RESULT` command acknowledgement codes.
pub mod result {
    pub const ACCEPTED: u8 = 0;
    pub const TEMPORARILY_REJECTED: u8 = 1;
    pub const DENIED: u8 = 2;
    pub const UNSUPPORTED: u8 = 3;
    pub const FAILED: u8 = 4;
    pub const IN_PROGRESS: u8 = 5;
}

/// Message id of FLIGHT_INFORMATION, the optional message the probe requests.
pub const MSG_ID_FLIGHT_INFORMATION: u32 = 264;

/// Heading value meaning "unknown" in GLOBAL_POSITION_INT `hdg`.
pub const HEADING_UNKNOWN: u16 = u16::MAX;
