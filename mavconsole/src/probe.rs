//! FLIGHT_INFORMATION capability probe.
//!
//! Vehicles may or may not stream FLIGHT_INFORMATION, which carries an
//! authoritative flight duration. The probe learns support per system by
//! requesting the message with `SET_MESSAGE_INTERVAL` and watching for
//! the acknowledgement and the message itself.
//!
//! # State Machine
//!
//! ```text
//!              ACK accepted                 ACK denied/failed
//!   Unknown -----------------> Supported     Unknown -----------> Unsupported
//!      ^                           |
//!      |  >10s without message     |
//!      +---------------------------+
//! ```
//!
//! - While `Unknown`, a request is sent at most once per probe interval.
//! - `Supported` and `Unknown` age back to `Unknown` after the silence
//!   timeout; `Unsupported` is final for the session.
//!
//! There are no timers: ageing is evaluated on each [`CapabilityProbe::step`].

use std::collections::HashMap;
use std::fmt;

use crate::message::{CommandAck, FlightInformation, VehicleIdentity};
use crate::protocol::{cmd, result, MSG_ID_FLIGHT_INFORMATION};
use crate::sink::CommandLong;

/// Minimum seconds between two probe requests to the same system.
pub const PROBE_INTERVAL_SECS: f64 = 10.0;

/// Seconds without FLIGHT_INFORMATION after which support is re-probed.
pub const SILENCE_TIMEOUT_SECS: f64 = 10.0;

/// Requested FLIGHT_INFORMATION interval (2 Hz).
pub const REQUESTED_INTERVAL_US: f32 = 500_000.0;

/// Learned support for FLIGHT_INFORMATION.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Support {
    #[default]
    Unknown,
    Supported,
    Unsupported,
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Support::Unknown => write!(f, "unknown"),
            Support::Supported => write!(f, "supported"),
            Support::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Per-system probe state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightInformationState {
    pub support: Support,
    /// When FLIGHT_INFORMATION was last received.
    pub last_seen: Option<f64>,
    /// When the last request was sent.
    pub last_probe_sent: Option<f64>,
}

/// Tracks FLIGHT_INFORMATION support for every system.
#[derive(Debug)]
pub struct CapabilityProbe {
    states: HashMap<u8, FlightInformationState>,
    probe_interval: f64,
    silence_timeout: f64,
}

impl Default for CapabilityProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityProbe {
    /// Create a probe with the standard 10 second interval and timeout.
    pub fn new() -> Self {
        Self::with_timing(PROBE_INTERVAL_SECS, SILENCE_TIMEOUT_SECS)
    }

    /// Create a probe with custom timing.
    pub fn with_timing(probe_interval: f64, silence_timeout: f64) -> Self {
        Self {
            states: HashMap::new(),
            probe_interval,
            silence_timeout,
        }
    }

    /// Current state for a system, if it has been seen.
    pub fn state(&self, system_id: u8) -> Option<&FlightInformationState> {
        self.states.get(&system_id)
    }

    /// Learned support for a system.
    pub fn support(&self, system_id: u8) -> Support {
        self.states
            .get(&system_id)
            .map(|s| s.support)
            .unwrap_or_default()
    }

    /// Whether the system is known to stream FLIGHT_INFORMATION.
    ///
    /// While this holds, the locally derived flight timer is not used.
    pub fn is_supported(&self, system_id: u8) -> bool {
        self.support(system_id) == Support::Supported
    }

    /// FLIGHT_INFORMATION arrived from `system_id`.
    pub fn on_flight_information(&mut self, system_id: u8, now: f64) {
        self.states.entry(system_id).or_default().last_seen = Some(now);
    }

    /// A COMMAND_ACK arrived from `system_id`.
    ///
    /// Only acknowledgements of `SET_MESSAGE_INTERVAL` for systems the probe
    /// already tracks are considered. Acceptance restarts the silence window
    /// at `now`. Returns the new support value when it changed.
    pub fn on_command_ack(&mut self, system_id: u8, ack: &CommandAck, now: f64) -> Option<Support> {
        if ack.command != cmd::SET_MESSAGE_INTERVAL {
            return None;
        }
        let state = self.states.get_mut(&system_id)?;

        let learned = match ack.result {
            result::ACCEPTED => Support::Supported,
            result::DENIED | result::FAILED => Support::Unsupported,
            _ => return None,
        };
        if learned == Support::Supported {
            state.last_seen = Some(now);
        }
        if state.support == learned {
            return None;
        }

        tracing::info!(
            sysid = system_id,
            from = %state.support,
            to = %learned,
            "FLIGHT_INFORMATION support learned"
        );
        state.support = learned;
        Some(learned)
    }

    /// Run one probe step after a message from `source`.
    ///
    /// Applies ageing and returns the request to send, if one is due.
    pub fn step(&mut self, source: VehicleIdentity, now: f64) -> Option<CommandLong> {
        let state = self.states.entry(source.system_id).or_default();

        let silent = state
            .last_seen
            .map_or(true, |seen| now - seen > self.silence_timeout);
        if state.support != Support::Unsupported && silent {
            if state.support == Support::Supported {
                tracing::debug!(
                    sysid = source.system_id,
                    "FLIGHT_INFORMATION stopped, re-probing"
                );
            }
            state.support = Support::Unknown;
        }

        if state.support != Support::Unknown {
            return None;
        }

        if let Some(sent) = state.last_probe_sent {
            if now - sent < self.probe_interval {
                return None;
            }
        }
        state.last_probe_sent = Some(now);

        tracing::debug!(
            sysid = source.system_id,
            compid = source.component_id,
            "Requesting FLIGHT_INFORMATION"
        );

        Some(CommandLong {
            target_system: source.system_id,
            target_component: source.component_id,
            command: cmd::SET_MESSAGE_INTERVAL,
            confirmation: 0,
            params: [
                MSG_ID_FLIGHT_INFORMATION as f32,
                REQUESTED_INTERVAL_US,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
            ],
        })
    }
}

/// Flight duration in seconds reported by FLIGHT_INFORMATION.
///
/// Returns `None` while landed (`takeoff_time_utc == 0`) so the display
/// keeps the last known duration.
pub fn reported_flight_time(info: &FlightInformation) -> Option<f64> {
    if info.takeoff_time_utc == 0 {
        return None;
    }
    let takeoff_ms = info.takeoff_time_utc as f64 * 0.001;
    Some((f64::from(info.time_boot_ms) - takeoff_ms) * 0.001)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src() -> VehicleIdentity {
        VehicleIdentity::new(1, 1)
    }

    fn ack(result: u8) -> CommandAck {
        CommandAck {
            command: cmd::SET_MESSAGE_INTERVAL,
            result,
        }
    }

    #[test]
    fn test_first_step_sends_request() {
        let mut probe = CapabilityProbe::new();

        let command = probe.step(src(), 0.0).expect("probe due");
        assert_eq!(command.command, cmd::SET_MESSAGE_INTERVAL);
        assert_eq!(command.target_system, 1);
        assert_eq!(command.target_component, 1);
        assert_eq!(command.params[0], 264.0);
        assert_eq!(command.params[1], 500_000.0);
    }

    #[test]
    fn test_one_request_per_window() {
        let mut probe = CapabilityProbe::new();
        let mut sent = Vec::new();

        // 10 Hz message rate for 35 seconds
        for tick in 0..350 {
            let now = tick as f64 * 0.1;
            if probe.step(src(), now).is_some() {
                sent.push(now);
            }
        }

        assert_eq!(sent.len(), 4);
        for pair in sent.windows(2) {
            assert!(pair[1] - pair[0] >= PROBE_INTERVAL_SECS);
        }
    }

    #[test]
    fn test_accepted_ack_suppresses_probe_while_messages_flow() {
        let mut probe = CapabilityProbe::new();
        probe.step(src(), 0.0);

        assert_eq!(probe.on_command_ack(1, &ack(result::ACCEPTED), 0.0), Some(Support::Supported));
        for tick in 1..30 {
            let now = tick as f64;
            probe.on_flight_information(1, now);
            assert!(probe.step(src(), now).is_none());
        }
        assert!(probe.is_supported(1));
    }

    #[test]
    fn test_supported_ages_to_unknown_on_silence() {
        let mut probe = CapabilityProbe::new();
        probe.step(src(), 0.0);
        probe.on_flight_information(1, 1.0);
        probe.on_command_ack(1, &ack(result::ACCEPTED), 1.0);

        assert!(probe.step(src(), 5.0).is_none());
        assert!(probe.is_supported(1));

        let command = probe.step(src(), 11.5);
        assert!(command.is_some(), "silence re-triggers probing");
        assert_eq!(probe.support(1), Support::Unknown);
    }

    #[test]
    fn test_unsupported_never_ages() {
        let mut probe = CapabilityProbe::new();
        probe.step(src(), 0.0);
        assert_eq!(probe.on_command_ack(1, &ack(result::DENIED), 0.0), Some(Support::Unsupported));

        for tick in 1..100 {
            assert!(probe.step(src(), tick as f64).is_none());
        }
        assert_eq!(probe.support(1), Support::Unsupported);
    }

    #[test]
    fn test_failed_ack_is_unsupported() {
        let mut probe = CapabilityProbe::new();
        probe.step(src(), 0.0);
        probe.on_command_ack(1, &ack(result::FAILED), 0.0);
        assert_eq!(probe.support(1), Support::Unsupported);
    }

    #[test]
    fn test_other_results_leave_state_unchanged() {
        let mut probe = CapabilityProbe::new();
        probe.step(src(), 0.0);

        assert_eq!(probe.on_command_ack(1, &ack(result::TEMPORARILY_REJECTED), 0.0), None);
        assert_eq!(probe.on_command_ack(1, &ack(result::IN_PROGRESS), 0.0), None);
        assert_eq!(probe.on_command_ack(1, &ack(result::UNSUPPORTED), 0.0), None);
        assert_eq!(probe.support(1), Support::Unknown);
    }

    #[test]
    fn test_ack_for_other_command_or_unknown_system_ignored() {
        let mut probe = CapabilityProbe::new();
        probe.step(src(), 0.0);

        let other = CommandAck {
            command: cmd::NAV_TAKEOFF,
            result: result::ACCEPTED,
        };
        assert_eq!(probe.on_command_ack(1, &other, 0.0), None);
        assert_eq!(probe.on_command_ack(9, &ack(result::ACCEPTED), 0.0), None);
        assert!(probe.state(9).is_none());
    }

    #[test]
    fn test_systems_are_probed_independently() {
        let mut probe = CapabilityProbe::new();
        assert!(probe.step(VehicleIdentity::new(1, 1), 0.0).is_some());
        assert!(probe.step(VehicleIdentity::new(2, 1), 0.5).is_some());
        assert!(probe.step(VehicleIdentity::new(1, 1), 1.0).is_none());
    }

    #[test]
    fn test_reported_flight_time() {
        let landed = FlightInformation {
            time_boot_ms: 100_000,
            takeoff_time_utc: 0,
            ..Default::default()
        };
        assert_eq!(reported_flight_time(&landed), None);

        let flying = FlightInformation {
            time_boot_ms: 200_000,
            takeoff_time_utc: 80_000_000,
            ..Default::default()
        };
        let secs = reported_flight_time(&flying).unwrap();
        assert!((secs - 120.0).abs() < 1e-9);
    }
}
