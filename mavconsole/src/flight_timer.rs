//! Locally derived flight duration.
//!
//! Tracks whether the vehicle is flying and accumulates the time since the
//! last takeoff edge. Used only for systems that do not report
//! FLIGHT_INFORMATION themselves.
//!
//! # Detection Logic
//!
//! ```text
//! Copter class:  flying = motors armed
//! Other classes: flying = groundspeed > 3 m/s
//! ```
//!
//! Multirotors can hover at zero groundspeed, so they use the armed state.

use std::fmt;

/// Groundspeed above which a non-copter vehicle counts as flying (m/s).
pub const FLYING_GROUNDSPEED_THRESHOLD: f32 = 3.0;

/// Vehicle class used to choose the flying predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VehicleClass {
    /// Multirotors and helicopters: flying while armed.
    Copter,
    /// Everything else: flying while moving.
    #[default]
    Other,
}

impl VehicleClass {
    /// Evaluate the flying predicate for this class.
    pub fn is_flying(&self, armed: bool, groundspeed: f32) -> bool {
        match self {
            VehicleClass::Copter => armed,
            VehicleClass::Other => groundspeed > FLYING_GROUNDSPEED_THRESHOLD,
        }
    }
}

/// Flight state of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightState {
    #[default]
    Grounded,
    Airborne,
}

impl fmt::Display for FlightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightState::Grounded => write!(f, "grounded"),
            FlightState::Airborne => write!(f, "airborne"),
        }
    }
}

/// Grounded/airborne state machine with accumulated flight time.
#[derive(Debug, Default)]
pub struct FlightTimer {
    state: FlightState,
    /// Time of the last takeoff edge.
    start_time: f64,
    /// Duration of the current or last flight, seconds.
    total_time: f64,
}

impl FlightTimer {
    /// Create a grounded timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> FlightState {
        self.state
    }

    /// Duration of the current or most recent flight, seconds.
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Feed the flying predicate at time `now`.
    ///
    /// Returns the updated duration when it should be displayed: on every
    /// evaluation while airborne and on the landing edge. The takeoff edge
    /// itself only records the start time.
    pub fn update(&mut self, flying: bool, now: f64) -> Option<f64> {
        match (self.state, flying) {
            (FlightState::Grounded, true) => {
                self.transition(FlightState::Airborne, now);
                self.start_time = now;
                None
            }
            (FlightState::Airborne, true) => {
                self.total_time = now - self.start_time;
                Some(self.total_time)
            }
            (FlightState::Airborne, false) => {
                self.total_time = now - self.start_time;
                self.transition(FlightState::Grounded, now);
                Some(self.total_time)
            }
            (FlightState::Grounded, false) => None,
        }
    }

    fn transition(&mut self, to: FlightState, now: f64) {
        tracing::debug!(
            from = %self.state,
            to = %to,
            at = now,
            duration = self.total_time,
            "Flight state changed"
        );
        self.state = to;
    }
}

/// Format a duration in seconds as `M:SS`.
pub fn format_flight_time(seconds: f64) -> String {
    let secs = seconds.max(0.0) as u64;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_grounded() {
        let timer = FlightTimer::new();
        assert_eq!(timer.state(), FlightState::Grounded);
        assert_eq!(timer.total_time(), 0.0);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(FlightState::Grounded.to_string(), "grounded");
        assert_eq!(FlightState::Airborne.to_string(), "airborne");
    }

    #[test]
    fn test_takeoff_edge_records_start_only() {
        let mut timer = FlightTimer::new();
        assert_eq!(timer.update(true, 100.0), None);
        assert_eq!(timer.state(), FlightState::Airborne);
    }

    #[test]
    fn test_duration_is_interval_between_edges() {
        let mut timer = FlightTimer::new();
        timer.update(false, 0.0);
        timer.update(true, 10.0);
        // irregular message rate in between
        for t in [10.1, 10.2, 15.0, 15.05, 40.0, 71.9] {
            timer.update(true, t);
        }
        assert_eq!(timer.update(false, 72.5), Some(62.5));
        assert_eq!(timer.state(), FlightState::Grounded);

        // further grounded updates keep the last duration
        assert_eq!(timer.update(false, 90.0), None);
        assert_eq!(timer.total_time(), 62.5);
    }

    #[test]
    fn test_airborne_updates_emit_running_time() {
        let mut timer = FlightTimer::new();
        timer.update(true, 5.0);
        assert_eq!(timer.update(true, 8.0), Some(3.0));
        assert_eq!(timer.update(true, 9.5), Some(4.5));
    }

    #[test]
    fn test_second_flight_restarts_timer() {
        let mut timer = FlightTimer::new();
        timer.update(true, 0.0);
        timer.update(false, 30.0);
        timer.update(true, 100.0);
        assert_eq!(timer.update(false, 110.0), Some(10.0));
    }

    #[test]
    fn test_flying_predicate_by_class() {
        assert!(VehicleClass::Copter.is_flying(true, 0.0));
        assert!(!VehicleClass::Copter.is_flying(false, 20.0));
        assert!(VehicleClass::Other.is_flying(false, 3.5));
        assert!(!VehicleClass::Other.is_flying(true, 3.0));
    }

    #[test]
    fn test_format_flight_time() {
        assert_eq!(format_flight_time(0.0), "0:00");
        assert_eq!(format_flight_time(62.5), "1:02");
        assert_eq!(format_flight_time(3600.0), "60:00");
        assert_eq!(format_flight_time(-4.0), "0:00");
    }

    #[test]
    fn test_flight_state_display() {
        assert_eq!(FlightState::Grounded.to_string(), "grounded");
        assert_eq!(FlightState::Airborne.to_string(), "airborne");
    }
}
