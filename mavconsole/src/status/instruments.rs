//! Instrument readouts: VFR_HUD, attitude, wind, EKF, power, parameters and
//! flight time.

use super::{emit, green_if, Frame, StatusDeriver, UNKNOWN_TEXT};
use crate::flight_timer::format_flight_time;
use crate::message::{Attitude, EkfStatusReport, FlightInformation, PowerStatus, VfrHud, Wind};
use crate::probe::reported_flight_time;
use crate::protocol::power;
use crate::sink::{StatusColor, StatusSink};

/// Healthy board supply range, millivolts.
const VCC_RANGE_MV: std::ops::RangeInclusive<u16> = 4600..=5300;

const EKF_VARIANCE_BAD: f32 = 1.0;
const EKF_VARIANCE_WARN: f32 = 0.5;

/// Power flags shown in the PWR field, in display order.
const POWER_FLAGS: &[(u16, &str)] = &[
    (power::USB_CONNECTED, "U"),
    (power::BRICK_VALID, "B"),
    (power::SERVO_VALID, "S"),
    (power::PERIPH_OVERCURRENT, "O1"),
    (power::PERIPH_HIPOWER_OVERCURRENT, "O2"),
];

impl StatusDeriver {
    pub(super) fn on_vfr_hud(
        &mut self,
        frame: &Frame<'_>,
        msg: &VfrHud,
        sink: &mut dyn StatusSink,
    ) {
        let units = &frame.settings.units;
        let rel_alt = frame.store.relative_alt_m();

        let estimated = estimated_agl(frame);
        let reported = frame
            .store
            .terrain_report()
            .map(|t| f64::from(t.current_height));
        if estimated.is_some() || reported.is_some() || self.shown_agl {
            self.shown_agl = true;
            let estimated = estimated
                .map(|agl| units.height_string(agl + rel_alt))
                .unwrap_or_else(|| UNKNOWN_TEXT.to_string());
            let reported = reported
                .map(|agl| units.height_string(agl))
                .unwrap_or_else(|| UNKNOWN_TEXT.to_string());
            emit(sink, "AGL", format!("AGL {}/{}", estimated, reported), StatusColor::Black);
        }

        emit(
            sink,
            "Alt",
            format!("Alt {}", units.height_string(rel_alt)),
            StatusColor::Black,
        );
        emit(
            sink,
            "AirSpeed",
            format!("AirSpeed {}", units.speed_string(f64::from(msg.airspeed))),
            StatusColor::Black,
        );
        emit(
            sink,
            "GPSSpeed",
            format!("GPSSpeed {}", units.speed_string(f64::from(msg.groundspeed))),
            StatusColor::Black,
        );
        emit(sink, "Thr", format!("Thr {}", msg.throttle), StatusColor::Black);

        if !frame.flight_information_supported {
            let flying = frame
                .context
                .vehicle_class()
                .is_flying(frame.motors_armed(), msg.groundspeed);
            if let Some(duration) = self.flight_timer.update(flying, frame.now) {
                emit_flight_time(sink, duration);
            }
        }
    }
}

/// Terrain-derived height of home (or `basealt`) above the ground below
/// the vehicle, before adding the altitude above home.
fn estimated_agl(frame: &Frame<'_>) -> Option<f64> {
    let terrain = frame.context.terrain()?;
    let (lat, lon) = frame.store.position_deg();

    if frame.settings.basealt != 0.0 {
        return terrain
            .elevation(lat, lon)
            .map(|ground| frame.settings.basealt - ground);
    }

    let (home_lat, home_lon) = frame.context.home()?;
    let home = terrain.elevation(home_lat, home_lon)?;
    terrain.elevation(lat, lon).map(|ground| home - ground)
}

fn emit_flight_time(sink: &mut dyn StatusSink, seconds: f64) {
    emit(
        sink,
        "FlightTime",
        format!("FlightTime {}", format_flight_time(seconds)),
        StatusColor::Black,
    );
}

pub(super) fn on_attitude(msg: &Attitude, sink: &mut dyn StatusSink) {
    let roll = f64::from(msg.roll).to_degrees() as i64;
    let pitch = f64::from(msg.pitch).to_degrees() as i64;
    emit(sink, "Roll", format!("Roll {}", roll), StatusColor::Black);
    emit(sink, "Pitch", format!("Pitch {}", pitch), StatusColor::Black);
}

pub(super) fn on_wind(frame: &Frame<'_>, msg: &Wind, sink: &mut dyn StatusSink) {
    emit(
        sink,
        "Wind",
        format!(
            "Wind {}/{}",
            msg.direction as i64,
            frame.settings.units.speed_string(f64::from(msg.speed))
        ),
        StatusColor::Black,
    );
}

pub(super) fn on_ekf_status(msg: &EkfStatusReport, sink: &mut dyn StatusSink) {
    let highest = msg.highest_variance();
    let color = if highest >= EKF_VARIANCE_BAD {
        StatusColor::Red
    } else if highest >= EKF_VARIANCE_WARN {
        StatusColor::Orange
    } else {
        StatusColor::Green
    };
    emit(sink, "EKF", "EKF", color);
}

pub(super) fn on_power_status(msg: &PowerStatus, sink: &mut dyn StatusSink) {
    emit(
        sink,
        "Vcc",
        format!("Vcc {:.2}", f64::from(msg.vcc) * 0.001),
        green_if(VCC_RANGE_MV.contains(&msg.vcc)),
    );

    let mut text = String::from("PWR:");
    for &(flag, letter) in POWER_FLAGS {
        if msg.flags & flag != 0 {
            text.push_str(letter);
        }
    }
    emit(sink, "PWR", text, green_if(msg.flags & power::CHANGED == 0));

    emit(
        sink,
        "Srv",
        format!("Srv {:.2}", f64::from(msg.vservo) * 0.001),
        StatusColor::Green,
    );
}

pub(super) fn on_param_value(frame: &Frame<'_>, sink: &mut dyn StatusSink) {
    let (received, total) = frame.context.param_status();
    emit(
        sink,
        "Params",
        format!("Param {}/{}", received, total),
        StatusColor::Black,
    );
}

pub(super) fn on_flight_information(msg: &FlightInformation, sink: &mut dyn StatusSink) {
    // landed: keep showing the last flight
    if let Some(duration) = reported_flight_time(msg) {
        emit_flight_time(sink, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::super::StatusDeriver;
    use crate::flight_timer::VehicleClass;
    use crate::message::{
        Attitude, EkfStatusReport, FlightInformation, GlobalPositionInt, Heartbeat, MessagePayload,
        ParamValue, PowerStatus, TerrainReport, VfrHud, Wind,
    };
    use crate::protocol::{power, MODE_FLAG_SAFETY_ARMED};
    use crate::sink::{RecordingSink, StatusColor};

    fn hud(groundspeed: f32) -> MessagePayload {
        MessagePayload::VfrHud(VfrHud {
            airspeed: 14.8,
            groundspeed,
            throttle: 42,
            ..Default::default()
        })
    }

    #[test]
    fn test_vfr_hud_basic_fields() {
        let mut h = Harness::new();
        h.store.record(&MessagePayload::GlobalPositionInt(GlobalPositionInt {
            relative_alt: 35_600,
            ..Default::default()
        }));
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.run(&mut deriver, hud(9.2), &mut sink);
        assert_eq!(sink.text("Alt"), Some("Alt 35m"));
        assert_eq!(sink.text("AirSpeed"), Some("AirSpeed 14m/s"));
        assert_eq!(sink.text("GPSSpeed"), Some("GPSSpeed 9m/s"));
        assert_eq!(sink.text("Thr"), Some("Thr 42"));
        // no terrain source at all
        assert!(sink.field("AGL").is_none());
    }

    #[test]
    fn test_agl_from_home_elevation() {
        let mut h = Harness::new();
        h.context = h
            .context
            .with_home(-35.0, 149.0)
            .with_terrain(|lat: f64, _lon: f64| Some(if lat < -35.05 { 580.0 } else { 600.0 }));
        h.store.record(&MessagePayload::GlobalPositionInt(GlobalPositionInt {
            lat: -351_000_000,
            lon: 1_490_000_000,
            relative_alt: 50_000,
            ..Default::default()
        }));
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.run(&mut deriver, hud(0.0), &mut sink);
        // home 600, ground 580, 50 above home
        assert_eq!(sink.text("AGL"), Some("AGL 70m/---"));
    }

    #[test]
    fn test_agl_from_basealt_and_terrain_report() {
        let mut h = Harness::new();
        h.settings = h.settings.clone().with_basealt(650.0);
        h.context = h.context.with_terrain(|_lat: f64, _lon: f64| Some(600.0));
        h.store.record(&MessagePayload::TerrainReport(TerrainReport {
            current_height: 61.5,
            ..Default::default()
        }));
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.run(&mut deriver, hud(0.0), &mut sink);
        assert_eq!(sink.text("AGL"), Some("AGL 50m/61m"));
    }

    #[test]
    fn test_agl_sticky_once_shown() {
        let mut h = Harness::new();
        h.store.record(&MessagePayload::TerrainReport(TerrainReport {
            current_height: 10.0,
            ..Default::default()
        }));
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();
        h.run(&mut deriver, hud(0.0), &mut sink);
        assert_eq!(sink.text("AGL"), Some("AGL ---/10m"));

        // terrain report gone from a fresh store, AGL still refreshed
        h.store = crate::store::MessageStore::new();
        h.run(&mut deriver, hud(0.0), &mut sink);
        assert_eq!(sink.text("AGL"), Some("AGL ---/---"));
    }

    #[test]
    fn test_flight_timer_from_groundspeed() {
        let mut h = Harness::new();
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.now = 100.0;
        h.run(&mut deriver, hud(10.0), &mut sink);
        assert!(sink.field("FlightTime").is_none());

        h.now = 165.0;
        h.run(&mut deriver, hud(10.0), &mut sink);
        assert_eq!(sink.text("FlightTime"), Some("FlightTime 1:05"));

        h.now = 190.0;
        h.run(&mut deriver, hud(1.0), &mut sink);
        assert_eq!(sink.text("FlightTime"), Some("FlightTime 1:30"));
    }

    #[test]
    fn test_flight_timer_copter_uses_armed() {
        let mut h = Harness::new();
        h.context = h.context.with_class(VehicleClass::Copter);
        h.registry.record_heartbeat(
            h.source,
            Heartbeat {
                base_mode: MODE_FLAG_SAFETY_ARMED,
                ..Default::default()
            },
        );
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.now = 10.0;
        h.run(&mut deriver, hud(0.0), &mut sink);
        h.now = 20.0;
        h.run(&mut deriver, hud(0.0), &mut sink);
        assert_eq!(sink.text("FlightTime"), Some("FlightTime 0:10"));
    }

    #[test]
    fn test_flight_timer_suppressed_when_supported() {
        let mut h = Harness::new();
        h.supported = true;
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.now = 1.0;
        h.run(&mut deriver, hud(10.0), &mut sink);
        h.now = 30.0;
        h.run(&mut deriver, hud(10.0), &mut sink);
        assert!(sink.field("FlightTime").is_none());
    }

    #[test]
    fn test_attitude_and_wind() {
        let mut h = Harness::new();
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.run(
            &mut deriver,
            MessagePayload::Attitude(Attitude {
                roll: 0.5,
                pitch: -0.1,
                ..Default::default()
            }),
            &mut sink,
        );
        assert_eq!(sink.text("Roll"), Some("Roll 28"));
        assert_eq!(sink.text("Pitch"), Some("Pitch -5"));

        h.run(
            &mut deriver,
            MessagePayload::Wind(Wind {
                direction: 271.6,
                speed: 7.9,
                ..Default::default()
            }),
            &mut sink,
        );
        assert_eq!(sink.text("Wind"), Some("Wind 271/7m/s"));
    }

    #[test]
    fn test_ekf_thresholds() {
        let mut h = Harness::new();
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        for (variance, color) in [
            (0.2, StatusColor::Green),
            (0.5, StatusColor::Orange),
            (1.0, StatusColor::Red),
        ] {
            h.run(
                &mut deriver,
                MessagePayload::EkfStatusReport(EkfStatusReport {
                    compass_variance: variance,
                    ..Default::default()
                }),
                &mut sink,
            );
            assert_eq!(sink.color("EKF"), Some(color));
        }
    }

    #[test]
    fn test_power_status() {
        let mut h = Harness::new();
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.run(
            &mut deriver,
            MessagePayload::PowerStatus(PowerStatus {
                vcc: 5120,
                vservo: 4980,
                flags: power::USB_CONNECTED | power::BRICK_VALID | power::PERIPH_OVERCURRENT,
            }),
            &mut sink,
        );
        assert_eq!(sink.text("Vcc"), Some("Vcc 5.12"));
        assert_eq!(sink.color("Vcc"), Some(StatusColor::Green));
        assert_eq!(sink.text("PWR"), Some("PWR:UBO1"));
        assert_eq!(sink.color("PWR"), Some(StatusColor::Green));
        assert_eq!(sink.text("Srv"), Some("Srv 4.98"));

        h.run(
            &mut deriver,
            MessagePayload::PowerStatus(PowerStatus {
                vcc: 4400,
                vservo: 0,
                flags: power::CHANGED,
            }),
            &mut sink,
        );
        assert_eq!(sink.color("Vcc"), Some(StatusColor::Red));
        assert_eq!(sink.text("PWR"), Some("PWR:"));
        assert_eq!(sink.color("PWR"), Some(StatusColor::Red));
    }

    #[test]
    fn test_param_and_flight_information() {
        let mut h = Harness::new();
        h.context.params = (120, 850);
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.run(&mut deriver, MessagePayload::ParamValue(ParamValue::default()), &mut sink);
        assert_eq!(sink.text("Params"), Some("Param 120/850"));

        // landed report leaves the display alone
        h.run(
            &mut deriver,
            MessagePayload::FlightInformation(FlightInformation {
                time_boot_ms: 500_000,
                ..Default::default()
            }),
            &mut sink,
        );
        assert!(sink.field("FlightTime").is_none());

        // took off 100 s after boot, now 250 s after boot
        h.run(
            &mut deriver,
            MessagePayload::FlightInformation(FlightInformation {
                time_boot_ms: 250_000,
                takeoff_time_utc: 100_000_000,
                ..Default::default()
            }),
            &mut sink,
        );
        assert_eq!(sink.text("FlightTime"), Some("FlightTime 2:30"));
    }
}
