//! Mission progress and navigation errors.
//!
//! Error sign labels: `(L)` means the vehicle is below (or slower than) its
//! target, `(H)` above (or faster). NAV_CONTROLLER_OUTPUT and HIGH_LATENCY2
//! use the same rule.

use super::{emit, sensors, Frame, StatusDeriver, UNKNOWN_TEXT};
use crate::flight_timer::format_flight_time;
use crate::message::{HighLatency2, MissionCurrent, NavControllerOutput};
use crate::mission::{estimate_seconds_remaining, DEFAULT_SPEED_READING};
use crate::sink::{StatusColor, StatusSink};

fn sign_label(error: f64) -> &'static str {
    if error > 0.0 {
        "(L)"
    } else {
        "(H)"
    }
}

impl StatusDeriver {
    pub(super) fn on_mission_current(
        &mut self,
        frame: &Frame<'_>,
        msg: &MissionCurrent,
        sink: &mut dyn StatusSink,
    ) {
        let count = frame.context.mission().map_or(0, |m| m.count());
        let total = if count > 0 {
            format!("/{}", count)
        } else {
            String::new()
        };
        emit(sink, "WP", format!("WP {}{}", msg.seq, total), StatusColor::Black);

        let (lat, lon) = frame.store.position_deg();
        if lat == 0.0 || lon == 0.0 {
            return;
        }

        let reading = frame
            .store
            .vfr_hud()
            .map_or(DEFAULT_SPEED_READING, |hud| f64::from(hud.airspeed));
        let speed = self.speed.update(reading);
        let remaining = estimate_seconds_remaining(
            frame.context.mission(),
            lat,
            lon,
            usize::from(msg.seq),
            speed,
        );
        emit(
            sink,
            "ETR",
            format!("ETR {}", format_flight_time(remaining)),
            StatusColor::Black,
        );
    }
}

pub(super) fn on_nav_controller(
    frame: &Frame<'_>,
    msg: &NavControllerOutput,
    sink: &mut dyn StatusSink,
) {
    let units = &frame.settings.units;

    emit(
        sink,
        "WPDist",
        format!("Distance {}", units.dist_string(f64::from(msg.wp_dist))),
        StatusColor::Black,
    );
    emit(
        sink,
        "WPBearing",
        format!("Bearing {}", msg.target_bearing),
        StatusColor::Black,
    );

    let alt_error = f64::from(msg.alt_error);
    let alt_text = if alt_error.is_nan() {
        "NaN".to_string()
    } else {
        format!("{}{}", units.height_string(alt_error), sign_label(alt_error))
    };
    emit(sink, "AltError", format!("AltError {}", alt_text), StatusColor::Black);

    let aspd_error = f64::from(msg.aspd_error);
    emit(
        sink,
        "AspdError",
        format!(
            "AspdError {}{}",
            units.speed_string(aspd_error * 0.01),
            sign_label(aspd_error)
        ),
        StatusColor::Black,
    );
}

/// Navigation and instrument fields of HIGH_LATENCY2.
///
/// Headings arrive in 2-degree units over 0..360 and are shifted to
/// -180..180 to match the other bearing sources. Speeds are in 0.2 m/s.
pub(super) fn on_high_latency2(frame: &Frame<'_>, msg: &HighLatency2, sink: &mut dyn StatusSink) {
    let units = &frame.settings.units;

    emit(
        sink,
        "WPDist",
        format!("Distance {}", units.dist_string(f64::from(msg.target_distance) * 10.0)),
        StatusColor::Black,
    );
    emit(
        sink,
        "WPBearing",
        format!("Bearing {}", i32::from(msg.target_heading) * 2 - 180),
        StatusColor::Black,
    );

    let alt_error = f64::from(i32::from(msg.target_altitude) - i32::from(msg.altitude));
    emit(
        sink,
        "AltError",
        format!("AltError {}{}", units.height_string(alt_error), sign_label(alt_error)),
        StatusColor::Black,
    );

    let aspd_error = (f64::from(msg.airspeed_sp) - f64::from(msg.airspeed)) / 5.0;
    emit(
        sink,
        "AspdError",
        format!("AspdError {}{}", units.speed_string(aspd_error), sign_label(aspd_error)),
        StatusColor::Black,
    );

    emit(
        sink,
        "Wind",
        format!(
            "Wind {}/{}",
            i32::from(msg.wind_heading) * 2 - 180,
            units.speed_string(f64::from(msg.windspeed) / 5.0)
        ),
        StatusColor::Black,
    );

    let lat = f64::from(msg.latitude) * 1.0e-7;
    let lon = f64::from(msg.longitude) * 1.0e-7;
    let alt = frame
        .context
        .terrain()
        .and_then(|t| t.elevation(lat, lon))
        .map(|ground| units.height_string(f64::from(msg.altitude) - ground))
        .unwrap_or_else(|| UNKNOWN_TEXT.to_string());
    emit(sink, "Alt", format!("Alt {}", alt), StatusColor::Black);

    emit(
        sink,
        "AirSpeed",
        format!("AirSpeed {}", units.speed_string(f64::from(msg.airspeed) / 5.0)),
        StatusColor::Black,
    );
    emit(
        sink,
        "GPSSpeed",
        format!("GPSSpeed {}", units.speed_string(f64::from(msg.groundspeed) / 5.0)),
        StatusColor::Black,
    );
    emit(sink, "Thr", format!("Thr {}", msg.throttle), StatusColor::Black);
    emit(
        sink,
        "Heading",
        format!("Hdg {}/{}", u16::from(msg.heading) * 2, UNKNOWN_TEXT),
        StatusColor::Black,
    );
    emit(sink, "WP", format!("WP {}/--", msg.wp_num), StatusColor::Black);

    sensors::on_high_latency_failures(msg, sink);
}
