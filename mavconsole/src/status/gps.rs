//! GPS fix and heading.

use super::{emit, Frame, UNKNOWN_TEXT};
use crate::message::GpsRaw;
use crate::protocol::HEADING_UNKNOWN;
use crate::sink::{StatusColor, StatusSink};

/// Fix type from which a fix counts as good (3D).
const GOOD_FIX: u8 = 3;

pub(super) fn on_gps_raw(
    frame: &Frame<'_>,
    gps: &GpsRaw,
    secondary: bool,
    sink: &mut dyn StatusSink,
) {
    let (key, prefix) = if secondary { ("GPS2", "GPS2") } else { ("GPS", "GPS:") };

    if gps.fix_type >= GOOD_FIX {
        emit(
            sink,
            key,
            format!("{} OK{} ({})", prefix, gps.fix_type, gps.satellites_visible),
            StatusColor::Green,
        );
    } else {
        emit(
            sink,
            key,
            format!("{} {} ({})", prefix, gps.fix_type, gps.satellites_visible),
            StatusColor::Red,
        );
    }

    if secondary {
        return;
    }

    let fused = fused_heading(frame)
        .map(|h| format!("{:>3}", h))
        .unwrap_or_else(|| UNKNOWN_TEXT.to_string());
    let course = gps.cog / 100;
    emit(
        sink,
        "Heading",
        format!("Hdg {}/{:>3}", fused, course),
        StatusColor::Black,
    );
}

/// Heading in whole degrees from VFR_HUD, else GLOBAL_POSITION_INT.
fn fused_heading(frame: &Frame<'_>) -> Option<i32> {
    if let Some(hud) = frame.store.vfr_hud() {
        return Some(i32::from(hud.heading));
    }
    frame
        .store
        .global_position()
        .filter(|pos| pos.hdg != HEADING_UNKNOWN)
        .map(|pos| i32::from(pos.hdg / 100))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::super::StatusDeriver;
    use crate::message::{GlobalPositionInt, GpsRaw, MessagePayload, VfrHud};
    use crate::sink::{RecordingSink, StatusColor};

    fn gps(fix_type: u8, sats: u8, cog: u16) -> GpsRaw {
        GpsRaw {
            fix_type,
            satellites_visible: sats,
            cog,
            ..Default::default()
        }
    }

    #[test]
    fn test_fix_quality() {
        let mut h = Harness::new();
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.run(&mut deriver, MessagePayload::GpsRawInt(gps(3, 12, 0)), &mut sink);
        assert_eq!(sink.text("GPS"), Some("GPS: OK3 (12)"));
        assert_eq!(sink.color("GPS"), Some(StatusColor::Green));

        h.run(&mut deriver, MessagePayload::GpsRawInt(gps(2, 5, 0)), &mut sink);
        assert_eq!(sink.text("GPS"), Some("GPS: 2 (5)"));
        assert_eq!(sink.color("GPS"), Some(StatusColor::Red));

        h.run(&mut deriver, MessagePayload::Gps2Raw(gps(6, 20, 0)), &mut sink);
        assert_eq!(sink.text("GPS2"), Some("GPS2 OK6 (20)"));
    }

    #[test]
    fn test_heading_sources() {
        let mut h = Harness::new();
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.run(&mut deriver, MessagePayload::GpsRawInt(gps(3, 9, 9_050)), &mut sink);
        assert_eq!(sink.text("Heading"), Some("Hdg ---/ 90"));

        // sentinel heading stays unknown
        h.store.record(&MessagePayload::GlobalPositionInt(GlobalPositionInt {
            hdg: u16::MAX,
            ..Default::default()
        }));
        h.run(&mut deriver, MessagePayload::GpsRawInt(gps(3, 9, 9_050)), &mut sink);
        assert_eq!(sink.text("Heading"), Some("Hdg ---/ 90"));

        h.store.record(&MessagePayload::GlobalPositionInt(GlobalPositionInt {
            hdg: 27_099,
            ..Default::default()
        }));
        h.run(&mut deriver, MessagePayload::GpsRawInt(gps(3, 9, 9_050)), &mut sink);
        assert_eq!(sink.text("Heading"), Some("Hdg 270/ 90"));

        // VFR_HUD wins over GLOBAL_POSITION_INT
        h.store.record(&MessagePayload::VfrHud(VfrHud {
            heading: 45,
            ..Default::default()
        }));
        h.run(&mut deriver, MessagePayload::GpsRawInt(gps(3, 9, 35_999)), &mut sink);
        assert_eq!(sink.text("Heading"), Some("Hdg  45/359"));
    }

    #[test]
    fn test_secondary_gps_leaves_heading() {
        let mut h = Harness::new();
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.run(&mut deriver, MessagePayload::Gps2Raw(gps(1, 0, 100)), &mut sink);
        assert!(sink.text("Heading").is_none());
    }
}
