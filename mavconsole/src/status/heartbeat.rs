//! Mode, arm state and link summary from the primary HEARTBEAT.

use super::{emit, Frame, StatusDeriver};
use crate::sink::{StatusColor, StatusSink};

impl StatusDeriver {
    pub(super) fn on_heartbeat(
        &mut self,
        frame: &Frame<'_>,
        mav_type: u8,
        custom_mode: u32,
        sink: &mut dyn StatusSink,
    ) {
        let mode = frame.context.flight_mode(mav_type, custom_mode);
        let mode = match &frame.settings.vehicle_name {
            Some(name) => format!("{}:{}", name, mode),
            None => mode,
        };
        emit(sink, "Mode", mode, StatusColor::Blue);

        if frame.registry.vehicle_count() > 1 {
            emit(
                sink,
                "SysID",
                format!("Sys:{}", frame.source.system_id),
                StatusColor::Blue,
            );
        }

        let color = if frame.motors_armed() {
            StatusColor::Green
        } else {
            StatusColor::Red
        };
        let text = if self.safety_on { "ARM(SAFE)" } else { "ARM" };
        emit(sink, "ARM", text, color);

        let links = frame.context.links();
        for field in self.links.update(&links, frame.settings.check_delay) {
            sink.set_status(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::super::StatusDeriver;
    use crate::link::{LinkStats, LINK_ROW};
    use crate::message::{Heartbeat, MessagePayload, SysStatus, VehicleIdentity};
    use crate::protocol::{mav_type, sensor, MODE_FLAG_SAFETY_ARMED};
    use crate::sink::{RecordingSink, StatusColor};

    fn heartbeat(base_mode: u8, custom_mode: u32) -> Heartbeat {
        Heartbeat {
            mav_type: mav_type::QUADROTOR,
            base_mode,
            custom_mode,
            ..Default::default()
        }
    }

    fn deliver(
        h: &mut Harness,
        deriver: &mut StatusDeriver,
        hb: Heartbeat,
        sink: &mut RecordingSink,
    ) {
        h.registry.on_heartbeat(h.source, hb.mav_type);
        h.registry.record_heartbeat(h.source, hb.clone());
        h.run(deriver, MessagePayload::Heartbeat(hb), sink);
    }

    #[test]
    fn test_mode_and_arm() {
        let mut h = Harness::new();
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        deliver(&mut h, &mut deriver, heartbeat(0, 5), &mut sink);
        assert_eq!(sink.text("Mode"), Some("Mode(5)"));
        assert_eq!(sink.color("Mode"), Some(StatusColor::Blue));
        assert_eq!(sink.text("ARM"), Some("ARM"));
        assert_eq!(sink.color("ARM"), Some(StatusColor::Red));
        // single vehicle: no SysID
        assert!(sink.field("SysID").is_none());

        deliver(&mut h, &mut deriver, heartbeat(MODE_FLAG_SAFETY_ARMED, 5), &mut sink);
        assert_eq!(sink.color("ARM"), Some(StatusColor::Green));
    }

    #[test]
    fn test_vehicle_name_prefix() {
        let mut h = Harness::new();
        h.settings = h.settings.clone().with_vehicle_name("Alpha");
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        deliver(&mut h, &mut deriver, heartbeat(0, 3), &mut sink);
        assert_eq!(sink.text("Mode"), Some("Alpha:Mode(3)"));
    }

    #[test]
    fn test_safety_suffix() {
        let mut h = Harness::new();
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.run(&mut deriver, MessagePayload::SysStatus(SysStatus::default()), &mut sink);
        deliver(&mut h, &mut deriver, heartbeat(0, 0), &mut sink);
        assert_eq!(sink.text("ARM"), Some("ARM(SAFE)"));

        let motors = sensor::MOTOR_OUTPUTS;
        h.run(
            &mut deriver,
            MessagePayload::SysStatus(SysStatus {
                onboard_control_sensors_present: motors,
                onboard_control_sensors_enabled: motors,
                onboard_control_sensors_health: motors,
                ..Default::default()
            }),
            &mut sink,
        );
        deliver(&mut h, &mut deriver, heartbeat(0, 0), &mut sink);
        assert_eq!(sink.text("ARM"), Some("ARM"));
    }

    #[test]
    fn test_sysid_shown_with_several_vehicles() {
        let mut h = Harness::new();
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        h.registry.on_heartbeat(VehicleIdentity::new(2, 1), mav_type::FIXED_WING);
        deliver(&mut h, &mut deriver, heartbeat(0, 0), &mut sink);
        assert_eq!(sink.text("SysID"), Some("Sys:1"));
    }

    #[test]
    fn test_link_fields() {
        let mut h = Harness::new();
        h.context.links = vec![
            LinkStats::new(1, "udp", 100, 0),
            LinkStats::new(2, "serial", 0, 0).with_error(true),
        ];
        let mut deriver = StatusDeriver::new();
        let mut sink = RecordingSink::new();

        deliver(&mut h, &mut deriver, heartbeat(0, 0), &mut sink);
        assert_eq!(sink.color("Link1"), Some(StatusColor::DarkGreen));
        assert_eq!(sink.text("Link2"), Some("Link serial down"));
        assert_eq!(sink.field("Link2").map(|f| f.row), Some(LINK_ROW));
    }
}
