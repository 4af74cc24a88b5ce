//! The console engine: one entry point per inbound message.
//!
//! # Dispatch order
//!
//! ```text
//! 1. HEARTBEAT / HIGH_LATENCY2 / GIMBAL_DEVICE_INFORMATION -> registry
//! 2. parameter epoch changed                                -> menu refresh
//! 3. RADIO / RADIO_STATUS                                   -> Radio field
//! 4. SYS_STATUS                                             -> critical errors
//! 5. not from the primary vehicle                           -> stop
//! 6. record in store, run the type handler
//! 7. re-evaluate custom display items that reference the type
//! 8. capability probe step                                  -> maybe a command
//! ```
//!
//! Steps 1-4 run for every source so that all vehicles show up in menus and
//! radio/critical warnings are never missed. Dispatch never fails: bad or
//! missing data degrades individual fields.

use std::collections::BTreeMap;

use crate::config::ConsoleSettings;
use crate::context::VehicleContext;
use crate::error::ExpressionError;
use crate::expression::{DisplayItem, DEFAULT_DISPLAY_ROW, EVAL_FAILED_TEXT};
use crate::link::radio_status_field;
use crate::message::{MessagePayload, TelemetryMessage};
use crate::probe::CapabilityProbe;
use crate::registry::VehicleRegistry;
use crate::sink::{CommandSink, StatusColor, StatusField, StatusSink};
use crate::status::{initial_fields, CriticalErrorMonitor, Frame, StatusDeriver};
use crate::store::MessageStore;

/// Telemetry correlation and status derivation for one session.
#[derive(Debug, Default)]
pub struct ConsoleEngine {
    settings: ConsoleSettings,
    registry: VehicleRegistry,
    probe: CapabilityProbe,
    store: MessageStore,
    deriver: StatusDeriver,
    critical: CriticalErrorMonitor,
    display_items: BTreeMap<String, DisplayItem>,
    last_param_epoch: Option<u64>,
}

impl ConsoleEngine {
    /// Create an engine with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the given settings. Display items from the
    /// settings are registered immediately.
    pub fn with_settings(settings: ConsoleSettings) -> Self {
        let display_items = settings
            .display_items
            .iter()
            .map(|item| (item.id.clone(), item.clone()))
            .collect();
        Self {
            settings,
            display_items,
            ..Default::default()
        }
    }

    /// Replace the capability probe, e.g. to change its timing.
    pub fn with_probe(mut self, probe: CapabilityProbe) -> Self {
        self.probe = probe;
        self
    }

    pub fn settings(&self) -> &ConsoleSettings {
        &self.settings
    }

    pub fn registry(&self) -> &VehicleRegistry {
        &self.registry
    }

    pub fn probe(&self) -> &CapabilityProbe {
        &self.probe
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn deriver(&self) -> &StatusDeriver {
        &self.deriver
    }

    /// Emit the placeholder fields shown before telemetry arrives.
    pub fn emit_initial_status(&self, status: &mut dyn StatusSink) {
        for field in initial_fields() {
            status.set_status(field);
        }
        for item in self.display_items.values() {
            status.set_status(StatusField::new(&item.id, "", StatusColor::Black, item.row));
        }
    }

    /// Register (or replace) a custom display item and show it empty.
    pub fn add_display_item(
        &mut self,
        id: &str,
        format: &str,
        expression: &str,
        row: Option<u8>,
        status: &mut dyn StatusSink,
    ) -> Result<(), ExpressionError> {
        let item = DisplayItem::new(id, format, expression, row.unwrap_or(DEFAULT_DISPLAY_ROW))?;
        tracing::debug!(id, expression = %item.source, "Display item added");
        status.set_status(StatusField::new(id, "", StatusColor::Black, item.row));
        self.display_items.insert(id.to_string(), item);
        Ok(())
    }

    /// Stop updating a display item. Returns whether it existed.
    pub fn remove_display_item(&mut self, id: &str) -> bool {
        self.display_items.remove(id).is_some()
    }

    /// Registered display items, sorted by id.
    pub fn display_items(&self) -> impl Iterator<Item = &DisplayItem> {
        self.display_items.values()
    }

    /// Process one message.
    pub fn dispatch(
        &mut self,
        msg: &TelemetryMessage,
        context: &dyn VehicleContext,
        status: &mut dyn StatusSink,
        commands: &mut dyn CommandSink,
    ) {
        let source = msg.source;
        let now = msg.timestamp;

        let mut refresh_menu = match &msg.message {
            MessagePayload::Heartbeat(hb) => {
                self.registry.record_heartbeat(source, hb.clone());
                self.registry.on_heartbeat(source, hb.mav_type)
            }
            MessagePayload::HighLatency2(hl) => self.registry.on_heartbeat(source, hl.mav_type),
            MessagePayload::GimbalDeviceInformation(info) => self
                .registry
                .on_component_seen(source, format!("{}-{}", info.vendor_name, info.model_name)),
            _ => false,
        };

        let epoch = context.param_epoch();
        if self.last_param_epoch != Some(epoch) {
            self.last_param_epoch = Some(epoch);
            refresh_menu = true;
        }
        if refresh_menu {
            let entries = self.registry.menu_entries(|sysid| context.component_ids(sysid));
            status.vehicles_changed(&entries);
        }

        match &msg.message {
            MessagePayload::Radio(radio) | MessagePayload::RadioStatus(radio) => {
                status.set_status(radio_status_field(radio));
            }
            MessagePayload::SysStatus(sys) => {
                if let Some(text) = self.critical.check(
                    source,
                    sys,
                    &self.registry,
                    self.settings.announce_interval,
                    now,
                ) {
                    status.announce(&text);
                }
            }
            _ => {}
        }

        if !context.is_primary(source) {
            return;
        }

        self.store.record(&msg.message);
        match &msg.message {
            MessagePayload::FlightInformation(_) => {
                self.probe.on_flight_information(source.system_id, now);
            }
            MessagePayload::CommandAck(ack) => {
                self.probe.on_command_ack(source.system_id, ack, now);
            }
            _ => {}
        }

        let frame = Frame {
            now,
            source,
            settings: &self.settings,
            store: &self.store,
            registry: &self.registry,
            context,
            flight_information_supported: self.probe.is_supported(source.system_id),
        };
        self.deriver.handle(&frame, &msg.message, status);

        self.update_display_items(msg.kind().name(), status);

        if let Some(command) = self.probe.step(source, now) {
            commands.send_command(command);
        }
    }

    fn update_display_items(&self, message: &str, status: &mut dyn StatusSink) {
        for item in self.display_items.values().filter(|d| d.references(message)) {
            let text = match item.render(&self.store) {
                Ok(text) => text,
                Err(err) => {
                    self.log_expression_failure(item, &err);
                    EVAL_FAILED_TEXT.to_string()
                }
            };
            status.set_status(StatusField::new(&item.id, text, StatusColor::Black, item.row));
        }
    }

    fn log_expression_failure(&self, item: &DisplayItem, err: &ExpressionError) {
        match self.settings.debug_level {
            0 => tracing::trace!(id = %item.id, error = %err, "Display item failed"),
            1 => tracing::debug!(id = %item.id, error = %err, "Display item failed"),
            _ => tracing::warn!(
                id = %item.id,
                expression = %item.source,
                error = %err,
                "Display item failed"
            ),
        }
    }
}
