//! One-way output interfaces of the engine.
//!
//! The engine never draws anything. It emits [`StatusField`] upserts and
//! announcements to a [`StatusSink`], and outbound commands to a
//! [`CommandSink`]. Hosts decide how these are rendered or transmitted.

use std::collections::BTreeMap;
use std::fmt;

use crate::registry::VehicleMenuEntry;

/// Display color of a status field.
///
/// Colors are semantic hints; a renderer maps them to whatever palette it
/// uses. `Black` is the neutral foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusColor {
    #[default]
    Black,
    Grey,
    Green,
    DarkGreen,
    Red,
    Orange,
    Yellow,
    Blue,
}

impl StatusColor {
    /// Lower-case color name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Black => "black",
            StatusColor::Grey => "grey",
            StatusColor::Green => "green",
            StatusColor::DarkGreen => "dark green",
            StatusColor::Red => "red",
            StatusColor::Orange => "orange",
            StatusColor::Yellow => "yellow",
            StatusColor::Blue => "blue",
        }
    }
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single status upsert. Later fields with the same key replace earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusField {
    /// Stable identifier, e.g. `"Mode"`, `"GPS"`, `"Link1"`.
    pub key: String,
    /// Display text.
    pub text: String,
    pub color: StatusColor,
    /// Display row.
    pub row: u8,
}

impl StatusField {
    /// Create a field with an explicit color and row.
    pub fn new(
        key: impl Into<String>,
        text: impl Into<String>,
        color: StatusColor,
        row: u8,
    ) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
            color,
            row,
        }
    }
}

/// Outbound COMMAND_LONG request.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandLong {
    pub target_system: u8,
    pub target_component: u8,
    pub command: u16,
    pub confirmation: u8,
    pub params: [f32; 7],
}

/// Receives status updates from the engine.
pub trait StatusSink {
    /// Upsert a status field.
    fn set_status(&mut self, field: StatusField);

    /// One-shot spoken or printed announcement.
    fn announce(&mut self, text: &str);

    /// The set of known vehicles/components changed; rebuild any menus.
    fn vehicles_changed(&mut self, entries: &[VehicleMenuEntry]);
}

/// Receives outbound commands. Fire-and-forget: replies come back as
/// ordinary input messages.
pub trait CommandSink {
    fn send_command(&mut self, command: CommandLong);
}

/// Sink that records everything it receives.
///
/// Keeps both the full emission log and the latest field per key, which is
/// what a display would show.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Every field in emission order.
    pub fields: Vec<StatusField>,
    /// Latest field per key.
    pub latest: BTreeMap<String, StatusField>,
    /// Announcements in emission order.
    pub announcements: Vec<String>,
    /// Most recent vehicle menu.
    pub menu: Vec<VehicleMenuEntry>,
    /// Number of `vehicles_changed` calls.
    pub menu_refreshes: usize,
    /// Commands in emission order.
    pub commands: Vec<CommandLong>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest field for `key`, if any was emitted.
    pub fn field(&self, key: &str) -> Option<&StatusField> {
        self.latest.get(key)
    }

    /// Latest text for `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.field(key).map(|f| f.text.as_str())
    }

    /// Latest color for `key`.
    pub fn color(&self, key: &str) -> Option<StatusColor> {
        self.field(key).map(|f| f.color)
    }

    /// Number of times a field with `key` was emitted.
    pub fn emissions(&self, key: &str) -> usize {
        self.fields.iter().filter(|f| f.key == key).count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl StatusSink for RecordingSink {
    fn set_status(&mut self, field: StatusField) {
        self.latest.insert(field.key.clone(), field.clone());
        self.fields.push(field);
    }

    fn announce(&mut self, text: &str) {
        self.announcements.push(text.to_string());
    }

    fn vehicles_changed(&mut self, entries: &[VehicleMenuEntry]) {
        self.menu = entries.to_vec();
        self.menu_refreshes += 1;
    }
}

impl CommandSink for RecordingSink {
    fn send_command(&mut self, command: CommandLong) {
        self.commands.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_latest_per_key() {
        let mut sink = RecordingSink::new();
        sink.set_status(StatusField::new("GPS", "GPS: 1 (4)", StatusColor::Red, 0));
        sink.set_status(StatusField::new("GPS", "GPS: OK3 (9)", StatusColor::Green, 0));

        assert_eq!(sink.text("GPS"), Some("GPS: OK3 (9)"));
        assert_eq!(sink.color("GPS"), Some(StatusColor::Green));
        assert_eq!(sink.emissions("GPS"), 2);
        assert_eq!(sink.text("Mode"), None);
    }

    #[test]
    fn test_color_display() {
        assert_eq!(StatusColor::DarkGreen.to_string(), "dark green");
        assert_eq!(StatusColor::default(), StatusColor::Black);
    }
}
