//! Terminal rendering of engine output.

use std::collections::HashMap;

use console::{style, Style};
use mavconsole::registry::VehicleMenuEntry;
use mavconsole::{CommandLong, CommandSink, StatusColor, StatusField, StatusSink};

/// Terminal style for a status color.
pub fn color_style(color: StatusColor) -> Style {
    match color {
        StatusColor::Black => Style::new(),
        StatusColor::Grey => Style::new().dim(),
        StatusColor::Green => Style::new().green(),
        StatusColor::DarkGreen => Style::new().green().dim(),
        StatusColor::Red => Style::new().red().bold(),
        StatusColor::Orange => Style::new().color256(208),
        StatusColor::Yellow => Style::new().yellow(),
        StatusColor::Blue => Style::new().blue(),
    }
}

/// Status board printed to the terminal.
///
/// Fields are kept in first-seen order within their row, the way a console
/// window lays them out.
#[derive(Debug, Default)]
pub struct TerminalSink {
    fields: Vec<StatusField>,
    index: HashMap<String, usize>,
    /// Print every field change as it happens.
    show_changes: bool,
    announcements: usize,
}

impl TerminalSink {
    pub fn new(show_changes: bool) -> Self {
        Self {
            show_changes,
            ..Default::default()
        }
    }

    pub fn announcements(&self) -> usize {
        self.announcements
    }

    /// Non-empty fields grouped by row, rows ascending.
    pub fn rows(&self) -> Vec<(u8, Vec<&StatusField>)> {
        let mut rows: Vec<(u8, Vec<&StatusField>)> = Vec::new();
        for field in self.fields.iter().filter(|f| !f.text.is_empty()) {
            match rows.iter_mut().find(|(row, _)| *row == field.row) {
                Some((_, fields)) => fields.push(field),
                None => rows.push((field.row, vec![field])),
            }
        }
        rows.sort_by_key(|(row, _)| *row);
        rows
    }

    /// Render the board with terminal styling.
    pub fn render(&self) -> String {
        self.rows()
            .into_iter()
            .map(|(_, fields)| {
                fields
                    .iter()
                    .map(|f| color_style(f.color).apply_to(&f.text).to_string())
                    .collect::<Vec<_>>()
                    .join("  ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl StatusSink for TerminalSink {
    fn set_status(&mut self, field: StatusField) {
        match self.index.get(&field.key).copied() {
            Some(i) => {
                let existing = &mut self.fields[i];
                let changed = existing.text != field.text || existing.color != field.color;
                if self.show_changes && changed {
                    println!(
                        "  {:<10} {}",
                        style(&field.key).dim(),
                        color_style(field.color).apply_to(&field.text)
                    );
                }
                *existing = field;
            }
            None => {
                self.index.insert(field.key.clone(), self.fields.len());
                self.fields.push(field);
            }
        }
    }

    fn announce(&mut self, text: &str) {
        self.announcements += 1;
        println!("{} {}", style(">>").yellow().bold(), style(text).bold());
    }

    fn vehicles_changed(&mut self, entries: &[VehicleMenuEntry]) {
        if entries.is_empty() {
            return;
        }
        let labels: Vec<_> = entries.iter().map(|e| e.label.as_str()).collect();
        println!("{} {}", style("Vehicles:").cyan(), labels.join(", "));
    }
}

/// Outbound commands during replay. There is no link to send them on, so
/// they are only counted and logged.
#[derive(Debug, Default)]
pub struct OfflineCommands {
    sent: usize,
}

impl OfflineCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl CommandSink for OfflineCommands {
    fn send_command(&mut self, command: CommandLong) {
        self.sent += 1;
        tracing::debug!(
            command = command.command,
            target_system = command.target_system,
            target_component = command.target_component,
            "Command not sent (offline replay)"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(key: &str, text: &str, row: u8) -> StatusField {
        StatusField::new(key, text, StatusColor::Black, row)
    }

    #[test]
    fn test_rows_keep_first_seen_order() {
        let mut sink = TerminalSink::new(false);
        sink.set_status(field("GPS", "GPS: --", 0));
        sink.set_status(field("Alt", "Alt ---", 2));
        sink.set_status(field("Mode", "UNKNOWN", 0));
        sink.set_status(field("GPS", "GPS: OK3 (9)", 0));

        let rows = sink.rows();
        assert_eq!(rows.len(), 2);
        let row0: Vec<_> = rows[0].1.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(row0, vec!["GPS: OK3 (9)", "UNKNOWN"]);
        assert_eq!(rows[1].0, 2);
    }

    #[test]
    fn test_empty_fields_hidden() {
        let mut sink = TerminalSink::new(false);
        sink.set_status(field("Batt", "", 4));
        assert!(sink.rows().is_empty());

        sink.set_status(field("Batt", "12.1V", 4));
        assert_eq!(sink.rows()[0].1[0].text, "12.1V");
    }

    #[test]
    fn test_counts() {
        let mut sink = TerminalSink::new(false);
        let mut commands = OfflineCommands::new();
        sink.announce("RC fail");
        commands.send_command(CommandLong {
            target_system: 1,
            target_component: 1,
            command: 511,
            confirmation: 0,
            params: [0.0; 7],
        });
        assert_eq!(sink.announcements(), 1);
        assert_eq!(commands.sent(), 1);
    }
}
