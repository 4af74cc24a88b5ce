//! Latest-message snapshot for the primary vehicle.
//!
//! Handlers that combine several message types (heading fallback, position
//! for ETR, terrain report for AGL) read the most recent message of each
//! type from here. Custom display expressions read it through
//! [`FieldSource`].

use std::collections::HashMap;

use crate::error::ExpressionError;
use crate::message::{GlobalPositionInt, MessageKind, MessagePayload, TerrainReport, VfrHud};

/// Numeric field lookup by message name and field name.
pub trait FieldSource {
    fn field(&self, message: &str, field: &str) -> Result<f64, ExpressionError>;
}

/// Most recent message of every type.
#[derive(Debug, Default)]
pub struct MessageStore {
    latest: HashMap<MessageKind, MessagePayload>,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `payload` as the latest of its type.
    pub fn record(&mut self, payload: &MessagePayload) {
        self.latest.insert(payload.kind(), payload.clone());
    }

    /// Latest message of `kind`.
    pub fn get(&self, kind: MessageKind) -> Option<&MessagePayload> {
        self.latest.get(&kind)
    }

    /// Number of message types seen.
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    pub fn vfr_hud(&self) -> Option<&VfrHud> {
        match self.get(MessageKind::VfrHud)? {
            MessagePayload::VfrHud(m) => Some(m),
            _ => None,
        }
    }

    pub fn global_position(&self) -> Option<&GlobalPositionInt> {
        match self.get(MessageKind::GlobalPositionInt)? {
            MessagePayload::GlobalPositionInt(m) => Some(m),
            _ => None,
        }
    }

    pub fn terrain_report(&self) -> Option<&TerrainReport> {
        match self.get(MessageKind::TerrainReport)? {
            MessagePayload::TerrainReport(m) => Some(m),
            _ => None,
        }
    }

    /// Current position in degrees from GLOBAL_POSITION_INT, `(0, 0)` when
    /// unknown.
    pub fn position_deg(&self) -> (f64, f64) {
        self.global_position()
            .map(|p| (f64::from(p.lat) * 1.0e-7, f64::from(p.lon) * 1.0e-7))
            .unwrap_or((0.0, 0.0))
    }

    /// Altitude above home in metres, 0 when unknown.
    pub fn relative_alt_m(&self) -> f64 {
        self.global_position()
            .map(|p| f64::from(p.relative_alt) * 1.0e-3)
            .unwrap_or(0.0)
    }
}

impl FieldSource for MessageStore {
    fn field(&self, message: &str, field: &str) -> Result<f64, ExpressionError> {
        let payload = MessageKind::from_name(message)
            .and_then(|kind| self.get(kind))
            .ok_or_else(|| ExpressionError::MissingMessage(message.to_string()))?;

        let missing = || ExpressionError::MissingField {
            message: message.to_string(),
            field: field.to_string(),
        };

        // `type` is the MAVLink name of the vehicle type field; the
        // serialized form uses that key for the message tag instead.
        let key = if field == "type" { "mav_type" } else { field };
        let value = serde_json::to_value(payload).map_err(|_| missing())?;
        let raw = value.get(key).ok_or_else(missing)?;
        raw.as_f64().ok_or_else(|| ExpressionError::NonNumeric {
            message: message.to_string(),
            field: field.to_string(),
        })
    }
}

impl FieldSource for HashMap<(String, String), f64> {
    fn field(&self, message: &str, field: &str) -> Result<f64, ExpressionError> {
        self.get(&(message.to_string(), field.to_string()))
            .copied()
            .ok_or_else(|| ExpressionError::MissingField {
                message: message.to_string(),
                field: field.to_string(),
            })
    }
}
