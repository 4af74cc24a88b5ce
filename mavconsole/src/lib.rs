//! MAVConsole - telemetry status engine for ground control consoles
//!
//! This library turns a stream of decoded vehicle telemetry messages into
//! keyed, colored status fields, spoken/text announcements, a vehicle
//! selection menu and the occasional outbound command.
//!
//! # Architecture
//!
//! ```text
//! TelemetryMessage ──► ConsoleEngine::dispatch
//!                        ├─ VehicleRegistry      (who exists)
//!                        ├─ CriticalErrorMonitor (SYS_STATUS, all sources)
//!                        ├─ MessageStore         (latest per type, primary only)
//!                        ├─ StatusDeriver        (per-type field handlers)
//!                        ├─ DisplayItem          (user expressions)
//!                        └─ CapabilityProbe      (FLIGHT_INFORMATION)
//!                              │
//!                              ▼
//!                  StatusSink / CommandSink (host)
//! ```
//!
//! The engine never reads a wall clock: every time-based decision uses the
//! timestamp carried by the message being processed. Host facts the engine
//! cannot derive from telemetry (primary vehicle, mode names, mission,
//! terrain, link counters) are supplied through [`VehicleContext`].

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod expression;
pub mod flight_timer;
pub mod link;
pub mod message;
pub mod mission;
pub mod probe;
pub mod protocol;
pub mod registry;
pub mod sink;
pub mod status;
pub mod store;
pub mod units;

pub use config::ConsoleSettings;
pub use context::{SimpleContext, TerrainModel, VehicleContext};
pub use engine::ConsoleEngine;
pub use error::{ConfigError, ExpressionError};
pub use expression::DisplayItem;
pub use message::{MessageKind, MessagePayload, TelemetryMessage, VehicleIdentity};
pub use sink::{CommandLong, CommandSink, RecordingSink, StatusColor, StatusField, StatusSink};
