//! Replay command - run a telemetry capture through the status engine.
//!
//! A capture is a JSON Lines file with one decoded message per line (see
//! `mavconsole::message`). Blank lines and lines starting with `#` are
//! ignored; lines that do not decode are logged and skipped.
//!
//! ```text
//! reader task ──(bounded channel)──► engine loop ──► TerminalSink
//! ```
//!
//! The engine stays on the consuming side so all dispatch happens on one
//! task, in capture order.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use console::style;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use mavconsole::flight_timer::VehicleClass;
use mavconsole::mission::Mission;
use mavconsole::{ConsoleEngine, ConsoleSettings, MessagePayload, TelemetryMessage};

use crate::context::ReplayContext;
use crate::error::CliError;
use crate::terminal::{OfflineCommands, TerminalSink};

/// Messages buffered between the reader and the engine.
const CHANNEL_CAPACITY: usize = 256;

/// Vehicle class selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ClassArg {
    /// Flying while armed (multirotors, helicopters)
    Copter,
    /// Flying while moving faster than 3 m/s
    Other,
}

impl From<ClassArg> for VehicleClass {
    fn from(class: ClassArg) -> Self {
        match class {
            ClassArg::Copter => VehicleClass::Copter,
            ClassArg::Other => VehicleClass::Other,
        }
    }
}

/// Arguments for the replay command.
#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Capture file (JSON Lines)
    pub capture: PathBuf,

    /// System id of the vehicle to display (default: first vehicle seen)
    #[arg(long)]
    pub primary: Option<u8>,

    /// Flying predicate (default: from the vehicle type)
    #[arg(long, value_enum)]
    pub class: Option<ClassArg>,

    /// Mission file (JSON) used for WP counts and time remaining
    #[arg(long)]
    pub mission: Option<PathBuf>,

    /// Settings file (default: the user settings file, if present)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Assume flat terrain at this elevation (metres AMSL)
    #[arg(long)]
    pub ground_elevation: Option<f64>,

    /// Extra display item as ID:FORMAT:EXPRESSION (repeatable)
    #[arg(long = "display", value_name = "ITEM")]
    pub display: Vec<String>,

    /// Print every status change while replaying
    #[arg(long)]
    pub changes: bool,
}

/// Counters from reading a capture.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureStats {
    pub lines: usize,
    pub messages: usize,
    pub skipped: usize,
}

/// Result of a replay.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub sink: TerminalSink,
    pub engine: ConsoleEngine,
    pub stats: CaptureStats,
    pub commands: usize,
}

/// Run the replay command.
pub async fn run(args: ReplayArgs) -> Result<(), CliError> {
    let capture = args.capture.clone();
    let outcome = replay(args).await?;

    println!();
    println!("{}", style("Status").bold().underlined());
    println!("{}", outcome.sink.render());
    println!();
    println!(
        "{} messages from {} ({} skipped), {} announcements, {} commands",
        outcome.stats.messages,
        capture.display(),
        outcome.stats.skipped,
        outcome.sink.announcements(),
        outcome.commands
    );

    let items: Vec<_> = outcome.engine.display_items().collect();
    if !items.is_empty() {
        println!();
        println!("{}", style("Display items").bold());
        for item in items {
            println!("  {}", item);
        }
    }

    Ok(())
}

/// Replay a capture and return the final console state.
pub async fn replay(args: ReplayArgs) -> Result<ReplayOutcome, CliError> {
    let settings = load_settings(args.settings.as_deref())?;
    let mission = args.mission.as_deref().map(load_mission).transpose()?;

    let mut context = ReplayContext::new()
        .with_primary_system(args.primary)
        .with_class(args.class.map(VehicleClass::from))
        .with_mission(mission)
        .with_ground_elevation(args.ground_elevation);
    let mut engine = ConsoleEngine::with_settings(settings);
    let mut sink = TerminalSink::new(args.changes);
    let mut commands = OfflineCommands::new();

    engine.emit_initial_status(&mut sink);
    for item in &args.display {
        let (id, format, expression) = parse_display_arg(item)?;
        engine.add_display_item(id, format, expression, None, &mut sink)?;
    }

    let file = tokio::fs::File::open(&args.capture)
        .await
        .map_err(|source| CliError::Read {
            path: args.capture.clone(),
            source,
        })?;

    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
    let reader = tokio::spawn(read_capture(BufReader::new(file), tx));

    while let Some(msg) = rx.recv().await {
        match &msg.message {
            MessagePayload::Heartbeat(hb) => {
                context.observe_heartbeat(msg.source, hb.mav_type);
            }
            MessagePayload::HighLatency2(hl) => {
                context.observe_heartbeat(msg.source, hl.mav_type);
            }
            _ => {}
        }
        engine.dispatch(&msg, &context, &mut sink, &mut commands);
    }

    let stats = reader
        .await
        .map_err(|e| CliError::Replay(e.to_string()))?
        .map_err(|source| CliError::Read {
            path: args.capture.clone(),
            source,
        })?;
    if stats.messages == 0 {
        return Err(CliError::EmptyCapture(args.capture));
    }
    if context.primary().is_none() {
        tracing::warn!(
            requested = ?args.primary,
            "No vehicle heartbeat selected a primary vehicle"
        );
    }

    tracing::info!(
        lines = stats.lines,
        messages = stats.messages,
        skipped = stats.skipped,
        "Replay finished"
    );

    Ok(ReplayOutcome {
        sink,
        engine,
        stats,
        commands: commands.sent(),
    })
}

/// Decode capture lines and forward them until the input ends or the
/// receiver goes away.
pub async fn read_capture<R>(
    reader: R,
    tx: mpsc::Sender<TelemetryMessage>,
) -> std::io::Result<CaptureStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = CaptureStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        stats.lines += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match serde_json::from_str::<TelemetryMessage>(line) {
            Ok(msg) => {
                stats.messages += 1;
                if tx.send(msg).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                stats.skipped += 1;
                tracing::warn!(line = stats.lines, error = %e, "Skipping capture line");
            }
        }
    }

    Ok(stats)
}

/// Settings from `path`, or from the user settings file when it exists.
fn load_settings(path: Option<&Path>) -> Result<ConsoleSettings, CliError> {
    match path {
        Some(path) => Ok(ConsoleSettings::load(path)?),
        None => Ok(ConsoleSettings::load_default()?),
    }
}

fn load_mission(path: &Path) -> Result<Mission, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Mission {
        path: path.to_path_buf(),
        source,
    })
}

/// Split `ID:FORMAT:EXPRESSION`.
fn parse_display_arg(arg: &str) -> Result<(&str, &str, &str), CliError> {
    let mut parts = arg.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(id), Some(format), Some(expression)) if !id.trim().is_empty() => {
            Ok((id.trim(), format, expression))
        }
        _ => Err(CliError::Config(format!(
            "Display item '{}' must be ID:FORMAT:EXPRESSION",
            arg
        ))),
    }
}
