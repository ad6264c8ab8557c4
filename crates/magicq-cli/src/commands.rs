//! Subcommand implementations

use crate::FireArgs;
use anyhow::{bail, Result};
use colored::Colorize;
use magicq_core::{osc, CueSettings, Operation, PaddingMode, PropertyVersion};
use magicq_cue::lifecycle::NANOS_PER_MILLI;
use magicq_cue::{
    ClockTime, CueListener, CueState, Field, FieldValue, MagicQCue, OscSettings, Persistable,
    Playable, Pulsable, SendReport, TimedLifecycle, UdpBinder,
};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Logs cue events at debug level
struct StateLog;

impl CueListener for StateLog {
    fn field_changed(&mut self, field: Field, value: &FieldValue) {
        debug!("{} = {}", field, value);
    }

    fn state_changed(&mut self, state: CueState) {
        debug!("Cue state {:?}", state);
    }
}

pub fn encode(
    operation: Operation,
    playback: i16,
    level: i16,
    cue: &str,
    padding: PaddingMode,
) -> Result<()> {
    let settings = CueSettings {
        playback,
        level,
        jump_cue_id: cue.to_string(),
        ..Default::default()
    };

    let address = operation.address(&settings);
    let datagram = osc::encode(operation, &settings, padding)?;

    println!("{} {}", "Address".cyan().bold(), address.yellow());
    println!(
        "{} {} bytes, {:?} padding",
        "Datagram".cyan().bold(),
        datagram.len(),
        padding
    );
    print!("{}", hex_dump(&datagram));
    Ok(())
}

pub fn check(json: &str, settings: OscSettings) -> Result<()> {
    let mut cue = MagicQCue::with_settings(settings);
    cue.from_json(json)?;

    let message = cue.error_message();
    if !message.is_empty() {
        bail!("Cue cannot play: {}", message);
    }

    println!(
        "{} sends {}",
        "ok".green().bold(),
        describe(&cue.config().defined()).yellow()
    );
    Ok(())
}

/// Change one field of a saved cue and return the updated JSON
pub fn set(json: &str, field: &str, value: &str, settings: OscSettings) -> Result<String> {
    let mut cue = MagicQCue::with_settings(settings);
    cue.from_json(json)?;

    let changed = cue.set_field_text(field, value)?;
    let key: Field = field.parse()?;
    let stored = cue.config().get(key, PropertyVersion::Defined);
    if changed {
        println!("{} {} = {}", "set".green().bold(), key, stored);
    } else {
        println!("{} {} is already {}", "unchanged".yellow(), key, stored);
    }

    let message = cue.error_message();
    if !message.is_empty() {
        println!("{} {}", "warning".yellow().bold(), message);
    }

    Ok(cue.to_json()?)
}

pub async fn fire(
    args: &FireArgs,
    settings: OscSettings,
    pulse: Duration,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    let cue = cue_from_args(args, settings)?;
    play_to_end(cue, pulse, shutdown_rx).await
}

pub async fn run(
    json: &str,
    pre_wait_ms: u64,
    settings: OscSettings,
    pulse: Duration,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    let mut cue = MagicQCue::with_parts(settings, timed(pre_wait_ms), UdpBinder);
    cue.from_json(json)?;
    play_to_end(cue, pulse, shutdown_rx).await
}

fn timed(pre_wait_ms: u64) -> TimedLifecycle {
    TimedLifecycle::default().with_pre_time(pre_wait_ms.saturating_mul(NANOS_PER_MILLI))
}

/// Build a cue from `fire` flags
pub fn cue_from_args(args: &FireArgs, settings: OscSettings) -> Result<MagicQCue> {
    let mut cue = MagicQCue::with_parts(settings, timed(args.pre_wait_ms), UdpBinder);
    cue.set_name("command line");

    cue.set(Field::Playback, FieldValue::Int(args.playback))?;
    if let Some(level) = args.level {
        cue.set(Field::Level, FieldValue::Int(level))?;
        cue.set(Field::ActionLevel, FieldValue::Bool(true))?;
    }
    if let Some(id) = &args.jump {
        cue.set(Field::JumpCueId, FieldValue::Text(id.clone()))?;
        cue.set(Field::ActionJump, FieldValue::Bool(true))?;
    }

    let switches = [
        (Field::ActionActivate, args.activate),
        (Field::ActionGo, args.go),
        (Field::ActionStop, args.stop),
        (Field::ActionRelease, args.release),
    ];
    for (field, on) in switches {
        if on {
            cue.set(field, FieldValue::Bool(true))?;
        }
    }

    Ok(cue)
}

/// Play the cue and pulse it until it stops or Ctrl+C arrives
async fn play_to_end(
    mut cue: MagicQCue,
    pulse: Duration,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    cue.add_listener(Box::new(StateLog));

    println!(
        "{} Firing {} at {}",
        "MagicQ".cyan().bold(),
        describe(&cue.config().defined()).yellow(),
        cue.transmitter().settings().destination
    );

    cue.play()?;

    let start = Instant::now();
    let mut ticker = tokio::time::interval(pulse);
    while cue.state().is_playing() {
        tokio::select! {
            _ = ticker.tick() => cue.pulse(clock_since(start)),
            Some(()) = shutdown_rx.recv() => {
                info!("Stopping cue");
                cue.stop();
            }
        }
    }

    let reports = cue.last_fire();
    if reports.is_empty() {
        println!("{}", "Stopped before firing".yellow());
        return Ok(());
    }

    print_reports(reports);

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        bail!("{} of {} commands failed", failed, reports.len());
    }
    Ok(())
}

fn clock_since(start: Instant) -> ClockTime {
    ClockTime::try_from(start.elapsed().as_nanos()).unwrap_or(ClockTime::MAX)
}

fn print_reports(reports: &[SendReport]) {
    for report in reports {
        match &report.result {
            Ok(sent) => println!(
                "  {} {} ({} bytes)",
                "sent".green(),
                report.address.yellow(),
                sent
            ),
            Err(e) => println!("  {} {}: {}", "failed".red(), report.address.yellow(), e),
        }
    }
}

/// Addresses a cue would send, in fire order
fn describe(settings: &CueSettings) -> String {
    let addresses: Vec<String> = settings
        .enabled_actions()
        .map(|action| action.operation().address(settings))
        .collect();

    if addresses.is_empty() {
        "nothing".to_string()
    } else {
        addresses.join(" ")
    }
}

/// Offset, hex and printable bytes, eight per line
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, chunk) in bytes.chunks(8).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        let text: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
            .collect();
        out.push_str(&format!("{:04x}  {:<23}  {}\n", i * 8, hex.join(" "), text));
    }
    out
}
