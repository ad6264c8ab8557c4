//! MagicQ Cue
//!
//! A show-control cue that fires ChamSys MagicQ remote playback commands over
//! OSC/UDP at the moment its pre-wait ends.
//!
//! This crate provides:
//! - Transmitter settings from the environment ([`OscSettings`])
//! - A lazily bound, self-healing OSC sender ([`OscTransmitter`])
//! - The host lifecycle contract and a timed implementation ([`CueLifecycle`])
//! - The cue itself ([`MagicQCue`])
//!
//! # Example
//!
//! ```ignore
//! let mut cue = MagicQCue::new();
//! cue.set(Field::Playback, FieldValue::Int(3))?;
//! cue.set(Field::ActionGo, FieldValue::Bool(true))?;
//!
//! cue.play()?;
//! cue.pulse(clock); // sends /rpc/3G
//! ```

pub mod config;
pub mod cue;
pub mod error;
pub mod lifecycle;
pub mod socket;
pub mod transmitter;

pub use config::{OscSettings, HOST_ENV, PORT_ENV};
pub use cue::{CueListener, MagicQCue, Persistable, Playable, Pulsable, SendReport, DEFAULT_NAME};
pub use error::{CueError, Result, TransportError};
pub use lifecycle::{is_fire_instant, ClockTime, CueLifecycle, CueState, TimedLifecycle};
pub use socket::{DatagramSocket, SocketBinder, UdpBinder};
pub use transmitter::OscTransmitter;

pub use magicq_core::{
    Action, ConfigError, CueConfig, CueRecord, CueSettings, Field, FieldValue, Operation,
    PaddingMode,
};
