//! MagicQ Core
//!
//! Command model and wire encoding for cues that drive a ChamSys MagicQ
//! console through its OSC remote playback control interface.
//!
//! This crate provides:
//! - Defined/live versioned values ([`Versioned`])
//! - The cue command model and its validity rule ([`CueConfig`])
//! - The flat persisted record ([`CueRecord`])
//! - OSC datagram encoding ([`osc::encode`], [`Operation`])

pub mod error;
pub mod model;
pub mod osc;
pub mod property;

pub use error::{ConfigError, Error, Result};
pub use model::{
    validate_level, validate_playback, Action, CueConfig, CueRecord, CueSettings, Field,
    FieldValue, CLASS_NAME, MAX_LEVEL, MAX_PLAYBACK,
};
pub use osc::{encode, Operation, PaddingMode, MAX_ADDRESS_SIZE, MAX_DATAGRAM_SIZE};
pub use property::{PropertyVersion, Versioned};

/// Default OSC port of the console
pub const DEFAULT_OSC_PORT: u16 = 8000;
