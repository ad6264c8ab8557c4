//! Error types for the MagicQ command model

use thiserror::Error;

/// Result type alias for command model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Invalid combination of cue fields.
///
/// The `Display` text is what the host shows next to a cue in the error state.
/// Variants are listed in the order they are checked.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No playback chosen")]
    NoPlayback,

    #[error("No actions selected")]
    NoActions,

    #[error("No cue chosen to jump to")]
    NoJumpCue,
}

/// Command model error types
#[derive(Error, Debug)]
pub enum Error {
    /// Cue fields do not describe a sendable command
    #[error("invalid cue: {0}")]
    Config(#[from] ConfigError),

    /// Address plus terminator does not fit the fixed address field
    #[error("address too long: {len} bytes (max {max})")]
    AddressTooLong { len: usize, max: usize },

    /// OSC encoder failure
    #[error("encode error: {0}")]
    Encode(String),

    /// No field with this name
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Value variant does not match the field's type
    #[error("field {field} expects {expected}")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },

    /// Text could not be parsed for the field
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    /// Persisted record could not be read or written
    #[error("persistence error: {0}")]
    Persist(#[from] serde_json::Error),
}
