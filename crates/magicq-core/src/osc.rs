//! MagicQ remote playback control over OSC
//!
//! Every command is an OSC message with no arguments; the whole command lives
//! in the address:
//!
//! ```text
//! ┌─────────────────────────────┬─────────────────────┐
//! │ Address + NUL + padding     │ Type tags ",\0\0\0" │
//! └─────────────────────────────┴─────────────────────┘
//! ```
//!
//! Two padding rules are supported. [`PaddingMode::Legacy`] grows the
//! NUL-terminated length `n` by `n % 4`, so already aligned addresses get no
//! extra NUL and some lengths stay misaligned. [`PaddingMode::Strict`] pads to
//! the next multiple of four as OSC 1.0 requires.

use crate::model::CueSettings;
use crate::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};
use rosc::{OscMessage, OscPacket};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Size of the address field, terminator included
pub const MAX_ADDRESS_SIZE: usize = 32;

/// Upper bound on an encoded command
pub const MAX_DATAGRAM_SIZE: usize = 64;

/// Type tag block announcing zero arguments
pub const EMPTY_TYPE_TAGS: [u8; 4] = [b',', 0, 0, 0];

/// A remote playback control command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Activate,
    Release,
    Go,
    Stop,
    SetLevel,
    JumpToCueId,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Activate,
        Operation::Release,
        Operation::Go,
        Operation::Stop,
        Operation::SetLevel,
        Operation::JumpToCueId,
    ];

    /// Command letter terminating the address
    pub fn code(&self) -> char {
        match self {
            Operation::Activate => 'A',
            Operation::Release => 'R',
            Operation::Go => 'G',
            Operation::Stop => 'S',
            Operation::SetLevel => 'L',
            Operation::JumpToCueId => 'J',
        }
    }

    /// Build the address for this operation from one slot of cue settings
    pub fn address(&self, settings: &CueSettings) -> String {
        let playback = settings.playback;
        match self {
            Operation::SetLevel => format!("/rpc/{},{}{}", playback, settings.level, self.code()),
            Operation::JumpToCueId => {
                format!("/rpc/{},{}{}", playback, settings.jump_cue_id, self.code())
            }
            _ => format!("/rpc/{}{}", playback, self.code()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Activate => "activate",
            Operation::Release => "release",
            Operation::Go => "go",
            Operation::Stop => "stop",
            Operation::SetLevel => "level",
            Operation::JumpToCueId => "jump",
        };
        f.write_str(name)
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "activate" | "a" => Ok(Operation::Activate),
            "release" | "r" => Ok(Operation::Release),
            "go" | "g" => Ok(Operation::Go),
            "stop" | "s" => Ok(Operation::Stop),
            "level" | "set_level" | "set-level" | "l" => Ok(Operation::SetLevel),
            "jump" | "jump_to_cue_id" | "j" => Ok(Operation::JumpToCueId),
            _ => Err(Error::InvalidValue {
                field: "operation",
                value: s.to_string(),
            }),
        }
    }
}

/// Address padding rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddingMode {
    /// `n += n % 4` on the NUL-terminated length
    #[default]
    Legacy,
    /// OSC 1.0 padding
    Strict,
}

/// Encode `operation` using the given settings slot
pub fn encode(operation: Operation, settings: &CueSettings, padding: PaddingMode) -> Result<Bytes> {
    encode_address(&operation.address(settings), padding)
}

/// Encode an argument-less OSC message for `address`
pub fn encode_address(address: &str, padding: PaddingMode) -> Result<Bytes> {
    let terminated = address.len() + 1;
    if terminated > MAX_ADDRESS_SIZE {
        return Err(Error::AddressTooLong {
            len: terminated,
            max: MAX_ADDRESS_SIZE,
        });
    }

    match padding {
        PaddingMode::Legacy => Ok(encode_legacy(address)),
        PaddingMode::Strict => encode_strict(address),
    }
}

/// Datagram length produced for an address under `padding`
pub fn encoded_len(address: &str, padding: PaddingMode) -> usize {
    let terminated = address.len() + 1;
    let padded = match padding {
        PaddingMode::Legacy => terminated + terminated % 4,
        PaddingMode::Strict => (terminated + 3) & !3,
    };
    padded + EMPTY_TYPE_TAGS.len()
}

fn encode_legacy(address: &str) -> Bytes {
    let total = encoded_len(address, PaddingMode::Legacy);
    let mut buf = BytesMut::with_capacity(total);

    buf.put_slice(address.as_bytes());
    buf.put_bytes(0, total - EMPTY_TYPE_TAGS.len() - address.len());
    buf.put_slice(&EMPTY_TYPE_TAGS);

    buf.freeze()
}

fn encode_strict(address: &str) -> Result<Bytes> {
    let packet = OscPacket::Message(OscMessage {
        addr: address.to_string(),
        args: vec![],
    });

    rosc::encoder::encode(&packet)
        .map(Bytes::from)
        .map_err(|e| Error::Encode(format!("{:?}", e)))
}
