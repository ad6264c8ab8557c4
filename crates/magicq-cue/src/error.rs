//! Cue error types

use crate::lifecycle::CueState;
use magicq_core::ConfigError;
use std::net::SocketAddr;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CueError>;

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Socket failures. None of these stop the cue; the socket is recreated on the
/// next send.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("failed to send to {addr}: {source}")]
    Send {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("short send: {sent} of {expected} bytes")]
    ShortSend { sent: usize, expected: usize },

    #[error("encode error: {0}")]
    Encode(#[from] magicq_core::Error),
}

#[derive(Error, Debug)]
pub enum CueError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] magicq_core::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("cue cannot play from state {0:?}")]
    NotPlayable(CueState),
}
