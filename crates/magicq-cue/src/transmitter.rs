//! OSC transmitter
//!
//! Owns at most one socket. The socket is created on the first send, reused
//! while sends succeed, and dropped on any failure so the next send starts
//! from a fresh one.

use crate::config::OscSettings;
use crate::error::{TransportError, TransportResult};
use crate::socket::{DatagramSocket, SocketBinder, UdpBinder};
use magicq_core::{osc, CueSettings, Operation};
use std::net::SocketAddr;
use tracing::{debug, error, info};

/// Lazily bound OSC sender
pub struct OscTransmitter<B: SocketBinder = UdpBinder> {
    settings: OscSettings,
    binder: B,
    socket: Option<Box<dyn DatagramSocket>>,
}

impl OscTransmitter<UdpBinder> {
    pub fn new(settings: OscSettings) -> Self {
        Self::with_binder(settings, UdpBinder)
    }
}

impl<B: SocketBinder> OscTransmitter<B> {
    pub fn with_binder(settings: OscSettings, binder: B) -> Self {
        Self {
            settings,
            binder,
            socket: None,
        }
    }

    pub fn settings(&self) -> &OscSettings {
        &self.settings
    }

    /// Replace the settings. An open socket is closed so the next send binds
    /// with the new values.
    pub fn set_settings(&mut self, settings: OscSettings) {
        if settings != self.settings {
            self.close();
            self.settings = settings;
        }
    }

    pub fn binder(&self) -> &B {
        &self.binder
    }

    pub fn is_bound(&self) -> bool {
        self.socket.is_some()
    }

    /// Local address of the open socket
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn ensure_socket(&mut self) -> TransportResult<&dyn DatagramSocket> {
        let socket = match self.socket.take() {
            Some(socket) => socket,
            None => {
                let addr = self.settings.bind_addr();
                info!("Establishing OSC socket on {}", addr);
                self.binder.bind(addr).map_err(|e| {
                    error!("Failed to establish OSC socket: {}", e);
                    e
                })?
            }
        };

        Ok(&**self.socket.insert(socket))
    }

    /// Send `operation` built from the live settings
    pub fn send(&mut self, operation: Operation, live: &CueSettings) -> TransportResult<usize> {
        let destination = self.settings.destination;
        let padding = self.settings.padding;

        let socket = self.ensure_socket()?;
        let datagram = osc::encode(operation, live, padding)?;

        let result = socket.send_to(&datagram, destination);
        match result {
            Ok(sent) if sent == datagram.len() => {
                debug!(
                    "Sent {} ({} bytes) to {}",
                    operation.address(live),
                    sent,
                    destination
                );
                Ok(sent)
            }
            Ok(sent) => {
                error!("Short OSC send: {} of {} bytes", sent, datagram.len());
                self.close();
                Err(TransportError::ShortSend {
                    sent,
                    expected: datagram.len(),
                })
            }
            Err(source) => {
                error!("Failed to send OSC datagram to {}: {}", destination, source);
                self.close();
                Err(TransportError::Send {
                    addr: destination,
                    source,
                })
            }
        }
    }

    /// Drop the socket, if any
    pub fn close(&mut self) {
        if self.socket.take().is_some() {
            debug!("Closed OSC socket");
        }
    }
}

impl<B: SocketBinder> Drop for OscTransmitter<B> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unbound() {
        let transmitter = OscTransmitter::new(OscSettings::with_port(0));
        assert!(!transmitter.is_bound());
        assert_eq!(transmitter.local_addr(), None);
    }

    #[test]
    fn test_encode_error_keeps_socket() {
        let receiver = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let settings =
            OscSettings::with_port(0).with_destination(receiver.local_addr().unwrap());
        let mut transmitter = OscTransmitter::new(settings);

        let live = CueSettings {
            playback: 1,
            jump_cue_id: "y".repeat(40),
            ..Default::default()
        };

        let result = transmitter.send(Operation::JumpToCueId, &live);
        assert!(matches!(result, Err(TransportError::Encode(_))));
        assert!(transmitter.is_bound());
    }
}
