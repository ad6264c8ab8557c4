//! Datagram socket seam
//!
//! The transmitter never touches `std::net` directly; it asks a
//! [`SocketBinder`] for a socket. [`UdpBinder`] is the real one.

use crate::error::{TransportError, TransportResult};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, UdpSocket};

/// Something that can send a datagram
pub trait DatagramSocket {
    fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl DatagramSocket for UdpSocket {
    fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, target)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }
}

/// Creates bound sockets
pub trait SocketBinder {
    fn bind(&mut self, addr: SocketAddr) -> TransportResult<Box<dyn DatagramSocket>>;
}

/// Binds non-blocking UDP sockets with address reuse enabled
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpBinder;

impl SocketBinder for UdpBinder {
    fn bind(&mut self, addr: SocketAddr) -> TransportResult<Box<dyn DatagramSocket>> {
        let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;

        // Several cues may hold a socket on the configured port
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;

        socket
            .bind(&addr.into())
            .map_err(|source| TransportError::Bind { addr, source })?;

        Ok(Box::new(UdpSocket::from(socket)))
    }
}
