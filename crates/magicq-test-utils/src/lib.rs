//! Common test helpers for the MagicQ crates
//!
//! - A loopback receiver that collects datagrams with a deadline
//! - Test log output through `tracing-subscriber`

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

/// Default wait for datagrams
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Logging
// ============================================================================

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Datagram Capture
// ============================================================================

/// Loopback receiver standing in for the console
pub struct UdpCapture {
    socket: UdpSocket,
}

impl UdpCapture {
    /// Bind on an ephemeral loopback port
    pub fn bind() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("Failed to bind capture socket");
        Self { socket }
    }

    pub fn addr(&self) -> SocketAddr {
        self.socket.local_addr().unwrap()
    }

    /// Wait for one datagram
    pub fn recv(&self, max_wait: Duration) -> Option<Vec<u8>> {
        // A zero timeout is rejected by the OS
        let max_wait = max_wait.max(Duration::from_millis(1));
        self.socket.set_read_timeout(Some(max_wait)).unwrap();

        let mut buf = [0u8; 1024];
        match self.socket.recv_from(&mut buf) {
            Ok((len, _)) => Some(buf[..len].to_vec()),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => None,
            Err(e) => panic!("Capture receive failed: {}", e),
        }
    }

    /// Collect up to `count` datagrams, stopping at the deadline
    pub fn collect(&self, count: usize, max_wait: Duration) -> Vec<Vec<u8>> {
        let deadline = Instant::now() + max_wait;
        let mut datagrams = Vec::with_capacity(count);

        while datagrams.len() < count {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.recv(remaining) {
                Some(datagram) => datagrams.push(datagram),
                None => break,
            }
        }

        datagrams
    }

    /// Assert nothing arrives within `max_wait`
    pub fn expect_silence(&self, max_wait: Duration) {
        if let Some(datagram) = self.recv(max_wait) {
            panic!("Unexpected datagram: {:?}", address_of(&datagram));
        }
    }
}

/// Address string of an OSC datagram, up to the first NUL
pub fn address_of(datagram: &[u8]) -> String {
    let end = datagram
        .iter()
        .position(|b| *b == 0)
        .unwrap_or(datagram.len());
    String::from_utf8_lossy(&datagram[..end]).into_owned()
}
