//! Transmitter settings
//!
//! The port comes from `STACK_MAGICQ_OSC_PORT` and defaults to 8000. The same
//! port is used for the local bind and the destination. `STACK_MAGICQ_OSC_HOST`
//! points the destination at another machine; without it commands go to
//! loopback, where MagicQ normally runs alongside the show controller.

use magicq_core::{PaddingMode, DEFAULT_OSC_PORT};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tracing::warn;

/// Environment variable overriding the OSC port
pub const PORT_ENV: &str = "STACK_MAGICQ_OSC_PORT";

/// Environment variable overriding the destination host
pub const HOST_ENV: &str = "STACK_MAGICQ_OSC_HOST";

/// Default destination host
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// OSC transmitter settings
///
/// When read from a file, a missing `destination` is built from `host`
/// (loopback by default) and `local_port`, so the console is addressed on the
/// bound port unless told otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OscSettingsTable")]
pub struct OscSettings {
    /// Local UDP port to bind, 0 for ephemeral
    pub local_port: u16,
    /// Where commands are sent
    pub destination: SocketAddr,
    /// Address padding rule
    pub padding: PaddingMode,
}

/// File form of [`OscSettings`]; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OscSettingsTable {
    pub local_port: Option<u16>,
    pub host: Option<IpAddr>,
    pub destination: Option<SocketAddr>,
    pub padding: Option<PaddingMode>,
}

impl From<OscSettingsTable> for OscSettings {
    fn from(table: OscSettingsTable) -> Self {
        let mut settings = Self::with_port(table.local_port.unwrap_or(DEFAULT_OSC_PORT));
        if let Some(host) = table.host {
            settings.destination.set_ip(host);
        }
        if let Some(destination) = table.destination {
            settings.destination = destination;
        }
        if let Some(padding) = table.padding {
            settings.padding = padding;
        }
        settings
    }
}

impl Default for OscSettings {
    fn default() -> Self {
        Self::with_port(DEFAULT_OSC_PORT)
    }
}

impl OscSettings {
    /// Bind and send on `port` at loopback
    pub fn with_port(port: u16) -> Self {
        Self {
            local_port: port,
            destination: SocketAddr::new(DEFAULT_HOST, port),
            padding: PaddingMode::default(),
        }
    }

    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_port(lookup(PORT_ENV).as_deref());
        let mut settings = Self::with_port(port);

        if let Some(host) = lookup(HOST_ENV) {
            match host.trim().parse::<IpAddr>() {
                Ok(ip) => settings.destination.set_ip(ip),
                Err(_) => warn!("Ignoring {}={:?}: not an IP address", HOST_ENV, host),
            }
        }

        settings
    }

    pub fn with_destination(mut self, destination: SocketAddr) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_padding(mut self, padding: PaddingMode) -> Self {
        self.padding = padding;
        self
    }

    /// Wildcard address the socket binds to, in the destination's family
    pub fn bind_addr(&self) -> SocketAddr {
        let wildcard = match self.destination {
            SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        SocketAddr::new(wildcard, self.local_port)
    }
}

/// Parse a port override. Anything outside 1..=65535 gives the default.
pub fn parse_port(value: Option<&str>) -> u16 {
    let Some(raw) = value else {
        return DEFAULT_OSC_PORT;
    };

    match raw.trim().parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => port as u16,
        _ => {
            warn!("Ignoring {}={:?}, using {}", PORT_ENV, raw, DEFAULT_OSC_PORT);
            DEFAULT_OSC_PORT
        }
    }
}
