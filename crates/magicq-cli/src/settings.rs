//! Settings file and command-line overrides
//!
//! Without a file the transmitter settings come from the environment. A file
//! with an `[osc]` table replaces them; flags are applied last.

use anyhow::{Context, Result};
use magicq_core::PaddingMode;
use magicq_cue::OscSettings;
use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;

/// Contents of the TOML settings file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub osc: Option<OscSettings>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Values given on the command line
#[derive(Debug, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub host: Option<IpAddr>,
    pub strict_padding: bool,
}

pub fn resolve(file: Option<FileConfig>, overrides: &Overrides) -> OscSettings {
    let base = file
        .and_then(|f| f.osc)
        .unwrap_or_else(OscSettings::from_env);
    apply(base, overrides)
}

fn apply(mut settings: OscSettings, overrides: &Overrides) -> OscSettings {
    if let Some(port) = overrides.port {
        settings.local_port = port;
        settings.destination.set_port(port);
    }
    if let Some(host) = overrides.host {
        settings.destination.set_ip(host);
    }
    if overrides.strict_padding {
        settings.padding = PaddingMode::Strict;
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_table_is_used() {
        let file = FileConfig::parse(
            r#"
            [osc]
            local_port = 0
            destination = "10.0.0.5:8000"
            "#,
        )
        .unwrap();

        let settings = resolve(Some(file), &Overrides::default());
        assert_eq!(settings.local_port, 0);
        assert_eq!(settings.destination, "10.0.0.5:8000".parse().unwrap());
        assert_eq!(settings.padding, PaddingMode::Legacy);
    }

    #[test]
    fn test_file_port_is_the_console_port() {
        let file = FileConfig::parse("[osc]\nlocal_port = 7000").unwrap();

        let settings = resolve(Some(file), &Overrides::default());
        assert_eq!(settings.destination, "127.0.0.1:7000".parse().unwrap());
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig::parse("[osc]\nlocal_port = 7000").unwrap();
        let overrides = Overrides {
            port: Some(9000),
            host: Some("192.168.0.10".parse().unwrap()),
            strict_padding: true,
        };

        let settings = resolve(Some(file), &overrides);
        assert_eq!(settings.local_port, 9000);
        assert_eq!(settings.destination, "192.168.0.10:9000".parse().unwrap());
        assert_eq!(settings.padding, PaddingMode::Strict);
    }

    #[test]
    fn test_bad_file_is_an_error() {
        assert!(FileConfig::parse("[osc]\nlocal_port = \"eight\"").is_err());
    }
}
