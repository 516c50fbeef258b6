//! Server configuration
//!
//! Settings come from, in increasing precedence: built-in defaults, an
//! optional TOML file, then command-line flags / environment variables.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

/// Default bind host
const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port
const DEFAULT_PORT: u16 = 8080;

/// Default longest accepted line in bytes
const DEFAULT_MAX_FRAME_LEN: usize = 4096;

/// Default number of readiness events fetched per poll
const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "chat_relay", version, about = "Line-based multi-client TCP chat relay")]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "CHAT_RELAY_PORT")]
    pub port: Option<u16>,

    /// Host or IP address to bind
    #[arg(short = 'H', long, env = "CHAT_RELAY_HOST")]
    pub host: Option<String>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Longest accepted line in bytes; longer lines drop the connection
    #[arg(long, value_name = "BYTES")]
    pub max_frame_len: Option<usize>,
}

/// Runtime configuration for the relay
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Host or IP address to bind
    pub host: String,
    /// Port to listen on (0 picks a free port)
    pub port: u16,
    /// Longest accepted inbound line, delimiter excluded
    pub max_frame_len: usize,
    /// Readiness events fetched per poll call
    pub event_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Build the effective configuration from parsed arguments
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(host) = &cli.host {
            config.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(max_frame_len) = cli.max_frame_len {
            config.max_frame_len = max_frame_len;
        }

        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Read a TOML file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Resolve the address to bind
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| ConfigError::InvalidAddress(self.host.clone()))?
            .next()
            .ok_or_else(|| ConfigError::InvalidAddress(self.host.clone()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_len == 0 {
            return Err(ConfigError::InvalidValue("max_frame_len must be positive"));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue("event_capacity must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["chat_relay"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_frame_len, 4096);
        assert_eq!(
            config.listen_addr().unwrap(),
            "127.0.0.1:8080".parse().unwrap()
        );
    }

    #[test]
    fn test_cli_overrides() {
        let config = ServerConfig::load(&cli(&["-p", "9000", "--max-frame-len", "128"])).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_frame_len, 128);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_file_then_cli() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host = \"0.0.0.0\"\nport = 7000\nmax_frame_len = 256").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = ServerConfig::load(&cli(&["--config", &path, "--port", "7001"])).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 7001);
        assert_eq!(config.max_frame_len, 256);
        assert_eq!(config.event_capacity, 1024);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prot = 7000").unwrap();

        assert!(matches!(
            ServerConfig::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ServerConfig::from_file(Path::new("/nonexistent/chat_relay.toml")),
            Err(ConfigError::Read(_))
        ));
    }

    #[test]
    fn test_zero_frame_limit_rejected() {
        assert!(matches!(
            ServerConfig::load(&cli(&["--max-frame-len", "0"])),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
