//! Server Configuration
//!
//! Command-line configuration for the server binary, with defaults for a
//! local deployment: TCP on 8080, UDP on 8081, both on
//! loopback, ten UDP workers.
//!
//! Which clients share a store is an explicit setting per transport rather
//! than an accident of the transport. The defaults keep stream sessions
//! isolated and datagram clients sharing one store.

use clap::{Parser, ValueEnum};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default host both transports bind to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port.
pub const DEFAULT_STREAM_PORT: u16 = 8080;

/// Default UDP port.
pub const DEFAULT_DATAGRAM_PORT: u16 = 8081;

/// Default number of datagrams processed at once.
pub const DEFAULT_DATAGRAM_WORKERS: usize = 10;

/// Default receive buffer for one datagram, in bytes.
pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 1024;

/// Default idle time, in seconds, before a per-client datagram store is dropped.
pub const DEFAULT_DATAGRAM_IDLE_SECS: u64 = 300;

/// How clients of one transport map onto store instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreScope {
    /// Each client (TCP connection, or UDP address and port) gets its own store.
    PerClient,
    /// Every client of the transport uses one process-wide store.
    Shared,
}

impl fmt::Display for StoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreScope::PerClient => f.write_str("per-client"),
            StoreScope::Shared => f.write_str("shared"),
        }
    }
}

/// Whether a STATISTICS request is counted in the session's command log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StatisticsPolicy {
    /// STATISTICS is never logged. Reports list PUT, GET, DELETE, KEYS, QUIT.
    #[default]
    ExcludeSelf,
    /// STATISTICS is logged before its report is computed, and the report
    /// gains a sixth `STATISTICS: n` line that includes the current request.
    IncludeSelf,
}

/// Errors found while validating a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("datagram worker pool needs at least one worker")]
    NoDatagramWorkers,

    #[error("maximum datagram size must be greater than zero")]
    ZeroDatagramSize,
}

/// Runtime configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "duokv", version, about = "In-memory key-value store over TCP and UDP")]
pub struct Config {
    /// Host to bind both transports to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// TCP port for the stream transport
    #[arg(long, default_value_t = DEFAULT_STREAM_PORT)]
    pub stream_port: u16,

    /// UDP port for the datagram transport
    #[arg(long, default_value_t = DEFAULT_DATAGRAM_PORT)]
    pub datagram_port: u16,

    /// Number of datagrams handled concurrently; further packets wait
    #[arg(long, default_value_t = DEFAULT_DATAGRAM_WORKERS)]
    pub datagram_workers: usize,

    /// Receive buffer for one datagram, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_DATAGRAM_SIZE)]
    pub max_datagram_size: usize,

    /// Store scope for TCP sessions
    #[arg(long, value_enum, default_value_t = StoreScope::PerClient)]
    pub stream_store: StoreScope,

    /// Store scope for UDP clients
    #[arg(long, value_enum, default_value_t = StoreScope::Shared)]
    pub datagram_store: StoreScope,

    /// Seconds a per-client UDP store survives without requests; 0 keeps it until QUIT
    #[arg(long, default_value_t = DEFAULT_DATAGRAM_IDLE_SECS)]
    pub datagram_idle_timeout: u64,

    /// Whether STATISTICS counts itself
    #[arg(long, value_enum, default_value_t = StatisticsPolicy::ExcludeSelf)]
    pub statistics: StatisticsPolicy,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            stream_port: DEFAULT_STREAM_PORT,
            datagram_port: DEFAULT_DATAGRAM_PORT,
            datagram_workers: DEFAULT_DATAGRAM_WORKERS,
            max_datagram_size: DEFAULT_MAX_DATAGRAM_SIZE,
            stream_store: StoreScope::PerClient,
            datagram_store: StoreScope::Shared,
            datagram_idle_timeout: DEFAULT_DATAGRAM_IDLE_SECS,
            statistics: StatisticsPolicy::ExcludeSelf,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Checks values clap cannot reject on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.datagram_workers == 0 {
            return Err(ConfigError::NoDatagramWorkers);
        }
        if self.max_datagram_size == 0 {
            return Err(ConfigError::ZeroDatagramSize);
        }
        Ok(())
    }

    /// Idle timeout for per-client datagram stores, `None` when disabled.
    pub fn datagram_idle_timeout(&self) -> Option<Duration> {
        match self.datagram_idle_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Returns the TCP bind address as a string
    pub fn stream_address(&self) -> String {
        format!("{}:{}", self.host, self.stream_port)
    }

    /// Returns the UDP bind address as a string
    pub fn datagram_address(&self) -> String {
        format!("{}:{}", self.host, self.datagram_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_parsed_defaults() {
        let parsed = Config::parse_from(["duokv"]);
        let default = Config::default();

        assert_eq!(parsed.host, default.host);
        assert_eq!(parsed.stream_port, 8080);
        assert_eq!(parsed.datagram_port, 8081);
        assert_eq!(parsed.datagram_workers, 10);
        assert_eq!(parsed.max_datagram_size, 1024);
        assert_eq!(parsed.stream_store, StoreScope::PerClient);
        assert_eq!(parsed.datagram_store, StoreScope::Shared);
        assert_eq!(parsed.statistics, StatisticsPolicy::ExcludeSelf);
        assert_eq!(parsed.log_level, "info");
        assert_eq!(parsed.datagram_idle_timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_parse_flags() {
        let config = Config::parse_from([
            "duokv",
            "--host",
            "0.0.0.0",
            "--stream-port",
            "9000",
            "--datagram-store",
            "per-client",
            "--stream-store",
            "shared",
            "--statistics",
            "include-self",
            "--datagram-workers",
            "4",
        ]);

        assert_eq!(config.stream_address(), "0.0.0.0:9000");
        assert_eq!(config.datagram_address(), "0.0.0.0:8081");
        assert_eq!(config.datagram_store, StoreScope::PerClient);
        assert_eq!(config.stream_store, StoreScope::Shared);
        assert_eq!(config.statistics, StatisticsPolicy::IncludeSelf);
        assert_eq!(config.datagram_workers, 4);
    }

    #[test]
    fn test_validate() {
        assert_eq!(Config::default().validate(), Ok(()));

        let config = Config {
            datagram_workers: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoDatagramWorkers));

        let config = Config {
            max_datagram_size: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroDatagramSize));
    }

    #[test]
    fn test_idle_timeout_zero_disables() {
        let config = Config::parse_from(["duokv", "--datagram-idle-timeout", "0"]);
        assert_eq!(config.datagram_idle_timeout(), None);

        let config = Config::parse_from(["duokv", "--datagram-idle-timeout", "45"]);
        assert_eq!(config.datagram_idle_timeout(), Some(Duration::from_secs(45)));
    }
}
