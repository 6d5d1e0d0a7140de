//! Server configuration.
//!
//! Every option is a command-line flag that falls back to an environment
//! variable, then to a built-in default.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use logfind_core::EngineConfig;
use logfind_core::config::{
    DEFAULT_CACHE_TTL, DEFAULT_FILE_CACHE_TTL, DEFAULT_LOG_DIR, DEFAULT_MAX_OPEN_FILES,
    DEFAULT_REFRESH_INTERVAL,
};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default request budget per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Configuration for the HTTP server and the engine behind it.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "logfind")]
#[command(about = "Serve exact-timestamp lookups over a directory of log files")]
#[command(version)]
pub struct ServerConfig {
    /// Directory holding the log files.
    #[arg(long, env = "LOG_DIR", default_value = DEFAULT_LOG_DIR)]
    pub log_dir: PathBuf,

    /// Port to listen on.
    #[arg(long, env = "SERVER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind to.
    #[arg(long, env = "BIND_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// How long a resolved lookup stays memoized, e.g. `5m`.
    #[arg(long, env = "CACHE_TTL", value_parser = humantime::parse_duration, default_value = "5m")]
    pub cache_ttl: Duration,

    /// Maximum number of simultaneously mapped files.
    #[arg(long, env = "MAX_OPEN_FILES", default_value_t = DEFAULT_MAX_OPEN_FILES)]
    pub max_open_files: usize,

    /// How long a mapped file stays cached, e.g. `10m`.
    #[arg(long, env = "FILE_CACHE_TTL", value_parser = humantime::parse_duration, default_value = "10m")]
    pub file_cache_ttl: Duration,

    /// Requests accepted per second across all clients.
    #[arg(long, env = "RATE_LIMIT", default_value_t = DEFAULT_RATE_LIMIT)]
    pub rate_limit: u32,

    /// Interval between directory rescans, e.g. `1h`.
    #[arg(long, env = "REFRESH_INTERVAL", value_parser = humantime::parse_duration, default_value = "60m")]
    pub refresh_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            port: DEFAULT_PORT,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            cache_ttl: DEFAULT_CACHE_TTL,
            max_open_files: DEFAULT_MAX_OPEN_FILES,
            file_cache_ttl: DEFAULT_FILE_CACHE_TTL,
            rate_limit: DEFAULT_RATE_LIMIT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to listen on.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the engine portion of the configuration.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(&self.log_dir)
            .with_max_open_files(self.max_open_files)
            .with_file_cache_ttl(self.file_cache_ttl)
            .with_cache_ttl(self.cache_ttl)
            .with_refresh_interval(self.refresh_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let parsed = ServerConfig::try_parse_from(["logfind"]).expect("parse");
        let config = ServerConfig::default();

        // Environment may override parsed values; only compare when unset.
        if std::env::var_os("SERVER_PORT").is_none() {
            assert_eq!(parsed.port, config.port);
        }
        assert_eq!(config.bind_addr().port(), 8080);
        assert_eq!(config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_flags_override() {
        let config = ServerConfig::try_parse_from([
            "logfind",
            "--log-dir",
            "/tmp/logs",
            "--port",
            "9000",
            "--host",
            "127.0.0.1",
            "--cache-ttl",
            "90s",
            "--max-open-files",
            "4",
            "--file-cache-ttl",
            "2m",
            "--rate-limit",
            "7",
            "--refresh-interval",
            "1h 30m",
        ])
        .expect("parse");

        assert_eq!(config.bind_addr(), "127.0.0.1:9000".parse::<SocketAddr>().expect("addr"));
        assert_eq!(config.rate_limit, 7);

        let engine = config.engine_config();
        assert_eq!(engine.log_dir, PathBuf::from("/tmp/logs"));
        assert_eq!(engine.max_open_files, 4);
        assert_eq!(engine.cache_ttl, Duration::from_secs(90));
        assert_eq!(engine.file_cache_ttl, Duration::from_secs(120));
        assert_eq!(engine.refresh_interval, Duration::from_secs(5400));
    }

    #[test]
    fn test_bad_duration_rejected() {
        let result = ServerConfig::try_parse_from(["logfind", "--cache-ttl", "soon"]);
        assert!(result.is_err());
    }
}
