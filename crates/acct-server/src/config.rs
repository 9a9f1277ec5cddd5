//! Command line and environment settings for both binaries
//!
//! Every option can be given as a flag or through its environment variable;
//! flags win.

use crate::server::{ServerConfig, MAX_IN_FLIGHT_LIMIT};
use crate::state::ValkeyConfig;
use clap::{Args, Parser};
use std::fmt::Write as _;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

fn parse_max_in_flight(value: &str) -> Result<usize, String> {
    let limit: usize = value.parse().map_err(|e| format!("{}", e))?;
    if (1..=MAX_IN_FLIGHT_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(format!("must be between 1 and {}", MAX_IN_FLIGHT_LIMIT))
    }
}

/// Valkey/Redis connection settings
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Valkey/Redis address as host:port
    #[arg(long = "redis-addr", env = "REDIS_ADDR", default_value = "localhost:6379")]
    pub redis_addr: String,

    /// Valkey/Redis password
    #[arg(long = "redis-password", env = "REDIS_PASSWORD", hide_env_values = true)]
    pub redis_password: Option<String>,

    /// Logical database index
    #[arg(long = "redis-db", env = "REDIS_DB", default_value_t = 0)]
    pub redis_db: u32,
}

impl StoreSettings {
    pub fn url(&self) -> String {
        format!("redis://{}/{}", self.redis_addr, self.redis_db)
    }

    pub fn valkey_config(&self) -> ValkeyConfig {
        ValkeyConfig::new(self.url()).with_password(self.redis_password.clone())
    }
}

/// Log sink settings
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// JSON log file, appended to; empty disables file output
    #[arg(long = "log-file", env = "LOG_FILE_PATH", default_value = "/var/log/radius_updates.log")]
    pub log_file: String,

    /// Default log filter when RUST_LOG is unset
    #[arg(long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl LogSettings {
    pub fn log_file_path(&self) -> Option<&Path> {
        (!self.log_file.is_empty()).then(|| Path::new(&self.log_file))
    }
}

/// RADIUS accounting server
#[derive(Parser, Debug, Clone)]
#[command(name = "acct-server", author, version, about, long_about = None)]
pub struct ServerSettings {
    /// UDP port to listen on
    #[arg(long, env = "RADIUS_PORT", default_value_t = 1813)]
    pub port: u16,

    /// Address to listen on
    #[arg(long = "listen-address", env = "RADIUS_LISTEN_ADDRESS", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub listen_address: IpAddr,

    /// Shared secret used by all accounting clients
    #[arg(long, env = "RADIUS_SECRET", default_value = "testing123", hide_env_values = true, hide_default_value = true)]
    pub secret: String,

    /// Maximum number of requests handled concurrently (unbounded if unset)
    #[arg(long = "max-in-flight", env = "RADIUS_MAX_IN_FLIGHT", value_parser = parse_max_in_flight)]
    pub max_in_flight: Option<usize>,

    /// Validate settings, print a summary and exit
    #[arg(long)]
    pub validate: bool,

    #[command(flatten)]
    pub store: StoreSettings,

    #[command(flatten)]
    pub log: LogSettings,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.port)
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind_addr(),
            max_in_flight: self.max_in_flight,
        }
    }

    /// Human readable settings with secrets redacted
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "  Listen: {}", self.bind_addr());
        let _ = writeln!(out, "  Secret: {}", redact(&self.secret));
        let _ = writeln!(
            out,
            "  Max in flight: {}",
            self.max_in_flight
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unbounded".to_string())
        );
        write_store_summary(&mut out, &self.store);
        write_log_summary(&mut out, &self.log);
        out
    }
}

/// RADIUS accounting key tailer
#[derive(Parser, Debug, Clone)]
#[command(name = "acct-tailer", author, version, about, long_about = None)]
pub struct TailerSettings {
    /// Set notify-keyspace-events on the server before subscribing
    #[arg(long = "enable-notifications", env = "REDIS_ENABLE_NOTIFICATIONS")]
    pub enable_notifications: bool,

    /// Validate settings, print a summary and exit
    #[arg(long)]
    pub validate: bool,

    #[command(flatten)]
    pub store: StoreSettings,

    #[command(flatten)]
    pub log: LogSettings,
}

impl TailerSettings {
    pub fn summary(&self) -> String {
        let mut out = String::new();
        write_store_summary(&mut out, &self.store);
        let _ = writeln!(out, "  Enable notifications: {}", self.enable_notifications);
        write_log_summary(&mut out, &self.log);
        out
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "(empty)"
    } else {
        "<redacted>"
    }
}

fn write_store_summary(out: &mut String, store: &StoreSettings) {
    let _ = writeln!(out, "  Store: {}", store.url());
    if let Some(ref password) = store.redis_password {
        let _ = writeln!(out, "  Store password: {}", redact(password));
    }
}

fn write_log_summary(out: &mut String, log: &LogSettings) {
    let _ = writeln!(out, "  Log level: {}", log.log_level);
    match log.log_file_path() {
        Some(path) => {
            let _ = writeln!(out, "  Log file: {}", path.display());
        }
        None => {
            let _ = writeln!(out, "  Log file: (disabled)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_flags() {
        let settings = ServerSettings::try_parse_from([
            "acct-server",
            "--port",
            "11813",
            "--listen-address",
            "127.0.0.1",
            "--secret",
            "s3cret",
            "--redis-addr",
            "valkey:6380",
            "--redis-db",
            "2",
            "--redis-password",
            "hunter2",
            "--max-in-flight",
            "64",
            "--log-file",
            "",
        ])
        .unwrap();

        assert_eq!(settings.bind_addr(), "127.0.0.1:11813".parse().unwrap());
        assert_eq!(settings.secret, "s3cret");
        assert_eq!(settings.server_config().max_in_flight, Some(64));
        assert_eq!(settings.log.log_file_path(), None);

        let valkey = settings.store.valkey_config();
        assert_eq!(valkey.url, "redis://valkey:6380/2");
        assert_eq!(valkey.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_summary_redacts_secrets() {
        let settings = ServerSettings::try_parse_from([
            "acct-server",
            "--secret",
            "s3cret",
            "--redis-password",
            "hunter2",
        ])
        .unwrap();

        let summary = settings.summary();
        assert!(!summary.contains("s3cret"));
        assert!(!summary.contains("hunter2"));
        assert!(summary.contains("<redacted>"));
    }

    #[test]
    fn test_empty_password_is_none() {
        let store = StoreSettings {
            redis_addr: "localhost:6379".to_string(),
            redis_password: Some(String::new()),
            redis_db: 0,
        };
        assert_eq!(store.valkey_config().password, None);
    }

    #[test]
    fn test_tailer_flags() {
        let settings = TailerSettings::try_parse_from([
            "acct-tailer",
            "--enable-notifications",
            "--redis-addr",
            "10.0.0.5:6379",
            "--log-file",
            "/tmp/tail.log",
        ])
        .unwrap();

        assert!(settings.enable_notifications);
        assert_eq!(settings.store.url(), "redis://10.0.0.5:6379/0");
        assert_eq!(settings.log.log_file_path(), Some(Path::new("/tmp/tail.log")));
        assert!(settings.summary().contains("Enable notifications: true"));
    }

    #[test]
    fn test_max_in_flight_bounds() {
        assert!(ServerSettings::try_parse_from(["acct-server", "--max-in-flight", "0"]).is_err());

        let too_many = (MAX_IN_FLIGHT_LIMIT as u128 + 1).to_string();
        assert!(ServerSettings::try_parse_from(["acct-server", "--max-in-flight", too_many.as_str()]).is_err());

        let settings =
            ServerSettings::try_parse_from(["acct-server", "--max-in-flight", "1"]).unwrap();
        assert_eq!(settings.max_in_flight, Some(1));
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(ServerSettings::try_parse_from(["acct-server", "--port", "70000"]).is_err());
    }
}
