//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is loaded at startup by
//! the binary). Unset variables use the defaults below; unreadable ones are
//! reported and also fall back to the defaults.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::api::logs::log_warning;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default upload limit in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

pub const ENV_PORT: &str = "SWEEPER_PORT";
pub const ENV_BIND: &str = "SWEEPER_BIND";
pub const ENV_MAX_UPLOAD_MB: &str = "SWEEPER_MAX_UPLOAD_MB";

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let port = read_var(&lookup, ENV_PORT, defaults.port);
        let bind = read_var(&lookup, ENV_BIND, defaults.bind);
        let max_upload_mb = read_var(&lookup, ENV_MAX_UPLOAD_MB, DEFAULT_MAX_UPLOAD_MB);

        Self {
            bind,
            port,
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
        }
    }

    /// Override the port, e.g. from a command-line flag.
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn read_var<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) if raw.trim().is_empty() => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log_warning(format!("Ignoring invalid {}={:?}, using default", key, raw));
            default
        }),
    }
}
