//! Configuration loaded from environment variables.

use std::env;
use std::net::IpAddr;

use anyhow::{Context, Result};

/// Default main listener port.
pub const DEFAULT_PORT: u16 = 8081;

/// Default cap on POST bodies (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the main listener binds to (default: 127.0.0.1).
    pub bind_addr: IpAddr,

    /// Main listener port (default: 8081).
    pub port: u16,

    /// Port for `/health` and `/metrics`. When None, no admin listener runs.
    pub admin_port: Option<u16>,

    /// Addresses trusted in addition to loopback (comma-separated).
    pub trusted_addrs: Vec<IpAddr>,

    /// Maximum accepted POST body size in bytes.
    pub max_body_bytes: usize,

    /// Handle one request at a time instead of concurrently.
    pub serialize_requests: bool,

    /// Log the offending text when a check fails.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            admin_port: None,
            trusted_addrs: Vec::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            serialize_requests: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(v) => v.parse().context("BIND_ADDR must be an IP address")?,
            Err(_) => defaults.bind_addr,
        };

        let port = match env::var("PORT") {
            Ok(v) => v.parse().context("PORT must be a valid u16")?,
            Err(_) => defaults.port,
        };

        let admin_port = env::var("ADMIN_PORT")
            .ok()
            .map(|v| v.parse().context("ADMIN_PORT must be a valid u16"))
            .transpose()?;

        let trusted_addrs = match env::var("TRUSTED_ADDRS") {
            Ok(v) => parse_addr_list(&v)?,
            Err(_) => Vec::new(),
        };

        let max_body_bytes = match env::var("MAX_BODY_BYTES") {
            Ok(v) => v.parse().context("MAX_BODY_BYTES must be a valid usize")?,
            Err(_) => defaults.max_body_bytes,
        };

        let serialize_requests = env_flag("SERIALIZE_REQUESTS")?;
        let verbose = env_flag("VERBOSE")?;

        Ok(Self {
            bind_addr,
            port,
            admin_port,
            trusted_addrs,
            max_body_bytes,
            serialize_requests,
            verbose,
        })
    }
}

/// Parse a comma-separated list of IP addresses, ignoring blanks.
fn parse_addr_list(raw: &str) -> Result<Vec<IpAddr>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .with_context(|| format!("TRUSTED_ADDRS entry '{s}' is not an IP address"))
        })
        .collect()
}

fn env_flag(name: &str) -> Result<bool> {
    match env::var(name) {
        Ok(v) => parse_flag(&v).with_context(|| format!("{name} must be true or false")),
        Err(_) => Ok(false),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("unrecognized flag value '{other}'"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_loopback() {
        let config = Config::default();
        assert!(config.bind_addr.is_loopback());
        assert_eq!(config.port, 8081);
        assert!(config.admin_port.is_none());
        assert!(!config.serialize_requests);
    }

    #[test]
    fn addr_list_accepts_both_families() {
        let addrs = parse_addr_list(" 10.0.0.5, ,fe80::1 ").unwrap();
        assert_eq!(addrs.len(), 2);
        assert!(addrs[0].is_ipv4());
        assert!(addrs[1].is_ipv6());
    }

    #[test]
    fn addr_list_rejects_hostnames() {
        let err = parse_addr_list("localhost").unwrap_err();
        assert!(err.to_string().contains("localhost"));
    }

    #[test]
    fn flags() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
