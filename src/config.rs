//! Configuration loaded from environment variables.
//!
//! - `HOST` - bind address (default: 0.0.0.0)
//! - `PORT` - listen port (default: 8083)
//! - `DATABASE_URL` - PostgreSQL URL; the in-memory store is used when unset
//! - `DATABASE_MAX_CONNECTIONS` - pool size (default: 10)
//! - `NATS_URL` - where domain events are published, optional
//! - `ADMIN_TOKEN` - shared secret for `/api/admin/*`; admin routes refuse all requests when unset

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),
    #[error("ADMIN_TOKEN must be at least 16 characters")]
    WeakAdminToken,
}

const MIN_ADMIN_TOKEN_LENGTH: usize = 16;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub nats_url: Option<String>,
    pub admin_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8083,
            database_url: None,
            database_max_connections: 10,
            nats_url: None,
            admin_token: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let admin_token = var("ADMIN_TOKEN");
        if admin_token.as_ref().is_some_and(|t| t.len() < MIN_ADMIN_TOKEN_LENGTH) {
            return Err(ConfigError::WeakAdminToken);
        }

        Ok(Self {
            host: parse(&var, "HOST")?.unwrap_or(defaults.host),
            port: parse(&var, "PORT")?.unwrap_or(defaults.port),
            database_url: var("DATABASE_URL"),
            database_max_connections: parse(&var, "DATABASE_MAX_CONNECTIONS")?.unwrap_or(defaults.database_max_connections),
            nats_url: var("NATS_URL"),
            admin_token,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}

fn parse<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnvVar(key, e.to_string())))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c.socket_addr().to_string(), "0.0.0.0:8083");
        assert!(c.database_url.is_none());
        assert!(c.admin_token.is_none());
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let c = config(&[("PORT", "9000"), ("HOST", "127.0.0.1"), ("DATABASE_URL", "  "), ("ADMIN_TOKEN", "0123456789abcdef")]).unwrap();
        assert_eq!(c.socket_addr().to_string(), "127.0.0.1:9000");
        assert!(c.database_url.is_none());
        assert_eq!(c.admin_token.as_deref(), Some("0123456789abcdef"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(config(&[("PORT", "eighty")]), Err(ConfigError::InvalidEnvVar("PORT", _))));
        assert!(matches!(config(&[("ADMIN_TOKEN", "short")]), Err(ConfigError::WeakAdminToken)));
    }
}
