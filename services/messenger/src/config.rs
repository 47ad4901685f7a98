//! Service configuration
//!
//! Settings are read from `MESSENGER_*` environment variables on top of
//! built-in defaults. Database and token settings have their own
//! `from_env` constructors in `common::database` and [`crate::jwt`].

use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;

/// Which record store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// PostgreSQL through sqlx
    Postgres,
    /// Process-local store, contents are lost on restart
    Memory,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_address: String,
    /// Record store backend
    pub store: StoreBackend,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl ServerConfig {
    /// Load the server configuration
    ///
    /// # Environment Variables
    /// - `MESSENGER_BIND_ADDRESS` (default: `0.0.0.0:3000`)
    /// - `MESSENGER_STORE`: `postgres` or `memory` (default: `postgres`)
    /// - `MESSENGER_LOG_LEVEL` (default: `info`)
    pub fn from_env() -> Result<Self> {
        let config = Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("store", "postgres")?
            .set_default("log_level", "info")?
            .add_source(Environment::with_prefix("MESSENGER"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_server_config_defaults() {
        unsafe {
            std::env::remove_var("MESSENGER_BIND_ADDRESS");
            std::env::remove_var("MESSENGER_STORE");
            std::env::remove_var("MESSENGER_LOG_LEVEL");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.store, StoreBackend::Postgres);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    #[serial]
    fn test_server_config_from_env() {
        unsafe {
            std::env::set_var("MESSENGER_BIND_ADDRESS", "127.0.0.1:8080");
            std::env::set_var("MESSENGER_STORE", "memory");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.store, StoreBackend::Memory);

        unsafe {
            std::env::remove_var("MESSENGER_BIND_ADDRESS");
            std::env::remove_var("MESSENGER_STORE");
        }
    }

    #[test]
    #[serial]
    fn test_server_config_rejects_unknown_store() {
        unsafe {
            std::env::set_var("MESSENGER_STORE", "mongodb");
        }

        assert!(ServerConfig::from_env().is_err());

        unsafe {
            std::env::remove_var("MESSENGER_STORE");
        }
    }
}
