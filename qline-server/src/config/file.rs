//! TOML file configuration structures.
//!
//! These structs directly map to the `qline.toml` file format. The service
//! directory sections reuse the core config types, so the file is the
//! single source of truth for services, points, and providers.

use qline_core::config::{ProviderConfig, ServiceConfig, ServicePointConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
    #[serde(default)]
    pub points: Vec<ServicePointConfig>,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default address")
}

/// Storage configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Which ticket store backs the engine.
///
/// `postgres` reads the connection string from the `DATABASE_URL`
/// environment variable; credentials stay out of the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[storage]
backend = "postgres"

[[services]]
id = "0191d8a6-0000-7000-8000-000000000001"
name = "General"
prefix = "A"

[[services]]
id = "0191d8a6-0000-7000-8000-000000000002"
name = "Billing"
prefix = "B"
active = false

[[points]]
id = "0191d8a6-0000-7000-8000-000000000010"
name = "Counter 1"
services = ["0191d8a6-0000-7000-8000-000000000001"]

[[providers]]
id = "0191d8a6-0000-7000-8000-000000000020"
name = "Dana"
assigned_point = "0191d8a6-0000-7000-8000-000000000010"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[0].prefix, 'A');
        assert!(config.services[0].active);
        assert!(!config.services[1].active);
        assert_eq!(config.points.len(), 1);
        assert_eq!(config.points[0].services.len(), 1);
        assert_eq!(config.providers[0].name, "Dana");
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config: FileConfig = toml::from_str("[server]\n").unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.services.is_empty());
        assert!(config.points.is_empty());
        assert!(config.providers.is_empty());
    }
}
