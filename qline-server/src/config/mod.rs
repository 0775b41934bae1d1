//! Configuration loading.
//!
//! The TOML file is parsed into [`FileConfig`] and the directory sections
//! are validated into a [`ServiceDirectory`] before anything starts. The
//! same loader is reused by the SIGHUP reload path, so a broken edit is
//! rejected as a whole and the running directory stays untouched.

mod file;

pub use file::{FileConfig, ServerConfig, StorageBackend, StorageConfig};

use qline_core::config::{DirectoryError, ServiceDirectory};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid service directory: {0}")]
    Directory(#[from] DirectoryError),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// The validated result of loading the config file.
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub storage: StorageConfig,
    pub directory: ServiceDirectory,
}

/// Loads and re-loads the configuration file.
pub struct ConfigLoader {
    path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(path: &Path, listen_override: Option<SocketAddr>) -> Self {
        Self {
            path: path.to_path_buf(),
            listen_override,
        }
    }

    /// Read, parse, and validate the config file.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let raw = std::fs::read_to_string(&self.path)?;
        let file: FileConfig = toml::from_str(&raw)?;
        let directory = ServiceDirectory::new(file.services, file.points, file.providers)?;
        Ok(LoadedConfig {
            listen: self.listen_override.unwrap_or(file.server.listen),
            storage: file.storage,
            directory,
        })
    }

    /// Re-read the config file (SIGHUP path). Only the service directory is
    /// applied at runtime; listen address and storage backend changes take
    /// effect on the next restart.
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }
}

/// Get the database connection string from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
