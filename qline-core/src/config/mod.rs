//! Service directory configuration.
//!
//! Services, service points, and providers are configuration-owned: the
//! server loads them from its TOML file and replaces the whole directory on
//! reload. The engine reads a directory snapshot on every operation, so
//! mapping changes apply to the next request without restarts.

mod directory;
mod store;

pub use directory::{
    DirectoryError, ProviderConfig, ServiceConfig, ServiceDirectory, ServicePointConfig,
};
pub use store::{DirectoryStore, DirectoryWatcher};
