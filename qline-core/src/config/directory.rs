use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// A requestable capability, carrying the single-character ticket prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub id: Uuid,
    pub name: String,
    /// Ticket numbering prefix, e.g. `A` for `A001`.
    pub prefix: char,
    /// Inactive services stop issuing tickets; already-issued tickets stay
    /// claimable so the queue can drain.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A station that claims tickets for the services mapped to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePointConfig {
    pub id: Uuid,
    pub name: String,
    /// Ids of the services this point may claim tickets for.
    #[serde(default)]
    pub services: Vec<Uuid>,
}

/// An operator. The point assignment is advisory context for the UI; every
/// claim names its point explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub assigned_point: Option<Uuid>,
}

/// Validation failures in the configured directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("prefix {prefix:?} of service {service} is not an ASCII letter or digit")]
    InvalidPrefix { service: Uuid, prefix: char },

    #[error("prefix {prefix:?} is used by more than one active service")]
    DuplicatePrefix { prefix: char },

    #[error("duplicate id {0} in directory")]
    DuplicateId(Uuid),

    #[error("point {point} maps unknown service {service}")]
    UnknownService { point: Uuid, service: Uuid },

    #[error("provider {provider} is assigned to unknown point {point}")]
    UnknownPoint { provider: Uuid, point: Uuid },
}

/// The validated set of services, points, and providers.
///
/// Shared as an immutable snapshot (`Arc`) so concurrent claims never see a
/// half-applied reload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceDirectory {
    services: Vec<ServiceConfig>,
    points: Vec<ServicePointConfig>,
    providers: Vec<ProviderConfig>,
}

impl ServiceDirectory {
    /// Build a directory, rejecting prefix collisions among active services
    /// and dangling references.
    pub fn new(
        services: Vec<ServiceConfig>,
        points: Vec<ServicePointConfig>,
        providers: Vec<ProviderConfig>,
    ) -> Result<Self, DirectoryError> {
        let mut ids = HashSet::new();
        for id in services
            .iter()
            .map(|s| s.id)
            .chain(points.iter().map(|p| p.id))
            .chain(providers.iter().map(|p| p.id))
        {
            if !ids.insert(id) {
                return Err(DirectoryError::DuplicateId(id));
            }
        }

        let mut active_prefixes = HashSet::new();
        for service in &services {
            if !service.prefix.is_ascii_alphanumeric() {
                return Err(DirectoryError::InvalidPrefix {
                    service: service.id,
                    prefix: service.prefix,
                });
            }
            if service.active && !active_prefixes.insert(service.prefix) {
                return Err(DirectoryError::DuplicatePrefix {
                    prefix: service.prefix,
                });
            }
        }

        let service_ids: HashSet<Uuid> = services.iter().map(|s| s.id).collect();
        for point in &points {
            for service in &point.services {
                if !service_ids.contains(service) {
                    return Err(DirectoryError::UnknownService {
                        point: point.id,
                        service: *service,
                    });
                }
            }
        }

        let point_ids: HashSet<Uuid> = points.iter().map(|p| p.id).collect();
        for provider in &providers {
            if let Some(point) = provider.assigned_point {
                if !point_ids.contains(&point) {
                    return Err(DirectoryError::UnknownPoint {
                        provider: provider.id,
                        point,
                    });
                }
            }
        }

        Ok(Self {
            services,
            points,
            providers,
        })
    }

    /// Wrap in an `Arc` for snapshot sharing.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn service(&self, id: Uuid) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn point(&self, id: Uuid) -> Option<&ServicePointConfig> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn provider(&self, id: Uuid) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Services currently issuing tickets.
    pub fn active_services(&self) -> impl Iterator<Item = &ServiceConfig> {
        self.services.iter().filter(|s| s.active)
    }

    /// The services whose tickets `point_id` may claim, or `None` for an
    /// unknown point. Includes inactive services so their queues drain.
    pub fn eligible_services(&self, point_id: Uuid) -> Option<&[Uuid]> {
        self.point(point_id).map(|p| p.services.as_slice())
    }

    /// Display name for a point id, for announcements and reports.
    pub fn point_name(&self, id: Uuid) -> Option<&str> {
        self.point(id).map(|p| p.name.as_str())
    }

    /// Display name for a provider id, for reports.
    pub fn provider_name(&self, id: Uuid) -> Option<&str> {
        self.provider(id).map(|p| p.name.as_str())
    }
}
