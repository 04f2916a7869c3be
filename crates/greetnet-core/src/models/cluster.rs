//! Cluster domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hard upper bound on visitors per walk, network-wide. Cluster
/// configuration may lower it but never exceed it.
pub const MAX_VISITORS: u32 = 6;

/// Lifecycle status shared by clusters and destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityStatus {
    Draft,
    Active,
    Inactive,
    Deactivated,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Draft => "Draft",
            EntityStatus::Active => "Active",
            EntityStatus::Inactive => "Inactive",
            EntityStatus::Deactivated => "Deactivated",
        }
    }

    pub fn parse(s: &str) -> Option<EntityStatus> {
        match s {
            "Draft" => Some(EntityStatus::Draft),
            "Active" => Some(EntityStatus::Active),
            "Inactive" => Some(EntityStatus::Inactive),
            "Deactivated" => Some(EntityStatus::Deactivated),
            _ => None,
        }
    }
}

/// A geographic community of destinations run by volunteer admins.
///
/// `code` is the short identifier used across the network; it is
/// upper-cased on save and immutable after creation. The admin fields
/// are the role holders synchronized by the role engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub status: EntityStatus,
    pub address: String,
    pub description: String,
    pub paypal_url: Option<String>,
    pub admin: Option<Uuid>,
    pub admin_alt: Option<Uuid>,
    pub max_participants: u32,
    pub backup_email: Option<String>,
    pub library_url: Option<String>,
    pub greeter_library_url: Option<String>,
    pub comm_langs: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCluster {
    pub code: String,
    pub name: String,
    pub status: EntityStatus,
    pub address: String,
    pub description: String,
    pub paypal_url: Option<String>,
    pub admin: Option<Uuid>,
    pub admin_alt: Option<Uuid>,
    pub max_participants: u32,
    pub backup_email: Option<String>,
    pub library_url: Option<String>,
    pub greeter_library_url: Option<String>,
    pub comm_langs: Vec<String>,
}

/// Partial update. `None` leaves a field unchanged; for optional
/// fields, `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCluster {
    pub name: Option<String>,
    pub status: Option<EntityStatus>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub paypal_url: Option<Option<String>>,
    pub admin: Option<Option<Uuid>>,
    pub admin_alt: Option<Option<Uuid>>,
    pub max_participants: Option<u32>,
    pub backup_email: Option<Option<String>>,
    pub library_url: Option<Option<String>>,
    pub greeter_library_url: Option<Option<String>>,
    pub comm_langs: Option<Vec<String>>,
}
