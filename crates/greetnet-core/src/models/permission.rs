//! Field-level permission model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::entity::EntityRef;
use crate::models::role::Role;

/// A stored opinion about whether one role may edit one field of one
/// cluster or destination.
///
/// Uniquely keyed by (target, field_name, target_role). Absence of a
/// row means "editable" — the enforcer only restricts, never grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPermission {
    pub id: Uuid,
    pub target: EntityRef,
    pub field_name: String,
    /// The role whose editing rights this row describes.
    pub target_role: Role,
    pub is_editable: bool,
    /// Roles allowed to configure this row; extended idempotently on
    /// every update.
    pub granted_by: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
