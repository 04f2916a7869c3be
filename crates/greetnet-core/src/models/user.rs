//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account in the admin application.
///
/// `is_active = false` marks a pending placeholder: a row created
/// out-of-band for someone named as a role holder before they have ever
/// signed in. Adoption (first successful save naming them) activates
/// the row; a failed save discards it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// Preferred communication language, e.g. `fr` or `en-gb`.
    pub comm_lang: String,
    pub cluster_code: Option<String>,
    pub dest_code: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub comm_lang: String,
    pub cluster_code: Option<String>,
    pub dest_code: Option<String>,
    pub is_active: bool,
}

/// Partial update. `None` leaves a field unchanged; for optional
/// fields, `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<Option<String>>,
    pub comm_lang: Option<String>,
    pub cluster_code: Option<Option<String>>,
    pub dest_code: Option<Option<String>>,
    pub is_active: Option<bool>,
}
