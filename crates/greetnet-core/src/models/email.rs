//! Provider email-template registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Template codes used by the application flows.
pub mod codes {
    /// Initial password setup for a new account.
    pub const SET_PASSWORD: &str = "SETPW";
    /// Password reset requested by the user.
    pub const RESET_PASSWORD: &str = "RESPW";
    /// Profile change notification.
    pub const PROFILE_MODIFIED: &str = "MODIF";
}

/// Maps an application template code + language to the provider-side
/// template id. Unique on (code, lang).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub lang: String,
    pub provider_template_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmailTemplate {
    pub code: String,
    pub name: String,
    pub lang: String,
    pub provider_template_id: i64,
}
