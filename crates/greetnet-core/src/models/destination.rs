//! Destination domain model and its one-to-one configuration blocks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::cluster::EntityStatus;

/// A place where walks happen, belonging to exactly one cluster.
///
/// `code` is upper-cased on save and immutable after creation.
/// `parent_code` links sub-destinations by code, deliberately without a
/// foreign-key constraint. The five holder fields drive the role
/// synchronizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    pub id: Uuid,
    pub cluster_id: Uuid,
    pub code: String,
    pub parent_code: Option<String>,
    pub iga_code: Option<String>,
    pub name: String,
    pub description: String,
    pub address: String,
    pub region: String,
    pub country: String,
    pub logo_path: Option<String>,
    pub email_label: String,
    pub status: EntityStatus,
    pub manager: Option<Uuid>,
    pub referent: Option<Uuid>,
    pub matcher: Option<Uuid>,
    pub matcher_alt: Option<Uuid>,
    pub financier: Option<Uuid>,
    pub min_places: u32,
    pub max_places: u32,
    pub min_interests: u32,
    pub max_interests: u32,
    pub require_stay_dates: bool,
    pub dispersion_days: u32,
    pub notification_email: Option<String>,
    pub reply_email: Option<String>,
    pub accepts_disability: bool,
    pub disability_notice: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDestination {
    pub cluster_id: Uuid,
    pub code: String,
    pub parent_code: Option<String>,
    pub iga_code: Option<String>,
    pub name: String,
    pub description: String,
    pub address: String,
    pub region: String,
    pub country: String,
    pub logo_path: Option<String>,
    pub email_label: String,
    pub status: EntityStatus,
    pub manager: Option<Uuid>,
    pub referent: Option<Uuid>,
    pub matcher: Option<Uuid>,
    pub matcher_alt: Option<Uuid>,
    pub financier: Option<Uuid>,
    pub min_places: u32,
    pub max_places: u32,
    pub min_interests: u32,
    pub max_interests: u32,
    pub require_stay_dates: bool,
    pub dispersion_days: u32,
    pub notification_email: Option<String>,
    pub reply_email: Option<String>,
    pub accepts_disability: bool,
    pub disability_notice: Option<String>,
}

/// Partial update. `None` leaves a field unchanged; for optional
/// fields, `Some(None)` clears the stored value. The short code is not
/// updatable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDestination {
    pub parent_code: Option<Option<String>>,
    pub iga_code: Option<Option<String>>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub logo_path: Option<Option<String>>,
    pub email_label: Option<String>,
    pub status: Option<EntityStatus>,
    pub manager: Option<Option<Uuid>>,
    pub referent: Option<Option<Uuid>>,
    pub matcher: Option<Option<Uuid>>,
    pub matcher_alt: Option<Option<Uuid>>,
    pub financier: Option<Option<Uuid>>,
    pub min_places: Option<u32>,
    pub max_places: Option<u32>,
    pub min_interests: Option<u32>,
    pub max_interests: Option<u32>,
    pub require_stay_dates: Option<bool>,
    pub dispersion_days: Option<u32>,
    pub notification_email: Option<Option<String>>,
    pub reply_email: Option<Option<String>>,
    pub accepts_disability: Option<bool>,
    pub disability_notice: Option<Option<String>>,
}

/// Functional configuration, one row per destination, replaced as a
/// whole when the configuration form is saved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestinationData {
    pub destination_id: Uuid,
    pub donation_recipient: Option<String>,
    pub donation_amount: Option<u32>,
    pub paypal_url: Option<String>,
    pub donation_text: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub comm_langs: Vec<String>,
    pub spoken_langs: Vec<String>,
    pub default_lang: String,
    pub auto_handling: bool,
    pub request_wall_open: bool,
    pub ask_visitor_comment: bool,
    pub visitor_comment_prompt: Option<String>,
    pub closure_active: bool,
    pub closure_start: Option<NaiveDate>,
    pub closure_end: Option<NaiveDate>,
    pub closure_text: Option<String>,
    pub closure_max_participants: u32,
    pub signature_name: Option<String>,
    pub signature_url: Option<String>,
    pub signature_social_label_1: Option<String>,
    pub signature_social_url_1: Option<String>,
    pub signature_social_label_2: Option<String>,
    pub signature_social_url_2: Option<String>,
    pub signature_tagline: Option<String>,
    pub footer_title: Option<String>,
    pub footer_text: Option<String>,
    pub footer_start: Option<NaiveDate>,
    pub footer_end: Option<NaiveDate>,
}

/// Booking-lifecycle timings, one row per destination. All values are
/// day counts or frequencies in days.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestinationFlux {
    pub destination_id: Uuid,
    pub early_mail_frequency: u32,
    pub early_confirmation_days: u32,
    pub treatment_days: u32,
    pub urgency_days: u32,
    pub min_organisation_days: u32,
    pub greeter_reply_deadline: u32,
    pub greeter_reminder_frequency: u32,
    pub visitor_reply_deadline: u32,
    pub visitor_reminder_frequency: u32,
    pub pre_walk_reminder_days: u32,
    pub manual_entry_days: u32,
    pub report_deadline: u32,
    pub report_reminder_frequency: u32,
    pub review_request_days: u32,
    pub review_reminder_frequency: u32,
    pub review_deadline: u32,
    pub retention_days: u32,
}
