//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Translatable text fields carry a
//! companion `<field>_i18n` object holding shadow values per language.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Clusters
-- =======================================================================
DEFINE TABLE cluster SCHEMAFULL;
DEFINE FIELD code ON TABLE cluster TYPE string;
DEFINE FIELD name ON TABLE cluster TYPE string;
DEFINE FIELD status ON TABLE cluster TYPE string \
    ASSERT $value IN ['Draft', 'Active', 'Inactive', 'Deactivated'];
DEFINE FIELD address ON TABLE cluster TYPE string;
DEFINE FIELD description ON TABLE cluster TYPE string;
DEFINE FIELD description_i18n ON TABLE cluster TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD paypal_url ON TABLE cluster TYPE option<string>;
DEFINE FIELD admin ON TABLE cluster TYPE option<string>;
DEFINE FIELD admin_alt ON TABLE cluster TYPE option<string>;
DEFINE FIELD max_participants ON TABLE cluster TYPE int;
DEFINE FIELD backup_email ON TABLE cluster TYPE option<string>;
DEFINE FIELD library_url ON TABLE cluster TYPE option<string>;
DEFINE FIELD greeter_library_url ON TABLE cluster TYPE option<string>;
DEFINE FIELD comm_langs ON TABLE cluster TYPE array;
DEFINE FIELD comm_langs.* ON TABLE cluster TYPE string;
DEFINE FIELD created_at ON TABLE cluster TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE cluster TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_cluster_code ON TABLE cluster COLUMNS code UNIQUE;

-- =======================================================================
-- Destinations
-- =======================================================================
DEFINE TABLE destination SCHEMAFULL;
DEFINE FIELD cluster_id ON TABLE destination TYPE string;
DEFINE FIELD code ON TABLE destination TYPE string;
DEFINE FIELD parent_code ON TABLE destination TYPE option<string>;
DEFINE FIELD iga_code ON TABLE destination TYPE option<string>;
DEFINE FIELD name ON TABLE destination TYPE string;
DEFINE FIELD description ON TABLE destination TYPE string;
DEFINE FIELD description_i18n ON TABLE destination TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD address ON TABLE destination TYPE string;
DEFINE FIELD region ON TABLE destination TYPE string;
DEFINE FIELD country ON TABLE destination TYPE string;
DEFINE FIELD logo_path ON TABLE destination TYPE option<string>;
DEFINE FIELD email_label ON TABLE destination TYPE string;
DEFINE FIELD status ON TABLE destination TYPE string \
    ASSERT $value IN ['Draft', 'Active', 'Inactive', 'Deactivated'];
DEFINE FIELD manager ON TABLE destination TYPE option<string>;
DEFINE FIELD referent ON TABLE destination TYPE option<string>;
DEFINE FIELD matcher ON TABLE destination TYPE option<string>;
DEFINE FIELD matcher_alt ON TABLE destination TYPE option<string>;
DEFINE FIELD financier ON TABLE destination TYPE option<string>;
DEFINE FIELD min_places ON TABLE destination TYPE int;
DEFINE FIELD max_places ON TABLE destination TYPE int;
DEFINE FIELD min_interests ON TABLE destination TYPE int;
DEFINE FIELD max_interests ON TABLE destination TYPE int;
DEFINE FIELD require_stay_dates ON TABLE destination TYPE bool \
    DEFAULT false;
DEFINE FIELD dispersion_days ON TABLE destination TYPE int DEFAULT 0;
DEFINE FIELD notification_email ON TABLE destination TYPE option<string>;
DEFINE FIELD reply_email ON TABLE destination TYPE option<string>;
DEFINE FIELD accepts_disability ON TABLE destination TYPE bool \
    DEFAULT false;
DEFINE FIELD disability_notice ON TABLE destination TYPE option<string>;
DEFINE FIELD disability_notice_i18n ON TABLE destination \
    TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE destination TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE destination TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_destination_code ON TABLE destination \
    COLUMNS code UNIQUE;
DEFINE INDEX idx_destination_cluster ON TABLE destination \
    COLUMNS cluster_id;

-- =======================================================================
-- Destination functional configuration (one row per destination)
-- =======================================================================
DEFINE TABLE destination_data SCHEMAFULL;
DEFINE FIELD destination_id ON TABLE destination_data TYPE string;
DEFINE FIELD donation_recipient ON TABLE destination_data \
    TYPE option<string>;
DEFINE FIELD donation_amount ON TABLE destination_data TYPE option<int>;
DEFINE FIELD paypal_url ON TABLE destination_data TYPE option<string>;
DEFINE FIELD donation_text ON TABLE destination_data TYPE option<string>;
DEFINE FIELD donation_text_i18n ON TABLE destination_data \
    TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD facebook_url ON TABLE destination_data TYPE option<string>;
DEFINE FIELD instagram_url ON TABLE destination_data TYPE option<string>;
DEFINE FIELD comm_langs ON TABLE destination_data TYPE array;
DEFINE FIELD comm_langs.* ON TABLE destination_data TYPE string;
DEFINE FIELD spoken_langs ON TABLE destination_data TYPE array;
DEFINE FIELD spoken_langs.* ON TABLE destination_data TYPE string;
DEFINE FIELD default_lang ON TABLE destination_data TYPE string;
DEFINE FIELD auto_handling ON TABLE destination_data TYPE bool \
    DEFAULT false;
DEFINE FIELD request_wall_open ON TABLE destination_data TYPE bool \
    DEFAULT true;
DEFINE FIELD ask_visitor_comment ON TABLE destination_data TYPE bool \
    DEFAULT false;
DEFINE FIELD visitor_comment_prompt ON TABLE destination_data \
    TYPE option<string>;
DEFINE FIELD visitor_comment_prompt_i18n ON TABLE destination_data \
    TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD closure_active ON TABLE destination_data TYPE bool \
    DEFAULT false;
DEFINE FIELD closure_start ON TABLE destination_data TYPE option<string>;
DEFINE FIELD closure_end ON TABLE destination_data TYPE option<string>;
DEFINE FIELD closure_text ON TABLE destination_data TYPE option<string>;
DEFINE FIELD closure_text_i18n ON TABLE destination_data \
    TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD closure_max_participants ON TABLE destination_data \
    TYPE int DEFAULT 0;
DEFINE FIELD signature_name ON TABLE destination_data \
    TYPE option<string>;
DEFINE FIELD signature_url ON TABLE destination_data TYPE option<string>;
DEFINE FIELD signature_social_label_1 ON TABLE destination_data \
    TYPE option<string>;
DEFINE FIELD signature_social_url_1 ON TABLE destination_data \
    TYPE option<string>;
DEFINE FIELD signature_social_label_2 ON TABLE destination_data \
    TYPE option<string>;
DEFINE FIELD signature_social_url_2 ON TABLE destination_data \
    TYPE option<string>;
DEFINE FIELD signature_tagline ON TABLE destination_data \
    TYPE option<string>;
DEFINE FIELD signature_tagline_i18n ON TABLE destination_data \
    TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD footer_title ON TABLE destination_data TYPE option<string>;
DEFINE FIELD footer_title_i18n ON TABLE destination_data \
    TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD footer_text ON TABLE destination_data TYPE option<string>;
DEFINE FIELD footer_text_i18n ON TABLE destination_data \
    TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD footer_start ON TABLE destination_data TYPE option<string>;
DEFINE FIELD footer_end ON TABLE destination_data TYPE option<string>;
DEFINE INDEX idx_destination_data_dest ON TABLE destination_data \
    COLUMNS destination_id UNIQUE;

-- =======================================================================
-- Destination flux timings (one row per destination)
-- =======================================================================
DEFINE TABLE destination_flux SCHEMAFULL;
DEFINE FIELD destination_id ON TABLE destination_flux TYPE string;
DEFINE FIELD early_mail_frequency ON TABLE destination_flux TYPE int \
    DEFAULT 0;
DEFINE FIELD early_confirmation_days ON TABLE destination_flux TYPE int \
    DEFAULT 0;
DEFINE FIELD treatment_days ON TABLE destination_flux TYPE int DEFAULT 0;
DEFINE FIELD urgency_days ON TABLE destination_flux TYPE int DEFAULT 0;
DEFINE FIELD min_organisation_days ON TABLE destination_flux TYPE int \
    DEFAULT 0;
DEFINE FIELD greeter_reply_deadline ON TABLE destination_flux TYPE int \
    DEFAULT 0;
DEFINE FIELD greeter_reminder_frequency ON TABLE destination_flux \
    TYPE int DEFAULT 0;
DEFINE FIELD visitor_reply_deadline ON TABLE destination_flux TYPE int \
    DEFAULT 0;
DEFINE FIELD visitor_reminder_frequency ON TABLE destination_flux \
    TYPE int DEFAULT 0;
DEFINE FIELD pre_walk_reminder_days ON TABLE destination_flux TYPE int \
    DEFAULT 0;
DEFINE FIELD manual_entry_days ON TABLE destination_flux TYPE int \
    DEFAULT 0;
DEFINE FIELD report_deadline ON TABLE destination_flux TYPE int \
    DEFAULT 0;
DEFINE FIELD report_reminder_frequency ON TABLE destination_flux \
    TYPE int DEFAULT 0;
DEFINE FIELD review_request_days ON TABLE destination_flux TYPE int \
    DEFAULT 0;
DEFINE FIELD review_reminder_frequency ON TABLE destination_flux \
    TYPE int DEFAULT 0;
DEFINE FIELD review_deadline ON TABLE destination_flux TYPE int \
    DEFAULT 0;
DEFINE FIELD retention_days ON TABLE destination_flux TYPE int \
    DEFAULT 0;
DEFINE INDEX idx_destination_flux_dest ON TABLE destination_flux \
    COLUMNS destination_id UNIQUE;

-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD first_name ON TABLE user TYPE string;
DEFINE FIELD last_name ON TABLE user TYPE string;
DEFINE FIELD phone ON TABLE user TYPE option<string>;
DEFINE FIELD comm_lang ON TABLE user TYPE string;
DEFINE FIELD cluster_code ON TABLE user TYPE option<string>;
DEFINE FIELD dest_code ON TABLE user TYPE option<string>;
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Greeter profiles (one row per user)
-- =======================================================================
DEFINE TABLE greeter SCHEMAFULL;
DEFINE FIELD user_id ON TABLE greeter TYPE string;
DEFINE FIELD address_line_1 ON TABLE greeter TYPE string;
DEFINE FIELD address_line_2 ON TABLE greeter TYPE option<string>;
DEFINE FIELD postal_code ON TABLE greeter TYPE string;
DEFINE FIELD city ON TABLE greeter TYPE string;
DEFINE FIELD landline ON TABLE greeter TYPE option<string>;
DEFINE FIELD birth_date ON TABLE greeter TYPE option<string>;
DEFINE FIELD job ON TABLE greeter TYPE option<string>;
DEFINE FIELD photo_path ON TABLE greeter TYPE option<string>;
DEFINE FIELD away_from ON TABLE greeter TYPE option<string>;
DEFINE FIELD away_until ON TABLE greeter TYPE option<string>;
DEFINE FIELD interests ON TABLE greeter TYPE string DEFAULT '';
DEFINE FIELD experiences ON TABLE greeter TYPE string DEFAULT '';
DEFINE FIELD places ON TABLE greeter TYPE string DEFAULT '';
DEFINE FIELD created_at ON TABLE greeter TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE greeter TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_greeter_user ON TABLE greeter COLUMNS user_id UNIQUE;

-- =======================================================================
-- Tags (shared labels, reference-counted through owns_tag edges)
-- =======================================================================
DEFINE TABLE tag SCHEMAFULL;
DEFINE FIELD kind ON TABLE tag TYPE string \
    ASSERT $value IN ['Experience', 'InterestCenter', 'NoReplyGreeter', \
    'NoReplyVisitor', 'Notoriety', 'Place'];
DEFINE FIELD label ON TABLE tag TYPE string;
DEFINE FIELD translations ON TABLE tag TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE tag TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_tag_kind_label ON TABLE tag COLUMNS kind, label UNIQUE;

-- =======================================================================
-- Field permissions
-- =======================================================================
DEFINE TABLE field_permission SCHEMAFULL;
DEFINE FIELD target_table ON TABLE field_permission TYPE string \
    ASSERT $value IN ['cluster', 'destination'];
DEFINE FIELD target_id ON TABLE field_permission TYPE string;
DEFINE FIELD field_name ON TABLE field_permission TYPE string;
DEFINE FIELD target_role ON TABLE field_permission TYPE string \
    ASSERT $value IN ['SuperAdmin', 'Admin', 'Referent', 'Gestionnaire', \
    'Manager', 'Financier', 'Greeter'];
DEFINE FIELD is_editable ON TABLE field_permission TYPE bool \
    DEFAULT false;
DEFINE FIELD granted_by ON TABLE field_permission TYPE array;
DEFINE FIELD granted_by.* ON TABLE field_permission TYPE string;
DEFINE FIELD created_at ON TABLE field_permission TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE field_permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_field_permission_key ON TABLE field_permission \
    COLUMNS target_table, target_id, field_name, target_role UNIQUE;

-- =======================================================================
-- Role membership
-- =======================================================================
DEFINE TABLE role_member SCHEMAFULL;
DEFINE FIELD user_id ON TABLE role_member TYPE string;
DEFINE FIELD role ON TABLE role_member TYPE string \
    ASSERT $value IN ['SuperAdmin', 'Admin', 'Referent', 'Gestionnaire', \
    'Manager', 'Financier', 'Greeter'];
DEFINE FIELD created_at ON TABLE role_member TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_member_key ON TABLE role_member \
    COLUMNS user_id, role UNIQUE;

-- =======================================================================
-- Email templates
-- =======================================================================
DEFINE TABLE email_template SCHEMAFULL;
DEFINE FIELD code ON TABLE email_template TYPE string;
DEFINE FIELD name ON TABLE email_template TYPE string;
DEFINE FIELD lang ON TABLE email_template TYPE string;
DEFINE FIELD provider_template_id ON TABLE email_template TYPE int;
DEFINE FIELD created_at ON TABLE email_template TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_email_template_code_lang ON TABLE email_template \
    COLUMNS code, lang UNIQUE;

-- =======================================================================
-- Graph Edge Tables (relations)
-- =======================================================================

-- Cluster/Destination -> Tag ownership
DEFINE TABLE owns_tag TYPE RELATION SCHEMAFULL;
DEFINE FIELD kind ON TABLE owns_tag TYPE string \
    ASSERT $value IN ['Experience', 'InterestCenter', 'NoReplyGreeter', \
    'NoReplyVisitor', 'Notoriety', 'Place'];
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
