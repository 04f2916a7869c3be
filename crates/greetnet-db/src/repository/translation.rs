//! SurrealDB implementation of [`TranslationRepository`].
//!
//! Field names are interpolated into the query text, so every name is
//! checked against a fixed allow-list first. The list also resolves
//! which table carries the field: destination prose lives partly on
//! `destination` and partly on `destination_data`, both keyed by the
//! destination UUID.

use std::collections::BTreeMap;

use greetnet_core::error::{GreetnetError, GreetnetResult};
use greetnet_core::models::entity::EntityRef;
use greetnet_core::repository::TranslationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

const CLUSTER_FIELDS: &[&str] = &["description"];

const DESTINATION_FIELDS: &[&str] = &["description", "disability_notice"];

const DESTINATION_DATA_FIELDS: &[&str] = &[
    "donation_text",
    "visitor_comment_prompt",
    "closure_text",
    "signature_tagline",
    "footer_title",
    "footer_text",
];

fn resolve_table(entity: EntityRef, field: &str) -> GreetnetResult<&'static str> {
    let table = match entity {
        EntityRef::Cluster(_) if CLUSTER_FIELDS.contains(&field) => "cluster",
        EntityRef::Destination(_) if DESTINATION_FIELDS.contains(&field) => "destination",
        EntityRef::Destination(_) if DESTINATION_DATA_FIELDS.contains(&field) => {
            "destination_data"
        }
        _ => {
            return Err(GreetnetError::Internal(format!(
                "field '{field}' of {entity} is not translatable"
            )));
        }
    };
    Ok(table)
}

#[derive(Debug, SurrealValue)]
struct ValueRow {
    value: Option<String>,
}

/// SurrealDB implementation of the Translation repository.
#[derive(Clone)]
pub struct SurrealTranslationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTranslationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TranslationRepository for SurrealTranslationRepository<C> {
    async fn load_field(&self, entity: EntityRef, field: &str) -> GreetnetResult<Option<String>> {
        let table = resolve_table(entity, field)?;

        // Field name is from the allow-list above, safe to inline.
        let query = format!("SELECT {field} AS value FROM type::record($table, $id)");

        let mut result = self
            .db
            .query(&query)
            .bind(("table", table.to_string()))
            .bind(("id", entity.uuid().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ValueRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().and_then(|row| row.value))
    }

    async fn store_field_translations(
        &self,
        entity: EntityRef,
        field: &str,
        translations: BTreeMap<String, String>,
    ) -> GreetnetResult<()> {
        let table = resolve_table(entity, field)?;

        let query = format!("UPDATE type::record($table, $id) SET {field}_i18n = $translations");

        let result = self
            .db
            .query(&query)
            .bind(("table", table.to_string()))
            .bind(("id", entity.uuid().to_string()))
            .bind(("translations", translations))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| DbError::from_write(table, e))?;

        Ok(())
    }
}
