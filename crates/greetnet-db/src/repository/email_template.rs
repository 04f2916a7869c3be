//! SurrealDB implementation of [`EmailTemplateRepository`].

use chrono::{DateTime, Utc};
use greetnet_core::error::GreetnetResult;
use greetnet_core::models::email::{CreateEmailTemplate, EmailTemplate};
use greetnet_core::repository::EmailTemplateRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct EmailTemplateRow {
    record_id: String,
    code: String,
    name: String,
    lang: String,
    provider_template_id: i64,
    created_at: DateTime<Utc>,
}

impl EmailTemplateRow {
    fn try_into_template(self) -> Result<EmailTemplate, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(EmailTemplate {
            id,
            code: self.code,
            name: self.name,
            lang: self.lang,
            provider_template_id: self.provider_template_id,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the EmailTemplate repository.
#[derive(Clone)]
pub struct SurrealEmailTemplateRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealEmailTemplateRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> EmailTemplateRepository for SurrealEmailTemplateRepository<C> {
    async fn create(&self, input: CreateEmailTemplate) -> GreetnetResult<EmailTemplate> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('email_template', $id) SET \
                 code = $code, name = $name, lang = $lang, \
                 provider_template_id = $provider_template_id",
            )
            .bind(("id", id.to_string()))
            .bind(("code", input.code))
            .bind(("name", input.name))
            .bind(("lang", input.lang))
            .bind(("provider_template_id", input.provider_template_id))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_write("email_template", e))?;

        let id_str = id.to_string();
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('email_template', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmailTemplateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "email_template".into(),
            id: id_str,
        })?;

        Ok(row.try_into_template()?)
    }

    async fn get(&self, code: &str, lang: &str) -> GreetnetResult<EmailTemplate> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM email_template \
                 WHERE code = $code AND lang = $lang",
            )
            .bind(("code", code.to_string()))
            .bind(("lang", lang.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmailTemplateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "email_template".into(),
            id: format!("{code}/{lang}"),
        })?;

        Ok(row.try_into_template()?)
    }

    async fn list(&self) -> GreetnetResult<Vec<EmailTemplate>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM email_template \
                 ORDER BY code ASC, lang ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmailTemplateRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(EmailTemplateRow::try_into_template)
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
