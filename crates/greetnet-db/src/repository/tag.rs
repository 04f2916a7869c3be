//! SurrealDB implementation of [`TagRepository`].
//!
//! Ownership is modelled with `owns_tag` graph edges from a cluster or
//! destination record to a tag record. The edge carries the tag kind so
//! per-kind replacement never disturbs the entity's other lists.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use greetnet_core::error::GreetnetResult;
use greetnet_core::models::entity::EntityRef;
use greetnet_core::models::tag::{Tag, TagKind};
use greetnet_core::repository::TagRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

fn parse_kind(s: &str) -> Result<TagKind, DbError> {
    TagKind::parse(s).ok_or_else(|| DbError::Migration(format!("unknown tag kind: {s}")))
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TagRow {
    record_id: String,
    kind: String,
    label: String,
    translations: BTreeMap<String, String>,
    created_at: DateTime<Utc>,
}

impl TagRow {
    fn try_into_tag(self) -> Result<Tag, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Tag {
            id,
            kind: parse_kind(&self.kind)?,
            label: self.label,
            translations: self.translations,
            created_at: self.created_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Tag repository.
#[derive(Clone)]
pub struct SurrealTagRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTagRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_by_kind_label(
        &self,
        kind: TagKind,
        label: &str,
    ) -> Result<Option<Tag>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tag \
                 WHERE kind = $kind AND label = $label",
            )
            .bind(("kind", kind.as_str().to_string()))
            .bind(("label", label.to_string()))
            .await?;

        let rows: Vec<TagRow> = result.take(0)?;
        rows.into_iter().next().map(TagRow::try_into_tag).transpose()
    }
}

impl<C: Connection> TagRepository for SurrealTagRepository<C> {
    async fn get_or_create(&self, kind: TagKind, label: &str) -> GreetnetResult<(Tag, bool)> {
        if let Some(tag) = self.find_by_kind_label(kind, label).await? {
            return Ok((tag, false));
        }

        let id = Uuid::new_v4();
        let result = self
            .db
            .query(
                "CREATE type::record('tag', $id) SET \
                 kind = $kind, label = $label, translations = {}",
            )
            .bind(("id", id.to_string()))
            .bind(("kind", kind.as_str().to_string()))
            .bind(("label", label.to_string()))
            .await
            .map_err(DbError::from)?;

        match result.check() {
            Ok(_) => Ok((self.get_by_id(id).await?, true)),
            // Lost a race on the (kind, label) unique index: the row
            // now exists, fetch it.
            Err(e) => match DbError::from_write("tag", e) {
                DbError::AlreadyExists { .. } => {
                    let tag = self
                        .find_by_kind_label(kind, label)
                        .await?
                        .ok_or(DbError::AlreadyExists {
                            entity: "tag".into(),
                        })?;
                    Ok((tag, false))
                }
                other => Err(other.into()),
            },
        }
    }

    async fn get_by_id(&self, id: Uuid) -> GreetnetResult<Tag> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('tag', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TagRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tag".into(),
            id: id_str,
        })?;

        Ok(row.try_into_tag()?)
    }

    async fn owned(&self, owner: EntityRef, kind: TagKind) -> GreetnetResult<Vec<Tag>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(out) AS record_id, out.kind AS kind, \
                 out.label AS label, out.translations AS translations, \
                 out.created_at AS created_at \
                 FROM owns_tag \
                 WHERE in = type::record($table, $owner) AND kind = $kind",
            )
            .bind(("table", owner.table().to_string()))
            .bind(("owner", owner.uuid().to_string()))
            .bind(("kind", kind.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TagRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(TagRow::try_into_tag)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn set_owned(
        &self,
        owner: EntityRef,
        kind: TagKind,
        tag_ids: &[Uuid],
    ) -> GreetnetResult<()> {
        self.db
            .query(
                "DELETE owns_tag \
                 WHERE in = type::record($table, $owner) AND kind = $kind",
            )
            .bind(("table", owner.table().to_string()))
            .bind(("owner", owner.uuid().to_string()))
            .bind(("kind", kind.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        for tag_id in tag_ids {
            let result = self
                .db
                .query(
                    "RELATE (type::record($table, $owner))\
                     ->owns_tag->(type::record('tag', $tag)) \
                     SET kind = $kind",
                )
                .bind(("table", owner.table().to_string()))
                .bind(("owner", owner.uuid().to_string()))
                .bind(("tag", tag_id.to_string()))
                .bind(("kind", kind.as_str().to_string()))
                .await
                .map_err(DbError::from)?;

            result
                .check()
                .map_err(|e| DbError::from_write("owns_tag", e))?;
        }

        Ok(())
    }

    async fn reference_count(&self, tag_id: Uuid) -> GreetnetResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM owns_tag \
                 WHERE out = type::record('tag', $tag) GROUP ALL",
            )
            .bind(("tag", tag_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn delete(&self, tag_id: Uuid) -> GreetnetResult<()> {
        self.db
            .query(
                "DELETE owns_tag WHERE out = type::record('tag', $tag); \
                 DELETE type::record('tag', $tag)",
            )
            .bind(("tag", tag_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn set_translations(
        &self,
        tag_id: Uuid,
        translations: BTreeMap<String, String>,
    ) -> GreetnetResult<()> {
        let result = self
            .db
            .query(
                "UPDATE type::record('tag', $tag) \
                 SET translations = $translations",
            )
            .bind(("tag", tag_id.to_string()))
            .bind(("translations", translations))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_write("tag", e))?;

        Ok(())
    }
}
