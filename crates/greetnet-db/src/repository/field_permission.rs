//! SurrealDB implementation of [`FieldPermissionRepository`].

use chrono::{DateTime, Utc};
use greetnet_core::error::GreetnetResult;
use greetnet_core::models::entity::EntityRef;
use greetnet_core::models::permission::FieldPermission;
use greetnet_core::models::role::Role;
use greetnet_core::repository::FieldPermissionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

fn parse_role(s: &str) -> Result<Role, DbError> {
    Role::parse(s).ok_or_else(|| DbError::Migration(format!("unknown role: {s}")))
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct FieldPermissionRow {
    record_id: String,
    target_table: String,
    target_id: String,
    field_name: String,
    target_role: String,
    is_editable: bool,
    granted_by: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FieldPermissionRow {
    fn try_into_permission(self) -> Result<FieldPermission, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let target_uuid = Uuid::parse_str(&self.target_id)
            .map_err(|e| DbError::Migration(format!("invalid target UUID: {e}")))?;
        let target = EntityRef::from_parts(&self.target_table, target_uuid).ok_or_else(|| {
            DbError::Migration(format!("unknown target table: {}", self.target_table))
        })?;
        let granted_by = self
            .granted_by
            .iter()
            .map(|r| parse_role(r))
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(FieldPermission {
            id,
            target,
            field_name: self.field_name,
            target_role: parse_role(&self.target_role)?,
            is_editable: self.is_editable,
            granted_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the FieldPermission repository.
#[derive(Clone)]
pub struct SurrealFieldPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealFieldPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_row(
        &self,
        target: EntityRef,
        field_name: &str,
        target_role: Role,
    ) -> Result<Option<FieldPermission>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM field_permission \
                 WHERE target_table = $table AND target_id = $target \
                 AND field_name = $field AND target_role = $role",
            )
            .bind(("table", target.table().to_string()))
            .bind(("target", target.uuid().to_string()))
            .bind(("field", field_name.to_string()))
            .bind(("role", target_role.as_str().to_string()))
            .await?;

        let rows: Vec<FieldPermissionRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(FieldPermissionRow::try_into_permission)
            .transpose()
    }
}

impl<C: Connection> FieldPermissionRepository for SurrealFieldPermissionRepository<C> {
    async fn list_for(&self, target: EntityRef, role: Role) -> GreetnetResult<Vec<FieldPermission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM field_permission \
                 WHERE target_table = $table AND target_id = $target \
                 AND target_role = $role \
                 ORDER BY field_name ASC",
            )
            .bind(("table", target.table().to_string()))
            .bind(("target", target.uuid().to_string()))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FieldPermissionRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(FieldPermissionRow::try_into_permission)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn upsert(
        &self,
        target: EntityRef,
        field_name: &str,
        target_role: Role,
        is_editable: bool,
        granted_by: &[Role],
    ) -> GreetnetResult<FieldPermission> {
        let existing = self.find_row(target, field_name, target_role).await?;

        match existing {
            Some(permission) => {
                // Merge granting roles without duplicates.
                let mut merged = permission.granted_by.clone();
                for role in granted_by {
                    if !merged.contains(role) {
                        merged.push(*role);
                    }
                }
                let merged_strs: Vec<String> =
                    merged.iter().map(|r| r.as_str().to_string()).collect();

                let result = self
                    .db
                    .query(
                        "UPDATE type::record('field_permission', $id) SET \
                         is_editable = $is_editable, \
                         granted_by = $granted_by, \
                         updated_at = time::now()",
                    )
                    .bind(("id", permission.id.to_string()))
                    .bind(("is_editable", is_editable))
                    .bind(("granted_by", merged_strs))
                    .await
                    .map_err(DbError::from)?;

                result
                    .check()
                    .map_err(|e| DbError::from_write("field_permission", e))?;
            }
            None => {
                let id = Uuid::new_v4();
                let granted_strs: Vec<String> =
                    granted_by.iter().map(|r| r.as_str().to_string()).collect();

                let result = self
                    .db
                    .query(
                        "CREATE type::record('field_permission', $id) SET \
                         target_table = $table, target_id = $target, \
                         field_name = $field, target_role = $role, \
                         is_editable = $is_editable, \
                         granted_by = $granted_by",
                    )
                    .bind(("id", id.to_string()))
                    .bind(("table", target.table().to_string()))
                    .bind(("target", target.uuid().to_string()))
                    .bind(("field", field_name.to_string()))
                    .bind(("role", target_role.as_str().to_string()))
                    .bind(("is_editable", is_editable))
                    .bind(("granted_by", granted_strs))
                    .await
                    .map_err(DbError::from)?;

                result
                    .check()
                    .map_err(|e| DbError::from_write("field_permission", e))?;
            }
        }

        let row = self
            .find_row(target, field_name, target_role)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "field_permission".into(),
                id: format!("{target} {field_name} {}", target_role.as_str()),
            })?;

        Ok(row)
    }

    async fn delete_stale(
        &self,
        target: EntityRef,
        keep_fields: &[String],
    ) -> GreetnetResult<u64> {
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM field_permission \
                 WHERE target_table = $table AND target_id = $target \
                 AND field_name NOT IN $keep GROUP ALL",
            )
            .bind(("table", target.table().to_string()))
            .bind(("target", target.uuid().to_string()))
            .bind(("keep", keep_fields.to_vec()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let stale = count_rows.first().map(|r| r.total).unwrap_or(0);

        if stale > 0 {
            self.db
                .query(
                    "DELETE field_permission \
                     WHERE target_table = $table AND target_id = $target \
                     AND field_name NOT IN $keep",
                )
                .bind(("table", target.table().to_string()))
                .bind(("target", target.uuid().to_string()))
                .bind(("keep", keep_fields.to_vec()))
                .await
                .map_err(DbError::from)?;
        }

        Ok(stale)
    }
}
