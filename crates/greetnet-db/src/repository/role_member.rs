//! SurrealDB implementation of [`RoleMembershipRepository`].
//!
//! Memberships are plain (user, role) rows behind a unique index, so
//! `add` can swallow the duplicate error and stay idempotent.

use greetnet_core::error::GreetnetResult;
use greetnet_core::models::role::Role;
use greetnet_core::repository::RoleMembershipRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RoleRow {
    role: String,
}

/// SurrealDB implementation of the RoleMembership repository.
#[derive(Clone)]
pub struct SurrealRoleMembershipRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleMembershipRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleMembershipRepository for SurrealRoleMembershipRepository<C> {
    async fn add(&self, user_id: Uuid, role: Role) -> GreetnetResult<()> {
        let result = self
            .db
            .query("CREATE role_member SET user_id = $user, role = $role")
            .bind(("user", user_id.to_string()))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        match result.check() {
            Ok(_) => Ok(()),
            Err(e) => match DbError::from_write("role_member", e) {
                // Already a member.
                DbError::AlreadyExists { .. } => Ok(()),
                other => Err(other.into()),
            },
        }
    }

    async fn remove(&self, user_id: Uuid, role: Role) -> GreetnetResult<()> {
        self.db
            .query(
                "DELETE role_member \
                 WHERE user_id = $user AND role = $role",
            )
            .bind(("user", user_id.to_string()))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn roles_of(&self, user_id: Uuid) -> GreetnetResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT role FROM role_member \
                 WHERE user_id = $user ORDER BY role ASC",
            )
            .bind(("user", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                Role::parse(&row.role)
                    .ok_or_else(|| DbError::Migration(format!("unknown role: {}", row.role)))
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
