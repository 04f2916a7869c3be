//! SurrealDB implementation of [`UserRepository`].
//!
//! Pending placeholders (`is_active = false`) are ordinary rows; the
//! adoption query is a single conditional UPDATE so two concurrent
//! saves can never both claim the same placeholder.

use chrono::{DateTime, Utc};
use greetnet_core::error::GreetnetResult;
use greetnet_core::models::user::{CreateUser, UpdateUser, User};
use greetnet_core::repository::{PaginatedResult, Pagination, UserRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    comm_lang: String,
    cluster_code: Option<String>,
    dest_code: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    comm_lang: String,
    cluster_code: Option<String>,
    dest_code: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> User {
        User {
            id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            comm_lang: self.comm_lang,
            cluster_code: self.cluster_code,
            dest_code: self.dest_code,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            comm_lang: self.comm_lang,
            cluster_code: self.cluster_code,
            dest_code: self.dest_code,
            is_active: self.is_active,
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

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> GreetnetResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 email = $email, \
                 first_name = $first_name, last_name = $last_name, \
                 phone = $phone, comm_lang = $comm_lang, \
                 cluster_code = $cluster_code, dest_code = $dest_code, \
                 is_active = $is_active",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("phone", input.phone))
            .bind(("comm_lang", input.comm_lang))
            .bind(("cluster_code", input.cluster_code.map(|c| c.to_uppercase())))
            .bind(("dest_code", input.dest_code.map(|c| c.to_uppercase())))
            .bind(("is_active", input.is_active))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id))
    }

    async fn get_by_id(&self, id: Uuid) -> GreetnetResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id))
    }

    async fn get_by_email(&self, email: &str) -> GreetnetResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $email",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> GreetnetResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.comm_lang.is_some() {
            sets.push("comm_lang = $comm_lang");
        }
        if input.cluster_code.is_some() {
            sets.push("cluster_code = $cluster_code");
        }
        if input.dest_code.is_some() {
            sets.push("dest_code = $dest_code");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        if let Some(phone) = input.phone {
            // Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("phone", phone));
        }
        if let Some(comm_lang) = input.comm_lang {
            builder = builder.bind(("comm_lang", comm_lang));
        }
        if let Some(cluster_code) = input.cluster_code {
            builder = builder.bind(("cluster_code", cluster_code.map(|c| c.to_uppercase())));
        }
        if let Some(dest_code) = input.dest_code {
            builder = builder.bind(("dest_code", dest_code.map(|c| c.to_uppercase())));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id))
    }

    async fn delete(&self, id: Uuid) -> GreetnetResult<()> {
        self.db
            .query("DELETE type::record('user', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> GreetnetResult<PaginatedResult<User>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_by_cluster_code(&self, cluster_code: &str) -> GreetnetResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE cluster_code = $code ORDER BY last_name ASC",
            )
            .bind(("code", cluster_code.to_uppercase()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list_by_dest_code(&self, dest_code: &str) -> GreetnetResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE dest_code = $code ORDER BY last_name ASC",
            )
            .bind(("code", dest_code.to_uppercase()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn adopt_pending(&self, id: Uuid) -> GreetnetResult<User> {
        let id_str = id.to_string();

        // Conditional update: only flips rows that are still pending.
        // An empty result means someone else adopted the row first.
        let mut result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 is_active = true, updated_at = time::now() \
                 WHERE is_active = false",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::AlreadyExists {
            entity: "user (already adopted)".into(),
        })?;

        Ok(row.into_user(id))
    }

    async fn delete_unadopted(&self, ids: &[Uuid]) -> GreetnetResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let id_strs: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE meta::id(id) IN $ids \
                 AND is_active = false AND cluster_code IS NONE \
                 GROUP ALL",
            )
            .bind(("ids", id_strs.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let doomed = count_rows.first().map(|r| r.total).unwrap_or(0);

        if doomed > 0 {
            self.db
                .query(
                    "DELETE user WHERE meta::id(id) IN $ids \
                     AND is_active = false AND cluster_code IS NONE",
                )
                .bind(("ids", id_strs))
                .await
                .map_err(DbError::from)?;
        }

        Ok(doomed)
    }
}
