//! SurrealDB implementation of [`ClusterRepository`].
//!
//! Short codes are upper-cased on the way in and never touched by
//! updates.

use chrono::{DateTime, Utc};
use greetnet_core::error::GreetnetResult;
use greetnet_core::models::cluster::{Cluster, CreateCluster, EntityStatus, UpdateCluster};
use greetnet_core::repository::{ClusterRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

pub(crate) fn parse_status(s: &str) -> Result<EntityStatus, DbError> {
    EntityStatus::parse(s).ok_or_else(|| DbError::Migration(format!("unknown status: {s}")))
}

fn parse_holder(value: Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    value
        .map(|v| {
            Uuid::parse_str(&v)
                .map_err(|e| DbError::Migration(format!("invalid {field} UUID: {e}")))
        })
        .transpose()
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ClusterRow {
    code: String,
    name: String,
    status: String,
    address: String,
    description: String,
    paypal_url: Option<String>,
    admin: Option<String>,
    admin_alt: Option<String>,
    max_participants: u32,
    backup_email: Option<String>,
    library_url: Option<String>,
    greeter_library_url: Option<String>,
    comm_langs: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct ClusterRowWithId {
    record_id: String,
    code: String,
    name: String,
    status: String,
    address: String,
    description: String,
    paypal_url: Option<String>,
    admin: Option<String>,
    admin_alt: Option<String>,
    max_participants: u32,
    backup_email: Option<String>,
    library_url: Option<String>,
    greeter_library_url: Option<String>,
    comm_langs: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ClusterRow {
    fn try_into_cluster(self, id: Uuid) -> Result<Cluster, DbError> {
        Ok(Cluster {
            id,
            code: self.code,
            name: self.name,
            status: parse_status(&self.status)?,
            address: self.address,
            description: self.description,
            paypal_url: self.paypal_url,
            admin: parse_holder(self.admin, "admin")?,
            admin_alt: parse_holder(self.admin_alt, "admin_alt")?,
            max_participants: self.max_participants,
            backup_email: self.backup_email,
            library_url: self.library_url,
            greeter_library_url: self.greeter_library_url,
            comm_langs: self.comm_langs,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ClusterRowWithId {
    fn try_into_cluster(self) -> Result<Cluster, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Cluster {
            id,
            code: self.code,
            name: self.name,
            status: parse_status(&self.status)?,
            address: self.address,
            description: self.description,
            paypal_url: self.paypal_url,
            admin: parse_holder(self.admin, "admin")?,
            admin_alt: parse_holder(self.admin_alt, "admin_alt")?,
            max_participants: self.max_participants,
            backup_email: self.backup_email,
            library_url: self.library_url,
            greeter_library_url: self.greeter_library_url,
            comm_langs: self.comm_langs,
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

/// SurrealDB implementation of the Cluster repository.
#[derive(Clone)]
pub struct SurrealClusterRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealClusterRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ClusterRepository for SurrealClusterRepository<C> {
    async fn create(&self, input: CreateCluster) -> GreetnetResult<Cluster> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('cluster', $id) SET \
                 code = $code, name = $name, status = $status, \
                 address = $address, description = $description, \
                 paypal_url = $paypal_url, \
                 admin = $admin, admin_alt = $admin_alt, \
                 max_participants = $max_participants, \
                 backup_email = $backup_email, \
                 library_url = $library_url, \
                 greeter_library_url = $greeter_library_url, \
                 comm_langs = $comm_langs",
            )
            .bind(("id", id_str.clone()))
            .bind(("code", input.code.to_uppercase()))
            .bind(("name", input.name))
            .bind(("status", input.status.as_str().to_string()))
            .bind(("address", input.address))
            .bind(("description", input.description))
            .bind(("paypal_url", input.paypal_url))
            .bind(("admin", input.admin.map(|u| u.to_string())))
            .bind(("admin_alt", input.admin_alt.map(|u| u.to_string())))
            .bind(("max_participants", input.max_participants))
            .bind(("backup_email", input.backup_email))
            .bind(("library_url", input.library_url))
            .bind(("greeter_library_url", input.greeter_library_url))
            .bind(("comm_langs", input.comm_langs))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("cluster", e))?;

        let rows: Vec<ClusterRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "cluster".into(),
            id: id_str,
        })?;

        Ok(row.try_into_cluster(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> GreetnetResult<Cluster> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('cluster', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClusterRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "cluster".into(),
            id: id_str,
        })?;

        Ok(row.try_into_cluster(id)?)
    }

    async fn get_by_code(&self, code: &str) -> GreetnetResult<Cluster> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM cluster \
                 WHERE code = $code",
            )
            .bind(("code", code.to_uppercase()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClusterRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "cluster".into(),
            id: format!("code={code}"),
        })?;

        Ok(row.try_into_cluster()?)
    }

    async fn update(&self, id: Uuid, input: UpdateCluster) -> GreetnetResult<Cluster> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.paypal_url.is_some() {
            sets.push("paypal_url = $paypal_url");
        }
        if input.admin.is_some() {
            sets.push("admin = $admin");
        }
        if input.admin_alt.is_some() {
            sets.push("admin_alt = $admin_alt");
        }
        if input.max_participants.is_some() {
            sets.push("max_participants = $max_participants");
        }
        if input.backup_email.is_some() {
            sets.push("backup_email = $backup_email");
        }
        if input.library_url.is_some() {
            sets.push("library_url = $library_url");
        }
        if input.greeter_library_url.is_some() {
            sets.push("greeter_library_url = $greeter_library_url");
        }
        if input.comm_langs.is_some() {
            sets.push("comm_langs = $comm_langs");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('cluster', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(paypal_url) = input.paypal_url {
            builder = builder.bind(("paypal_url", paypal_url));
        }
        if let Some(admin) = input.admin {
            builder = builder.bind(("admin", admin.map(|u| u.to_string())));
        }
        if let Some(admin_alt) = input.admin_alt {
            builder = builder.bind(("admin_alt", admin_alt.map(|u| u.to_string())));
        }
        if let Some(max_participants) = input.max_participants {
            builder = builder.bind(("max_participants", max_participants));
        }
        if let Some(backup_email) = input.backup_email {
            builder = builder.bind(("backup_email", backup_email));
        }
        if let Some(library_url) = input.library_url {
            builder = builder.bind(("library_url", library_url));
        }
        if let Some(greeter_library_url) = input.greeter_library_url {
            builder = builder.bind(("greeter_library_url", greeter_library_url));
        }
        if let Some(comm_langs) = input.comm_langs {
            builder = builder.bind(("comm_langs", comm_langs));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("cluster", e))?;

        let rows: Vec<ClusterRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "cluster".into(),
            id: id_str,
        })?;

        Ok(row.try_into_cluster(id)?)
    }

    async fn delete(&self, id: Uuid) -> GreetnetResult<()> {
        self.db
            .query("DELETE type::record('cluster', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> GreetnetResult<PaginatedResult<Cluster>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM cluster GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM cluster \
                 ORDER BY code ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClusterRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_cluster())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
