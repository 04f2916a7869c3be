//! Database connectivity: environment-driven settings and the shared
//! SurrealDB handle.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

/// Connection settings, normally read from `GREETNET_DB_*` variables.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Endpoint as `host:port`, no scheme.
    pub url: String,
    /// Namespace to select after signing in.
    pub namespace: String,
    /// Database to select within the namespace.
    pub database: String,
    /// Root-level username.
    pub username: String,
    /// Root-level password.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "greetnet".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Read `GREETNET_DB_*` environment variables, keeping the
    /// default for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("GREETNET_DB_URL").unwrap_or(defaults.url),
            namespace: std::env::var("GREETNET_DB_NAMESPACE").unwrap_or(defaults.namespace),
            database: std::env::var("GREETNET_DB_DATABASE").unwrap_or(defaults.database),
            username: std::env::var("GREETNET_DB_USERNAME").unwrap_or(defaults.username),
            password: std::env::var("GREETNET_DB_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

/// Owner of the live database handle; repositories clone the handle
/// out of it.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Open the WebSocket connection, sign in as root, and select the
    /// configured namespace and database.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Database connection established");

        Ok(Self { db })
    }

    /// The live handle; cloning it is cheap.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
