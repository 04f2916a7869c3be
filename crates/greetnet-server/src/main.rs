//! GreetNet server entry point.
//!
//! Wires configuration, the database connection and the schema
//! migrations, then idles until shutdown. The HTTP surface sits on top
//! of `greetnet-service` and is deployed separately.

use greetnet_db::{DbConfig, DbManager};
use greetnet_service::config::ServiceConfig;
use greetnet_service::email::MailjetMailer;
use greetnet_service::translate::DeepLTranslator;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("greetnet=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting GreetNet server...");

    let db_config = DbConfig::from_env();
    let manager = match DbManager::connect(&db_config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Database connection failed");
            std::process::exit(1);
        }
    };

    if let Err(e) = greetnet_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Schema migration failed");
        std::process::exit(1);
    }

    let config = ServiceConfig::from_env();
    let translator = config
        .deepl_api_key
        .clone()
        .map(|key| DeepLTranslator::new(config.deepl_api_url.clone(), key));
    let mailer = match (&config.mailjet_api_key, &config.mailjet_api_secret) {
        (Some(key), Some(secret)) => {
            Some(MailjetMailer::new(key, secret, config.mail_from.clone()))
        }
        _ => None,
    };
    tracing::info!(
        translation_configured = translator.is_some(),
        mail_configured = mailer.is_some(),
        "GreetNet server ready"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Shutdown signal handler failed");
    }

    tracing::info!("GreetNet server stopped.");
}
