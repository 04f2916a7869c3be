//! Integration tests for the EmailTemplate repository using in-memory
//! SurrealDB.

use greetnet_core::error::GreetnetError;
use greetnet_core::models::email::{CreateEmailTemplate, codes};
use greetnet_core::repository::EmailTemplateRepository;
use greetnet_db::repository::SurrealEmailTemplateRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    greetnet_db::run_migrations(&db).await.unwrap();
    db
}

fn template(code: &str, lang: &str, provider_id: i64) -> CreateEmailTemplate {
    CreateEmailTemplate {
        code: code.into(),
        name: format!("{code} ({lang})"),
        lang: lang.into(),
        provider_template_id: provider_id,
    }
}

#[tokio::test]
async fn get_resolves_by_code_and_language() {
    let db = setup().await;
    let repo = SurrealEmailTemplateRepository::new(db);

    repo.create(template(codes::SET_PASSWORD, "fr", 101)).await.unwrap();
    repo.create(template(codes::SET_PASSWORD, "en-gb", 102)).await.unwrap();

    let fr = repo.get(codes::SET_PASSWORD, "fr").await.unwrap();
    assert_eq!(fr.provider_template_id, 101);

    let en = repo.get(codes::SET_PASSWORD, "en-gb").await.unwrap();
    assert_eq!(en.provider_template_id, 102);

    let err = repo.get(codes::SET_PASSWORD, "de").await.unwrap_err();
    assert!(matches!(err, GreetnetError::NotFound { .. }));
}

#[tokio::test]
async fn duplicate_code_lang_pair_is_rejected() {
    let db = setup().await;
    let repo = SurrealEmailTemplateRepository::new(db);

    repo.create(template(codes::PROFILE_MODIFIED, "fr", 201)).await.unwrap();
    let err = repo
        .create(template(codes::PROFILE_MODIFIED, "fr", 202))
        .await
        .unwrap_err();
    assert!(matches!(err, GreetnetError::AlreadyExists { .. }));
}

#[tokio::test]
async fn list_returns_all_templates_ordered() {
    let db = setup().await;
    let repo = SurrealEmailTemplateRepository::new(db);

    repo.create(template(codes::RESET_PASSWORD, "fr", 301)).await.unwrap();
    repo.create(template(codes::PROFILE_MODIFIED, "fr", 302)).await.unwrap();

    let all = repo.list().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].code, codes::PROFILE_MODIFIED);
    assert_eq!(all[1].code, codes::RESET_PASSWORD);
}
