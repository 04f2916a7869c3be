//! Integration tests for the effect executors, with recording stubs in
//! place of the translation and mail providers.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use greetnet_core::models::cluster::{CreateCluster, EntityStatus};
use greetnet_core::models::destination::CreateDestination;
use greetnet_core::models::email::{CreateEmailTemplate, codes};
use greetnet_core::models::entity::EntityRef;
use greetnet_core::models::user::CreateUser;
use greetnet_core::repository::{
    ClusterRepository, DestinationRepository, EmailTemplateRepository, UserRepository,
};
use greetnet_db::repository::{
    SurrealClusterRepository, SurrealDestinationRepository, SurrealEmailTemplateRepository,
    SurrealTagRepository, SurrealTranslationRepository, SurrealUserRepository,
};
use greetnet_service::config::ServiceConfig;
use greetnet_service::effects::{Effect, RetryPolicy};
use greetnet_service::email::{MailError, Mailer, OutboundMail};
use greetnet_service::jobs::{JobContext, spawn_all};
use greetnet_service::translate::{TranslateError, Translator};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

#[derive(Clone, Default)]
struct RecordingTranslator {
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl Translator for RecordingTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), target_lang.to_string()));
        Ok(format!("[{target_lang}] {text}"))
    }
}

#[derive(Clone, Default)]
struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutboundMail>>>,
}

impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutboundMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

type Context = JobContext<
    SurrealTranslationRepository<Db>,
    SurrealTagRepository<Db>,
    SurrealUserRepository<Db>,
    SurrealEmailTemplateRepository<Db>,
    RecordingTranslator,
    RecordingMailer,
>;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    greetnet_db::run_migrations(&db).await.unwrap();
    db
}

fn context(
    db: &Surreal<Db>,
    translator: Option<RecordingTranslator>,
    mailer: Option<RecordingMailer>,
) -> Context {
    JobContext {
        translations: SurrealTranslationRepository::new(db.clone()),
        tags: SurrealTagRepository::new(db.clone()),
        users: SurrealUserRepository::new(db.clone()),
        templates: SurrealEmailTemplateRepository::new(db.clone()),
        translator,
        mailer,
        config: ServiceConfig::default(),
        retry: RetryPolicy::default(),
    }
}

async fn seed_cluster(db: &Surreal<Db>, description: &str) -> Uuid {
    SurrealClusterRepository::new(db.clone())
        .create(CreateCluster {
            code: "NAN".into(),
            name: "Loire Valley".into(),
            status: EntityStatus::Active,
            address: "Nantes".into(),
            description: description.into(),
            paypal_url: None,
            admin: None,
            admin_alt: None,
            max_participants: 4,
            backup_email: None,
            library_url: None,
            greeter_library_url: None,
            comm_langs: vec!["fr".into()],
        })
        .await
        .unwrap()
        .id
}

#[derive(Debug, SurrealValue)]
struct ShadowRow {
    value: Option<String>,
}

async fn shadow_value(db: &Surreal<Db>, table: &str, id: Uuid, path: &str) -> Option<String> {
    let mut result = db
        .query(format!(
            "SELECT {path} AS value FROM type::record('{table}', $id)"
        ))
        .bind(("id", id.to_string()))
        .await
        .unwrap();
    let row: Option<ShadowRow> = result.take(0).unwrap();
    row.and_then(|r| r.value)
}

#[tokio::test]
async fn empty_source_text_makes_no_provider_call() {
    let db = setup().await;
    let id = seed_cluster(&db, "   ").await;
    let translator = RecordingTranslator::default();
    let ctx = context(&db, Some(translator.clone()), None);

    ctx.translate_field(EntityRef::Cluster(id), "description")
        .await
        .unwrap();

    assert!(translator.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn translations_are_stored_under_underscored_keys() {
    let db = setup().await;
    let id = seed_cluster(&db, "Bonjour").await;
    let translator = RecordingTranslator::default();
    let ctx = context(&db, Some(translator.clone()), None);

    ctx.translate_field(EntityRef::Cluster(id), "description")
        .await
        .unwrap();

    // One call per configured target language.
    assert_eq!(translator.calls.lock().unwrap().len(), 4);

    let stored = shadow_value(&db, "cluster", id, "description_i18n.en_gb").await;
    assert_eq!(stored.as_deref(), Some("[en-gb] Bonjour"));
    let stored = shadow_value(&db, "cluster", id, "description_i18n.de").await;
    assert_eq!(stored.as_deref(), Some("[de] Bonjour"));
}

#[tokio::test]
async fn comma_lists_are_translated_item_by_item() {
    let db = setup().await;
    let cluster_id = seed_cluster(&db, "").await;
    let dest = SurrealDestinationRepository::new(db.clone())
        .create(CreateDestination {
            cluster_id,
            code: "NANCC".into(),
            parent_code: None,
            iga_code: None,
            name: "City centre".into(),
            description: "historic centre, harbour".into(),
            address: "Nantes".into(),
            region: "Pays de la Loire".into(),
            country: "FR".into(),
            logo_path: None,
            email_label: "Nantes Greeters".into(),
            status: EntityStatus::Active,
            manager: None,
            referent: None,
            matcher: None,
            matcher_alt: None,
            financier: None,
            min_places: 2,
            max_places: 2,
            min_interests: 1,
            max_interests: 1,
            require_stay_dates: false,
            dispersion_days: 0,
            notification_email: None,
            reply_email: None,
            accepts_disability: false,
            disability_notice: None,
        })
        .await
        .unwrap();

    let translator = RecordingTranslator::default();
    let ctx = context(&db, Some(translator.clone()), None);
    ctx.translate_field_items(EntityRef::Destination(dest.id), "description")
        .await
        .unwrap();

    // Two items, four languages.
    assert_eq!(translator.calls.lock().unwrap().len(), 8);

    let stored = shadow_value(&db, "destination", dest.id, "description_i18n.en_gb").await;
    assert_eq!(
        stored.as_deref(),
        Some("[en-gb] historic centre, [en-gb] harbour")
    );
}

#[tokio::test]
async fn template_mail_resolves_the_recipient_language() {
    let db = setup().await;
    let templates = SurrealEmailTemplateRepository::new(db.clone());
    templates
        .create(CreateEmailTemplate {
            code: codes::SET_PASSWORD.into(),
            name: "Set password".into(),
            lang: "fr".into(),
            provider_template_id: 101,
        })
        .await
        .unwrap();
    templates
        .create(CreateEmailTemplate {
            code: codes::SET_PASSWORD.into(),
            name: "Set password".into(),
            lang: "de".into(),
            provider_template_id: 102,
        })
        .await
        .unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let german = users
        .create(CreateUser {
            email: "hans@example.org".into(),
            first_name: "Hans".into(),
            last_name: "Meyer".into(),
            phone: None,
            comm_lang: "de".into(),
            cluster_code: None,
            dest_code: None,
            is_active: true,
        })
        .await
        .unwrap();
    let spanish = users
        .create(CreateUser {
            email: "ines@example.org".into(),
            first_name: "Ines".into(),
            last_name: "Lopez".into(),
            phone: None,
            comm_lang: "es".into(),
            cluster_code: None,
            dest_code: None,
            is_active: true,
        })
        .await
        .unwrap();

    let mailer = RecordingMailer::default();
    let ctx = context(&db, None, Some(mailer.clone()));

    ctx.send_template_email(codes::SET_PASSWORD, german.id, BTreeMap::new())
        .await
        .unwrap();
    // No Spanish template: falls back to the source language.
    ctx.send_template_email(codes::SET_PASSWORD, spanish.id, BTreeMap::new())
        .await
        .unwrap();

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].provider_template_id, 102);
    assert_eq!(sent[0].to_name, "Hans Meyer");
    assert_eq!(sent[1].provider_template_id, 101);
}

#[tokio::test]
async fn unconfigured_providers_turn_effects_into_noops() {
    let db = setup().await;
    let id = seed_cluster(&db, "Bonjour").await;
    let ctx = context(&db, None, None);

    ctx.translate_field(EntityRef::Cluster(id), "description")
        .await
        .unwrap();
    assert_eq!(
        shadow_value(&db, "cluster", id, "description_i18n.en_gb").await,
        None
    );
}

#[tokio::test]
async fn spawned_effects_run_in_the_background() {
    let db = setup().await;
    let templates = SurrealEmailTemplateRepository::new(db.clone());
    templates
        .create(CreateEmailTemplate {
            code: codes::RESET_PASSWORD.into(),
            name: "Reset password".into(),
            lang: "fr".into(),
            provider_template_id: 55,
        })
        .await
        .unwrap();
    let user = SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            email: "ana@example.org".into(),
            first_name: "Ana".into(),
            last_name: "Durand".into(),
            phone: None,
            comm_lang: "fr".into(),
            cluster_code: None,
            dest_code: None,
            is_active: true,
        })
        .await
        .unwrap();

    let mailer = RecordingMailer::default();
    let ctx = Arc::new(context(&db, None, Some(mailer.clone())));
    spawn_all(
        ctx,
        vec![Effect::SendTemplateEmail {
            code: codes::RESET_PASSWORD.into(),
            user_id: user.id,
            variables: BTreeMap::new(),
        }],
    );

    for _ in 0..100 {
        if !mailer.sent.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].provider_template_id, 55);
}
