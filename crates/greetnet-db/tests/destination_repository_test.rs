//! Integration tests for the Destination repository using in-memory
//! SurrealDB, including the one-to-one configuration rows.

use chrono::NaiveDate;
use greetnet_core::models::cluster::{CreateCluster, EntityStatus};
use greetnet_core::models::destination::{
    CreateDestination, DestinationData, DestinationFlux, UpdateDestination,
};
use greetnet_core::repository::{ClusterRepository, DestinationRepository, Pagination};
use greetnet_db::repository::{SurrealClusterRepository, SurrealDestinationRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB, run migrations, create one cluster.
async fn setup() -> (Surreal<surrealdb::engine::local::Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    greetnet_db::run_migrations(&db).await.unwrap();

    let cluster_repo = SurrealClusterRepository::new(db.clone());
    let cluster = cluster_repo
        .create(CreateCluster {
            code: "NAN".into(),
            name: "Nantes".into(),
            status: EntityStatus::Active,
            address: "Nantes, France".into(),
            description: "Walks along the Loire.".into(),
            paypal_url: None,
            admin: None,
            admin_alt: None,
            max_participants: 6,
            backup_email: None,
            library_url: None,
            greeter_library_url: None,
            comm_langs: vec!["fr".into()],
        })
        .await
        .unwrap();

    (db, cluster.id)
}

fn sample_destination(cluster_id: Uuid, code: &str) -> CreateDestination {
    CreateDestination {
        cluster_id,
        code: code.into(),
        parent_code: None,
        iga_code: None,
        name: "Nantes Centre".into(),
        description: "The historic centre.".into(),
        address: "Place Royale".into(),
        region: "Pays de la Loire".into(),
        country: "France".into(),
        logo_path: None,
        email_label: "Nantes Greeters".into(),
        status: EntityStatus::Draft,
        manager: None,
        referent: None,
        matcher: None,
        matcher_alt: None,
        financier: None,
        min_places: 2,
        max_places: 5,
        min_interests: 2,
        max_interests: 4,
        require_stay_dates: false,
        dispersion_days: 3,
        notification_email: None,
        reply_email: None,
        accepts_disability: false,
        disability_notice: None,
    }
}

#[tokio::test]
async fn create_and_get_destination() {
    let (db, cluster_id) = setup().await;
    let repo = SurrealDestinationRepository::new(db);

    let dest = repo
        .create(sample_destination(cluster_id, "nct"))
        .await
        .unwrap();
    assert_eq!(dest.code, "NCT");
    assert_eq!(dest.cluster_id, cluster_id);

    let fetched = repo.get_by_code("NCT").await.unwrap();
    assert_eq!(fetched.id, dest.id);
}

#[tokio::test]
async fn update_holders_and_bounds() {
    let (db, cluster_id) = setup().await;
    let repo = SurrealDestinationRepository::new(db);

    let dest = repo
        .create(sample_destination(cluster_id, "NCT"))
        .await
        .unwrap();

    let manager = Uuid::new_v4();
    let updated = repo
        .update(
            dest.id,
            UpdateDestination {
                manager: Some(Some(manager)),
                max_places: Some(6),
                status: Some(EntityStatus::Active),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.manager, Some(manager));
    assert_eq!(updated.max_places, 6);
    assert_eq!(updated.status, EntityStatus::Active);
    assert_eq!(updated.code, "NCT");
}

#[tokio::test]
async fn list_and_count_by_cluster() {
    let (db, cluster_id) = setup().await;
    let repo = SurrealDestinationRepository::new(db);

    repo.create(sample_destination(cluster_id, "NCT"))
        .await
        .unwrap();
    let mut second = sample_destination(cluster_id, "NER");
    second.name = "Erdre".into();
    repo.create(second).await.unwrap();

    let page = repo
        .list_by_cluster(cluster_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].code, "NCT");

    assert_eq!(repo.count_by_cluster(cluster_id).await.unwrap(), 2);
    assert_eq!(repo.count_by_cluster(Uuid::new_v4()).await.unwrap(), 0);
}

#[tokio::test]
async fn data_row_is_absent_until_first_upsert() {
    let (db, cluster_id) = setup().await;
    let repo = SurrealDestinationRepository::new(db);

    let dest = repo
        .create(sample_destination(cluster_id, "NCT"))
        .await
        .unwrap();

    assert!(repo.get_data(dest.id).await.unwrap().is_none());

    let data = DestinationData {
        destination_id: dest.id,
        default_lang: "fr".into(),
        comm_langs: vec!["fr".into(), "en-gb".into()],
        spoken_langs: vec!["fr".into()],
        closure_active: true,
        closure_start: NaiveDate::from_ymd_opt(2026, 12, 20),
        closure_end: NaiveDate::from_ymd_opt(2027, 1, 5),
        closure_text: Some("Closed over the holidays.".into()),
        ..Default::default()
    };
    repo.upsert_data(data).await.unwrap();

    let stored = repo.get_data(dest.id).await.unwrap().unwrap();
    assert_eq!(stored.default_lang, "fr");
    assert_eq!(stored.closure_start, NaiveDate::from_ymd_opt(2026, 12, 20));

    // Second upsert replaces the row as a whole.
    let replacement = DestinationData {
        destination_id: dest.id,
        default_lang: "en-gb".into(),
        ..Default::default()
    };
    repo.upsert_data(replacement).await.unwrap();

    let stored = repo.get_data(dest.id).await.unwrap().unwrap();
    assert_eq!(stored.default_lang, "en-gb");
    assert!(!stored.closure_active);
    assert!(stored.closure_start.is_none());
}

#[tokio::test]
async fn flux_row_round_trips() {
    let (db, cluster_id) = setup().await;
    let repo = SurrealDestinationRepository::new(db);

    let dest = repo
        .create(sample_destination(cluster_id, "NCT"))
        .await
        .unwrap();

    assert!(repo.get_flux(dest.id).await.unwrap().is_none());

    let flux = DestinationFlux {
        destination_id: dest.id,
        treatment_days: 4,
        urgency_days: 2,
        greeter_reply_deadline: 3,
        retention_days: 365,
        ..Default::default()
    };
    repo.upsert_flux(flux).await.unwrap();

    let stored = repo.get_flux(dest.id).await.unwrap().unwrap();
    assert_eq!(stored.treatment_days, 4);
    assert_eq!(stored.retention_days, 365);
    assert_eq!(stored.early_mail_frequency, 0);
}

#[tokio::test]
async fn delete_removes_configuration_rows_too() {
    let (db, cluster_id) = setup().await;
    let repo = SurrealDestinationRepository::new(db);

    let dest = repo
        .create(sample_destination(cluster_id, "NCT"))
        .await
        .unwrap();
    repo.upsert_flux(DestinationFlux {
        destination_id: dest.id,
        ..Default::default()
    })
    .await
    .unwrap();

    repo.delete(dest.id).await.unwrap();

    assert!(repo.get_by_id(dest.id).await.is_err());
    assert!(repo.get_flux(dest.id).await.unwrap().is_none());
}
