//! Integration tests for the destination save flow, the stored field
//! permissions and the configuration blocks.

use std::collections::HashMap;

use greetnet_core::error::GreetnetError;
use greetnet_core::models::cluster::{Cluster, CreateCluster, EntityStatus};
use greetnet_core::models::destination::{CreateDestination, DestinationData, UpdateDestination};
use greetnet_core::models::entity::EntityRef;
use greetnet_core::models::role::Role;
use greetnet_core::models::tag::TagKind;
use greetnet_core::repository::{
    ClusterRepository, DestinationRepository, FieldPermissionRepository, TagRepository,
};
use greetnet_db::repository::{
    SurrealClusterRepository, SurrealDestinationRepository, SurrealFieldPermissionRepository,
    SurrealRoleMembershipRepository, SurrealTagRepository, SurrealUserRepository,
};
use greetnet_service::destination::DestinationService;
use greetnet_service::effects::Effect;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Service = DestinationService<
    SurrealDestinationRepository<Db>,
    SurrealClusterRepository<Db>,
    SurrealUserRepository<Db>,
    SurrealRoleMembershipRepository<Db>,
    SurrealTagRepository<Db>,
    SurrealFieldPermissionRepository<Db>,
>;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    greetnet_db::run_migrations(&db).await.unwrap();
    db
}

fn service(db: &Surreal<Db>) -> Service {
    DestinationService::new(
        SurrealDestinationRepository::new(db.clone()),
        SurrealClusterRepository::new(db.clone()),
        SurrealUserRepository::new(db.clone()),
        SurrealRoleMembershipRepository::new(db.clone()),
        SurrealTagRepository::new(db.clone()),
        SurrealFieldPermissionRepository::new(db.clone()),
    )
}

/// A cluster with two interest-center tags, which caps max_interests.
async fn seed_cluster(db: &Surreal<Db>) -> Cluster {
    let cluster = SurrealClusterRepository::new(db.clone())
        .create(CreateCluster {
            code: "NAN".into(),
            name: "Loire Valley".into(),
            status: EntityStatus::Active,
            address: "Nantes".into(),
            description: String::new(),
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
        .unwrap();

    let tags = SurrealTagRepository::new(db.clone());
    let mut ids = Vec::new();
    for label in ["history", "nature"] {
        let (tag, _) = tags
            .get_or_create(TagKind::InterestCenter, label)
            .await
            .unwrap();
        ids.push(tag.id);
    }
    tags.set_owned(EntityRef::Cluster(cluster.id), TagKind::InterestCenter, &ids)
        .await
        .unwrap();

    cluster
}

fn create_input(cluster_id: Uuid) -> CreateDestination {
    CreateDestination {
        cluster_id,
        code: "NANCC".into(),
        parent_code: None,
        iga_code: None,
        name: "City centre".into(),
        description: "Old town walks".into(),
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
        max_places: 3,
        min_interests: 1,
        max_interests: 2,
        require_stay_dates: false,
        dispersion_days: 3,
        notification_email: None,
        reply_email: None,
        accepts_disability: false,
        disability_notice: None,
    }
}

fn places() -> Vec<String> {
    vec!["old town".into(), "harbour".into(), "market".into()]
}

#[tokio::test]
async fn create_requires_an_admin_role() {
    let db = setup().await;
    let cluster = seed_cluster(&db).await;
    let svc = service(&db);

    let err = svc
        .create(
            &[Role::Gestionnaire],
            create_input(cluster.id),
            places(),
            None,
            &[],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GreetnetError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn max_below_min_rejects_the_whole_save() {
    let db = setup().await;
    let cluster = seed_cluster(&db).await;
    let svc = service(&db);

    let mut input = create_input(cluster.id);
    input.min_places = 3;
    input.max_places = 2;

    let err = svc
        .create(&[Role::Admin], input, places(), None, &[])
        .await
        .unwrap_err();
    match err {
        GreetnetError::Invalid(errors) => assert!(errors.has_field("max_places")),
        other => panic!("expected validation error, got {other:?}"),
    }

    // Nothing was persisted.
    let repo = SurrealDestinationRepository::new(db.clone());
    assert!(matches!(
        repo.get_by_code("NANCC").await.unwrap_err(),
        GreetnetError::NotFound { .. }
    ));
}

#[tokio::test]
async fn interest_cap_is_bounded_by_cluster_tags() {
    let db = setup().await;
    let cluster = seed_cluster(&db).await;
    let svc = service(&db);

    // The cluster only owns two interest-center tags.
    let mut input = create_input(cluster.id);
    input.max_interests = 5;

    let err = svc
        .create(&[Role::Admin], input, places(), None, &[])
        .await
        .unwrap_err();
    match err {
        GreetnetError::Invalid(errors) => assert!(errors.has_field("max_interests")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn toggles_from_non_granting_callers_are_ignored() {
    let db = setup().await;
    let cluster = seed_cluster(&db).await;
    let svc = service(&db);

    let outcome = svc
        .create(&[Role::Admin], create_input(cluster.id), places(), None, &[])
        .await
        .unwrap();
    let target = EntityRef::Destination(outcome.destination.id);

    let mut toggles = HashMap::new();
    toggles.insert("min_places".to_string(), true);
    svc.update(
        &[Role::Gestionnaire],
        outcome.destination.id,
        UpdateDestination::default(),
        places(),
        Some(toggles),
        &[],
    )
    .await
    .unwrap();

    let permissions = SurrealFieldPermissionRepository::new(db.clone());
    assert!(permissions
        .list_for(target, Role::Gestionnaire)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn absent_permission_rows_disable_nothing() {
    let db = setup().await;
    let cluster = seed_cluster(&db).await;
    let svc = service(&db);

    let outcome = svc
        .create(&[Role::Admin], create_input(cluster.id), places(), None, &[])
        .await
        .unwrap();

    // No toggles were ever stored; the restricted caller can still
    // edit their fields.
    let outcome = svc
        .update(
            &[Role::Gestionnaire],
            outcome.destination.id,
            UpdateDestination {
                dispersion_days: Some(7),
                ..Default::default()
            },
            places(),
            None,
            &[],
        )
        .await
        .unwrap();
    assert_eq!(outcome.destination.dispersion_days, 7);
}

#[tokio::test]
async fn stored_toggles_restrict_matcher_updates() {
    let db = setup().await;
    let cluster = seed_cluster(&db).await;
    let svc = service(&db);

    let outcome = svc
        .create(&[Role::Admin], create_input(cluster.id), places(), None, &[])
        .await
        .unwrap();
    let id = outcome.destination.id;

    // The admin enables min_places only; every other toggleable field
    // becomes not-editable.
    let mut toggles = HashMap::new();
    toggles.insert("min_places".to_string(), true);
    svc.update(
        &[Role::Admin],
        id,
        UpdateDestination::default(),
        places(),
        Some(toggles),
        &[],
    )
    .await
    .unwrap();

    let outcome = svc
        .update(
            &[Role::Gestionnaire],
            id,
            UpdateDestination {
                min_places: Some(3),
                dispersion_days: Some(9),
                ..Default::default()
            },
            places(),
            None,
            &[],
        )
        .await
        .unwrap();

    assert_eq!(outcome.destination.min_places, 3, "enabled field applies");
    assert_eq!(outcome.destination.dispersion_days, 3, "disabled field is dropped");
}

#[tokio::test]
async fn data_save_queues_translation_only_for_changed_fields() {
    let db = setup().await;
    let cluster = seed_cluster(&db).await;
    let svc = service(&db);

    let outcome = svc
        .create(&[Role::Admin], create_input(cluster.id), places(), None, &[])
        .await
        .unwrap();

    let data = DestinationData {
        destination_id: outcome.destination.id,
        donation_text: Some("Merci pour votre soutien".into()),
        default_lang: "fr".into(),
        ..Default::default()
    };
    let saved = svc.save_data(&[Role::Manager], data).await.unwrap();
    assert_eq!(saved.effects.len(), 1);
    assert!(matches!(
        &saved.effects[0],
        Effect::TranslateField { field, .. } if field == "donation_text"
    ));

    // Resubmitting the same block queues nothing.
    let again = svc.save_data(&[Role::Manager], saved.data.clone()).await.unwrap();
    assert!(again.effects.is_empty());

    // Changing one prose field queues exactly that field.
    let mut changed = again.data.clone();
    changed.footer_text = Some("Fermé en janvier".into());
    let third = svc.save_data(&[Role::Manager], changed).await.unwrap();
    assert_eq!(third.effects.len(), 1);
    assert!(matches!(
        &third.effects[0],
        Effect::TranslateField { field, .. } if field == "footer_text"
    ));
}

#[tokio::test]
async fn data_save_validates_the_comment_prompt() {
    let db = setup().await;
    let cluster = seed_cluster(&db).await;
    let svc = service(&db);

    let outcome = svc
        .create(&[Role::Admin], create_input(cluster.id), places(), None, &[])
        .await
        .unwrap();

    let data = DestinationData {
        destination_id: outcome.destination.id,
        ask_visitor_comment: true,
        default_lang: "fr".into(),
        ..Default::default()
    };
    let err = svc.save_data(&[Role::Manager], data).await.unwrap_err();
    match err {
        GreetnetError::Invalid(errors) => {
            assert!(errors.has_field("visitor_comment_prompt"))
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_releases_the_places_list() {
    let db = setup().await;
    let cluster = seed_cluster(&db).await;
    let svc = service(&db);
    let tags = SurrealTagRepository::new(db.clone());

    let outcome = svc
        .create(&[Role::Admin], create_input(cluster.id), places(), None, &[])
        .await
        .unwrap();
    let owned = tags
        .owned(EntityRef::Destination(outcome.destination.id), TagKind::Place)
        .await
        .unwrap();
    assert_eq!(owned.len(), 3);
    let place_id = owned[0].id;

    svc.delete(&[Role::Admin], outcome.destination.id).await.unwrap();

    // Sole-owner tags went with the destination.
    assert!(matches!(
        tags.get_by_id(place_id).await.unwrap_err(),
        GreetnetError::NotFound { .. }
    ));
    let repo = SurrealDestinationRepository::new(db.clone());
    assert!(matches!(
        repo.get_by_id(outcome.destination.id).await.unwrap_err(),
        GreetnetError::NotFound { .. }
    ));
}
