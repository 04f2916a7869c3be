//! Integration tests for the cluster save flow using in-memory
//! SurrealDB repositories.

use std::collections::HashMap;

use greetnet_core::error::{GreetnetError, GreetnetResult};
use greetnet_core::models::cluster::{CreateCluster, EntityStatus, UpdateCluster};
use greetnet_core::models::email::codes;
use greetnet_core::models::entity::EntityRef;
use greetnet_core::models::role::Role;
use greetnet_core::models::tag::TagKind;
use greetnet_core::models::user::{CreateUser, User};
use greetnet_core::repository::{
    FieldPermissionRepository, RoleMembershipRepository, TagRepository, UserRepository,
};
use greetnet_db::repository::{
    SurrealClusterRepository, SurrealDestinationRepository, SurrealFieldPermissionRepository,
    SurrealRoleMembershipRepository, SurrealTagRepository, SurrealUserRepository,
};
use greetnet_service::cluster::{ClusterService, ClusterTagLists};
use greetnet_service::effects::Effect;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Service = ClusterService<
    SurrealClusterRepository<Db>,
    SurrealDestinationRepository<Db>,
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
    ClusterService::new(
        SurrealClusterRepository::new(db.clone()),
        SurrealDestinationRepository::new(db.clone()),
        SurrealUserRepository::new(db.clone()),
        SurrealRoleMembershipRepository::new(db.clone()),
        SurrealTagRepository::new(db.clone()),
        SurrealFieldPermissionRepository::new(db.clone()),
    )
}

fn tag_lists() -> ClusterTagLists {
    ClusterTagLists {
        experiences: vec!["food tour".into(), "street art".into()],
        interest_centers: vec!["history".into(), "nature".into()],
        no_reply_greeter: vec!["too busy".into()],
        no_reply_visitor: vec!["no show".into()],
        notoriety: vec!["press".into(), "word of mouth".into()],
    }
}

fn create_input(code: &str, admin: Option<Uuid>) -> CreateCluster {
    CreateCluster {
        code: code.into(),
        name: "Loire Valley".into(),
        status: EntityStatus::Active,
        address: "1 place Royale, Nantes".into(),
        description: "Walks along the river".into(),
        paypal_url: None,
        admin,
        admin_alt: None,
        max_participants: 4,
        backup_email: None,
        library_url: None,
        greeter_library_url: None,
        comm_langs: vec!["fr".into(), "en-gb".into()],
    }
}

async fn pending_user(db: &Surreal<Db>, email: &str) -> User {
    SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            email: email.into(),
            first_name: "Ana".into(),
            last_name: "Durand".into(),
            phone: None,
            comm_lang: "fr".into(),
            cluster_code: None,
            dest_code: None,
            is_active: false,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn create_requires_super_admin() {
    let db = setup().await;
    let svc = service(&db);

    let err = svc
        .create(&[Role::Admin], create_input("NAN", None), tag_lists(), None, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, GreetnetError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn duplicate_code_is_a_field_error() {
    let db = setup().await;
    let svc = service(&db);

    svc.create(&[Role::SuperAdmin], create_input("NAN", None), tag_lists(), None, &[])
        .await
        .unwrap();

    let err = svc
        .create(&[Role::SuperAdmin], create_input("nan", None), tag_lists(), None, &[])
        .await
        .unwrap_err();
    match err {
        GreetnetError::Invalid(errors) => assert!(errors.has_field("code")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn validation_failure_discards_pending_placeholders() {
    let db = setup().await;
    let svc = service(&db);
    let pending = pending_user(&db, "ana@example.org").await;

    let mut lists = tag_lists();
    lists.experiences = vec!["only one".into()];

    let err = svc
        .create(
            &[Role::SuperAdmin],
            create_input("NAN", Some(pending.id)),
            lists,
            None,
            &[pending.id],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GreetnetError::Invalid(_)));

    // The placeholder row is gone.
    let users = SurrealUserRepository::new(db.clone());
    assert!(matches!(
        users.get_by_id(pending.id).await.unwrap_err(),
        GreetnetError::NotFound { .. }
    ));
}

#[tokio::test]
async fn create_adopts_pending_admin_and_queues_password_mail() {
    let db = setup().await;
    let svc = service(&db);
    let pending = pending_user(&db, "ana@example.org").await;

    let outcome = svc
        .create(
            &[Role::SuperAdmin],
            create_input("NAN", Some(pending.id)),
            tag_lists(),
            None,
            &[pending.id],
        )
        .await
        .unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let adopted = users.get_by_id(pending.id).await.unwrap();
    assert!(adopted.is_active);
    assert_eq!(adopted.cluster_code.as_deref(), Some("NAN"));

    let memberships = SurrealRoleMembershipRepository::new(db.clone());
    assert!(memberships
        .roles_of(pending.id)
        .await
        .unwrap()
        .contains(&Role::Admin));

    assert!(outcome.effects.iter().any(|e| matches!(
        e,
        Effect::SendTemplateEmail { code, user_id, .. }
            if code == codes::SET_PASSWORD && *user_id == pending.id
    )));
    // The non-empty description fans out.
    assert!(outcome.effects.iter().any(|e| matches!(
        e,
        Effect::TranslateField { field, .. } if field == "description"
    )));
}

/// A membership store whose writes always fail, standing in for a
/// connection dropping mid-save.
struct FailingMemberships;

impl RoleMembershipRepository for FailingMemberships {
    async fn add(&self, _user_id: Uuid, _role: Role) -> GreetnetResult<()> {
        Err(GreetnetError::Database("connection reset".into()))
    }

    async fn remove(&self, _user_id: Uuid, _role: Role) -> GreetnetResult<()> {
        Ok(())
    }

    async fn roles_of(&self, _user_id: Uuid) -> GreetnetResult<Vec<Role>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn failed_membership_write_leaves_the_placeholder_pending() {
    let db = setup().await;
    let pending = pending_user(&db, "ana@example.org").await;

    let svc = ClusterService::new(
        SurrealClusterRepository::new(db.clone()),
        SurrealDestinationRepository::new(db.clone()),
        SurrealUserRepository::new(db.clone()),
        FailingMemberships,
        SurrealTagRepository::new(db.clone()),
        SurrealFieldPermissionRepository::new(db.clone()),
    );

    let err = svc
        .create(
            &[Role::SuperAdmin],
            create_input("NAN", Some(pending.id)),
            tag_lists(),
            None,
            &[pending.id],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GreetnetError::Database(_)));

    // The adoption was unwound: still inactive, no pointer, so a
    // retried save can claim the placeholder again.
    let users = SurrealUserRepository::new(db.clone());
    let user = users.get_by_id(pending.id).await.unwrap();
    assert!(!user.is_active);
    assert_eq!(user.cluster_code, None);
}

#[tokio::test]
async fn resubmitting_identical_tag_lists_changes_nothing() {
    let db = setup().await;
    let svc = service(&db);
    let admin = pending_user(&db, "ana@example.org").await;

    let outcome = svc
        .create(
            &[Role::SuperAdmin],
            create_input("NAN", Some(admin.id)),
            tag_lists(),
            None,
            &[admin.id],
        )
        .await
        .unwrap();
    let created_tags = outcome
        .effects
        .iter()
        .filter(|e| matches!(e, Effect::TranslateTag { .. }))
        .count();
    assert_eq!(created_tags, 8, "every submitted label is new");

    let tags = SurrealTagRepository::new(db.clone());
    let owner = EntityRef::Cluster(outcome.cluster.id);
    let mut before: Vec<Uuid> = tags
        .owned(owner, TagKind::InterestCenter)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    before.sort();

    // Same lists again through the update path.
    let outcome = svc
        .update(
            &[Role::SuperAdmin],
            outcome.cluster.id,
            UpdateCluster::default(),
            tag_lists(),
            None,
            &[],
        )
        .await
        .unwrap();
    assert!(
        !outcome
            .effects
            .iter()
            .any(|e| matches!(e, Effect::TranslateTag { .. })),
        "no tag was created on re-sync"
    );

    let mut after: Vec<Uuid> = tags
        .owned(owner, TagKind::InterestCenter)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    after.sort();
    assert_eq!(before, after);
}

#[tokio::test]
async fn reassigning_the_admin_moves_roles_and_pointers() {
    let db = setup().await;
    let svc = service(&db);
    let alice = pending_user(&db, "alice@example.org").await;
    let bob = pending_user(&db, "bob@example.org").await;

    let outcome = svc
        .create(
            &[Role::SuperAdmin],
            create_input("NAN", Some(alice.id)),
            tag_lists(),
            None,
            &[alice.id],
        )
        .await
        .unwrap();

    svc.update(
        &[Role::SuperAdmin],
        outcome.cluster.id,
        UpdateCluster {
            admin: Some(Some(bob.id)),
            ..Default::default()
        },
        tag_lists(),
        None,
        &[bob.id],
    )
    .await
    .unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let memberships = SurrealRoleMembershipRepository::new(db.clone());

    let bob_now = users.get_by_id(bob.id).await.unwrap();
    assert!(bob_now.is_active);
    assert_eq!(bob_now.cluster_code.as_deref(), Some("NAN"));
    assert!(memberships.roles_of(bob.id).await.unwrap().contains(&Role::Admin));

    // Alice held nothing else on the cluster: unassigned and
    // deactivated.
    let alice_now = users.get_by_id(alice.id).await.unwrap();
    assert!(!alice_now.is_active);
    assert_eq!(alice_now.cluster_code, None);
    assert!(!memberships.roles_of(alice.id).await.unwrap().contains(&Role::Admin));
}

#[tokio::test]
async fn stored_toggles_restrict_admin_updates() {
    let db = setup().await;
    let svc = service(&db);
    let admin = pending_user(&db, "ana@example.org").await;

    // Grant only the name; every other toggleable field gets a
    // not-editable row.
    let mut toggles = HashMap::new();
    toggles.insert("name".to_string(), true);
    let outcome = svc
        .create(
            &[Role::SuperAdmin],
            create_input("NAN", Some(admin.id)),
            tag_lists(),
            Some(toggles),
            &[admin.id],
        )
        .await
        .unwrap();

    let mut lists = tag_lists();
    lists.interest_centers = vec!["gardens".into(), "wine".into()];
    let updated = svc
        .update(
            &[Role::Admin],
            outcome.cluster.id,
            UpdateCluster {
                name: Some("Loire Valley West".into()),
                address: Some("2 rue Kervegan, Nantes".into()),
                description: Some("Rewritten".into()),
                ..Default::default()
            },
            lists,
            None,
            &[],
        )
        .await
        .unwrap();

    assert_eq!(updated.cluster.name, "Loire Valley West");
    assert_eq!(updated.cluster.address, "1 place Royale, Nantes");
    assert_eq!(updated.cluster.description, "Walks along the river");
    assert!(
        !updated
            .effects
            .iter()
            .any(|e| matches!(e, Effect::TranslateField { .. })),
        "a stripped description queues no fan-out"
    );

    // The disabled interest list kept its stored labels.
    let tags = SurrealTagRepository::new(db.clone());
    let mut labels: Vec<String> = tags
        .owned(EntityRef::Cluster(outcome.cluster.id), TagKind::InterestCenter)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.label)
        .collect();
    labels.sort();
    assert_eq!(labels, vec!["history".to_string(), "nature".to_string()]);
}

#[tokio::test]
async fn cluster_toggles_from_an_admin_are_ignored() {
    let db = setup().await;
    let svc = service(&db);
    let admin = pending_user(&db, "ana@example.org").await;

    let outcome = svc
        .create(
            &[Role::SuperAdmin],
            create_input("NAN", Some(admin.id)),
            tag_lists(),
            None,
            &[admin.id],
        )
        .await
        .unwrap();

    let mut toggles = HashMap::new();
    toggles.insert("name".to_string(), true);
    svc.update(
        &[Role::Admin],
        outcome.cluster.id,
        UpdateCluster::default(),
        tag_lists(),
        Some(toggles),
        &[],
    )
    .await
    .unwrap();

    // No rows were written; every field stays editable.
    let permissions = SurrealFieldPermissionRepository::new(db.clone());
    let rows = permissions
        .list_for(EntityRef::Cluster(outcome.cluster.id), Role::Admin)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn dropped_tags_survive_while_shared_and_die_alone() {
    let db = setup().await;
    let svc = service(&db);
    let tags = SurrealTagRepository::new(db.clone());
    let alice = pending_user(&db, "alice@example.org").await;
    let bob = pending_user(&db, "bob@example.org").await;

    let first = svc
        .create(
            &[Role::SuperAdmin],
            create_input("NAN", Some(alice.id)),
            tag_lists(),
            None,
            &[alice.id],
        )
        .await
        .unwrap();
    let mut second_input = create_input("BDX", Some(bob.id));
    second_input.name = "Bordeaux".into();
    let second = svc
        .create(&[Role::SuperAdmin], second_input, tag_lists(), None, &[bob.id])
        .await
        .unwrap();

    let history = tags
        .owned(EntityRef::Cluster(first.cluster.id), TagKind::InterestCenter)
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.label == "history")
        .unwrap();

    let mut without_history = tag_lists();
    without_history.interest_centers = vec!["nature".into(), "museums".into()];

    // First owner drops the tag; the second still references it.
    svc.update(
        &[Role::SuperAdmin],
        first.cluster.id,
        UpdateCluster::default(),
        without_history.clone(),
        None,
        &[],
    )
    .await
    .unwrap();
    assert!(tags.get_by_id(history.id).await.is_ok());

    // Last owner drops it too.
    svc.update(
        &[Role::SuperAdmin],
        second.cluster.id,
        UpdateCluster::default(),
        without_history,
        None,
        &[],
    )
    .await
    .unwrap();
    assert!(matches!(
        tags.get_by_id(history.id).await.unwrap_err(),
        GreetnetError::NotFound { .. }
    ));
}

#[tokio::test]
async fn unchanged_description_queues_no_translation() {
    let db = setup().await;
    let svc = service(&db);
    let admin = pending_user(&db, "ana@example.org").await;

    let outcome = svc
        .create(
            &[Role::SuperAdmin],
            create_input("NAN", Some(admin.id)),
            tag_lists(),
            None,
            &[admin.id],
        )
        .await
        .unwrap();

    let outcome = svc
        .update(
            &[Role::SuperAdmin],
            outcome.cluster.id,
            UpdateCluster {
                name: Some("Loire Valley West".into()),
                ..Default::default()
            },
            tag_lists(),
            None,
            &[],
        )
        .await
        .unwrap();

    assert!(
        !outcome
            .effects
            .iter()
            .any(|e| matches!(e, Effect::TranslateField { .. }))
    );
}

#[tokio::test]
async fn delete_refused_while_destinations_remain() {
    let db = setup().await;
    let svc = service(&db);

    let outcome = svc
        .create(&[Role::SuperAdmin], create_input("NAN", None), tag_lists(), None, &[])
        .await
        .unwrap();

    use greetnet_core::models::destination::CreateDestination;
    use greetnet_core::repository::DestinationRepository;
    SurrealDestinationRepository::new(db.clone())
        .create(CreateDestination {
            cluster_id: outcome.cluster.id,
            code: "NANCC".into(),
            parent_code: None,
            iga_code: None,
            name: "City centre".into(),
            description: String::new(),
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

    let err = svc
        .delete(&[Role::SuperAdmin], outcome.cluster.id)
        .await
        .unwrap_err();
    assert!(matches!(err, GreetnetError::Invalid(_)));
}
