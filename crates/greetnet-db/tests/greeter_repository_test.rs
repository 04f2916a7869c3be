//! Integration tests for the Greeter repository using in-memory
//! SurrealDB.

use chrono::NaiveDate;
use greetnet_core::error::GreetnetError;
use greetnet_core::models::greeter::{CreateGreeter, UpdateGreeter};
use greetnet_core::repository::GreeterRepository;
use greetnet_db::repository::SurrealGreeterRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    greetnet_db::run_migrations(&db).await.unwrap();
    db
}

fn sample_greeter(user_id: Uuid) -> CreateGreeter {
    CreateGreeter {
        user_id,
        address_line_1: "12 rue des Lilas".into(),
        address_line_2: None,
        postal_code: "44000".into(),
        city: "Nantes".into(),
        landline: None,
        birth_date: NaiveDate::from_ymd_opt(1958, 4, 2),
        job: Some("librarian".into()),
        photo_path: None,
        away_from: None,
        away_until: None,
        interests: vec!["history".into(), "food".into()],
        experiences: vec![],
        places: vec!["old town".into()],
    }
}

#[tokio::test]
async fn create_and_get_profile() {
    let db = setup().await;
    let repo = SurrealGreeterRepository::new(db);
    let user_id = Uuid::new_v4();

    let greeter = repo.create(sample_greeter(user_id)).await.unwrap();
    assert_eq!(greeter.user_id, user_id);
    assert_eq!(greeter.interests, vec!["history", "food"]);
    assert!(greeter.experiences.is_empty());

    let fetched = repo.get_by_user(user_id).await.unwrap();
    assert_eq!(fetched.birth_date, NaiveDate::from_ymd_opt(1958, 4, 2));
    assert_eq!(fetched.places, vec!["old town"]);
}

#[tokio::test]
async fn one_profile_per_user() {
    let db = setup().await;
    let repo = SurrealGreeterRepository::new(db);
    let user_id = Uuid::new_v4();

    repo.create(sample_greeter(user_id)).await.unwrap();
    let err = repo.create(sample_greeter(user_id)).await.unwrap_err();
    assert!(matches!(err, GreetnetError::AlreadyExists { .. }));
}

#[tokio::test]
async fn update_replaces_lists_and_clears_optionals() {
    let db = setup().await;
    let repo = SurrealGreeterRepository::new(db);
    let user_id = Uuid::new_v4();

    repo.create(sample_greeter(user_id)).await.unwrap();

    let updated = repo
        .update(
            user_id,
            UpdateGreeter {
                interests: Some(vec!["architecture".into()]),
                job: Some(None),
                away_from: Some(NaiveDate::from_ymd_opt(2026, 7, 1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.interests, vec!["architecture"]);
    assert!(updated.job.is_none());
    // Untouched lists survive.
    assert_eq!(updated.places, vec!["old town"]);
}

#[tokio::test]
async fn delete_removes_profile() {
    let db = setup().await;
    let repo = SurrealGreeterRepository::new(db);
    let user_id = Uuid::new_v4();

    repo.create(sample_greeter(user_id)).await.unwrap();
    repo.delete(user_id).await.unwrap();

    assert!(repo.get_by_user(user_id).await.is_err());
}
