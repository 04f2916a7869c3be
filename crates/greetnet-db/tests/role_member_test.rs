//! Integration tests for the RoleMembership repository using in-memory
//! SurrealDB.

use greetnet_core::models::role::Role;
use greetnet_core::repository::RoleMembershipRepository;
use greetnet_db::repository::SurrealRoleMembershipRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    greetnet_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn add_is_idempotent() {
    let db = setup().await;
    let repo = SurrealRoleMembershipRepository::new(db);
    let user = Uuid::new_v4();

    repo.add(user, Role::Manager).await.unwrap();
    repo.add(user, Role::Manager).await.unwrap();
    repo.add(user, Role::Greeter).await.unwrap();

    let roles = repo.roles_of(user).await.unwrap();
    assert_eq!(roles, vec![Role::Greeter, Role::Manager]);
}

#[tokio::test]
async fn remove_only_drops_the_given_role() {
    let db = setup().await;
    let repo = SurrealRoleMembershipRepository::new(db);
    let user = Uuid::new_v4();

    repo.add(user, Role::Manager).await.unwrap();
    repo.add(user, Role::Financier).await.unwrap();

    repo.remove(user, Role::Manager).await.unwrap();
    assert_eq!(repo.roles_of(user).await.unwrap(), vec![Role::Financier]);

    // Removing a role the user never had is a no-op.
    repo.remove(user, Role::Admin).await.unwrap();
    assert_eq!(repo.roles_of(user).await.unwrap(), vec![Role::Financier]);
}
