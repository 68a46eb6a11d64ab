//! Integration tests for tenant and user repositories using in-memory
//! SurrealDB.

use chrono::Utc;
use mesa_core::error::MesaError;
use mesa_core::models::tenant::{CreateTenant, TenantStatus};
use mesa_core::models::user::{CreateUser, Role, UserStatus};
use mesa_core::repository::{TenantRepository, UserRepository};
use mesa_db::repository::{SurrealTenantRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    mesa_db::run_migrations(&db).await.unwrap();
    db
}

fn sample_user(tenant_id: Uuid, email: &str) -> CreateUser {
    CreateUser {
        tenant_id,
        email: email.into(),
        name: "Alice".into(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".into(),
        roles: vec![Role::Manager, Role::Employee],
        permissions: vec!["orders:read".into()],
        status: UserStatus::Active,
    }
}

// -----------------------------------------------------------------------
// Tenant tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_tenant() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    let tenant = repo
        .create(CreateTenant {
            name: "Chez Marcel".into(),
            slug: "chez-marcel".into(),
            status: TenantStatus::Active,
        })
        .await
        .unwrap();

    let fetched = repo.get_by_id(tenant.id).await.unwrap();
    assert_eq!(fetched.name, "Chez Marcel");
    assert_eq!(fetched.slug, "chez-marcel");
    assert_eq!(fetched.status, TenantStatus::Active);
}

#[tokio::test]
async fn tenant_activity_follows_status() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    let tenant = repo
        .create(CreateTenant {
            name: "La Cantina".into(),
            slug: "la-cantina".into(),
            status: TenantStatus::Active,
        })
        .await
        .unwrap();

    assert!(repo.is_active(tenant.id).await.unwrap());

    repo.set_status(tenant.id, TenantStatus::Suspended).await.unwrap();
    assert!(!repo.is_active(tenant.id).await.unwrap());

    // Unknown tenants read as inactive rather than erroring.
    assert!(!repo.is_active(Uuid::new_v4()).await.unwrap());
}

// -----------------------------------------------------------------------
// User tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_look_up_user_by_email() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    let tenant_id = Uuid::new_v4();

    let user = repo.create(sample_user(tenant_id, "alice@x.com")).await.unwrap();
    assert_eq!(user.roles, vec![Role::Manager, Role::Employee]);
    assert_eq!(user.login_count, 0);

    let fetched = repo.get_by_email("alice@x.com").await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.tenant_id, tenant_id);

    let missing = repo.get_by_email("nobody@x.com").await.unwrap_err();
    assert!(matches!(missing, MesaError::NotFound { .. }));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(sample_user(Uuid::new_v4(), "alice@x.com")).await.unwrap();
    let duplicate = repo.create(sample_user(Uuid::new_v4(), "alice@x.com")).await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn status_and_password_updates_persist() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(sample_user(Uuid::new_v4(), "alice@x.com")).await.unwrap();

    repo.set_status(user.id, UserStatus::Suspended).await.unwrap();
    repo.update_password(user.id, "new-hash").await.unwrap();

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.status, UserStatus::Suspended);
    assert_eq!(fetched.password_hash, "new-hash");
}

#[tokio::test]
async fn login_stats_are_bumped() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(sample_user(Uuid::new_v4(), "alice@x.com")).await.unwrap();
    assert!(user.last_login_at.is_none());

    let now = Utc::now();
    repo.touch_login_stats(user.id, now).await.unwrap();
    repo.touch_login_stats(user.id, now).await.unwrap();

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.login_count, 2);
    assert!(fetched.last_login_at.is_some());
}
