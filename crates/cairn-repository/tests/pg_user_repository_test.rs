//! Integration tests for PgUserRepository.
//!
//! These tests run against a real PostgreSQL database using testcontainers.
//! Requires Docker to be available on the system.

mod common;

use cairn_core::{CairnError, Email, HealthCheck, NewUser, UserId, UserPatch};
use cairn_repository::{DatabaseHealthCheck, PgUserRepository, UserRepository};
use common::TestDatabase;

fn new_user(name: &str, email: &str) -> NewUser {
    NewUser::new(name, Email::new(email).expect("valid email"))
}

#[tokio::test]
async fn test_create_assigns_id_and_round_trips() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.pool());

    let created = repo
        .create(new_user("John Doe", "JohnDoe@Example.com"))
        .await
        .expect("Failed to create user");

    assert!(created.id.into_inner() > 0);
    assert_eq!(created.email.as_str(), "johndoe@example.com");

    let found = repo
        .find_by_id(created.id)
        .await
        .expect("Query failed")
        .expect("User not found");
    assert_eq!(found, created);
}

#[tokio::test]
async fn test_find_all_empty_table() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.pool());

    let users = repo.find_all().await.expect("Query failed");
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_find_all_returns_every_user_in_id_order() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.pool());

    let a = repo.create(new_user("A", "a@example.com")).await.unwrap();
    let b = repo.create(new_user("B", "b@example.com")).await.unwrap();
    let c = repo.create(new_user("C", "c@example.com")).await.unwrap();

    let users = repo.find_all().await.expect("Query failed");
    assert_eq!(users, vec![a, b, c]);
}

#[tokio::test]
async fn test_find_by_ids_restricts_to_given_set() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.pool());

    let a = repo.create(new_user("A", "a@example.com")).await.unwrap();
    let _b = repo.create(new_user("B", "b@example.com")).await.unwrap();
    let c = repo.create(new_user("C", "c@example.com")).await.unwrap();

    let users = repo
        .find_by_ids(&[c.id, a.id, UserId::new(9_999)])
        .await
        .expect("Query failed");
    assert_eq!(users, vec![a, c]);
}

#[tokio::test]
async fn test_find_by_id_not_found() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.pool());

    let result = repo.find_by_id(UserId::new(12_345)).await.expect("Query failed");
    assert!(result.is_none());
}

#[tokio::test]
async fn test_merge_and_persist_keeps_absent_fields() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.pool());

    let created = repo.create(new_user("John Doe", "johndoe@example.com")).await.unwrap();
    let patch = UserPatch {
        name: None,
        email: Some(Email::new("john@example.org").unwrap()),
    };

    let updated = repo
        .merge_and_persist(created.id, patch)
        .await
        .expect("Update failed")
        .expect("User not found");

    assert_eq!(updated.name, "John Doe");
    assert_eq!(updated.email.as_str(), "john@example.org");
    assert_eq!(repo.find_by_id(created.id).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn test_merge_and_persist_missing_id() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.pool());

    let result = repo
        .merge_and_persist(UserId::new(77), UserPatch::default())
        .await
        .expect("Update failed");
    assert!(result.is_none());
}

#[tokio::test]
async fn test_health_check_and_closed_pool() {
    let db = TestDatabase::new().await;
    let pool = db.pool();
    let check = DatabaseHealthCheck::new(pool.clone());

    assert!(check.check().await.is_healthy());

    pool.close().await;
    assert!(check.check().await.is_unhealthy());

    let repo = PgUserRepository::new(pool);
    let err = repo.find_all().await.unwrap_err();
    assert!(matches!(err, CairnError::Database(_)));
}
