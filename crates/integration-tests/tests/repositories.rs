//! `PostgreSQL` repository tests.
//!
//! Each test gets a fresh database with the site migrations applied.
//!
//! Run with: `DATABASE_URL=postgres://... cargo test -p klyp-integration-tests -- --ignored`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use serde_json::{Map, Value, json};
use sqlx::PgPool;

use klyp_core::{Email, LeadSubmission, SectionName};
use klyp_web::db::{
    AdminUserRepository, ContentRepository, LeadRepository, PgAdminUserRepository,
    PgContentRepository, PgLeadRepository, RepositoryError,
};
use klyp_web::services::{AuthError, AuthService, CredentialVerifier};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn submission(name: &str, email: &str) -> LeadSubmission {
    LeadSubmission {
        full_name: name.to_owned(),
        email: email.to_owned(),
        business: "Coastal Escapes".to_owned(),
        ..LeadSubmission::default()
    }
}

// =============================================================================
// Leads
// =============================================================================

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn test_leads_listed_newest_first(pool: PgPool) {
    let repo = PgLeadRepository::new(pool);

    let first = repo
        .create(&submission("First", "first@example.com").validate().unwrap())
        .await
        .unwrap();
    let second = repo
        .create(&submission("Second", "second@example.com").validate().unwrap())
        .await
        .unwrap();

    assert!(!first.contacted);
    assert_eq!(first.phone, None);

    let ids: Vec<_> = repo.list().await.unwrap().iter().map(|l| l.id).collect();
    assert_eq!(ids, [second.id, first.id]);
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn test_mark_contacted_is_idempotent(pool: PgPool) {
    let repo = PgLeadRepository::new(pool);
    let lead = repo
        .create(&submission("Sam", "sam@example.com").validate().unwrap())
        .await
        .unwrap();

    assert!(repo.mark_contacted(lead.id).await.unwrap().contacted);
    assert!(repo.mark_contacted(lead.id).await.unwrap().contacted);

    let missing = klyp_core::LeadId::new(lead.id.as_i32() + 100);
    assert!(matches!(
        repo.mark_contacted(missing).await,
        Err(RepositoryError::NotFound)
    ));
}

// =============================================================================
// Content documents
// =============================================================================

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn test_content_upsert_replaces_whole_object(pool: PgPool) {
    let repo = PgContentRepository::new(pool);
    let hero = SectionName::parse("hero").unwrap();

    let created = repo
        .upsert(&hero, &object(json!({"headline1": "One", "subtitle": "Sub"})))
        .await
        .unwrap();
    let updated = repo
        .upsert(&hero, &object(json!({"headline1": "Two"})))
        .await
        .unwrap();

    assert_eq!(created.id, updated.id);
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(Value::Object(updated.content), json!({"headline1": "Two"}));
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn test_content_create_rejects_duplicate_section(pool: PgPool) {
    let repo = PgContentRepository::new(pool);
    let pricing = SectionName::parse("pricing").unwrap();

    let created = repo.create(&pricing).await.unwrap();
    assert!(created.content.is_empty());
    assert!(matches!(
        repo.create(&pricing).await,
        Err(RepositoryError::Conflict(_))
    ));
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn test_content_replace_detects_stale_writes(pool: PgPool) {
    let repo = PgContentRepository::new(pool);
    let demo = SectionName::parse("demo").unwrap();
    let doc = repo.upsert(&demo, &Map::new()).await.unwrap();

    let saved = repo
        .replace(doc.id, &object(json!({"videoTitle": "Tour"})), Some(doc.updated_at))
        .await
        .unwrap();
    assert_eq!(saved.content["videoTitle"], "Tour");

    let stale = repo
        .replace(doc.id, &object(json!({"videoTitle": "Old"})), Some(doc.updated_at))
        .await;
    assert!(matches!(stale, Err(RepositoryError::Conflict(_))));

    // Without a version the last write wins
    repo.replace(doc.id, &object(json!({"videoTitle": "Forced"})), None)
        .await
        .unwrap();

    let missing = klyp_core::ContentDocumentId::new(doc.id.as_i32() + 100);
    assert!(matches!(
        repo.replace(missing, &Map::new(), None).await,
        Err(RepositoryError::NotFound)
    ));
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn test_content_rejects_non_object_rows(pool: PgPool) {
    let result = sqlx::query(
        "INSERT INTO klyp.content_document (section, content) VALUES ('hero', '[1, 2]')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err());
}

// =============================================================================
// Console accounts
// =============================================================================

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn test_admin_email_unique_ignoring_case(pool: PgPool) {
    let repo = PgAdminUserRepository::new(pool);
    let email = Email::parse("Ops@Klyp.Travel").unwrap();
    repo.create(&email, "hash").await.unwrap();

    let shouted = Email::parse("OPS@KLYP.TRAVEL").unwrap();
    assert!(matches!(
        repo.create(&shouted, "hash").await,
        Err(RepositoryError::Conflict(_))
    ));
    assert!(repo.get_credentials(&shouted).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../web/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn test_password_login_against_postgres(pool: PgPool) {
    let repo = Arc::new(PgAdminUserRepository::new(pool));
    let auth = AuthService::new(repo.clone());

    auth.create_admin("ops@klyp.travel", "first password")
        .await
        .unwrap();
    let user = auth.verify("ops@klyp.travel", "first password").await.unwrap();

    let credentials = repo
        .get_credentials(&user.email)
        .await
        .unwrap()
        .unwrap();
    assert!(credentials.user.last_login.is_some());

    auth.set_password("ops@klyp.travel", "second password")
        .await
        .unwrap();
    assert!(matches!(
        auth.verify("ops@klyp.travel", "first password").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(auth.verify("ops@klyp.travel", "second password").await.is_ok());

    assert!(matches!(
        auth.set_password("nobody@klyp.travel", "third password").await,
        Err(AuthError::UserNotFound)
    ));
}
