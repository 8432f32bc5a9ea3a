//! Database operations for the site's `PostgreSQL` schema.
//!
//! # Schema: `klyp`
//!
//! ## Tables
//!
//! - `lead` - Founders-list sign-ups
//! - `content_document` - Editable page copy, one JSON object per section
//! - `admin_user` - Console accounts with Argon2 password hashes
//! - `session` - Server-side sessions (tower-sessions)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p klyp-cli -- migrate
//! ```
//!
//! Each table is reached through a repository trait so handlers can be
//! exercised against the in-memory implementations in [`memory`].

pub mod admin_users;
pub mod content;
pub mod leads;
pub mod memory;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_users::{AdminUserRepository, PgAdminUserRepository};
pub use content::{ContentRepository, PgContentRepository};
pub use leads::{LeadRepository, PgLeadRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate section) or a stale write.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to [`RepositoryError::Conflict`], passing
    /// every other error through.
    pub(crate) fn from_insert(e: sqlx::Error, conflict: impl FnOnce() -> String) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
