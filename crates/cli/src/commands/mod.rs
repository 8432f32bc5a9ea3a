//! Command implementations.

pub mod admin;
pub mod content;
pub mod migrate;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use klyp_core::SectionNameError;
use klyp_web::db::RepositoryError;
use klyp_web::services::AuthError;

/// Errors from any CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Section(#[from] SectionNameError),
}

/// Connect to the site database named by `KLYP_DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("KLYP_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("KLYP_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(klyp_web::db::create_pool(&database_url).await?)
}
