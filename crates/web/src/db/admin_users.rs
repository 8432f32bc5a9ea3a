//! Admin user repository.
//!
//! Emails are matched case-insensitively; the table carries a unique index
//! on `lower(email)`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use klyp_core::{AdminUserId, Email};

use super::RepositoryError;
use crate::models::{AdminCredentials, AdminUser};

/// Storage for console accounts.
#[async_trait::async_trait]
pub trait AdminUserRepository: Send + Sync + 'static {
    /// Look up an account and its password hash by email.
    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<AdminCredentials>, RepositoryError>;

    /// Create an account.
    ///
    /// Returns [`RepositoryError::Conflict`] if the email is taken.
    async fn create(&self, email: &Email, password_hash: &str)
    -> Result<AdminUser, RepositoryError>;

    /// Replace the password hash of an existing account.
    async fn set_password_hash(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<(), RepositoryError>;

    /// Stamp `last_login` with the current time.
    async fn record_login(&self, id: AdminUserId) -> Result<(), RepositoryError>;
}

#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: i32,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<AdminUserRow> for AdminCredentials {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            user: AdminUser {
                id: AdminUserId::new(row.id),
                email,
                created_at: row.created_at,
                last_login: row.last_login,
            },
            password_hash: row.password_hash,
        })
    }
}

const ADMIN_USER_COLUMNS: &str = "id, email, password_hash, created_at, last_login";

/// `PostgreSQL` admin user repository.
#[derive(Debug, Clone)]
pub struct PgAdminUserRepository {
    pool: PgPool,
}

impl PgAdminUserRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AdminUserRepository for PgAdminUserRepository {
    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<AdminCredentials>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {ADMIN_USER_COLUMNS} FROM klyp.admin_user WHERE lower(email) = lower($1)"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            r"
            INSERT INTO klyp.admin_user (email, password_hash)
            VALUES ($1, $2)
            RETURNING {ADMIN_USER_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, || "email already exists".to_owned()))?;

        let credentials: AdminCredentials = row.try_into()?;
        Ok(credentials.user)
    }

    async fn set_password_hash(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE klyp.admin_user SET password_hash = $2 WHERE lower(email) = lower($1)",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn record_login(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE klyp.admin_user SET last_login = now() WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
