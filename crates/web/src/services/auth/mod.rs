//! Console authentication.
//!
//! Handlers depend on [`CredentialVerifier`] only. The production
//! implementation, [`AuthService`], looks the account up by email and checks
//! an Argon2id hash; it also backs the CLI's account commands.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use klyp_core::Email;

use crate::db::AdminUserRepository;
use crate::models::AdminUser;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Checks a credential pair and returns the matching account.
#[async_trait::async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    /// Verify `email` and `password`.
    ///
    /// Any pair that does not match a stored account fails with
    /// [`AuthError::InvalidCredentials`], whatever the reason.
    async fn verify(&self, email: &str, password: &str) -> Result<AdminUser, AuthError>;
}

/// Password authentication against the admin user table.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn AdminUserRepository>,
}

impl AuthService {
    #[must_use]
    pub fn new(users: Arc<dyn AdminUserRepository>) -> Self {
        Self { users }
    }

    /// Create a console account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn create_admin(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email.trim())?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        Ok(self.users.create(&email, &password_hash).await?)
    }

    /// Replace the password of an existing account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account has this email, or
    /// the same validation errors as [`Self::create_admin`].
    pub async fn set_password(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = Email::parse(email.trim())?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        Ok(self.users.set_password_hash(&email, &password_hash).await?)
    }
}

#[async_trait::async_trait]
impl CredentialVerifier for AuthService {
    async fn verify(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email.trim()).map_err(|_| AuthError::InvalidCredentials)?;

        let credentials = self
            .users
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credentials.password_hash)?;

        if let Err(e) = self.users.record_login(credentials.user.id).await {
            tracing::warn!(
                admin_user_id = %credentials.user.id,
                error = %e,
                "Failed to record admin login time"
            );
        }

        Ok(credentials.user)
    }
}

/// Check a new password against the length rule.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
