//! Console account commands.
//!
//! Accounts are created out of band; the site has no sign-up page.

use std::sync::Arc;

use rand::distr::{Alphanumeric, SampleString};

use klyp_web::db::PgAdminUserRepository;
use klyp_web::services::AuthService;

use super::{CliError, connect};

const GENERATED_PASSWORD_LENGTH: usize = 20;

async fn auth_service() -> Result<AuthService, CliError> {
    let pool = connect().await?;
    Ok(AuthService::new(Arc::new(PgAdminUserRepository::new(pool))))
}

/// Use the given password, or generate one and log it once.
fn password_or_generated(password: Option<String>) -> String {
    password.unwrap_or_else(|| {
        let generated = Alphanumeric.sample_string(&mut rand::rng(), GENERATED_PASSWORD_LENGTH);
        tracing::info!("Generated password: {generated}");
        tracing::warn!("Store this password now; it is not shown again.");
        generated
    })
}

/// Create a console account.
///
/// # Errors
///
/// Returns an error for an invalid email, a short password, an existing
/// account, or a database failure.
pub async fn create_user(email: &str, password: Option<String>) -> Result<(), CliError> {
    let auth = auth_service().await?;
    let password = password_or_generated(password);

    let user = auth.create_admin(email, &password).await?;
    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(())
}

/// Replace the password of an existing console account.
///
/// # Errors
///
/// Returns an error for an unknown account, a short password, or a
/// database failure.
pub async fn set_password(email: &str, password: Option<String>) -> Result<(), CliError> {
    let auth = auth_service().await?;
    let password = password_or_generated(password);

    auth.set_password(email, &password).await?;
    tracing::info!("Password updated for {email}");
    Ok(())
}
