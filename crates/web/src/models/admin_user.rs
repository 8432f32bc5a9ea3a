//! Console account types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use klyp_core::{AdminUserId, Email};

/// A console account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// An account together with its stored password hash.
///
/// Only the credential verifier reads this. `Debug` redacts the hash.
#[derive(Clone)]
pub struct AdminCredentials {
    pub user: AdminUser,
    /// Argon2id hash in PHC string format.
    pub password_hash: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("user", &self.user)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}
