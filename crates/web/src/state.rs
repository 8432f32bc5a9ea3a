//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::WebConfig;
use crate::content::ContentStore;
use crate::db::{
    AdminUserRepository, ContentRepository, LeadRepository, PgAdminUserRepository,
    PgContentRepository, PgLeadRepository,
};
use crate::services::{AuthService, CredentialVerifier, MediaStorage};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like repositories and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    pool: Option<PgPool>,
    leads: Arc<dyn LeadRepository>,
    content: ContentStore,
    credentials: Arc<dyn CredentialVerifier>,
    storage: MediaStorage,
}

/// Storage backends for [`AppState::from_parts`].
pub struct Backends {
    pub leads: Arc<dyn LeadRepository>,
    pub content: Arc<dyn ContentRepository>,
    pub admin_users: Arc<dyn AdminUserRepository>,
}

impl AppState {
    /// Create the application state backed by `PostgreSQL`.
    #[must_use]
    pub fn new(config: WebConfig, pool: PgPool) -> Self {
        let backends = Backends {
            leads: Arc::new(PgLeadRepository::new(pool.clone())),
            content: Arc::new(PgContentRepository::new(pool.clone())),
            admin_users: Arc::new(PgAdminUserRepository::new(pool.clone())),
        };
        Self::build(config, Some(pool), backends)
    }

    /// Create the application state over arbitrary backends, without a
    /// database pool. Readiness checks report healthy.
    #[must_use]
    pub fn from_parts(config: WebConfig, backends: Backends) -> Self {
        Self::build(config, None, backends)
    }

    fn build(config: WebConfig, pool: Option<PgPool>, backends: Backends) -> Self {
        let storage = MediaStorage::new(&config.base_url, config.uploads.clone());
        Self {
            inner: Arc::new(AppStateInner {
                pool,
                leads: backends.leads,
                content: ContentStore::new(backends.content),
                credentials: Arc::new(AuthService::new(backends.admin_users)),
                storage,
                config,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get the database pool, if the state is backed by `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn leads(&self) -> &dyn LeadRepository {
        self.inner.leads.as_ref()
    }

    /// Get the content store accessor.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Get the credential verifier used by the login form.
    #[must_use]
    pub fn credentials(&self) -> &dyn CredentialVerifier {
        self.inner.credentials.as_ref()
    }

    #[must_use]
    pub fn storage(&self) -> &MediaStorage {
        &self.inner.storage
    }
}
