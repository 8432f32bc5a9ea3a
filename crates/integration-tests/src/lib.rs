//! Integration tests for the KLYP Workbench site.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process server tests (no external services)
//! cargo test -p klyp-integration-tests
//!
//! # Repository tests against PostgreSQL
//! DATABASE_URL=postgres://... cargo test -p klyp-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `site_flow` - the whole site served over TCP with in-memory backends
//! - `repositories` - `PostgreSQL` repositories against migrated databases
//! - `live_site` - a deployed or locally running server (`KLYP_BASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::net::TcpListener;

use klyp_web::config::{UploadConfig, WebConfig};
use klyp_web::db::memory::{
    MemoryAdminUserRepository, MemoryContentRepository, MemoryLeadRepository,
};
use klyp_web::middleware::session_layer;
use klyp_web::services::AuthService;
use klyp_web::state::{AppState, Backends};

/// Console account present in every [`TestServer`].
pub const ADMIN_EMAIL: &str = "ops@klyp.travel";
pub const ADMIN_PASSWORD: &str = "integration-password";

/// The site served on an ephemeral port with in-memory backends.
pub struct TestServer {
    pub base_url: String,
    pub leads: MemoryLeadRepository,
    media_dir: PathBuf,
    server: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Bind a listener, create the console account, and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound or the account cannot be
    /// created.
    #[allow(clippy::expect_used)]
    pub async fn start(name: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let base_url = format!("http://{addr}");

        let media_dir =
            std::env::temp_dir().join(format!("klyp-it-{name}-{}", std::process::id()));
        let mut config = WebConfig::local(UploadConfig {
            signing_secret: SecretString::from("integration-signing-secret-0123456789"),
            media_dir: media_dir.clone(),
            buckets: vec!["videos".to_owned()],
            max_upload_bytes: 64 * 1024,
            url_ttl: Duration::from_secs(300),
        });
        config.base_url.clone_from(&base_url);

        let leads = MemoryLeadRepository::new();
        let admin_users = MemoryAdminUserRepository::new();
        AuthService::new(Arc::new(admin_users.clone()))
            .create_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("create console account");

        let state = AppState::from_parts(
            config,
            Backends {
                leads: Arc::new(leads.clone()),
                content: Arc::new(MemoryContentRepository::new()),
                admin_users: Arc::new(admin_users),
            },
        );
        let app = klyp_web::app(
            state,
            session_layer(tower_sessions::MemoryStore::default(), false),
        );

        let server = tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        Self {
            base_url,
            leads,
            media_dir,
            server,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.abort();
        let _ = std::fs::remove_dir_all(&self.media_dir);
    }
}
