//! HTTP route handlers for the landing site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Landing page (?joined=1 shows the thank-you note)
//! GET  /brand.css              - Brand palette custom properties
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Lead capture (rate limited)
//! POST /leads                  - Founders-list form (HTML, post/redirect/get)
//! POST /api/leads              - Founders-list form (JSON)
//!
//! # Admin console (session required)
//! GET  /admin                  - Console (?tab=leads|content|video|branding)
//! GET  /admin/login            - Login page
//! POST /admin/login            - Verify credentials (rate limited)
//! POST /admin/logout           - Clear the session
//! GET  /admin/session          - Session status (JSON)
//! POST /admin/leads/{id}/contacted - Mark a lead contacted
//! POST /admin/content          - Create an empty section
//! POST /admin/content/{id}     - Save a JSON document
//! POST /admin/branding         - Save brand colors
//!
//! # Brokers (JSON, session required, CORS)
//! POST /api/admin-founders     - List leads / mark contacted
//! POST /api/get-upload-url     - Sign an upload URL
//! POST /api/update-site-content - Save a content document
//! POST /api/demo-video         - Stamp an uploaded video into the demo section
//!
//! # Storage
//! PUT  /storage/upload/{bucket}/{*path} - Signed upload target
//! GET  /media/*                - Uploaded objects
//! ```

pub mod admin;
pub mod api;
pub mod brand;
pub mod health;
pub mod landing;
pub mod leads;
pub mod storage;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::middleware::{form_rate_limiter, login_rate_limiter};
use crate::state::AppState;

/// Create the admin console routes router.
pub fn admin_routes() -> Router<AppState> {
    let login = Router::new()
        .route("/login", post(admin::auth::login))
        .layer(login_rate_limiter());

    Router::new()
        .route("/", get(admin::console::show))
        .route("/login", get(admin::auth::login_page))
        .merge(login)
        .route("/logout", post(admin::auth::logout))
        .route("/session", get(admin::auth::session_status))
        .route("/leads/{id}/contacted", post(admin::console::mark_contacted))
        .route("/content", post(admin::console::create_section))
        .route("/content/{id}", post(admin::console::save_document))
        .route("/branding", post(admin::console::save_branding))
}

/// Create the lead capture routes router.
pub fn lead_routes() -> Router<AppState> {
    Router::new()
        .route("/leads", post(leads::submit))
        .layer(form_rate_limiter())
}

/// Create the signed upload routes router.
pub fn storage_routes(max_upload_bytes: u64) -> Router<AppState> {
    let limit = usize::try_from(max_upload_bytes).unwrap_or(usize::MAX);
    Router::new()
        .route("/upload/{bucket}/{*path}", put(storage::upload))
        .layer(DefaultBodyLimit::max(limit))
}

/// Create all routes for the site.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(landing::show))
        .route("/brand.css", get(brand::stylesheet))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(lead_routes())
        .nest("/admin", admin_routes())
        .nest("/api", api::routes())
        .nest(
            "/storage",
            storage_routes(state.storage().max_upload_bytes()),
        )
}

#[cfg(test)]
mod tests;
