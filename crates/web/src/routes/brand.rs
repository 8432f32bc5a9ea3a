//! Brand palette stylesheet.
//!
//! Served as a separate stylesheet so the content security policy can keep
//! `style-src 'self'` without inline styles.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::state::AppState;

/// Serve the `:root` overrides for the brand colors.
///
/// Reads the current snapshot; an empty body leaves the defaults from
/// `main.css` in place.
pub async fn stylesheet(State(state): State<AppState>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        state.content().palette().to_css(),
    )
}
