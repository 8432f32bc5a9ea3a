//! JSON brokers for the admin console.
//!
//! Every broker is POST-only and answers `{"data": ...}` on success or
//! `{"error": "..."}` otherwise. Other methods get a JSON 405 and CORS
//! preflights are answered for any origin.

pub mod content;
pub mod founders;
pub mod uploads;

use axum::{
    Json, Router,
    extract::FromRequest,
    handler::Handler,
    http::{HeaderName, Method},
    response::{IntoResponse, Response},
    routing::{MethodRouter, post},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use super::leads;
use crate::error::ApiError;
use crate::middleware::form_rate_limiter;
use crate::state::AppState;

/// JSON body extractor whose rejection renders the `{error}` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Success envelope: `{"data": ...}`.
#[derive(Debug)]
pub struct Data<T>(pub T);

#[derive(Serialize)]
struct Envelope<'a, T> {
    data: &'a T,
}

impl<T: Serialize> IntoResponse for Data<T> {
    fn into_response(self) -> Response {
        Json(Envelope { data: &self.0 }).into_response()
    }
}

/// Answer any method other than POST with a JSON 405.
async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// A POST-only route with the JSON 405 fallback.
fn broker<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    post(handler).fallback(method_not_allowed)
}

/// CORS policy shared by the brokers.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            HeaderName::from_static("content-type"),
        ])
}

/// Create the `/api` routes router.
pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/leads", broker(leads::submit_json))
        .layer(form_rate_limiter());

    Router::new()
        .route("/admin-founders", broker(founders::handle))
        .route("/get-upload-url", broker(uploads::get_upload_url))
        .route("/demo-video", broker(uploads::set_demo_video))
        .route("/update-site-content", broker(content::update_site_content))
        .merge(public)
        .layer(cors_layer())
}
