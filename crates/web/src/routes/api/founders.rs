//! `admin-founders` broker.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use klyp_core::LeadId;

use super::{ApiJson, Data};
use crate::error::ApiError;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Request body for `admin-founders`.
#[derive(Debug, Deserialize)]
pub struct FoundersRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub id: Option<LeadId>,
}

/// List the founders list or mark a lead contacted.
///
/// POST /api/admin-founders
///
/// - `{"action": "list"}` returns every lead, newest first.
/// - `{"action": "mark_contacted", "id": 3}` returns the updated lead.
///
/// # Errors
///
/// Returns 400 for a missing id or unknown action and 404 for an unknown id.
#[instrument(skip(admin, state, request), fields(admin = %admin.email))]
pub async fn handle(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<FoundersRequest>,
) -> Result<Response, ApiError> {
    match request.action.as_deref() {
        Some("list") => {
            let leads = state.leads().list().await?;
            Ok(Data(leads).into_response())
        }
        Some("mark_contacted") => {
            let id = request
                .id
                .ok_or_else(|| ApiError::BadRequest("Missing id".to_owned()))?;
            let lead = state.leads().mark_contacted(id).await?;
            tracing::info!(lead_id = %lead.id, "Lead marked contacted");
            Ok(Data(lead).into_response())
        }
        _ => Err(ApiError::BadRequest("Unknown action".to_owned())),
    }
}
