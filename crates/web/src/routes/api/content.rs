//! `update-site-content` broker.

use axum::{extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use klyp_core::sections::SchemaIssue;
use klyp_core::{ContentDocument, ContentDocumentId, SectionName};

use super::{ApiJson, Data};
use crate::content::SavedDocument;
use crate::error::ApiError;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Request body for `update-site-content`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentRequest {
    #[serde(default)]
    pub id: Option<ContentDocumentId>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    /// When set, the write only succeeds if the stored document still has
    /// this `updated_at`.
    #[serde(default)]
    pub expected_updated_at: Option<DateTime<Utc>>,
}

/// The saved document plus any non-blocking schema issues.
#[derive(Debug, Serialize)]
pub struct SavedContent {
    #[serde(flatten)]
    pub document: ContentDocument,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SchemaIssue>,
}

impl From<SavedDocument> for SavedContent {
    fn from(saved: SavedDocument) -> Self {
        Self {
            document: saved.document,
            warnings: saved.warnings,
        }
    }
}

/// Save a content document by id or by section.
///
/// POST /api/update-site-content
///
/// With `id` the document is overwritten in place; with `section` it is
/// upserted. `id` wins when both are given.
///
/// # Errors
///
/// Returns 400 for content that is not an object, a request naming neither
/// id nor section, or content failing the section schema; 404 for an
/// unknown id; 409 for a stale `expectedUpdatedAt`.
#[instrument(skip(admin, state, request), fields(admin = %admin.email))]
pub async fn update_site_content(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Value::Object(content)) = request.content else {
        return Err(ApiError::BadRequest("Invalid content payload".to_owned()));
    };

    let saved = if let Some(id) = request.id {
        state
            .content()
            .replace(id, content, request.expected_updated_at)
            .await?
    } else if let Some(section) = request.section {
        let section =
            SectionName::parse(&section).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        state.content().update(&section, content).await?
    } else {
        return Err(ApiError::BadRequest("Provide id or section".to_owned()));
    };

    tracing::info!(
        section = %saved.document.section,
        warnings = saved.warnings.len(),
        "Content document saved"
    );
    Ok(Data(SavedContent::from(saved)))
}
