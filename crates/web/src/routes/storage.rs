//! Signed upload target.
//!
//! The console receives a signed URL from `/api/get-upload-url` and PUTs the
//! file body here. The signature binds bucket, path, and expiry, and each
//! token is accepted once.

use axum::{
    body::{Body, to_bytes},
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::ApiError;
use crate::services::StorageError;
use crate::state::AppState;

/// Query parameters of a signed upload URL.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub token: String,
    pub expires: i64,
}

/// Accept an upload for a signed URL.
///
/// PUT /storage/upload/{bucket}/{*path}?token=...&expires=...
///
/// # Errors
///
/// Returns 400 for a bad target or a tampered, expired, or reused token, 413
/// for an oversized body, and 500 if the file cannot be written.
#[instrument(skip(state, query, body))]
pub async fn upload(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
    Query(query): Query<UploadQuery>,
    body: Body,
) -> Result<StatusCode, ApiError> {
    let storage = state.storage();
    storage
        .authorize_upload(&bucket, &path, &query.token, query.expires)
        .await?;

    let limit = usize::try_from(storage.max_upload_bytes()).unwrap_or(usize::MAX);
    let bytes = to_bytes(body, limit).await.map_err(|e| {
        tracing::warn!(error = %e, "Upload body rejected");
        StorageError::TooLarge {
            max: storage.max_upload_bytes(),
        }
    })?;

    storage.store(&bucket, &path, &bytes).await?;
    Ok(StatusCode::OK)
}
