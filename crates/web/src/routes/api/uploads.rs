//! Signed upload brokers.
//!
//! The console asks `get-upload-url` for a signed URL, PUTs the file there,
//! then calls `demo-video` to point the demo section at the new object.

use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use klyp_core::sections::{DEMO_SECTION, DemoContent};
use klyp_core::{ContentDocument, SectionName};

use super::{ApiJson, Data};
use crate::error::ApiError;
use crate::middleware::RequireAdminAuth;
use crate::services::SignedUpload;
use crate::state::AppState;

/// Request body for `get-upload-url`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// An object in a bucket.
#[derive(Debug, Deserialize)]
pub struct ObjectRef {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

fn required_target(
    bucket: Option<&str>,
    path: Option<&str>,
) -> Result<(String, String), ApiError> {
    fn non_blank(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }

    match (non_blank(bucket), non_blank(path)) {
        (Some(bucket), Some(path)) => Ok((bucket.to_owned(), path.to_owned())),
        _ => Err(ApiError::BadRequest(
            "bucket and path are required".to_owned(),
        )),
    }
}

/// Sign an upload URL.
///
/// POST /api/get-upload-url
///
/// # Errors
///
/// Returns 400 for a missing bucket or path, an unknown bucket, or an unsafe
/// path.
#[instrument(skip(admin, state, request), fields(admin = %admin.email))]
pub async fn get_upload_url(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UploadUrlRequest>,
) -> Result<Data<SignedUpload>, ApiError> {
    let (bucket, path) = required_target(request.bucket.as_deref(), request.path.as_deref())?;
    let signed = state
        .storage()
        .sign_upload(&bucket, &path, request.content_type.as_deref())?;
    tracing::info!(bucket, path, "Signed upload URL");
    Ok(Data(signed))
}

/// Point the demo section at an uploaded video.
///
/// POST /api/demo-video
///
/// Sets `videoUrl` and `videoType: "upload"`, keeping the other demo keys.
/// Creates the demo document if it does not exist yet.
///
/// # Errors
///
/// Returns 400 for a missing or invalid target.
#[instrument(skip(admin, state, object), fields(admin = %admin.email))]
pub async fn set_demo_video(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    ApiJson(object): ApiJson<ObjectRef>,
) -> Result<Data<ContentDocument>, ApiError> {
    let (bucket, path) = required_target(object.bucket.as_deref(), object.path.as_deref())?;
    let url = state.storage().public_url(&bucket, &path)?;

    let section = SectionName::parse(DEMO_SECTION)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let saved = state
        .content()
        .merge(
            &section,
            [
                (DemoContent::VIDEO_URL_KEY.to_owned(), Value::String(url)),
                (
                    DemoContent::VIDEO_TYPE_KEY.to_owned(),
                    Value::String(DemoContent::VIDEO_TYPE_UPLOAD.to_owned()),
                ),
            ],
        )
        .await?;

    tracing::info!(bucket, path, "Demo video updated");
    Ok(Data(saved.document))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_target() {
        assert_eq!(
            required_target(Some("videos"), Some("a.mp4")).ok(),
            Some(("videos".to_owned(), "a.mp4".to_owned()))
        );
        assert!(required_target(None, Some("a.mp4")).is_err());
        assert!(required_target(Some("videos"), Some("  ")).is_err());
        assert_eq!(
            required_target(Some(" videos "), Some(" a.mp4\n")).ok(),
            Some(("videos".to_owned(), "a.mp4".to_owned()))
        );
    }
}
