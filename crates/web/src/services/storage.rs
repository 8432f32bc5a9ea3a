//! Signed uploads into the local media directory.
//!
//! The console never writes files directly. It asks for a signed upload URL,
//! then `PUT`s the bytes to it. A URL is bound to one bucket and object path,
//! expires after the configured TTL, and accepts a single upload. Objects are
//! served read-only under `/media/{bucket}/{path}`.
//!
//! Signatures are HMAC-SHA256 over `bucket\npath\nexpires`, base64url encoded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::config::UploadConfig;

type HmacSha256 = Hmac<Sha256>;

const MAX_PATH_LENGTH: usize = 255;
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors from signing or accepting uploads.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("invalid object path")]
    InvalidPath,

    #[error("invalid upload signature")]
    InvalidSignature,

    #[error("upload URL has expired")]
    Expired,

    #[error("upload URL has already been used")]
    AlreadyUsed,

    #[error("upload exceeds the {max} byte limit")]
    TooLarge { max: u64 },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether the error is the caller's fault rather than the server's.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// A signed upload URL, as returned to the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    pub signed_url: String,
    pub token: String,
    /// Object path inside the bucket.
    pub path: String,
    pub content_type: String,
    pub expires_at: DateTime<Utc>,
}

/// Local media storage with signed, single-use uploads.
#[derive(Clone)]
pub struct MediaStorage {
    base_url: String,
    config: UploadConfig,
    used_tokens: Cache<String, ()>,
}

impl std::fmt::Debug for MediaStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStorage")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MediaStorage {
    #[must_use]
    pub fn new(base_url: &str, config: UploadConfig) -> Self {
        // Used tokens only need remembering until their URL would expire anyway.
        let used_tokens = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(config.url_ttl + Duration::from_secs(60))
            .build();

        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            config,
            used_tokens,
        }
    }

    /// Root of the media directory served under `/media`.
    #[must_use]
    pub fn media_dir(&self) -> &Path {
        &self.config.media_dir
    }

    #[must_use]
    pub const fn max_upload_bytes(&self) -> u64 {
        self.config.max_upload_bytes
    }

    /// Sign an upload of `bucket/path`, valid for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnknownBucket` or `StorageError::InvalidPath`
    /// for a target outside the allowlist or a path that could escape it.
    pub fn sign_upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: Option<&str>,
    ) -> Result<SignedUpload, StorageError> {
        self.check_target(bucket, path)?;

        let ttl = chrono::Duration::from_std(self.config.url_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(2));
        let expires_at = Utc::now() + ttl;
        let token = self.signature(bucket, path, expires_at.timestamp());
        let signed_url = format!(
            "{}/storage/upload/{bucket}/{path}?token={token}&expires={}",
            self.base_url,
            expires_at.timestamp()
        );

        Ok(SignedUpload {
            signed_url,
            token,
            path: path.to_owned(),
            content_type: content_type
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_owned(),
            expires_at,
        })
    }

    /// Check a token and consume it.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad target, a tampered or expired token, or a
    /// token that has been used before.
    pub async fn authorize_upload(
        &self,
        bucket: &str,
        path: &str,
        token: &str,
        expires: i64,
    ) -> Result<(), StorageError> {
        self.check_target(bucket, path)?;
        self.verify_signature(bucket, path, expires, token)?;
        if Utc::now().timestamp() > expires {
            return Err(StorageError::Expired);
        }

        let entry = self.used_tokens.entry(token.to_owned()).or_insert(()).await;
        if !entry.is_fresh() {
            return Err(StorageError::AlreadyUsed);
        }
        Ok(())
    }

    /// Write an authorized upload to disk, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TooLarge` for oversized bodies and
    /// `StorageError::Io` if the file cannot be written.
    pub async fn store(&self, bucket: &str, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.check_target(bucket, path)?;
        if bytes.len() as u64 > self.config.max_upload_bytes {
            return Err(StorageError::TooLarge {
                max: self.config.max_upload_bytes,
            });
        }

        let target = self.object_path(bucket, path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let partial = partial_path(&target);
        let written = match tokio::fs::write(&partial, bytes).await {
            Ok(()) => tokio::fs::rename(&partial, &target).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }

        tracing::info!(bucket, path, size = bytes.len(), "Stored upload");
        Ok(())
    }

    /// Public URL of an object, relative to the site root so it stays
    /// same-origin for the media CSP.
    ///
    /// # Errors
    ///
    /// Returns the same target errors as [`Self::sign_upload`].
    pub fn public_url(&self, bucket: &str, path: &str) -> Result<String, StorageError> {
        self.check_target(bucket, path)?;
        Ok(format!("/media/{bucket}/{path}"))
    }

    fn check_target(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        if !self.config.allows_bucket(bucket) {
            return Err(StorageError::UnknownBucket(bucket.to_owned()));
        }
        if !is_safe_path(path) {
            return Err(StorageError::InvalidPath);
        }
        Ok(())
    }

    fn object_path(&self, bucket: &str, path: &str) -> PathBuf {
        path.split('/')
            .fold(self.config.media_dir.join(bucket), |dir, part| dir.join(part))
    }

    fn mac(&self, bucket: &str, path: &str, expires: i64) -> HmacSha256 {
        #[allow(clippy::expect_used)]
        let mut mac = HmacSha256::new_from_slice(
            self.config.signing_secret.expose_secret().as_bytes(),
        )
        .expect("HMAC accepts keys of any length");
        mac.update(format!("{bucket}\n{path}\n{expires}").as_bytes());
        mac
    }

    fn signature(&self, bucket: &str, path: &str, expires: i64) -> String {
        URL_SAFE_NO_PAD.encode(self.mac(bucket, path, expires).finalize().into_bytes())
    }

    fn verify_signature(
        &self,
        bucket: &str,
        path: &str,
        expires: i64,
        token: &str,
    ) -> Result<(), StorageError> {
        let provided = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| StorageError::InvalidSignature)?;
        self.mac(bucket, path, expires)
            .verify_slice(&provided)
            .map_err(|_| StorageError::InvalidSignature)
    }
}

/// Relative object paths made of `[A-Za-z0-9._-]` segments, none of which
/// may be empty or start with a dot.
/// Sibling of `target` that no other object or concurrent upload can share.
fn partial_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!("{name}.{}.part", Uuid::new_v4().simple()))
}

fn is_safe_path(path: &str) -> bool {
    !path.is_empty()
        && path.len() <= MAX_PATH_LENGTH
        && path.split('/').all(|segment| {
            !segment.is_empty()
                && !segment.starts_with('.')
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        })
}
