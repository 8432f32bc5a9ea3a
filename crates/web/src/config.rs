//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `KLYP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `KLYP_BASE_URL` - Public URL of the site, used for cookies and signed upload URLs
//! - `KLYP_SIGNING_SECRET` - Upload URL signing key (min 32 chars, high entropy)
//!
//! ## Optional
//! - `KLYP_HOST` - Bind address (default: 127.0.0.1)
//! - `KLYP_PORT` - Listen port (default: 3000)
//! - `KLYP_MEDIA_DIR` - Directory uploaded objects are written to (default: media)
//! - `KLYP_UPLOAD_BUCKETS` - Comma separated bucket allowlist (default: videos)
//! - `KLYP_MAX_UPLOAD_MB` - Largest accepted upload in megabytes (default: 200)
//! - `KLYP_UPLOAD_URL_TTL_SECS` - Lifetime of a signed upload URL (default: 7200)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 1.0)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SIGNING_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Site configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without a trailing slash
    pub base_url: String,
    /// Signed upload configuration
    pub uploads: UploadConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Signed upload configuration.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct UploadConfig {
    /// Key for the HMAC over upload URLs
    pub signing_secret: SecretString,
    /// Directory uploaded objects are written to and served from
    pub media_dir: PathBuf,
    /// Buckets uploads may target
    pub buckets: Vec<String>,
    /// Largest accepted upload body
    pub max_upload_bytes: u64,
    /// How long a signed upload URL stays valid
    pub url_ttl: Duration,
}

impl std::fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadConfig")
            .field("signing_secret", &"[REDACTED]")
            .field("media_dir", &self.media_dir)
            .field("buckets", &self.buckets)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("url_ttl", &self.url_ttl)
            .finish()
    }
}

impl UploadConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let signing_secret = get_validated_secret("KLYP_SIGNING_SECRET")?;
        validate_secret_length(&signing_secret, "KLYP_SIGNING_SECRET")?;

        let media_dir = PathBuf::from(get_env_or_default("KLYP_MEDIA_DIR", "media"));
        let buckets = parse_buckets(&get_env_or_default("KLYP_UPLOAD_BUCKETS", "videos"));
        if buckets.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "KLYP_UPLOAD_BUCKETS".to_string(),
                "must name at least one bucket".to_string(),
            ));
        }
        let max_upload_mb = get_env_or_default("KLYP_MAX_UPLOAD_MB", "200")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("KLYP_MAX_UPLOAD_MB".to_string(), e.to_string())
            })?;
        let url_ttl_secs = get_env_or_default("KLYP_UPLOAD_URL_TTL_SECS", "7200")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("KLYP_UPLOAD_URL_TTL_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            signing_secret,
            media_dir,
            buckets,
            max_upload_bytes: max_upload_mb.saturating_mul(BYTES_PER_MB),
            url_ttl: Duration::from_secs(url_ttl_secs),
        })
    }

    /// Whether uploads may target `bucket`.
    #[must_use]
    pub fn allows_bucket(&self, bucket: &str) -> bool {
        self.buckets.iter().any(|b| b == bucket)
    }
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("KLYP_DATABASE_URL")?;
        let host = get_env_or_default("KLYP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("KLYP_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("KLYP_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("KLYP_PORT".to_string(), e.to_string()))?;
        let base_url = parse_base_url(&get_required_env("KLYP_BASE_URL")?)?;

        let uploads = UploadConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            uploads,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Configuration for a local instance, without reading the environment.
    ///
    /// Used by tests and tooling that build an [`crate::state::AppState`]
    /// directly. The database URL is left empty; callers bring their own pool.
    #[must_use]
    pub fn local(uploads: UploadConfig) -> Self {
        Self {
            database_url: SecretString::from(String::new()),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            uploads,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS, which decides the `Secure`
    /// cookie flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Check the base URL is absolute http(s) and strip any trailing slash.
fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("KLYP_BASE_URL".to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "KLYP_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_buckets(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(String::from)
        .collect()
}

/// Validate that a secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SIGNING_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SIGNING_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_placeholder_secrets_rejected() {
        for value in ["your-signing-key-here", "changeme123", "my-secret-value-1234"] {
            let err = validate_secret_strength(value, "TEST_VAR").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(_, _)), "{value}");
        }
    }

    #[test]
    fn test_low_entropy_secret_rejected() {
        let result = validate_secret_strength(&"a".repeat(40), "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_random_secret_accepted() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "TEST").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "TEST").is_ok());
    }

    #[test]
    fn test_parse_base_url() {
        assert_eq!(
            parse_base_url("https://klyp.travel/").unwrap(),
            "https://klyp.travel"
        );
        assert_eq!(
            parse_base_url("http://localhost:3000").unwrap(),
            "http://localhost:3000"
        );
        assert!(parse_base_url("ftp://klyp.travel").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_parse_buckets() {
        assert_eq!(parse_buckets("videos, images ,,"), ["videos", "images"]);
        assert!(parse_buckets(" , ").is_empty());
    }

    #[test]
    fn test_socket_addr_and_https() {
        let config = WebConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://klyp.travel".to_string(),
            uploads: UploadConfig {
                signing_secret: SecretString::from("x".repeat(32)),
                media_dir: PathBuf::from("media"),
                buckets: vec!["videos".to_string()],
                max_upload_bytes: BYTES_PER_MB,
                url_ttl: Duration::from_secs(60),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(config.is_https());
        assert!(config.uploads.allows_bucket("videos"));
        assert!(!config.uploads.allows_bucket("private"));
        assert!(!format!("{:?}", config.uploads).contains("xxxx"));
    }
}
