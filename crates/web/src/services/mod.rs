//! Business services used by the route handlers.
//!
//! - [`auth`] - Credential verification and console account management
//! - [`storage`] - Signed uploads into the media directory

pub mod auth;
pub mod storage;

pub use auth::{AuthError, AuthService, CredentialVerifier};
pub use storage::{MediaStorage, SignedUpload, StorageError};
