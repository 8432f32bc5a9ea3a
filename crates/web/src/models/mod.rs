//! Web-side models that are not part of the core domain.

pub mod admin_user;
pub mod session;

pub use admin_user::{AdminCredentials, AdminUser};
pub use session::{CurrentAdmin, Flash, FlashKind, keys as session_keys};
