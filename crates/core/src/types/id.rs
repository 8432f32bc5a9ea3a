//! Row ids.
//!
//! Every table in the `klyp` schema uses a serial `integer` key. Each table
//! gets its own id type so a lead id can never be passed where a content
//! document id is expected.

/// Declare an `i32` id newtype.
///
/// The type serializes as a bare number and, with the `postgres` feature,
/// binds and decodes as `integer`.
///
/// ```rust
/// # use klyp_core::define_id;
/// define_id!(
///     /// Id of a newsletter issue.
///     IssueId
/// );
///
/// let id = IssueId::new(7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// A founders-list sign-up (`klyp.lead`).
    LeadId
);
define_id!(
    /// A content document (`klyp.content_document`).
    ContentDocumentId
);
define_id!(
    /// A console account (`klyp.admin_user`).
    AdminUserId
);
