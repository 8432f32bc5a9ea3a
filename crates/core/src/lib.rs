//! KLYP Core - Domain types for the KLYP Workbench landing site.
//!
//! This crate provides the types shared by every KLYP component:
//! - `web` - Landing page, lead capture, and the admin console
//! - `cli` - Command-line tools for migrations, admin accounts, and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Persistence lives in `klyp-web`; with the `postgres`
//! feature enabled the ID and email newtypes can be bound directly in `sqlx`
//! queries.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails
//! - [`lead`] - Founders-list sign-ups and their validation
//! - [`content`] - Section names, content documents, and the keyed accessor
//! - [`palette`] - Brand colors and their CSS representation
//! - [`sections`] - Typed schemas for each landing page section

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod content;
pub mod lead;
pub mod palette;
pub mod sections;
pub mod types;

pub use content::{ContentDocument, SectionName, SectionNameError, SiteContent};
pub use lead::{Lead, LeadSubmission, LeadValidationError, NewLead};
pub use palette::{BrandColor, BrandPalette};
pub use types::*;
