//! Founders-list leads.
//!
//! A [`LeadSubmission`] is what the sign-up form posts: raw, untrusted
//! strings. [`LeadSubmission::validate`] turns it into a [`NewLead`] that can
//! be inserted, or explains what the visitor needs to fix. Stored rows come
//! back as [`Lead`].

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, EmailError, LeadId};

/// A stored founders-list sign-up.
///
/// `contacted` only ever moves from `false` to `true`; leads are never
/// deleted by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub full_name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub business: String,
    pub integrations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub contacted: bool,
}

/// Raw form input for a founders-list sign-up.
///
/// Accepts both the HTML form field names and the camelCase keys sent by
/// JSON clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSubmission {
    #[serde(default, alias = "fullName")]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub business: String,
    #[serde(default)]
    pub integrations: String,
}

/// A validated lead, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    pub full_name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub business: String,
    pub integrations: Option<String>,
}

/// Form fields of a [`LeadSubmission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    FullName,
    Email,
    Phone,
    Business,
    Integrations,
}

impl LeadField {
    /// Maximum accepted length, in characters.
    #[must_use]
    pub const fn max_len(self) -> usize {
        match self {
            Self::FullName => 200,
            Self::Email => Email::MAX_LENGTH,
            Self::Phone => 50,
            Self::Business | Self::Integrations => 5000,
        }
    }

    /// Human readable label, as shown next to the form input.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FullName => "Full name",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Business => "Business",
            Self::Integrations => "Integrations",
        }
    }
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a [`LeadSubmission`] was rejected.
///
/// The `Display` text is safe to show to the visitor as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LeadValidationError {
    /// One or more required fields are blank.
    #[error("Please fill in all required fields.")]
    MissingRequired(Vec<LeadField>),
    /// The email does not have the shape `name@domain.tld`.
    #[error("Please enter a valid email address.")]
    InvalidEmail(#[source] EmailError),
    /// A field exceeds its maximum length.
    #[error("{field} must be at most {max} characters.")]
    TooLong { field: LeadField, max: usize },
}

impl LeadSubmission {
    /// Validate the submission.
    ///
    /// Fields are trimmed first, so whitespace-only input counts as missing.
    /// Blank optional fields become `None`.
    ///
    /// # Errors
    ///
    /// Returns [`LeadValidationError::MissingRequired`] listing every blank
    /// required field, then [`LeadValidationError::InvalidEmail`] if the email
    /// fails the shape check, then [`LeadValidationError::TooLong`] for the
    /// first oversized field.
    pub fn validate(&self) -> Result<NewLead, LeadValidationError> {
        let full_name = self.full_name.trim();
        let email = self.email.trim();
        let business = self.business.trim();

        let missing: Vec<LeadField> = [
            (LeadField::FullName, full_name),
            (LeadField::Email, email),
            (LeadField::Business, business),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(LeadValidationError::MissingRequired(missing));
        }

        let email = Email::parse(email).map_err(LeadValidationError::InvalidEmail)?;

        let phone = non_blank(&self.phone);
        let integrations = non_blank(&self.integrations);

        check_len(LeadField::FullName, full_name)?;
        check_len(LeadField::Business, business)?;
        if let Some(phone) = phone {
            check_len(LeadField::Phone, phone)?;
        }
        if let Some(integrations) = integrations {
            check_len(LeadField::Integrations, integrations)?;
        }

        Ok(NewLead {
            full_name: full_name.to_owned(),
            email,
            phone: phone.map(str::to_owned),
            business: business.to_owned(),
            integrations: integrations.map(str::to_owned),
        })
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn check_len(field: LeadField, value: &str) -> Result<(), LeadValidationError> {
    let max = field.max_len();
    if value.chars().count() > max {
        return Err(LeadValidationError::TooLong { field, max });
    }
    Ok(())
}
