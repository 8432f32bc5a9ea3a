//! Editable page content.
//!
//! Page copy lives in content documents: one JSON object per named section.
//! [`SiteContent`] is a snapshot of every document, keyed by section, and
//! implements the `get(section, key, default)` lookup the page sections use.

use core::fmt;
use std::borrow::Borrow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ContentDocumentId;

/// Errors that can occur when parsing a [`SectionName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionNameError {
    #[error("section name cannot be empty")]
    Empty,
    #[error("section name must be at most {max} characters")]
    TooLong { max: usize },
    #[error("section name may only contain letters, digits, '-' and '_'")]
    InvalidCharacter,
}

/// The unique name of a content document, e.g. `hero` or `branding`.
///
/// Names are trimmed and limited to ASCII letters, digits, `-` and `_`, so
/// they are safe to embed in URLs, form fields and HTML ids without escaping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionName(String);

impl SectionName {
    /// Maximum length of a section name.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a section name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed name is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains characters outside `[A-Za-z0-9_-]`.
    pub fn parse(s: &str) -> Result<Self, SectionNameError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SectionNameError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SectionNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SectionNameError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SectionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SectionName {
    type Error = SectionNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SectionName> for String {
    fn from(name: SectionName) -> Self {
        name.0
    }
}

impl std::str::FromStr for SectionName {
    type Err = SectionNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A stored content document.
///
/// `content` is always a JSON object and is replaced wholesale on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub id: ContentDocumentId,
    pub section: SectionName,
    pub content: Map<String, Value>,
    pub updated_at: DateTime<Utc>,
}

/// A point-in-time view of every content document, keyed by section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteContent {
    documents: BTreeMap<SectionName, ContentDocument>,
}

impl SiteContent {
    /// Build a snapshot from stored documents.
    ///
    /// If two documents share a section the later one wins.
    #[must_use]
    pub fn from_documents(documents: impl IntoIterator<Item = ContentDocument>) -> Self {
        let documents = documents
            .into_iter()
            .map(|doc| (doc.section.clone(), doc))
            .collect();
        Self { documents }
    }

    /// Look up `key` in `section`.
    ///
    /// A stored JSON `null` is treated the same as a missing key.
    #[must_use]
    pub fn value(&self, section: &str, key: &str) -> Option<&Value> {
        self.section(section)?
            .get(key)
            .filter(|value| !value.is_null())
    }

    /// Look up `key` in `section`, falling back to `default`.
    #[must_use]
    pub fn get(&self, section: &str, key: &str, default: impl Into<Value>) -> Value {
        self.value(section, key)
            .cloned()
            .unwrap_or_else(|| default.into())
    }

    /// Look up `key` in `section` as display text.
    ///
    /// Numbers and booleans are rendered as text; arrays and objects fall
    /// back to `default`.
    #[must_use]
    pub fn text(&self, section: &str, key: &str, default: &str) -> String {
        match self.value(section, key) {
            Some(Value::String(s)) => s.clone(),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
            _ => default.to_owned(),
        }
    }

    /// The content object of `section`, if the section exists.
    #[must_use]
    pub fn section(&self, section: &str) -> Option<&Map<String, Value>> {
        self.documents.get(section).map(|doc| &doc.content)
    }

    /// The stored document for `section`, if any.
    #[must_use]
    pub fn document(&self, section: &str) -> Option<&ContentDocument> {
        self.documents.get(section)
    }

    /// The stored document with the given id, if any.
    #[must_use]
    pub fn document_by_id(&self, id: ContentDocumentId) -> Option<&ContentDocument> {
        self.documents.values().find(|doc| doc.id == id)
    }

    /// All documents, most recently updated first.
    #[must_use]
    pub fn documents(&self) -> Vec<&ContentDocument> {
        let mut docs: Vec<_> = self.documents.values().collect();
        docs.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.section.cmp(&b.section))
        });
        docs
    }

    /// Insert or replace the document for its section.
    pub fn upsert(&mut self, document: ContentDocument) {
        self.documents.insert(document.section.clone(), document);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn doc(id: i32, section: &str, content: Value, minute: u32) -> ContentDocument {
        let Value::Object(content) = content else {
            panic!("content must be an object");
        };
        ContentDocument {
            id: ContentDocumentId::new(id),
            section: SectionName::parse(section).unwrap(),
            content,
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_section_name_rules() {
        assert_eq!(SectionName::parse("  hero ").unwrap().as_str(), "hero");
        assert!(SectionName::parse("case-studies_2").is_ok());
        assert_eq!(SectionName::parse("   "), Err(SectionNameError::Empty));
        assert_eq!(
            SectionName::parse("two words"),
            Err(SectionNameError::InvalidCharacter)
        );
        assert_eq!(
            SectionName::parse("<script>"),
            Err(SectionNameError::InvalidCharacter)
        );
        assert!(matches!(
            SectionName::parse(&"x".repeat(65)),
            Err(SectionNameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_section_name_deserialize_validates() {
        assert!(serde_json::from_str::<SectionName>("\"pricing\"").is_ok());
        assert!(serde_json::from_str::<SectionName>("\"bad name\"").is_err());
    }

    #[test]
    fn test_get_returns_default_for_missing_section() {
        let content = SiteContent::default();
        assert_eq!(
            content.get("hero", "headline1", "KLYP Workbench"),
            json!("KLYP Workbench")
        );
    }

    #[test]
    fn test_get_returns_stored_value() {
        let content = SiteContent::from_documents([doc(
            1,
            "hero",
            json!({"headline1": "Hello", "count": 3}),
            0,
        )]);
        assert_eq!(content.get("hero", "headline1", "x"), json!("Hello"));
        assert_eq!(content.get("hero", "missing", "x"), json!("x"));
        assert_eq!(content.text("hero", "count", "0"), "3");
    }

    #[test]
    fn test_null_counts_as_absent() {
        let content =
            SiteContent::from_documents([doc(1, "hero", json!({"headline1": null}), 0)]);
        assert_eq!(content.value("hero", "headline1"), None);
        assert_eq!(content.text("hero", "headline1", "fallback"), "fallback");
    }

    #[test]
    fn test_text_falls_back_for_structured_values() {
        let content = SiteContent::from_documents([doc(1, "hero", json!({"items": []}), 0)]);
        assert_eq!(content.text("hero", "items", "none"), "none");
    }

    #[test]
    fn test_documents_newest_first() {
        let content = SiteContent::from_documents([
            doc(1, "hero", json!({}), 1),
            doc(2, "demo", json!({}), 5),
            doc(3, "footer", json!({}), 3),
        ]);
        let order: Vec<_> = content
            .documents()
            .into_iter()
            .map(|d| d.section.as_str())
            .collect();
        assert_eq!(order, ["demo", "footer", "hero"]);
    }

    #[test]
    fn test_upsert_replaces_by_section() {
        let mut content = SiteContent::from_documents([doc(1, "hero", json!({"a": 1}), 0)]);
        content.upsert(doc(1, "hero", json!({"b": 2}), 1));
        assert_eq!(content.len(), 1);
        assert_eq!(content.value("hero", "a"), None);
        assert_eq!(content.value("hero", "b"), Some(&json!(2)));
        assert!(content.document_by_id(ContentDocumentId::new(1)).is_some());
    }
}
