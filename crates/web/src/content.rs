//! Content store accessor.
//!
//! Holds the most recently fetched [`SiteContent`] snapshot and routes writes
//! through the [`ContentRepository`]. Reads never touch the database; the
//! landing page calls [`ContentStore::refresh`] before rendering.
//!
//! Writes to sections with a typed schema are checked first. Blocking issues
//! reject the write without touching storage; unknown keys are saved and
//! returned as warnings.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use klyp_core::sections::{SchemaIssue, check_section};
use klyp_core::{BrandPalette, ContentDocument, ContentDocumentId, SectionName, SiteContent};

use crate::db::{ContentRepository, RepositoryError};

/// Errors from content writes.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The content does not fit the section's schema.
    #[error("invalid {section} content: {}", join_issues(.issues))]
    Invalid {
        section: SectionName,
        issues: Vec<SchemaIssue>,
    },
}

fn join_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A successful write and any non-blocking schema issues.
#[derive(Debug, Clone)]
pub struct SavedDocument {
    pub document: ContentDocument,
    pub warnings: Vec<SchemaIssue>,
}

/// Accessor over the content documents.
pub struct ContentStore {
    repository: Arc<dyn ContentRepository>,
    snapshot: RwLock<Arc<SiteContent>>,
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("sections", &self.snapshot().len())
            .finish_non_exhaustive()
    }
}

impl ContentStore {
    /// Create an accessor with an empty snapshot.
    #[must_use]
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self {
            repository,
            snapshot: RwLock::new(Arc::new(SiteContent::default())),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SiteContent> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Re-fetch every document and replace the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the repository error; the previous snapshot is kept.
    pub async fn refresh(&self) -> Result<Arc<SiteContent>, RepositoryError> {
        let documents = self.repository.list().await?;
        let fresh = Arc::new(SiteContent::from_documents(documents));
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&fresh);
        Ok(fresh)
    }

    /// Look up `key` in `section`, falling back to `default`.
    #[must_use]
    pub fn get(&self, section: &str, key: &str, default: impl Into<Value>) -> Value {
        self.snapshot().get(section, key, default)
    }

    /// Look up `key` in `section` as display text.
    #[must_use]
    pub fn text(&self, section: &str, key: &str, default: &str) -> String {
        self.snapshot().text(section, key, default)
    }

    /// All documents in the snapshot, most recently updated first.
    #[must_use]
    pub fn documents(&self) -> Vec<ContentDocument> {
        self.snapshot().documents().into_iter().cloned().collect()
    }

    /// The brand palette from the snapshot.
    #[must_use]
    pub fn palette(&self) -> BrandPalette {
        BrandPalette::from_content(&self.snapshot())
    }

    /// Replace the content of `section`, creating the document if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Invalid`] if the content fails the section's
    /// schema, or the repository error.
    pub async fn update(
        &self,
        section: &SectionName,
        content: Map<String, Value>,
    ) -> Result<SavedDocument, ContentError> {
        let warnings = check(section, &content)?;
        let document = self.repository.upsert(section, &content).await?;
        self.remember(&document);
        Ok(SavedDocument { document, warnings })
    }

    /// Set `entries` in `section`, keeping every other stored key.
    ///
    /// Reads the latest stored document first, so keys written elsewhere
    /// since the last refresh are preserved.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update`], plus the repository error from the refresh.
    pub async fn merge(
        &self,
        section: &SectionName,
        entries: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<SavedDocument, ContentError> {
        let current = self.refresh().await?;
        let mut content = current
            .section(section.as_str())
            .cloned()
            .unwrap_or_default();
        content.extend(entries);
        self.update(section, content).await
    }

    /// Overwrite the document with the given id.
    ///
    /// With `expected_updated_at` set the write is rejected with
    /// [`RepositoryError::Conflict`] if the document changed since.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown id,
    /// [`ContentError::Invalid`] for content that fails the schema, or the
    /// repository error.
    pub async fn replace(
        &self,
        id: ContentDocumentId,
        content: Map<String, Value>,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<SavedDocument, ContentError> {
        let section = match self.section_of(id) {
            Some(section) => section,
            None => {
                self.refresh().await?;
                self.section_of(id).ok_or(RepositoryError::NotFound)?
            }
        };
        let warnings = check(&section, &content)?;
        let document = self
            .repository
            .replace(id, &content, expected_updated_at)
            .await?;
        self.remember(&document);
        Ok(SavedDocument { document, warnings })
    }

    /// Insert an empty document for a new section.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the section exists.
    pub async fn create_section(
        &self,
        section: &SectionName,
    ) -> Result<ContentDocument, RepositoryError> {
        let document = self.repository.create(section).await?;
        self.remember(&document);
        Ok(document)
    }

    fn section_of(&self, id: ContentDocumentId) -> Option<SectionName> {
        self.snapshot()
            .document_by_id(id)
            .map(|doc| doc.section.clone())
    }

    fn remember(&self, document: &ContentDocument) {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        Arc::make_mut(&mut *snapshot).upsert(document.clone());
    }
}

/// Check `content` against the schema of `section`, returning warnings.
fn check(
    section: &SectionName,
    content: &Map<String, Value>,
) -> Result<Vec<SchemaIssue>, ContentError> {
    let (blocking, warnings): (Vec<_>, Vec<_>) = check_section(section.as_str(), content)
        .into_iter()
        .partition(SchemaIssue::is_blocking);
    if blocking.is_empty() {
        Ok(warnings)
    } else {
        Err(ContentError::Invalid {
            section: section.clone(),
            issues: blocking,
        })
    }
}
