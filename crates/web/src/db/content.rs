//! Content document repository.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::types::Json;

use klyp_core::{ContentDocument, ContentDocumentId, SectionName};

use super::RepositoryError;

/// Storage for content documents.
///
/// Every write replaces the whole `content` object and bumps `updated_at`.
#[async_trait::async_trait]
pub trait ContentRepository: Send + Sync + 'static {
    /// Every document, in no particular order.
    async fn list(&self) -> Result<Vec<ContentDocument>, RepositoryError>;

    /// Insert or overwrite the document for `section`.
    async fn upsert(
        &self,
        section: &SectionName,
        content: &Map<String, Value>,
    ) -> Result<ContentDocument, RepositoryError>;

    /// Insert an empty document.
    ///
    /// Returns [`RepositoryError::Conflict`] if the section already exists.
    async fn create(&self, section: &SectionName) -> Result<ContentDocument, RepositoryError>;

    /// Overwrite the document with the given id.
    ///
    /// With `expected_updated_at` set, the write only happens while the
    /// stored timestamp still matches; otherwise it fails with
    /// [`RepositoryError::Conflict`].
    async fn replace(
        &self,
        id: ContentDocumentId,
        content: &Map<String, Value>,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<ContentDocument, RepositoryError>;
}

#[derive(Debug, sqlx::FromRow)]
struct ContentDocumentRow {
    id: i32,
    section: String,
    content: Json<Value>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContentDocumentRow> for ContentDocument {
    type Error = RepositoryError;

    fn try_from(row: ContentDocumentRow) -> Result<Self, Self::Error> {
        let section = SectionName::parse(&row.section).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid section name in database: {e}"))
        })?;
        let Value::Object(content) = row.content.0 else {
            return Err(RepositoryError::DataCorruption(format!(
                "content of section {section} is not a JSON object"
            )));
        };

        Ok(Self {
            id: ContentDocumentId::new(row.id),
            section,
            content,
            updated_at: row.updated_at,
        })
    }
}

const DOCUMENT_COLUMNS: &str = "id, section, content, updated_at";

/// `PostgreSQL` content repository.
#[derive(Debug, Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ContentRepository for PgContentRepository {
    async fn list(&self) -> Result<Vec<ContentDocument>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContentDocumentRow>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM klyp.content_document"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn upsert(
        &self,
        section: &SectionName,
        content: &Map<String, Value>,
    ) -> Result<ContentDocument, RepositoryError> {
        let row = sqlx::query_as::<_, ContentDocumentRow>(&format!(
            r"
            INSERT INTO klyp.content_document (section, content)
            VALUES ($1, $2)
            ON CONFLICT (section)
            DO UPDATE SET content = EXCLUDED.content, updated_at = now()
            RETURNING {DOCUMENT_COLUMNS}
            "
        ))
        .bind(section.as_str())
        .bind(Json(content))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn create(&self, section: &SectionName) -> Result<ContentDocument, RepositoryError> {
        let row = sqlx::query_as::<_, ContentDocumentRow>(&format!(
            r"
            INSERT INTO klyp.content_document (section, content)
            VALUES ($1, '{{}}'::jsonb)
            RETURNING {DOCUMENT_COLUMNS}
            "
        ))
        .bind(section.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_insert(e, || format!("section {section} already exists"))
        })?;

        row.try_into()
    }

    async fn replace(
        &self,
        id: ContentDocumentId,
        content: &Map<String, Value>,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<ContentDocument, RepositoryError> {
        let row = sqlx::query_as::<_, ContentDocumentRow>(&format!(
            r"
            UPDATE klyp.content_document
            SET content = $2, updated_at = now()
            WHERE id = $1 AND ($3::timestamptz IS NULL OR updated_at = $3)
            RETURNING {DOCUMENT_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(Json(content))
        .bind(expected_updated_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return row.try_into();
        }

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM klyp.content_document WHERE id = $1)",
        )
        .bind(id.as_i32())
        .fetch_one(&self.pool)
        .await?;

        if exists {
            Err(RepositoryError::Conflict(
                "document was changed by someone else".to_owned(),
            ))
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}
