//! Lead repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use klyp_core::{Email, Lead, LeadId, NewLead};

use super::RepositoryError;

/// Storage for founders-list sign-ups.
#[async_trait::async_trait]
pub trait LeadRepository: Send + Sync + 'static {
    /// Insert a validated lead with `contacted = false`.
    async fn create(&self, lead: &NewLead) -> Result<Lead, RepositoryError>;

    /// Every lead, newest first.
    async fn list(&self) -> Result<Vec<Lead>, RepositoryError>;

    /// Set `contacted` to true. Marking an already contacted lead succeeds.
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown id.
    async fn mark_contacted(&self, id: LeadId) -> Result<Lead, RepositoryError>;
}

#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: i32,
    full_name: String,
    email: String,
    phone: Option<String>,
    business: String,
    integrations: Option<String>,
    created_at: DateTime<Utc>,
    contacted: bool,
}

impl TryFrom<LeadRow> for Lead {
    type Error = RepositoryError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: LeadId::new(row.id),
            full_name: row.full_name,
            email,
            phone: row.phone,
            business: row.business,
            integrations: row.integrations,
            created_at: row.created_at,
            contacted: row.contacted,
        })
    }
}

const LEAD_COLUMNS: &str =
    "id, full_name, email, phone, business, integrations, created_at, contacted";

/// `PostgreSQL` lead repository.
#[derive(Debug, Clone)]
pub struct PgLeadRepository {
    pool: PgPool,
}

impl PgLeadRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LeadRepository for PgLeadRepository {
    async fn create(&self, lead: &NewLead) -> Result<Lead, RepositoryError> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            r"
            INSERT INTO klyp.lead (full_name, email, phone, business, integrations)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LEAD_COLUMNS}
            "
        ))
        .bind(&lead.full_name)
        .bind(lead.email.as_str())
        .bind(lead.phone.as_deref())
        .bind(&lead.business)
        .bind(lead.integrations.as_deref())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list(&self) -> Result<Vec<Lead>, RepositoryError> {
        let rows = sqlx::query_as::<_, LeadRow>(&format!(
            "SELECT {LEAD_COLUMNS} FROM klyp.lead ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn mark_contacted(&self, id: LeadId) -> Result<Lead, RepositoryError> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            "UPDATE klyp.lead SET contacted = TRUE WHERE id = $1 RETURNING {LEAD_COLUMNS}"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
