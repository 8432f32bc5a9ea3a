//! In-memory repositories for testing.
//!
//! These keep everything in collections behind a `RwLock` and are lost when
//! the process exits. They follow the same contracts as the `PostgreSQL`
//! repositories, including conflicts and optimistic concurrency, so router
//! tests can run without a database.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use klyp_core::{
    AdminUserId, ContentDocument, ContentDocumentId, Email, Lead, LeadId, NewLead, SectionName,
};

use super::{AdminUserRepository, ContentRepository, LeadRepository, RepositoryError};
use crate::models::{AdminCredentials, AdminUser};

/// A timestamp strictly after `previous`, so every write is observable
/// through `updated_at` even when the clock has not moved.
fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if now <= prev => prev + TimeDelta::microseconds(1),
        _ => now,
    }
}

fn next_id<T>(items: impl Iterator<Item = T>, id: impl Fn(T) -> i32) -> i32 {
    items.map(id).max().unwrap_or(0) + 1
}

// =============================================================================
// Leads
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryLeadRepository {
    leads: Arc<RwLock<Vec<Lead>>>,
}

impl MemoryLeadRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored leads.
    pub async fn count(&self) -> usize {
        self.leads.read().await.len()
    }
}

#[async_trait::async_trait]
impl LeadRepository for MemoryLeadRepository {
    async fn create(&self, lead: &NewLead) -> Result<Lead, RepositoryError> {
        let mut leads = self.leads.write().await;
        let created_at = next_timestamp(leads.iter().map(|l| l.created_at).max());
        let stored = Lead {
            id: LeadId::new(next_id(leads.iter(), |l| l.id.as_i32())),
            full_name: lead.full_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            business: lead.business.clone(),
            integrations: lead.integrations.clone(),
            created_at,
            contacted: false,
        };
        leads.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<Lead>, RepositoryError> {
        let mut leads = self.leads.read().await.clone();
        leads.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(leads)
    }

    async fn mark_contacted(&self, id: LeadId) -> Result<Lead, RepositoryError> {
        let mut leads = self.leads.write().await;
        let lead = leads
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(RepositoryError::NotFound)?;
        lead.contacted = true;
        Ok(lead.clone())
    }
}

// =============================================================================
// Content documents
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryContentRepository {
    documents: Arc<RwLock<BTreeMap<SectionName, ContentDocument>>>,
}

impl MemoryContentRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with documents, keyed by their section.
    #[must_use]
    pub fn with_documents(documents: impl IntoIterator<Item = ContentDocument>) -> Self {
        let documents = documents
            .into_iter()
            .map(|doc| (doc.section.clone(), doc))
            .collect();
        Self {
            documents: Arc::new(RwLock::new(documents)),
        }
    }
}

#[async_trait::async_trait]
impl ContentRepository for MemoryContentRepository {
    async fn list(&self) -> Result<Vec<ContentDocument>, RepositoryError> {
        Ok(self.documents.read().await.values().cloned().collect())
    }

    async fn upsert(
        &self,
        section: &SectionName,
        content: &Map<String, Value>,
    ) -> Result<ContentDocument, RepositoryError> {
        let mut documents = self.documents.write().await;
        let id = match documents.get(section.as_str()) {
            Some(existing) => existing.id,
            None => ContentDocumentId::new(next_id(documents.values(), |d| d.id.as_i32())),
        };
        let previous = documents.get(section.as_str()).map(|d| d.updated_at);
        let document = ContentDocument {
            id,
            section: section.clone(),
            content: content.clone(),
            updated_at: next_timestamp(previous),
        };
        documents.insert(section.clone(), document.clone());
        Ok(document)
    }

    async fn create(&self, section: &SectionName) -> Result<ContentDocument, RepositoryError> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(section.as_str()) {
            return Err(RepositoryError::Conflict(format!(
                "section {section} already exists"
            )));
        }
        let document = ContentDocument {
            id: ContentDocumentId::new(next_id(documents.values(), |d| d.id.as_i32())),
            section: section.clone(),
            content: Map::new(),
            updated_at: next_timestamp(None),
        };
        documents.insert(section.clone(), document.clone());
        Ok(document)
    }

    async fn replace(
        &self,
        id: ContentDocumentId,
        content: &Map<String, Value>,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<ContentDocument, RepositoryError> {
        let mut documents = self.documents.write().await;
        let document = documents
            .values_mut()
            .find(|d| d.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if expected_updated_at.is_some_and(|expected| expected != document.updated_at) {
            return Err(RepositoryError::Conflict(
                "document was changed by someone else".to_owned(),
            ));
        }
        document.content = content.clone();
        document.updated_at = next_timestamp(Some(document.updated_at));
        Ok(document.clone())
    }
}

// =============================================================================
// Admin users
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryAdminUserRepository {
    users: Arc<RwLock<Vec<AdminCredentials>>>,
}

impl MemoryAdminUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AdminUserRepository for MemoryAdminUserRepository {
    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<AdminCredentials>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.user.email.as_str().eq_ignore_ascii_case(email.as_str()))
            .cloned())
    }

    async fn create(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<AdminUser, RepositoryError> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.user.email.as_str().eq_ignore_ascii_case(email.as_str()))
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let user = AdminUser {
            id: AdminUserId::new(next_id(users.iter(), |u| u.user.id.as_i32())),
            email: email.clone(),
            created_at: Utc::now(),
            last_login: None,
        };
        users.push(AdminCredentials {
            user: user.clone(),
            password_hash: password_hash.to_owned(),
        });
        Ok(user)
    }

    async fn set_password_hash(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let credentials = users
            .iter_mut()
            .find(|u| u.user.email.as_str().eq_ignore_ascii_case(email.as_str()))
            .ok_or(RepositoryError::NotFound)?;
        password_hash.clone_into(&mut credentials.password_hash);
        Ok(())
    }

    async fn record_login(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if let Some(credentials) = users.iter_mut().find(|u| u.user.id == id) {
            credentials.user.last_login = Some(Utc::now());
        }
        Ok(())
    }
}
