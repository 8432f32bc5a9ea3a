//! The admin console page and its form actions.
//!
//! Every action answers with a redirect back to the console tab it came
//! from, carrying the outcome as a flash message. A JSON document that fails
//! to parse or validate is the exception: the console is re-rendered with the
//! edit preserved so nothing typed is lost.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tower_sessions::Session;
use tracing::instrument;

use klyp_core::palette::{BRANDING_SECTION, PRIMARY_COLOR_KEY, SECONDARY_COLOR_KEY};
use klyp_core::sections::{DemoContent, KNOWN_SECTIONS, SectionSchema};
use klyp_core::{ContentDocument, ContentDocumentId, Lead, LeadId, SectionName};

use crate::content::ContentError;
use crate::db::RepositoryError;
use crate::filters;
use crate::middleware::{RequireAdminAuth, set_flash, take_flash};
use crate::models::{CurrentAdmin, Flash};
use crate::state::AppState;

// =============================================================================
// Tabs
// =============================================================================

/// Console tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Leads,
    Content,
    Video,
    Branding,
}

impl Tab {
    pub const ALL: [Self; 4] = [Self::Leads, Self::Content, Self::Video, Self::Branding];

    /// Parse the `?tab=` value, falling back to the leads tab.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|tab| Some(tab.as_str()) == value)
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leads => "leads",
            Self::Content => "content",
            Self::Video => "video",
            Self::Branding => "branding",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Leads => "Founders List",
            Self::Content => "Content",
            Self::Video => "Demo Video",
            Self::Branding => "Brand Colors",
        }
    }

    fn redirect(self) -> Redirect {
        Redirect::to(&format!("/admin?tab={}", self.as_str()))
    }
}

/// A tab in the console navigation.
#[derive(Debug, Clone)]
pub struct TabLink {
    pub key: &'static str,
    pub label: &'static str,
    pub active: bool,
}

// =============================================================================
// View Models
// =============================================================================

/// A lead as shown in the founders list table.
#[derive(Debug, Clone)]
pub struct LeadRow {
    pub id: LeadId,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub business: String,
    pub integrations: String,
    pub submitted: String,
    pub contacted: bool,
}

impl From<Lead> for LeadRow {
    fn from(lead: Lead) -> Self {
        Self {
            id: lead.id,
            full_name: lead.full_name,
            email: lead.email.into_inner(),
            phone: lead.phone.unwrap_or_default(),
            business: lead.business,
            integrations: lead.integrations.unwrap_or_default(),
            submitted: lead.created_at.format("%Y-%m-%d %H:%M").to_string(),
            contacted: lead.contacted,
        }
    }
}

/// A content document in the JSON editor.
#[derive(Debug, Clone)]
pub struct DocumentEditor {
    pub id: ContentDocumentId,
    pub section: String,
    /// Pretty-printed JSON, or the rejected edit.
    pub json: String,
    /// `updated_at` as RFC 3339, echoed back for the concurrency check.
    pub version: String,
    pub updated: String,
    pub error: Option<String>,
}

impl From<ContentDocument> for DocumentEditor {
    fn from(doc: ContentDocument) -> Self {
        let json = serde_json::to_string_pretty(&Value::Object(doc.content))
            .unwrap_or_else(|_| "{}".to_owned());
        Self {
            id: doc.id,
            section: doc.section.to_string(),
            json,
            version: doc.updated_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            updated: doc.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            error: None,
        }
    }
}

// =============================================================================
// Template
// =============================================================================

/// Admin console template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/console.html")]
pub struct ConsoleTemplate {
    pub admin_email: String,
    pub tab: &'static str,
    pub tabs: Vec<TabLink>,
    pub flash: Option<Flash>,
    /// Set when leads or content could not be loaded.
    pub load_error: Option<String>,
    pub leads: Vec<LeadRow>,
    pub documents: Vec<DocumentEditor>,
    /// Known sections without a document yet, offered when adding one.
    pub missing_sections: Vec<&'static str>,
    pub video_url: String,
    pub upload_bucket: String,
    pub max_upload_mb: u64,
    pub primary_color: String,
    pub secondary_color: String,
}

impl ConsoleTemplate {
    async fn load(state: &AppState, admin: &CurrentAdmin, tab: Tab) -> Self {
        let mut load_errors = Vec::new();

        let leads = match state.leads().list().await {
            Ok(leads) => leads.into_iter().map(LeadRow::from).collect(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch submissions");
                load_errors.push("Failed to fetch submissions");
                Vec::new()
            }
        };

        let content = match state.content().refresh().await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch content");
                load_errors.push("Failed to fetch content");
                state.content().snapshot()
            }
        };

        let documents: Vec<DocumentEditor> = content
            .documents()
            .into_iter()
            .cloned()
            .map(DocumentEditor::from)
            .collect();
        let missing_sections = KNOWN_SECTIONS
            .iter()
            .copied()
            .filter(|section| content.document(section).is_none())
            .collect();
        let demo = DemoContent::from_content(&content);
        let branding_text = |key| content.text(BRANDING_SECTION, key, "");
        let uploads = &state.config().uploads;

        Self {
            admin_email: admin.email.to_string(),
            tab: tab.as_str(),
            tabs: Tab::ALL
                .into_iter()
                .map(|t| TabLink {
                    key: t.as_str(),
                    label: t.label(),
                    active: t == tab,
                })
                .collect(),
            flash: None,
            load_error: (!load_errors.is_empty()).then(|| load_errors.join(". ")),
            leads,
            documents,
            missing_sections,
            video_url: demo.video_url,
            upload_bucket: uploads.buckets.first().cloned().unwrap_or_default(),
            max_upload_mb: uploads.max_upload_bytes / (1024 * 1024),
            primary_color: branding_text(PRIMARY_COLOR_KEY),
            secondary_color: branding_text(SECONDARY_COLOR_KEY),
        }
    }
}

// =============================================================================
// Console Page
// =============================================================================

/// Query parameters for the console.
#[derive(Debug, Deserialize)]
pub struct ConsoleQuery {
    pub tab: Option<String>,
}

/// Display the console.
#[instrument(skip(admin, state, session), fields(admin = %admin.email))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ConsoleQuery>,
) -> impl IntoResponse {
    let tab = Tab::from_query(query.tab.as_deref());
    let mut page = ConsoleTemplate::load(&state, &admin, tab).await;
    page.flash = take_flash(&session).await;
    page
}

// =============================================================================
// Leads
// =============================================================================

/// Mark a lead contacted.
#[instrument(skip(admin, state, session), fields(admin = %admin.email))]
pub async fn mark_contacted(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<LeadId>,
) -> Redirect {
    let flash = match state.leads().mark_contacted(id).await {
        Ok(lead) => {
            tracing::info!(lead_id = %lead.id, "Lead marked contacted");
            Flash::success("Marked as contacted")
        }
        Err(e) => {
            if !matches!(e, RepositoryError::NotFound) {
                tracing::error!(lead_id = %id, error = %e, "Failed to mark lead contacted");
            }
            Flash::error("Failed to update submission")
        }
    };
    set_flash(&session, flash).await;
    Tab::Leads.redirect()
}

// =============================================================================
// Content
// =============================================================================

/// New section form data.
#[derive(Debug, Deserialize)]
pub struct NewSectionForm {
    #[serde(default)]
    pub section: String,
}

/// Create an empty content document.
#[instrument(skip(admin, state, session), fields(admin = %admin.email))]
pub async fn create_section(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<NewSectionForm>,
) -> Redirect {
    let flash = match SectionName::parse(&form.section) {
        Err(e) => Flash::error(e.to_string()),
        Ok(section) => match state.content().create_section(&section).await {
            Ok(_) => {
                tracing::info!(%section, "Content section created");
                Flash::success(format!("Created {section} section"))
            }
            Err(RepositoryError::Conflict(_)) => {
                Flash::error(format!("Section {section} already exists"))
            }
            Err(e) => {
                tracing::error!(%section, error = %e, "Failed to create section");
                Flash::error("Failed to create section")
            }
        },
    };
    set_flash(&session, flash).await;
    Tab::Content.redirect()
}

/// JSON editor form data.
#[derive(Debug, Deserialize)]
pub struct DocumentForm {
    #[serde(default)]
    pub content: String,
    /// The `updated_at` the editor was loaded with.
    #[serde(default)]
    pub version: String,
}

type ParsedDocument = (Map<String, Value>, Option<DateTime<Utc>>);

/// Parse the editor form, or say why the edit goes back to the editor.
fn parse_document(form: &DocumentForm) -> Result<ParsedDocument, String> {
    let content = match serde_json::from_str::<Value>(&form.content) {
        Ok(Value::Object(content)) => content,
        Ok(_) => return Err("Content must be a JSON object.".to_owned()),
        Err(e) => return Err(format!("Invalid JSON: {e}")),
    };
    let version = form.version.trim();
    let expected = if version.is_empty() {
        None
    } else {
        let parsed = DateTime::parse_from_rfc3339(version)
            .map_err(|_| "The editor is out of date. Reload and try again.".to_owned())?;
        Some(parsed.with_timezone(&Utc))
    };
    Ok((content, expected))
}

/// Save a content document from the JSON editor.
#[instrument(skip(admin, state, session, form), fields(admin = %admin.email))]
pub async fn save_document(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ContentDocumentId>,
    Form(form): Form<DocumentForm>,
) -> Response {
    let (content, expected) = match parse_document(&form) {
        Ok(parsed) => parsed,
        Err(message) => {
            let status = StatusCode::UNPROCESSABLE_ENTITY;
            return rejected_edit(&state, &admin, id, form.content, message, status).await;
        }
    };

    let flash = match state.content().replace(id, content, expected).await {
        Ok(saved) => {
            tracing::info!(section = %saved.document.section, "Content document saved");
            if saved.warnings.is_empty() {
                Flash::success(format!("Updated {} content", saved.document.section))
            } else {
                let warnings: Vec<String> =
                    saved.warnings.iter().map(ToString::to_string).collect();
                Flash::success(format!(
                    "Updated {} content. Warnings: {}",
                    saved.document.section,
                    warnings.join("; ")
                ))
            }
        }
        Err(e @ ContentError::Invalid { .. }) => {
            let status = StatusCode::UNPROCESSABLE_ENTITY;
            return rejected_edit(&state, &admin, id, form.content, e.to_string(), status).await;
        }
        Err(ContentError::Repository(RepositoryError::Conflict(_))) => {
            let message = "This section was changed since you opened it. Copy your edit, reload, \
                           and try again."
                .to_owned();
            let status = StatusCode::CONFLICT;
            return rejected_edit(&state, &admin, id, form.content, message, status).await;
        }
        Err(ContentError::Repository(RepositoryError::NotFound)) => {
            Flash::error("Content section not found")
        }
        Err(e) => {
            tracing::error!(document_id = %id, error = %e, "Failed to save content");
            Flash::error("Failed to save content")
        }
    };
    set_flash(&session, flash).await;
    Tab::Content.redirect().into_response()
}

/// Re-render the content tab with a rejected edit in place.
async fn rejected_edit(
    state: &AppState,
    admin: &CurrentAdmin,
    id: ContentDocumentId,
    json: String,
    message: String,
    status: StatusCode,
) -> Response {
    let mut page = ConsoleTemplate::load(state, admin, Tab::Content).await;
    match page.documents.iter_mut().find(|doc| doc.id == id) {
        Some(editor) => {
            editor.json = json;
            editor.error = Some(message);
        }
        None => page.flash = Some(Flash::error(message)),
    }
    (status, page).into_response()
}

// =============================================================================
// Branding
// =============================================================================

/// Brand colors form data.
#[derive(Debug, Deserialize)]
pub struct BrandingForm {
    #[serde(default)]
    pub primary_color: String,
    #[serde(default)]
    pub secondary_color: String,
}

/// Save the brand colors into the branding document.
#[instrument(skip(admin, state, session), fields(admin = %admin.email))]
pub async fn save_branding(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<BrandingForm>,
) -> Redirect {
    let color = |value: &str| Value::String(value.trim().to_owned());
    let colors = [
        (PRIMARY_COLOR_KEY.to_owned(), color(&form.primary_color)),
        (SECONDARY_COLOR_KEY.to_owned(), color(&form.secondary_color)),
    ];

    let saved = match SectionName::parse(BRANDING_SECTION) {
        Ok(section) => state
            .content()
            .merge(&section, colors)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    let flash = match saved {
        Ok(_) => {
            tracing::info!("Brand colors saved");
            Flash::success("Color palette updated. Refresh the main site to see changes.")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to save color palette");
            Flash::error("Failed to save color palette")
        }
    };
    set_flash(&session, flash).await;
    Tab::Branding.redirect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_from_query() {
        assert_eq!(Tab::from_query(None), Tab::Leads);
        assert_eq!(Tab::from_query(Some("video")), Tab::Video);
        assert_eq!(Tab::from_query(Some("settings")), Tab::Leads);
    }

    #[test]
    fn test_parse_document() {
        let form = |content: &str, version: &str| DocumentForm {
            content: content.to_owned(),
            version: version.to_owned(),
        };

        let (content, expected) = parse_document(&form(r#"{"a": 1}"#, "")).unwrap_or_default();
        assert_eq!(content.len(), 1);
        assert!(expected.is_none());

        let (_, expected) =
            parse_document(&form("{}", "2024-05-01T10:00:00.123456Z")).unwrap_or_default();
        assert!(expected.is_some());

        assert!(parse_document(&form("[1]", "")).is_err());
        assert!(parse_document(&form("{", "")).is_err());
        assert!(parse_document(&form("{}", "yesterday")).is_err());
    }
}
