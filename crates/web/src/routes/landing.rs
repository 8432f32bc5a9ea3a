//! Landing page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use klyp_core::LeadSubmission;
use klyp_core::sections::LandingPage;

use crate::filters;
use crate::state::AppState;

/// Anchor of the founders-list section.
pub const FOUNDING_ANCHOR: &str = "founding";

/// Shown above the form after a successful sign-up.
pub const JOINED_MESSAGE: &str = "Thanks! We'll be in touch soon.";

/// Query parameters for the landing page.
#[derive(Debug, Default, Deserialize)]
pub struct LandingQuery {
    /// Set by the post/redirect/get after a successful sign-up.
    #[serde(default)]
    pub joined: Option<String>,
}

impl LandingQuery {
    fn joined(&self) -> bool {
        self.joined.as_deref().is_some_and(|v| v == "1")
    }
}

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "landing.html")]
pub struct LandingTemplate {
    pub page: LandingPage,
    /// Values to put back into the form after a rejected submission.
    pub form: LeadSubmission,
    pub error: Option<String>,
    pub success: Option<&'static str>,
}

impl LandingTemplate {
    /// Build the page from fresh content.
    ///
    /// A failed refresh renders from the last snapshot, which falls back to
    /// the default copy for anything missing.
    pub async fn load(state: &AppState) -> Self {
        let content = match state.content().refresh().await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh site content");
                state.content().snapshot()
            }
        };

        Self {
            page: LandingPage::from_content(&content),
            form: LeadSubmission::default(),
            error: None,
            success: None,
        }
    }
}

/// Display the landing page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Query(query): Query<LandingQuery>) -> impl IntoResponse {
    let mut template = LandingTemplate::load(&state).await;
    if query.joined() {
        template.success = Some(JOINED_MESSAGE);
    }
    template
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_flag() {
        assert!(!LandingQuery::default().joined());
        assert!(
            LandingQuery {
                joined: Some("1".to_owned())
            }
            .joined()
        );
        assert!(
            !LandingQuery {
                joined: Some("yes".to_owned())
            }
            .joined()
        );
    }
}
