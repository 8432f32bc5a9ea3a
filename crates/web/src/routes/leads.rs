//! Founders-list lead capture.
//!
//! The HTML form posts to `/leads` and follows post/redirect/get: an accepted
//! submission redirects back to the landing page with `?joined=1`, a rejected
//! one re-renders the page with the entered values and a message.

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use klyp_core::{Lead, LeadSubmission};

use super::api::{ApiJson, Data};
use super::landing::{FOUNDING_ANCHOR, LandingTemplate};
use crate::error::ApiError;
use crate::state::AppState;

/// Shown when the lead could not be stored.
pub const BACKEND_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Handle the founders-list form.
#[instrument(skip(state, form))]
pub async fn submit(State(state): State<AppState>, Form(form): Form<LeadSubmission>) -> Response {
    let lead = match form.validate() {
        Ok(lead) => lead,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected lead submission");
            let message = e.to_string();
            return rerender(&state, form, message, StatusCode::UNPROCESSABLE_ENTITY).await;
        }
    };

    match state.leads().create(&lead).await {
        Ok(stored) => {
            tracing::info!(lead_id = %stored.id, "Lead captured");
            Redirect::to(&format!("/?joined=1#{FOUNDING_ANCHOR}")).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to store lead");
            rerender(
                &state,
                form,
                BACKEND_FAILURE_MESSAGE.to_owned(),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .await
        }
    }
}

async fn rerender(
    state: &AppState,
    form: LeadSubmission,
    message: String,
    status: StatusCode,
) -> Response {
    let mut template = LandingTemplate::load(state).await;
    template.form = form;
    template.error = Some(message);
    (status, template).into_response()
}

/// Handle a JSON sign-up.
///
/// POST /api/leads
///
/// # Errors
///
/// Returns 400 with the validation message, or 500 if the lead could not be
/// stored.
#[instrument(skip(state, submission))]
pub async fn submit_json(
    State(state): State<AppState>,
    ApiJson(submission): ApiJson<LeadSubmission>,
) -> Result<(StatusCode, Data<Lead>), ApiError> {
    let lead = submission
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let stored = state.leads().create(&lead).await?;
    tracing::info!(lead_id = %stored.id, "Lead captured");
    Ok((StatusCode::CREATED, Data(stored)))
}
