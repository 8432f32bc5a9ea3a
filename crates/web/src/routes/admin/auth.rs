//! Console login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::LOGIN_PATH;
use crate::middleware::{
    OptionalAdminAuth, clear_current_admin, set_current_admin, set_flash, take_flash,
};
use crate::models::{CurrentAdmin, Flash};
use crate::routes::api::Data;
use crate::services::AuthError;
use crate::state::AppState;

/// Where a successful login lands.
const CONSOLE_PATH: &str = "/admin";

const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub notice: Option<Flash>,
    pub email: String,
}

impl LoginTemplate {
    fn failed(message: String, email: String) -> Self {
        Self {
            error: Some(message),
            notice: None,
            email,
        }
    }
}

/// Display the login page, or go straight to the console when signed in.
pub async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    session: Session,
) -> Response {
    if admin.is_some() {
        return Redirect::to(CONSOLE_PATH).into_response();
    }
    LoginTemplate {
        error: None,
        notice: take_flash(&session).await,
        email: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let result = state.credentials().verify(&form.email, &form.password).await;
    let user = match result {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Console login failed");
            let page =
                LoginTemplate::failed(AuthError::InvalidCredentials.to_string(), form.email);
            return (StatusCode::UNAUTHORIZED, page).into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Console login error");
            let page = LoginTemplate::failed(LOGIN_FAILED_MESSAGE.to_owned(), form.email);
            return (StatusCode::INTERNAL_SERVER_ERROR, page).into_response();
        }
    };

    let admin = CurrentAdmin::from(&user);
    if let Err(e) = set_current_admin(&session, &admin).await {
        tracing::error!(error = %e, "Failed to set session");
        let page = LoginTemplate::failed(LOGIN_FAILED_MESSAGE.to_owned(), form.email);
        return (StatusCode::INTERNAL_SERVER_ERROR, page).into_response();
    }

    set_sentry_user(admin.id.as_i32(), Some(admin.email.as_str()));
    tracing::info!(admin_user_id = %admin.id, "Console login");
    Redirect::to(CONSOLE_PATH).into_response()
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();
    set_flash(&session, Flash::success("You have been logged out successfully")).await;
    Redirect::to(LOGIN_PATH)
}

/// Session status, as reported by `GET /admin/session`.
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Report whether the caller is signed in.
pub async fn session_status(OptionalAdminAuth(admin): OptionalAdminAuth) -> impl IntoResponse {
    let status = SessionStatus {
        authenticated: admin.is_some(),
        email: admin.map(|a| a.email.into_inner()),
    };
    Data(status)
}
