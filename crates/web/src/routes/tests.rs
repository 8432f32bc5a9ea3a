//! Router tests against in-memory repositories and sessions.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
    response::Response,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use crate::config::{UploadConfig, WebConfig};
use crate::db::memory::{MemoryAdminUserRepository, MemoryContentRepository, MemoryLeadRepository};
use crate::middleware::session_layer;
use crate::services::AuthService;
use crate::state::{AppState, Backends};

const ADMIN_EMAIL: &str = "admin@klyp.travel";
const ADMIN_PASSWORD: &str = "correct horse battery";
const FORM: &str = "application/x-www-form-urlencoded";

struct TestApp {
    router: Router,
    leads: MemoryLeadRepository,
    media: PathBuf,
}

impl TestApp {
    async fn new(name: &str) -> Self {
        let media = std::env::temp_dir().join(format!("klyp-routes-{name}-{}", std::process::id()));
        let config = WebConfig::local(UploadConfig {
            signing_secret: SecretString::from("k7Qz!9vR#2mX$4pL&8nW^6bT*1cY@3hJ"),
            media_dir: media.clone(),
            buckets: vec!["videos".to_owned()],
            max_upload_bytes: 1024,
            url_ttl: Duration::from_secs(60),
        });

        let leads = MemoryLeadRepository::new();
        let admin_users = MemoryAdminUserRepository::new();
        AuthService::new(Arc::new(admin_users.clone()))
            .create_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .unwrap();

        let state = AppState::from_parts(
            config,
            Backends {
                leads: Arc::new(leads.clone()),
                content: Arc::new(MemoryContentRepository::new()),
                admin_users: Arc::new(admin_users),
            },
        );
        let router = crate::app(state, session_layer(MemoryStore::default(), false));

        Self {
            router,
            leads,
            media,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn login(&self) -> String {
        let response = self
            .send(form(
                "/admin/login",
                &format!("email={ADMIN_EMAIL}&password=correct+horse+battery"),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin");
        session_cookie(response.headers()).expect("login sets a session cookie")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media);
    }
}

fn request(method: Method, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.7");
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, cookie).body(Body::empty()).unwrap()
}

fn form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    request(Method::POST, uri, cookie)
        .header(header::CONTENT_TYPE, FORM)
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn post_json(uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    request(Method::POST, uri, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("klyp_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Landing page and lead capture
// =============================================================================

#[tokio::test]
async fn test_landing_page_renders_default_copy() {
    let app = TestApp::new("landing").await;
    let response = app.send(get("/", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key(header::CONTENT_SECURITY_POLICY)
    );
    let html = body_text(response).await;
    assert!(html.contains("KLYP Workbench"));
    assert!(html.contains("Demo Video Coming Soon"));
    assert!(html.contains(r#"action="/leads""#));
}

#[tokio::test]
async fn test_landing_form_guards_double_submit() {
    let app = TestApp::new("landing-guard").await;
    let html = body_text(app.send(get("/", None)).await).await;

    assert!(html.contains(r#"id="signup-form""#));
    assert!(html.contains(r#"<script src="/static/js/signup.js?v="#));

    let script = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/static/js/signup.js"
    ))
    .unwrap();
    assert!(script.contains(r#"getElementById("signup-form")"#));
    assert!(script.contains("button.disabled = true"));
}

#[tokio::test]
async fn test_valid_lead_creates_one_uncontacted_lead() {
    let app = TestApp::new("lead-valid").await;
    let response = app
        .send(form(
            "/leads",
            "full_name=Ada+Lovelace&email=ada%40example.com&phone=&business=Analytical+Travel\
             &integrations=Amadeus",
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?joined=1#founding");
    assert_eq!(app.leads.count().await, 1);

    let stored = crate::db::LeadRepository::list(&app.leads).await.unwrap();
    assert!(!stored[0].contacted);
    assert_eq!(stored[0].phone, None);

    let html = body_text(app.send(get("/?joined=1", None)).await).await;
    assert!(html.contains("be in touch soon."));
}

#[tokio::test]
async fn test_lead_without_business_is_rejected() {
    let app = TestApp::new("lead-missing").await;
    let response = app
        .send(form(
            "/leads",
            "full_name=Ada+Lovelace&email=ada%40example.com&business=+++",
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.leads.count().await, 0);
    let html = body_text(response).await;
    assert!(html.contains("Please fill in all required fields."));
    assert!(html.contains(r#"value="Ada Lovelace""#));
}

#[tokio::test]
async fn test_lead_with_invalid_email_is_rejected() {
    let app = TestApp::new("lead-email").await;
    let response = app
        .send(form(
            "/leads",
            "full_name=Ada&email=not-an-email&business=Agency",
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.leads.count().await, 0);
    assert!(
        body_text(response)
            .await
            .contains("Please enter a valid email address.")
    );
}

#[tokio::test]
async fn test_json_lead_capture() {
    let app = TestApp::new("lead-json").await;
    let response = app
        .send(post_json(
            "/api/leads",
            &json!({"fullName": "Grace", "email": "grace@navy.mil", "business": "Fleet travel"}),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["full_name"], "Grace");
    assert_eq!(body["data"]["contacted"], false);

    let response = app
        .send(post_json("/api/leads", &json!({"fullName": "Grace"}), None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Please fill in all required fields."})
    );
    assert_eq!(app.leads.count().await, 1);
}

// =============================================================================
// Session auth
// =============================================================================

#[tokio::test]
async fn test_console_requires_login() {
    let app = TestApp::new("console-gate").await;
    let response = app.send(get("/admin", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/login");

    let response = app
        .send(post_json("/api/admin-founders", &json!({"action": "list"}), None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn test_admin_pages_render_inside_site_layout() {
    use chrono::Datelike;

    let app = TestApp::new("admin-layout").await;
    let year = chrono::Utc::now().year();

    let login = body_text(app.send(get("/admin/login", None)).await).await;
    assert!(login.contains("<title>Sign in | KLYP Admin</title>"));
    assert!(login.contains("/static/css/main.css?v="));
    assert!(login.contains(&format!("&copy; {year} KLYP")));

    let cookie = app.login().await;
    let console = body_text(app.send(get("/admin?tab=video", Some(&cookie))).await).await;
    assert!(console.contains("<title>Console | KLYP Admin</title>"));
    assert!(console.contains("/static/js/admin.js?v="));
    assert!(console.contains(&format!("&copy; {year} KLYP")));
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let app = TestApp::new("login-wrong").await;
    let response = app
        .send(form(
            "/admin/login",
            &format!("email={ADMIN_EMAIL}&password=hunter22"),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("Invalid credentials"));
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = TestApp::new("session").await;

    let status = body_json(app.send(get("/admin/session", None)).await).await;
    assert_eq!(status, json!({"data": {"authenticated": false}}));

    let cookie = app.login().await;
    let status = body_json(app.send(get("/admin/session", Some(&cookie))).await).await;
    assert_eq!(
        status,
        json!({"data": {"authenticated": true, "email": ADMIN_EMAIL}})
    );

    let response = app.send(get("/admin", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Founders List"));

    let response = app
        .send(form("/admin/logout", "", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let status = body_json(app.send(get("/admin/session", Some(&cookie))).await).await;
    assert_eq!(status["data"]["authenticated"], false);
}

// =============================================================================
// Brokers
// =============================================================================

#[tokio::test]
async fn test_brokers_reject_other_methods() {
    let app = TestApp::new("broker-405").await;
    for uri in [
        "/api/admin-founders",
        "/api/get-upload-url",
        "/api/update-site-content",
    ] {
        let response = app.send(get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{uri}");
        assert_eq!(
            body_json(response).await,
            json!({"error": "Method not allowed"})
        );
    }
}

#[tokio::test]
async fn test_broker_cors_preflight() {
    let app = TestApp::new("broker-cors").await;
    let response = app
        .send(
            request(Method::OPTIONS, "/api/update-site-content", None)
                .header(header::ORIGIN, "https://studio.klyp.travel")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "apikey, content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap()
        .to_owned();
    assert!(allowed.contains("x-client-info"));
}

#[tokio::test]
async fn test_admin_founders_broker() {
    let app = TestApp::new("broker-founders").await;
    app.send(form(
        "/leads",
        "full_name=First&email=first%40example.com&business=One",
        None,
    ))
    .await;
    app.send(form(
        "/leads",
        "full_name=Second&email=second%40example.com&business=Two",
        None,
    ))
    .await;
    let cookie = app.login().await;

    let body = body_json(
        app.send(post_json("/api/admin-founders", &json!({"action": "list"}), Some(&cookie)))
            .await,
    )
    .await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|lead| lead["full_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Second", "First"]);
    let id = body["data"][1]["id"].clone();

    for _ in 0..2 {
        let response = app
            .send(post_json(
                "/api/admin-founders",
                &json!({"action": "mark_contacted", "id": id}),
                Some(&cookie),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["contacted"], true);
    }

    let cases = [
        (json!({"action": "mark_contacted"}), StatusCode::BAD_REQUEST, "Missing id"),
        (json!({"action": "delete"}), StatusCode::BAD_REQUEST, "Unknown action"),
        (
            json!({"action": "mark_contacted", "id": 999}),
            StatusCode::NOT_FOUND,
            "Not found",
        ),
    ];
    for (payload, status, message) in cases {
        let response = app
            .send(post_json("/api/admin-founders", &payload, Some(&cookie)))
            .await;
        assert_eq!(response.status(), status);
        assert_eq!(body_json(response).await, json!({"error": message}));
    }
}

async fn update_content(app: &TestApp, cookie: &str, payload: Value) -> Response {
    app.send(post_json("/api/update-site-content", &payload, Some(cookie)))
        .await
}

#[tokio::test]
async fn test_update_site_content_broker() {
    let app = TestApp::new("broker-content").await;
    let cookie = app.login().await;
    let send = |payload: Value| update_content(&app, &cookie, payload);

    let response = send(json!({"section": "hero", "content": "hello"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Invalid content payload"})
    );

    let response = send(json!({"content": {}})).await;
    assert_eq!(
        body_json(response).await,
        json!({"error": "Provide id or section"})
    );

    let response = send(json!({"section": "hero", "content": {"headline1": "Hello"}})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let saved = body_json(response).await;
    let id = saved["data"]["id"].clone();
    let version = saved["data"]["updated_at"].clone();

    let html = body_text(app.send(get("/", None)).await).await;
    assert!(html.contains("Hello"));

    let response = send(json!({"id": id, "content": {"headline1": "Again"}, "expectedUpdatedAt": version})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(json!({"id": id, "content": {"headline1": "Stale"}, "expectedUpdatedAt": version})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(json!({"id": 4242, "content": {}})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(json!({"section": "hero", "content": {"headline1": 7}})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signed_upload_and_demo_video() {
    let app = TestApp::new("upload").await;
    let cookie = app.login().await;

    let response = app
        .send(post_json("/api/get-upload-url", &json!({"bucket": "videos"}), Some(&cookie)))
        .await;
    assert_eq!(
        body_json(response).await,
        json!({"error": "bucket and path are required"})
    );

    let response = app
        .send(post_json(
            "/api/get-upload-url",
            &json!({"bucket": "videos", "path": "demo.mp4", "contentType": "video/mp4"}),
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let signed = body_json(response).await;
    let signed_url = signed["data"]["signedUrl"].as_str().unwrap();
    let upload_uri = signed_url
        .strip_prefix("http://localhost:3000")
        .unwrap()
        .to_owned();

    let put = |uri: &str| {
        request(Method::PUT, uri, None)
            .header(header::CONTENT_TYPE, "video/mp4")
            .body(Body::from("fake video"))
            .unwrap()
    };
    assert_eq!(app.send(put(&upload_uri)).await.status(), StatusCode::OK);
    assert_eq!(
        app.send(put(&upload_uri)).await.status(),
        StatusCode::BAD_REQUEST
    );

    let response = app
        .send(post_json(
            "/api/demo-video",
            &json!({"bucket": "videos", "path": "demo.mp4"}),
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let demo = body_json(response).await;
    assert_eq!(demo["data"]["content"]["videoUrl"], "/media/videos/demo.mp4");
    assert_eq!(demo["data"]["content"]["videoType"], "upload");

    let media = app.send(get("/media/videos/demo.mp4", None)).await;
    assert_eq!(media.status(), StatusCode::OK);
    assert_eq!(body_text(media).await, "fake video");

    let html = body_text(app.send(get("/", None)).await).await;
    assert!(html.contains(r#"src="/media/videos/demo.mp4""#));
}

async fn signed_upload_uri(app: &TestApp, cookie: &str, path: &str) -> String {
    let response = app
        .send(post_json(
            "/api/get-upload-url",
            &json!({"bucket": "videos", "path": path}),
            Some(cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let signed = body_json(response).await;
    signed["data"]["signedUrl"]
        .as_str()
        .unwrap()
        .strip_prefix("http://localhost:3000")
        .unwrap()
        .to_owned()
}

fn put_upload(uri: &str, content_type: &str, bytes: &'static [u8]) -> Request<Body> {
    request(Method::PUT, uri, None)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .unwrap()
}

#[tokio::test]
async fn test_reused_upload_url_keeps_first_object() {
    let app = TestApp::new("upload-reuse").await;
    let cookie = app.login().await;
    let uri = signed_upload_uri(&app, &cookie, "launch.mp4").await;

    let first = app.send(put_upload(&uri, "video/mp4", b"first take")).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.send(put_upload(&uri, "video/mp4", b"second take")).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(second).await["error"].is_string());

    let media = app.send(get("/media/videos/launch.mp4", None)).await;
    assert_eq!(media.status(), StatusCode::OK);
    assert_eq!(body_text(media).await, "first take");
}

#[tokio::test]
async fn test_uploads_sharing_a_stem_stay_separate() {
    let app = TestApp::new("upload-stem").await;
    let cookie = app.login().await;
    let mp4 = signed_upload_uri(&app, &cookie, "demo.mp4").await;
    let webm = signed_upload_uri(&app, &cookie, "demo.webm").await;

    let (mp4, webm) = tokio::join!(
        app.send(put_upload(&mp4, "video/mp4", b"mp4 video")),
        app.send(put_upload(&webm, "video/webm", b"webm video")),
    );
    assert_eq!(mp4.status(), StatusCode::OK);
    assert_eq!(webm.status(), StatusCode::OK);

    let media = app.send(get("/media/videos/demo.mp4", None)).await;
    assert_eq!(body_text(media).await, "mp4 video");
    let media = app.send(get("/media/videos/demo.webm", None)).await;
    assert_eq!(body_text(media).await, "webm video");

    let mut names: Vec<String> = std::fs::read_dir(app.media.join("videos"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["demo.mp4", "demo.webm"]);
}

// =============================================================================
// Console actions
// =============================================================================

#[tokio::test]
async fn test_console_marks_lead_contacted() {
    let app = TestApp::new("console-lead").await;
    app.send(form(
        "/leads",
        "full_name=Jo&email=jo%40agency.travel&business=Agency",
        None,
    ))
    .await;
    let id = crate::db::LeadRepository::list(&app.leads).await.unwrap()[0].id;
    let cookie = app.login().await;

    let response = app
        .send(form(&format!("/admin/leads/{id}/contacted"), "", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin?tab=leads");

    let html = body_text(app.send(get("/admin?tab=leads", Some(&cookie))).await).await;
    assert!(html.contains("Marked as contacted"));
    assert!(html.contains("Contacted"));

    // The flash is shown once
    let html = body_text(app.send(get("/admin?tab=leads", Some(&cookie))).await).await;
    assert!(!html.contains("Marked as contacted"));
}

#[tokio::test]
async fn test_console_content_editor_keeps_rejected_edit() {
    let app = TestApp::new("console-content").await;
    let cookie = app.login().await;

    let response = app
        .send(form("/admin/content", "section=pricing", Some(&cookie)))
        .await;
    assert_eq!(location(&response), "/admin?tab=content");
    let response = app
        .send(form("/admin/content", "section=pricing", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let html = body_text(app.send(get("/admin?tab=content", Some(&cookie))).await).await;
    assert!(html.contains("Section pricing already exists"));

    let response = app
        .send(form(
            "/admin/content/1",
            "content=%7B%22price%22%3A&version=",
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Invalid JSON"));
    assert!(html.contains("{&#34;price&#34;:") || html.contains("{&quot;price&quot;:"));

    let response = app
        .send(form(
            "/admin/content/1",
            "content=%7B%22price%22%3A%22%2449%22%7D&version=",
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let html = body_text(app.send(get("/", None)).await).await;
    assert!(html.contains("$49"));
}

#[tokio::test]
async fn test_branding_updates_stylesheet() {
    let app = TestApp::new("branding").await;
    let cookie = app.login().await;

    let css = body_text(app.send(get("/brand.css", None)).await).await;
    assert!(css.is_empty());

    let response = app
        .send(form(
            "/admin/branding",
            "primary_color=%23ec4899&secondary_color=",
            Some(&cookie),
        ))
        .await;
    assert_eq!(location(&response), "/admin?tab=branding");

    let response = app.send(get("/brand.css", None)).await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
    let css = body_text(response).await;
    assert!(css.contains("--brand-pink: 330 81% 60%;"));
    assert!(!css.contains("--brand-purple"));
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new("health").await;
    assert_eq!(app.send(get("/health", None)).await.status(), StatusCode::OK);
    assert_eq!(
        app.send(get("/health/ready", None)).await.status(),
        StatusCode::OK
    );
}
