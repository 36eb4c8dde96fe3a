// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test harness: a scripted in-process Academy backend.
//!
//! Serves the auth and resource endpoints on an ephemeral loopback port,
//! counts hits per endpoint, and lets tests script which credentials the
//! backend accepts.

use academy_client::api::{build_http_client, AuthApi, CatalogApi, TriviaApi};
use academy_client::config::Config;
use academy_client::models::User;
use academy_client::session::{CatalogService, SessionController, TriviaService};
use academy_client::store::TokenStore;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Per-endpoint request counters.
#[derive(Default)]
pub struct Hits {
    pub login_init: AtomicUsize,
    pub callback: AtomicUsize,
    pub status: AtomicUsize,
    pub refresh: AtomicUsize,
    pub enrollments: AtomicUsize,
}

/// Scripted backend behavior; fields with interior mutability are also
/// written by the handlers themselves (granted tokens, seen redirects).
pub struct Behavior {
    /// Access tokens the bearer endpoints accept.
    pub accepted_access: Mutex<HashSet<String>>,
    /// Refresh token -> access token it grants.
    pub refresh_grants: Mutex<HashMap<String, String>>,
    /// Authorization code the callback exchange accepts.
    pub accept_code: String,
    /// Bearer tokens the callback body carries (None = cookie-only mode).
    pub callback_tokens: Option<(String, String)>,
    /// `state` value riding on the issued auth URL.
    pub auth_state: Option<String>,
    /// Artificial delay before the status endpoint answers.
    pub status_delay: Mutex<Option<Duration>>,
    /// Artificial delay before the refresh endpoint answers.
    pub refresh_delay: Mutex<Option<Duration>>,
    /// `redirect_uri` most recently seen by login-init.
    pub seen_redirect_uri: Mutex<Option<String>>,
    /// The user record this backend returns everywhere.
    pub user: User,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            accepted_access: Mutex::new(HashSet::from(["valid-access".to_string()])),
            refresh_grants: Mutex::new(HashMap::from([(
                "valid-xyz".to_string(),
                "fresh-123".to_string(),
            )])),
            accept_code: "test-code".to_string(),
            callback_tokens: None,
            auth_state: Some("st-42".to_string()),
            status_delay: Mutex::new(None),
            refresh_delay: Mutex::new(None),
            seen_redirect_uri: Mutex::new(None),
            user: test_user(),
        }
    }
}

pub struct BackendState {
    pub hits: Hits,
    pub behavior: Behavior,
}

/// In-process Academy backend bound to an ephemeral loopback port.
pub struct TestBackend {
    pub addr: SocketAddr,
    pub state: Arc<BackendState>,
    server: JoinHandle<()>,
}

impl TestBackend {
    #[allow(dead_code)]
    pub async fn spawn() -> Self {
        Self::spawn_with(Behavior::default()).await
    }

    pub async fn spawn_with(behavior: Behavior) -> Self {
        let state = Arc::new(BackendState {
            hits: Hits::default(),
            behavior,
        });

        let app = backend_router(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test backend");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test backend died");
        });

        Self {
            addr,
            state,
            server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    #[allow(dead_code)]
    pub fn hits(&self) -> &Hits {
        &self.state.hits
    }

    #[allow(dead_code)]
    pub fn behavior(&self) -> &Behavior {
        &self.state.behavior
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// The user record every scripted backend returns.
#[allow(dead_code)]
pub fn test_user() -> User {
    User {
        id: 7,
        email: "a@b.com".to_string(),
        name: Some("Test Learner".to_string()),
        picture: None,
    }
}

/// Client configuration pointed at a test backend; fast retries, no
/// persistence by default (tests pass their own store).
#[allow(dead_code)]
pub fn test_config(base_url: &str) -> Config {
    Config {
        api_base_url: base_url.to_string(),
        data_dir: None,
        callback_port: 0,
        login_timeout_secs: 10,
        refresh_retries: 2,
        refresh_retry_delay_ms: 10,
    }
}

#[allow(dead_code)]
pub fn controller_for(backend: &TestBackend, store: TokenStore) -> SessionController {
    let http = build_http_client().expect("Failed to build HTTP client");
    let auth = AuthApi::new(http, backend.base_url());
    SessionController::new(auth, store, &test_config(&backend.base_url()))
}

#[allow(dead_code)]
pub fn catalog_for(
    backend: &TestBackend,
    store: TokenStore,
    controller: SessionController,
) -> CatalogService {
    let http = build_http_client().expect("Failed to build HTTP client");
    CatalogService::new(CatalogApi::new(http, backend.base_url()), store, controller)
}

#[allow(dead_code)]
pub fn trivia_for(
    backend: &TestBackend,
    store: TokenStore,
    controller: SessionController,
) -> TriviaService {
    let http = build_http_client().expect("Failed to build HTTP client");
    TriviaService::new(TriviaApi::new(http, backend.base_url()), store, controller)
}

// ─── Routes ──────────────────────────────────────────────────────────────

fn backend_router(state: Arc<BackendState>) -> Router {
    Router::new()
        .route("/auth/google/login/", get(login_init_endpoint))
        .route("/auth/google/callback/", post(callback_endpoint))
        .route("/auth/status/", get(status_endpoint))
        .route("/auth/token/refresh/", post(refresh_endpoint))
        .route("/api/courses/", get(courses_endpoint))
        .route("/api/courses/{id}/", get(course_detail_endpoint))
        .route(
            "/api/enrollments/",
            get(enrollments_endpoint).post(enroll_endpoint),
        )
        .route("/api/enrollments/{id}/", delete(unenroll_endpoint))
        .route("/api/certificates/", get(certificates_endpoint))
        .route(
            "/api/certificates/verify/{code}/",
            get(verify_certificate_endpoint),
        )
        .route("/api/trivia/questions/", get(trivia_questions_endpoint))
        .route("/api/trivia/scores/", post(trivia_scores_endpoint))
        .route("/api/trivia/leaderboard/", get(leaderboard_endpoint))
        .with_state(state)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

fn authorized(app: &BackendState, headers: &HeaderMap) -> bool {
    match bearer_token(headers) {
        Some(token) => app
            .behavior
            .accepted_access
            .lock()
            .unwrap()
            .contains(&token),
        None => false,
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Invalid or expired token" })),
    )
        .into_response()
}

// ─── Auth Endpoints ──────────────────────────────────────────────────────

async fn login_init_endpoint(
    State(app): State<Arc<BackendState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    app.hits.login_init.fetch_add(1, Ordering::SeqCst);

    let redirect = params.get("redirect_uri").cloned();
    *app.behavior.seen_redirect_uri.lock().unwrap() = redirect.clone();

    let mut auth_url = format!(
        "https://accounts.google.test/o/oauth2/auth?client_id=academy&redirect_uri={}",
        urlencoding::encode(
            redirect
                .as_deref()
                .unwrap_or("http://127.0.0.1:8970/auth/callback")
        )
    );
    if let Some(state) = &app.behavior.auth_state {
        auth_url.push_str(&format!("&state={}", state));
    }

    Json(json!({ "auth_url": auth_url }))
}

async fn callback_endpoint(
    State(app): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> Response {
    app.hits.callback.fetch_add(1, Ordering::SeqCst);

    let code = body.get("code").and_then(Value::as_str).unwrap_or_default();
    if code != app.behavior.accept_code {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Unknown authorization code" })),
        )
            .into_response();
    }

    let mut response = json!({ "user": app.behavior.user.clone() });
    if let Some((access, refresh)) = &app.behavior.callback_tokens {
        // Issued tokens become valid bearers
        app.behavior
            .accepted_access
            .lock()
            .unwrap()
            .insert(access.clone());
        response["access"] = json!(access);
        response["refresh"] = json!(refresh);
    }

    Json(response).into_response()
}

async fn status_endpoint(State(app): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    app.hits.status.fetch_add(1, Ordering::SeqCst);

    // Copy the delay out so no guard is held across the sleep
    let delay = *app.behavior.status_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if !authorized(&app, &headers) {
        return unauthorized();
    }
    Json(json!({ "user": app.behavior.user.clone() })).into_response()
}

async fn refresh_endpoint(
    State(app): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> Response {
    app.hits.refresh.fetch_add(1, Ordering::SeqCst);

    let delay = *app.behavior.refresh_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let requested = body
        .get("refresh")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let granted = app
        .behavior
        .refresh_grants
        .lock()
        .unwrap()
        .get(requested)
        .cloned();

    match granted {
        Some(access) => {
            // Freshly granted tokens become valid bearers
            app.behavior
                .accepted_access
                .lock()
                .unwrap()
                .insert(access.clone());
            Json(json!({ "access": access })).into_response()
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Refresh token invalid" })),
        )
            .into_response(),
    }
}

// ─── Resource Endpoints ──────────────────────────────────────────────────

async fn courses_endpoint() -> Json<Value> {
    Json(json!([
        {
            "id": 1,
            "slug": "rust-basics",
            "title": "Rust Basics",
            "description": "Ownership without tears",
            "lesson_count": 12
        },
        {
            "id": 2,
            "slug": "async-rust",
            "title": "Async Rust",
            "description": "Futures and executors",
            "lesson_count": 9
        }
    ]))
}

async fn course_detail_endpoint(Path(course_id): Path<u64>) -> Json<Value> {
    Json(json!({
        "id": course_id,
        "slug": "rust-basics",
        "title": "Rust Basics",
        "description": "Ownership without tears",
        "lesson_count": 12
    }))
}

async fn enrollments_endpoint(
    State(app): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> Response {
    app.hits.enrollments.fetch_add(1, Ordering::SeqCst);

    if !authorized(&app, &headers) {
        return unauthorized();
    }
    Json(json!([
        {
            "id": 11,
            "course_id": 1,
            "course_title": "Rust Basics",
            "enrolled_at": "2026-03-01T10:00:00Z",
            "completed_at": null
        }
    ]))
    .into_response()
}

async fn enroll_endpoint(
    State(app): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    app.hits.enrollments.fetch_add(1, Ordering::SeqCst);

    if !authorized(&app, &headers) {
        return unauthorized();
    }

    let course_id = body.get("course_id").and_then(Value::as_u64).unwrap_or(0);
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 12,
            "course_id": course_id,
            "course_title": "Async Rust",
            "enrolled_at": "2026-03-02T09:30:00Z",
            "completed_at": null
        })),
    )
        .into_response()
}

async fn unenroll_endpoint(
    State(app): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(_enrollment_id): Path<u64>,
) -> Response {
    if !authorized(&app, &headers) {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn certificates_endpoint(
    State(app): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&app, &headers) {
        return unauthorized();
    }
    Json(json!([
        {
            "id": 31,
            "course_title": "Rust Basics",
            "code": "CERT-1",
            "issued_at": "2026-04-01T09:00:00Z"
        }
    ]))
    .into_response()
}

async fn verify_certificate_endpoint(Path(code): Path<String>) -> Json<Value> {
    if code == "CERT-1" {
        Json(json!({
            "valid": true,
            "certificate": {
                "id": 31,
                "course_title": "Rust Basics",
                "code": "CERT-1",
                "issued_at": "2026-04-01T09:00:00Z"
            }
        }))
    } else {
        Json(json!({ "valid": false }))
    }
}

async fn trivia_questions_endpoint() -> Json<Value> {
    Json(json!([
        {
            "id": 1,
            "question": "Which keyword moves ownership?",
            "options": ["copy", "move", "ref", "box"],
            "answer": 1
        }
    ]))
}

async fn trivia_scores_endpoint(
    State(app): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> Response {
    if !authorized(&app, &headers) {
        return unauthorized();
    }
    StatusCode::CREATED.into_response()
}

async fn leaderboard_endpoint() -> Json<Value> {
    Json(json!([
        { "name": "ada", "score": 98, "played_at": "2026-05-01T12:00:00Z" },
        { "name": "grace", "score": 91, "played_at": "2026-05-01T13:30:00Z" }
    ]))
}
