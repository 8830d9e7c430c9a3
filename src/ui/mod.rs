//! Web form: upload a PDF, enter a key, pick a mode, extract, download.
//!
//! ## Why server-rendered
//!
//! The interaction is a handful of form posts. Each handler reads or updates
//! one [`Session`](crate::session::Session) in the [`SessionStore`] and
//! renders the whole page again, so the browser never holds state the server
//! does not know about.
//!
//! An extraction runs in its own task and writes its outcome back to the
//! session. A client that hangs up mid-extraction therefore still leaves the
//! session in `Extracted` or `Failed`, never stuck in `Extracting`. Sessions
//! idle for longer than [`ServerConfig::session_ttl`] are swept by [`serve`].
//!
//! ## Routes
//!
//! | Method | Path                         | Effect                                  |
//! |--------|------------------------------|-----------------------------------------|
//! | GET    | `/`                          | upload form                             |
//! | POST   | `/sessions`                  | multipart upload, redirect to session   |
//! | GET    | `/sessions/{id}`             | session page                            |
//! | POST   | `/sessions/{id}/extract`     | run the extraction, render the result   |
//! | GET    | `/sessions/{id}/download`    | `purchase_order_data.json`              |
//! | POST   | `/sessions/{id}/reset`       | drop the session                        |
//! | GET    | `/health`                    | liveness                                |

pub mod view;

use crate::config::{ExtractionConfig, ExtractionMode, ServerConfig};
use crate::error::PoExtractError;
use crate::extract::{extract_po_data, to_pretty_json, ExtractionOutcome, DOWNLOAD_FILE_NAME};
use crate::pipeline::input::Document;
use crate::session::SessionStore;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub config: Arc<ExtractionConfig>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: ExtractionConfig, max_upload_bytes: usize) -> Self {
        Self {
            sessions: SessionStore::new(),
            config: Arc::new(config),
            max_upload_bytes,
        }
    }

    /// Replace the session store with one that evicts after `ttl` idle.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.sessions = SessionStore::with_ttl(ttl);
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/sessions", post(upload))
        .route("/sessions/{id}", get(show_session))
        .route("/sessions/{id}/extract", post(extract))
        .route("/sessions/{id}/download", get(download))
        .route("/sessions/{id}/reset", post(reset))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(server: ServerConfig, extraction: ExtractionConfig) -> Result<(), PoExtractError> {
    let state = AppState::new(extraction, server.max_upload_bytes)
        .with_session_ttl(server.session_ttl);
    let sweeper = tokio::spawn(sweep_idle_sessions(state.sessions.clone()));
    let app = build_router(state);

    let listener = TcpListener::bind(server.bind)
        .await
        .map_err(|e| PoExtractError::Internal(format!("bind {}: {e}", server.bind)))?;
    let addr = listener
        .local_addr()
        .map_err(|e| PoExtractError::Internal(format!("local address: {e}")))?;
    info!("Purchase order extractor listening on http://{}/", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PoExtractError::Internal(format!("server: {e}")));
    sweeper.abort();
    served
}

/// Evict idle sessions a few times per TTL.
async fn sweep_idle_sessions(sessions: SessionStore) {
    let period = (sessions.ttl() / 4).max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        sessions.evict_idle();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

// ── Response helpers ──────────────────────────────────────────────────────

fn page(status: StatusCode, html: String) -> Response {
    (status, Html(html)).into_response()
}

fn index_error(status: StatusCode, message: &str) -> Response {
    page(status, view::index_page(Some(message)))
}

fn not_found() -> Response {
    page(StatusCode::NOT_FOUND, view::not_found_page())
}

fn session_redirect(id: Uuid) -> Response {
    Redirect::to(&format!("/sessions/{id}")).into_response()
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn index() -> Html<String> {
    Html(view::index_page(None))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut target: Option<Uuid> = None;
    let mut document: Option<Result<Document, PoExtractError>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return index_error(e.status(), &e.body_text()),
        };

        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("session") => {
                let text = match field.text().await {
                    Ok(text) => text,
                    Err(e) => return index_error(e.status(), &e.body_text()),
                };
                target = Uuid::parse_str(text.trim()).ok();
            }
            Some("file") => {
                let name = field.file_name().unwrap_or("document.pdf").to_string();
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Upload of '{}' failed: {}", name, e);
                        return index_error(e.status(), &e.body_text());
                    }
                };
                document = Some(Document::from_upload(name, bytes.to_vec(), state.max_upload_bytes));
            }
            _ => {}
        }
    }

    let document = match document {
        Some(Ok(doc)) => doc,
        Some(Err(e)) => {
            warn!("Rejected upload: {}", e);
            let status = match e {
                PoExtractError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            return index_error(status, &e.to_string());
        }
        None => return index_error(StatusCode::BAD_REQUEST, "Choose a PDF file to upload."),
    };

    // Re-upload from a session page replaces that session's document.
    if let Some(id) = target {
        if state
            .sessions
            .with_session(&id, |s| s.load(document.clone()))
            .is_some()
        {
            return session_redirect(id);
        }
    }

    let id = state.sessions.create(document);
    info!("Session {} created", id);
    session_redirect(id)
}

async fn show_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.sessions.get(&id) {
        Some(session) => page(StatusCode::OK, view::session_page(&session)),
        None => not_found(),
    }
}

/// Not `Debug`: it carries the API key.
#[derive(Deserialize)]
struct ExtractForm {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    mode: Option<String>,
}

async fn extract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<ExtractForm>,
) -> Response {
    let mode = match form.mode.as_deref().map(str::parse::<ExtractionMode>) {
        None => ExtractionMode::default(),
        Some(Ok(mode)) => mode,
        Some(Err(e)) => {
            return match state.sessions.get(&id) {
                Some(session) => page(
                    StatusCode::BAD_REQUEST,
                    view::session_page_with_error(&session, Some(&e.to_string())),
                ),
                None => not_found(),
            };
        }
    };

    // Short lock: only the state transition happens under the shard guard.
    let started = state
        .sessions
        .with_session(&id, |s| s.begin_extraction(&form.api_key, mode));

    let document = match started {
        None => return not_found(),
        Some(Ok(doc)) => doc,
        Some(Err(e)) => {
            let status = match e {
                PoExtractError::ExtractionInProgress => StatusCode::CONFLICT,
                _ => StatusCode::OK,
            };
            return match state.sessions.get(&id) {
                Some(session) => page(status, view::session_page(&session)),
                None => not_found(),
            };
        }
    };

    let task = tokio::spawn(run_extraction(state.clone(), id, document, form.api_key, mode));
    if let Err(e) = task.await {
        warn!("Session {}: extraction task failed: {}", id, e);
        let outcome = ExtractionOutcome::from(Err(PoExtractError::Internal(format!(
            "extraction task failed: {e}"
        ))));
        state.sessions.with_session(&id, |s| s.finish_extraction(outcome));
    }

    match state.sessions.get(&id) {
        Some(session) => page(StatusCode::OK, view::session_page(&session)),
        None => not_found(),
    }
}

/// Run one extraction and record its outcome on the session.
async fn run_extraction(
    state: AppState,
    id: Uuid,
    document: Document,
    api_key: String,
    mode: ExtractionMode,
) {
    let outcome = extract_po_data(&document, &api_key, mode, &state.config).await;
    info!(
        "Session {}: extraction {}",
        id,
        if outcome.is_success() { "succeeded" } else { "failed" }
    );

    if state
        .sessions
        .with_session(&id, |s| s.finish_extraction(outcome))
        .is_none()
    {
        debug!("Session {} was dropped before its extraction finished", id);
    }
}

async fn download(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let Some(session) = state.sessions.get(&id) else {
        return not_found();
    };
    let Some(data) = session.result() else {
        return (StatusCode::NOT_FOUND, "No extraction result to download").into_response();
    };

    match to_pretty_json(data) {
        Ok(body) => (
            [
                (header::CONTENT_TYPE, "application/json; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn reset(State(state): State<AppState>, Path(id): Path<Uuid>) -> Redirect {
    if state.sessions.remove(&id) {
        info!("Session {} reset", id);
    }
    Redirect::to("/")
}
