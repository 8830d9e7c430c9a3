//! Per-user session state for the web form.
//!
//! A [`Session`] is the explicit context object every handler works on: the
//! uploaded document plus where the user is in the flow.
//!
//! ```text
//!   Idle ──upload──▶ Loaded ──extract──▶ Extracting ──ok──▶ Extracted
//!                      ▲                     │
//!                      │                     └──err──▶ Failed
//!                      └──────── upload (any state) ◀──────┘
//! ```
//!
//! `Failed` keeps the document, so the form is offered again together with
//! the error. A missing API key goes straight from `Loaded` to `Failed`
//! without ever reaching `Extracting`.
//!
//! [`SessionStore`] holds sessions in memory only; nothing is persisted.
//! A session untouched for longer than the store's idle TTL is dropped by
//! [`SessionStore::evict_idle`], together with its document. A session in
//! `Extracting` is never evicted.

use crate::config::ExtractionMode;
use crate::error::PoExtractError;
use crate::extract::ExtractionOutcome;
use crate::pipeline::input::Document;
use crate::pipeline::response::ExtractionResult;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Where a session is in the extraction flow.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Loaded,
    Extracting,
    Extracted(ExtractionResult),
    Failed(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loaded => "loaded",
            SessionState::Extracting => "extracting",
            SessionState::Extracted(_) => "extracted",
            SessionState::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    document: Option<Document>,
    mode: ExtractionMode,
    state: SessionState,
    last_seen: Instant,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            document: None,
            mode: ExtractionMode::default(),
            state: SessionState::Idle,
            last_seen: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        match &self.state {
            SessionState::Extracted(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Time since a handler last read or updated this session.
    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }

    fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Replace the document. Any previous result or error is discarded.
    pub fn load(&mut self, document: Document) {
        debug!("Session {}: loaded '{}'", self.id, document.file_name());
        self.document = Some(document);
        self.state = SessionState::Loaded;
    }

    /// Move to `Extracting` and hand back the document to work on.
    ///
    /// A blank key moves the session to `Failed` and returns
    /// [`PoExtractError::MissingCredential`]; the caller must not contact the
    /// remote service in that case.
    pub fn begin_extraction(
        &mut self,
        api_key: &str,
        mode: ExtractionMode,
    ) -> Result<Document, PoExtractError> {
        let document = self.document.clone().ok_or(PoExtractError::NoDocument)?;
        if self.state == SessionState::Extracting {
            return Err(PoExtractError::ExtractionInProgress);
        }

        self.mode = mode;
        if api_key.trim().is_empty() {
            let err = PoExtractError::MissingCredential;
            self.state = SessionState::Failed(err.to_string());
            return Err(err);
        }

        self.state = SessionState::Extracting;
        Ok(document)
    }

    /// Record the outcome of the extraction started by [`Self::begin_extraction`].
    pub fn finish_extraction(&mut self, outcome: ExtractionOutcome) {
        if self.state != SessionState::Extracting {
            debug!(
                "Session {}: ignoring outcome in state {}",
                self.id,
                self.state.name()
            );
            return;
        }
        self.state = match outcome.into_result() {
            Ok(data) => SessionState::Extracted(data),
            Err(msg) => SessionState::Failed(msg),
        };
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Idle time after which [`SessionStore::evict_idle`] drops a session.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// In-memory session map shared by all handlers.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Session>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a session holding `document`, returning its id.
    pub fn create(&self, document: Document) -> Uuid {
        let mut session = Session::new();
        session.load(document);
        let id = session.id();
        self.sessions.insert(id, session);
        id
    }

    /// Snapshot of a session. Counts as activity.
    pub fn get(&self, id: &Uuid) -> Option<Session> {
        self.sessions.get_mut(id).map(|mut s| {
            s.touch();
            s.clone()
        })
    }

    /// Run `f` against a session under its shard lock. Counts as activity.
    ///
    /// Keep `f` short: never await inside it.
    pub fn with_session<R>(&self, id: &Uuid, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.sessions.get_mut(id).map(|mut s| {
            s.touch();
            f(&mut s)
        })
    }

    /// Drop every session idle for at least the TTL, except those still
    /// extracting. Returns how many were dropped.
    pub fn evict_idle(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| {
            s.state == SessionState::Extracting || s.last_seen.elapsed() < self.ttl
        });
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            info!("Evicted {} idle session(s)", evicted);
        }
        evicted
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
