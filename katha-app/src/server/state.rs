//! Shared server state: backends plus the per-visitor session registry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use katha::story::StorySession;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backend::Backends;
use crate::error::{AppError, Result};

use super::page::PageRenderer;

/// Identifies one visitor's session.
pub type SessionId = Uuid;

/// A session behind its busy flag.
pub type SharedSession = Arc<Mutex<StorySession>>;

/// Idle time after which a session is dropped unless configured otherwise.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    backends: Backends,
    sessions: DashMap<SessionId, Slot>,
    page: PageRenderer,
    idle_timeout: Duration,
}

struct Slot {
    session: SharedSession,
    last_used: Instant,
}

impl Slot {
    fn touch(&mut self) -> SharedSession {
        self.last_used = Instant::now();
        Arc::clone(&self.session)
    }

    /// In use by a request, or used within `idle_timeout`.
    fn is_live(&self, idle_timeout: Duration) -> bool {
        Arc::strong_count(&self.session) > 1 || self.last_used.elapsed() < idle_timeout
    }
}

impl AppState {
    /// Create state around the configured backends.
    ///
    /// # Errors
    ///
    /// Fails if the page template does not compile.
    pub fn new(backends: Backends) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(Inner {
                backends,
                sessions: DashMap::new(),
                page: PageRenderer::new()
                    .map_err(|e| AppError::server(format!("page template: {e}")))?,
                idle_timeout: DEFAULT_IDLE_TIMEOUT,
            }),
        })
    }

    /// Forget sessions idle for longer than `idle_timeout`.
    ///
    /// Call before the state is shared.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.idle_timeout = idle_timeout;
        }
        self
    }

    /// Configured backends.
    #[must_use]
    pub fn backends(&self) -> &Backends {
        &self.inner.backends
    }

    /// Page renderer.
    #[must_use]
    pub fn page(&self) -> &PageRenderer {
        &self.inner.page
    }

    /// The live session for `id`, if one exists.
    #[must_use]
    pub fn find_session(&self, id: SessionId) -> Option<SharedSession> {
        let idle_timeout = self.inner.idle_timeout;
        let mut slot = self.inner.sessions.get_mut(&id)?;
        if !slot.is_live(idle_timeout) {
            drop(slot);
            self.inner
                .sessions
                .remove_if(&id, |_, slot| !slot.is_live(idle_timeout));
            return None;
        }
        Some(slot.touch())
    }

    /// The live session for `id`, or an unregistered empty one.
    ///
    /// Routes that only read or change an existing story use this, so
    /// unknown cookies never grow the registry.
    #[must_use]
    pub fn session_or_blank(&self, id: SessionId) -> SharedSession {
        self.find_session(id)
            .unwrap_or_else(|| Arc::new(Mutex::new(self.inner.backends.session())))
    }

    /// The session for `id`, registered empty on first use.
    ///
    /// Idle sessions are pruned whenever a new one is registered.
    #[must_use]
    pub fn session(&self, id: SessionId) -> SharedSession {
        if let Some(session) = self.find_session(id) {
            return session;
        }

        self.prune();
        let mut slot = self.inner.sessions.entry(id).or_insert_with(|| {
            tracing::debug!(session = %id, "new story session");
            Slot {
                session: Arc::new(Mutex::new(self.inner.backends.session())),
                last_used: Instant::now(),
            }
        });
        slot.touch()
    }

    /// Drop every idle session. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let idle_timeout = self.inner.idle_timeout;
        let before = self.inner.sessions.len();
        self.inner.sessions.retain(|_, slot| slot.is_live(idle_timeout));
        let removed = before.saturating_sub(self.inner.sessions.len());
        if removed > 0 {
            tracing::debug!(removed, "expired idle story sessions");
        }
        removed
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backends", &self.inner.backends)
            .field("sessions", &self.session_count())
            .field("idle_timeout", &self.inner.idle_timeout)
            .finish_non_exhaustive()
    }
}
