//! The session store: every live session, keyed by id.
//!
//! Responsibilities:
//! - Creating a session the first time a browser shows up
//! - Finding the session for a returning browser
//! - Treating sessions idle past the timeout as if they never existed
//! - Sweeping those idle sessions out of memory
//!
//! # Concurrency note
//!
//! `SessionStore` is not thread-safe by itself: it's a plain `HashMap` and
//! every mutating method takes `&mut self`. The server wraps it in a
//! `tokio::sync::Mutex`, and [`SessionStore::get_or_create`] does its
//! lookup and insert inside one call, so holding the lock for that call
//! makes read-or-create a single atomic step.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use shieldlab_protocol::SessionId;

use crate::{Clock, Session, SessionConfig, SystemClock};

/// Holds all sessions for the lifetime of the process.
///
/// ## Lifecycle
///
/// ```text
/// get_or_create(None) ──→ [Anonymous] ──log_in()──→ [Authenticated]
///                              │                           │
///                              └──── idle > timeout ───────┘
///                                          │
///                                          ▼
///                          invisible to lookups ──→ expire_stale()
/// ```
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    /// Creates an empty store on the system clock.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an empty store reading time from `clock`.
    pub fn with_clock(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
            clock,
        }
    }

    /// Returns the session for `id`, creating one if needed.
    ///
    /// - `None`, an unknown id, or an id whose session has gone idle past
    ///   the timeout: a new anonymous session is minted under a new random
    ///   id. The client-supplied id is never reused.
    /// - A live id: the existing session is returned as-is (username,
    ///   token, and creation time untouched) and its idle timer restarts.
    ///
    /// The returned `SessionId` is the one the caller must hand back to the
    /// client; it differs from the input whenever a session was minted.
    pub fn get_or_create(
        &mut self,
        id: Option<&SessionId>,
    ) -> (SessionId, &mut Session) {
        let now = self.clock.now();
        let timeout = self.config.idle_timeout();

        if let Some(id) = id {
            if self.sessions.get(id).is_some_and(|s| s.is_idle(now, timeout)) {
                tracing::debug!(session = %id, "session idle past timeout, replacing");
                self.sessions.remove(id);
            }
        }

        let id = match id.filter(|id| self.sessions.contains_key(*id)) {
            Some(id) => id.clone(),
            None => {
                let id = self.mint_id();
                tracing::info!(session = %id, "session created");
                id
            }
        };

        let session = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id.clone(), now));
        session.touch(now);
        (id, session)
    }

    /// Looks up a live session without creating one.
    ///
    /// Idle sessions are reported as missing even before the sweeper
    /// removes them.
    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        let now = self.clock.now();
        self.sessions
            .get(id)
            .filter(|s| !s.is_idle(now, self.config.idle_timeout()))
    }

    /// Looks up a live session for modification.
    ///
    /// The idle timer is left alone: a request that ends up refused must
    /// not keep the session alive. Call [`touch`](Self::touch) once the
    /// request has been accepted.
    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        let now = self.clock.now();
        let timeout = self.config.idle_timeout();
        self.sessions
            .get_mut(id)
            .filter(|s| !s.is_idle(now, timeout))
    }

    /// Restarts the idle timer of a live session.
    ///
    /// Returns `false` if there is no such session or it has already gone
    /// idle; an idle session can't be revived.
    pub fn touch(&mut self, id: &SessionId) -> bool {
        let now = self.clock.now();
        match self.get_mut(id) {
            Some(session) => {
                session.touch(now);
                true
            }
            None => false,
        }
    }

    /// Removes every session that has been idle past the timeout.
    ///
    /// Returns the ids that were removed. A no-op when expiry is disabled.
    pub fn expire_stale(&mut self) -> Vec<SessionId> {
        let now = self.clock.now();
        let timeout = self.config.idle_timeout();
        let mut expired = Vec::new();

        self.sessions.retain(|id, session| {
            if session.is_idle(now, timeout) {
                tracing::debug!(
                    session = %id,
                    authenticated = session.is_authenticated(),
                    age_secs = now.saturating_duration_since(session.created_at()).as_secs(),
                    idle_secs = now.saturating_duration_since(session.last_seen()).as_secs(),
                    "session expired"
                );
                expired.push(id.clone());
                false
            } else {
                true
            }
        });

        if !expired.is_empty() {
            tracing::info!(
                count = expired.len(),
                remaining = self.sessions.len(),
                "expired idle sessions"
            );
        }
        expired
    }

    /// Number of sessions held, including idle ones not yet swept.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Draws a fresh random id. Loops only on a 2^-256 collision.
    fn mint_id(&self) -> SessionId {
        let mut rng = rand::rng();
        loop {
            let id = SessionId::from_random(rng.random());
            if !self.sessions.contains_key(&id) {
                return id;
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
