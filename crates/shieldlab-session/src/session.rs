//! Session types: the server's record of one browser.
//!
//! A session tracks:
//! - WHICH browser it belongs to (`SessionId`, carried in a cookie)
//! - WHO is logged in, if anyone (`AuthState`)
//! - WHAT token that browser must echo on protected requests (`CsrfToken`)
//! - WHEN it was created and last used (for idle expiry)

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use shieldlab_csrf::CsrfToken;
use shieldlab_protocol::SessionId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session lifetime.
///
/// `#[serde(default)]` lets a config file set just one field and take the
/// defaults for the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long (in seconds) a session may sit unused before it is
    /// forgotten. Every accepted request resets the timer.
    ///
    /// Default: 3600, the same hour the session cookie lives for.
    /// Set to 0 to keep sessions until the process exits.
    pub idle_timeout_secs: u64,

    /// How often (in seconds) the server sweeps expired sessions out of
    /// memory. Expired sessions are already invisible to lookups; the
    /// sweep only reclaims the space.
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    /// The idle timeout, or `None` when expiry is disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0)
            .then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

/// Whether anyone is logged in on this session.
///
/// ```text
///   Anonymous ──(login)──→ Authenticated
/// ```
///
/// There is no way back: logging out only clears the UI, and a second
/// login simply replaces the username. Only authenticated sessions may
/// perform mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Nobody has logged in yet.
    Anonymous,

    /// A user has logged in under this name.
    Authenticated { username: String },
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single browser's session.
///
/// Fields are private so the one-token-per-session rule can't be broken
/// from outside: the CSRF token is set once in [`Session::new`] and there
/// is no setter.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    auth: AuthState,
    csrf_token: CsrfToken,
    email: Option<String>,
    created_at: Instant,
    last_seen: Instant,
}

impl Session {
    /// Creates an anonymous session with a freshly issued CSRF token.
    pub(crate) fn new(id: SessionId, now: Instant) -> Self {
        Self {
            id,
            auth: AuthState::Anonymous,
            csrf_token: CsrfToken::generate(),
            email: None,
            created_at: now,
            last_seen: now,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The logged-in username, if any.
    pub fn username(&self) -> Option<&str> {
        match &self.auth {
            AuthState::Anonymous => None,
            AuthState::Authenticated { username } => Some(username),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::Authenticated { .. })
    }

    /// The token bound to this session. Compare with
    /// [`CsrfToken::matches`]; hand out with [`CsrfToken::expose`].
    pub fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }

    /// The account email most recently set by a change-email request.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    /// Binds a username, moving the session to `Authenticated`.
    ///
    /// The CSRF token is left alone: logging in again does not rotate it.
    pub fn log_in(&mut self, username: impl Into<String>) {
        self.auth = AuthState::Authenticated {
            username: username.into(),
        };
    }

    /// Records a new account email.
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = Some(email.into());
    }

    pub(crate) fn touch(&mut self, now: Instant) {
        self.last_seen = now;
    }

    /// `true` if the session has been idle for longer than `timeout`.
    pub(crate) fn is_idle(&self, now: Instant, timeout: Option<Duration>) -> bool {
        match timeout {
            Some(timeout) => now.saturating_duration_since(self.last_seen) > timeout,
            None => false,
        }
    }
}
