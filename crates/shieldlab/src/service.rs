//! The CSRF protocol: the four operations the HTTP layer calls.
//!
//! Every operation takes the session id the client presented (if any) and
//! returns plain data. Nothing here knows about cookies, status codes, or
//! JSON; that's the handler's job.
//!
//! ```text
//! issue_or_fetch_token ─┐
//! authenticate ─────────┼──→ SessionStore (one lock per call)
//! protected mutation ───┤        │
//! unprotected mutation ─┘        └──→ CsrfToken::matches
//! ```

use shieldlab_protocol::SessionId;
use shieldlab_session::SessionStore;
use tokio::sync::Mutex;

use crate::RequestError;

/// The state change both mutation endpoints perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailChange {
    pub email: String,
}

/// Result of [`CsrfProtocol::issue_or_fetch_token`].
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub session_id: SessionId,
    pub csrf_token: String,
    /// `true` if a new session was minted, so the caller must set the
    /// session cookie.
    pub created: bool,
}

/// Result of [`CsrfProtocol::authenticate`].
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub session_id: SessionId,
    pub username: String,
    pub csrf_token: String,
    pub created: bool,
}

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailChanged {
    pub username: String,
    pub email: String,
}

/// Issues CSRF tokens and gates mutations on them.
///
/// Owns the session store behind a Tokio mutex. Each operation takes the
/// lock once and does all of its reading and writing under it, so no two
/// requests can interleave inside one operation.
pub struct CsrfProtocol {
    sessions: Mutex<SessionStore>,
}

impl CsrfProtocol {
    pub fn new(store: SessionStore) -> Self {
        Self {
            sessions: Mutex::new(store),
        }
    }

    /// Returns the session's CSRF token, creating the session if needed.
    ///
    /// Idempotent for a live session: the same id always yields the same
    /// token.
    pub async fn issue_or_fetch_token(
        &self,
        session_id: Option<&SessionId>,
    ) -> IssuedToken {
        let mut sessions = self.sessions.lock().await;
        let (id, session) = sessions.get_or_create(session_id);

        IssuedToken {
            created: session_id != Some(&id),
            csrf_token: session.csrf_token().expose().to_owned(),
            session_id: id,
        }
    }

    /// Logs `username` in on the (possibly new) session.
    ///
    /// # Errors
    /// [`RequestError::InvalidUsername`] if the name is blank. No session is
    /// created in that case.
    pub async fn authenticate(
        &self,
        session_id: Option<&SessionId>,
        username: &str,
    ) -> Result<Authenticated, RequestError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(RequestError::InvalidUsername);
        }

        let mut sessions = self.sessions.lock().await;
        let (id, session) = sessions.get_or_create(session_id);
        session.log_in(username);

        tracing::info!(session = %id, %username, "user logged in");

        Ok(Authenticated {
            created: session_id != Some(&id),
            csrf_token: session.csrf_token().expose().to_owned(),
            username: username.to_owned(),
            session_id: id,
        })
    }

    /// Applies `change` only if the session is logged in and `provided`
    /// is its CSRF token.
    ///
    /// # Errors
    /// - [`RequestError::Unauthenticated`]: no live session, or nobody
    ///   logged in. Checked first, so token validity is irrelevant here.
    /// - [`RequestError::InvalidCsrfToken`]: token missing or wrong.
    pub async fn perform_protected_mutation(
        &self,
        session_id: Option<&SessionId>,
        provided: Option<&str>,
        change: EmailChange,
    ) -> Result<EmailChanged, RequestError> {
        let mut sessions = self.sessions.lock().await;
        let id = session_id.ok_or(RequestError::Unauthenticated)?;
        let session = sessions.get_mut(id).ok_or(RequestError::Unauthenticated)?;
        let username = session
            .username()
            .ok_or(RequestError::Unauthenticated)?
            .to_owned();

        if !session.csrf_token().matches(provided) {
            tracing::warn!(
                session = %id,
                %username,
                token_present = provided.is_some_and(|t| !t.is_empty()),
                "blocked email change: invalid CSRF token"
            );
            return Err(RequestError::InvalidCsrfToken);
        }

        session.set_email(change.email.clone());
        sessions.touch(id);
        tracing::info!(session = %id, %username, "email changed (token verified)");

        Ok(EmailChanged {
            username,
            email: change.email,
        })
    }

    /// Applies `change` for any logged-in session, ignoring CSRF entirely.
    ///
    /// This is the vulnerable baseline the lab demonstrates: a forged
    /// cross-site form post succeeds here because the browser attaches the
    /// session cookie on its own.
    ///
    /// # Errors
    /// [`RequestError::Unauthenticated`]: no live session, or nobody
    /// logged in.
    pub async fn perform_unprotected_mutation(
        &self,
        session_id: Option<&SessionId>,
        change: EmailChange,
    ) -> Result<EmailChanged, RequestError> {
        let mut sessions = self.sessions.lock().await;
        let id = session_id.ok_or(RequestError::Unauthenticated)?;
        let session = sessions.get_mut(id).ok_or(RequestError::Unauthenticated)?;
        let username = session
            .username()
            .ok_or(RequestError::Unauthenticated)?
            .to_owned();

        session.set_email(change.email.clone());
        sessions.touch(id);
        tracing::warn!(session = %id, %username, "email changed without CSRF check");

        Ok(EmailChanged {
            username,
            email: change.email,
        })
    }

    /// The username logged in on a live session.
    ///
    /// A read-only check: the idle timer is not restarted.
    ///
    /// # Errors
    /// [`RequestError::Unauthenticated`]: no live session, or nobody
    /// logged in.
    pub async fn require_login(
        &self,
        session_id: Option<&SessionId>,
    ) -> Result<String, RequestError> {
        let sessions = self.sessions.lock().await;
        session_id
            .and_then(|id| sessions.get(id))
            .and_then(|s| s.username().map(str::to_owned))
            .ok_or(RequestError::Unauthenticated)
    }

    /// Sweeps idle sessions. Returns how many were removed.
    pub async fn expire_stale(&self) -> usize {
        self.sessions.lock().await.expire_stale().len()
    }

    /// Current email on a live session, if set.
    pub async fn email_of(&self, session_id: &SessionId) -> Option<String> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .and_then(|s| s.email().map(str::to_owned))
    }

    /// Number of sessions held in memory.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
