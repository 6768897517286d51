//! Session cookie transport.
//!
//! The protocol service only ever sees `Option<&SessionId>`. Getting that
//! id out of a request, and putting a new one into a response, is hidden
//! behind [`SessionCookies`] so the core never touches raw HTTP.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use shieldlab_protocol::SessionId;

use crate::CookieConfig;

/// Reads and writes the session id carried by the client.
pub trait SessionCookies {
    /// The session id the client presented, if any.
    ///
    /// Malformed values are treated as absent.
    fn read_session_cookie(&self) -> Option<SessionId>;

    /// Instructs the client to store `id` as its session cookie.
    fn set_session_cookie(&mut self, id: &SessionId);
}

/// [`SessionCookies`] over axum's cookie jar.
///
/// Build one from the request's jar, use it, then return
/// [`SessionCookieJar::into_jar`] as part of the response so any
/// `Set-Cookie` header gets sent.
pub struct SessionCookieJar<'a> {
    jar: CookieJar,
    config: &'a CookieConfig,
}

impl<'a> SessionCookieJar<'a> {
    pub fn new(jar: CookieJar, config: &'a CookieConfig) -> Self {
        Self { jar, config }
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl SessionCookies for SessionCookieJar<'_> {
    fn read_session_cookie(&self) -> Option<SessionId> {
        let raw = self.jar.get(&self.config.name)?;
        match SessionId::parse(raw.value()) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring session cookie");
                None
            }
        }
    }

    fn set_session_cookie(&mut self, id: &SessionId) {
        let max_age = i64::try_from(self.config.max_age_secs).unwrap_or(i64::MAX);
        let cookie = Cookie::build((self.config.name.clone(), id.as_str().to_owned()))
            .http_only(true)
            .secure(self.config.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(max_age))
            .build();

        let jar = std::mem::replace(&mut self.jar, CookieJar::new());
        self.jar = jar.add(cookie);
    }
}
