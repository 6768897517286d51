//! Protocol types: the session identifier and the JSON bodies exchanged
//! with the lab UI.
//!
//! Field names on the wire are camelCase (`csrfToken`), matching what the
//! browser code sends and reads. `#[serde(rename_all = "camelCase")]`
//! handles the translation from Rust's snake_case.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Name of the cookie that carries the [`SessionId`].
pub const SESSION_COOKIE_NAME: &str = "sessionId";

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Opaque identifier correlating a browser to its server-side session.
///
/// A session id is minted by the server from 32 random bytes and rendered
/// as 64 lowercase hex characters. It is never derived from client input,
/// the clock, or a counter, so holding one tells you nothing about any
/// other.
///
/// The id is a bearer credential (whoever presents the cookie gets the
/// session), so neither `Display` nor `Debug` prints it in full. Both show
/// a short fingerprint like `S-3f9a0c12`, which is enough to correlate log
/// lines. Use [`SessionId::as_str`] when the full value is needed, e.g.
/// to write the cookie.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Length of a well-formed session id in characters.
    pub const LEN: usize = 64;

    /// Builds a session id from freshly drawn random bytes.
    pub fn from_random(bytes: [u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Parses a client-supplied value (normally a cookie).
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedSessionId`] unless the value is
    /// exactly [`Self::LEN`] lowercase hex characters.
    pub fn parse(value: &str) -> Result<Self, ProtocolError> {
        let well_formed = value.len() == Self::LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(ProtocolError::MalformedSessionId { len: value.len() });
        }
        Ok(Self(value.to_owned()))
    }

    /// Returns the full identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short, log-safe prefix of the identifier.
    pub fn fingerprint(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.fingerprint())
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId(S-{}…)", self.fingerprint())
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Body of `POST /api/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

/// Successful login. Carries the session's CSRF token so the UI can use it
/// right away without a separate fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub username: String,
    pub csrf_token: String,
}

// ---------------------------------------------------------------------------
// Token fetch
// ---------------------------------------------------------------------------

/// Body of `GET /api/csrf-token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfTokenResponse {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Change email
// ---------------------------------------------------------------------------

/// Body of both change-email endpoints.
///
/// `csrf_token` is optional on the wire: the unprotected endpoint ignores
/// it, and the protected endpoint treats a missing token as a rejection
/// rather than a malformed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmailRequest {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

/// Successful email change.
///
/// `warning` is only present on responses from the unprotected endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEmailResponse {
    pub success: bool,
    pub message: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors and health
// ---------------------------------------------------------------------------

/// Body of every rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_id() -> String {
        "0123456789abcdef".repeat(4)
    }

    #[test]
    fn test_session_id_parse_accepts_minted_format() {
        let id = SessionId::parse(&valid_id()).expect("well formed");
        assert_eq!(id.as_str(), valid_id());
    }

    #[test]
    fn test_session_id_parse_rejects_wrong_length() {
        let result = SessionId::parse("abc123");
        assert_eq!(
            result,
            Err(ProtocolError::MalformedSessionId { len: 6 })
        );
    }

    #[test]
    fn test_session_id_parse_rejects_uppercase_and_non_hex() {
        let upper = valid_id().to_uppercase();
        assert!(SessionId::parse(&upper).is_err());

        let mut junk = valid_id();
        junk.replace_range(0..1, "z");
        assert!(SessionId::parse(&junk).is_err());
    }

    #[test]
    fn test_session_id_from_random_is_well_formed() {
        let id = SessionId::from_random([0xab; 32]);
        assert_eq!(id.as_str().len(), SessionId::LEN);
        assert!(SessionId::parse(id.as_str()).is_ok());
    }

    #[test]
    fn test_session_id_display_and_debug_show_only_fingerprint() {
        let id = SessionId::parse(&valid_id()).unwrap();
        assert_eq!(id.to_string(), "S-01234567");
        let debug = format!("{id:?}");
        assert!(!debug.contains(&valid_id()), "debug leaked full id: {debug}");
        assert!(debug.contains("01234567"));
    }

    #[test]
    fn test_change_email_request_accepts_missing_token() {
        let req: ChangeEmailRequest =
            serde_json::from_str(r#"{"email":"x@y.com"}"#).unwrap();
        assert_eq!(req.email, "x@y.com");
        assert_eq!(req.csrf_token, None);
    }

    #[test]
    fn test_change_email_request_reads_camel_case_token() {
        let req: ChangeEmailRequest = serde_json::from_str(
            r#"{"email":"x@y.com","csrfToken":"abc"}"#,
        )
        .unwrap();
        assert_eq!(req.csrf_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_login_response_uses_camel_case() {
        let resp = LoginResponse {
            success: true,
            message: "Logged in successfully".into(),
            username: "alice".into(),
            csrf_token: "t".into(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["csrfToken"], "t");
        assert!(json.get("csrf_token").is_none());
    }

    #[test]
    fn test_optional_fields_are_omitted_when_absent() {
        let resp = ChangeEmailResponse {
            success: true,
            message: "Email changed to x@y.com".into(),
            email: "x@y.com".into(),
            warning: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("warning").is_none());

        let err = ErrorResponse {
            error: "Not authenticated".into(),
            message: None,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("message").is_none());
    }
}
