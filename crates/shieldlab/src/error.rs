//! Error types for the Shieldlab backend.

/// Why a single request was refused.
///
/// These are ordinary outcomes, not faults: each one maps to a 4xx
/// response, nothing is retried, and the session is left exactly as it
/// was before the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// A mutation was attempted on a session nobody has logged in to, or
    /// with no (or an unknown) session at all.
    #[error("not authenticated")]
    Unauthenticated,

    /// The request's CSRF token was missing or didn't match the session's.
    /// The client may fetch the token again and retry.
    #[error("invalid CSRF token")]
    InvalidCsrfToken,

    /// Login was attempted with an empty or whitespace-only username.
    #[error("username must not be blank")]
    InvalidUsername,

    /// The JSON body was missing, malformed, or lacked a required field.
    /// Mutations only report this to a logged-in session.
    #[error("invalid request body")]
    InvalidBody,
}

/// Top-level error for setting up and running the server.
///
/// `#[from]` generates the `From` impls, so `?` converts configuration and
/// I/O errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ShieldlabError {
    /// A request was refused.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The configuration file or environment couldn't be read or parsed.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The configured CORS origin isn't a valid header value.
    #[error("invalid allowed origin {0:?}")]
    InvalidOrigin(String),

    /// Binding the listener or serving connections failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
