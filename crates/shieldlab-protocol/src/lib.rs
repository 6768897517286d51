//! Wire types for Shieldlab.
//!
//! This crate defines what travels between the lab's browser UI and the
//! backend:
//!
//! - **Identity** ([`SessionId`]): the opaque value carried in the
//!   `sessionId` cookie.
//! - **Messages** ([`LoginRequest`], [`CsrfTokenResponse`],
//!   [`ChangeEmailRequest`], etc.): one explicit struct per request and
//!   response body, instead of open-ended JSON maps.
//! - **Errors** ([`ProtocolError`]): what can go wrong while parsing
//!   client-supplied identity values.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about sessions or tokens being valid.
//! It only knows the shape of the data.
//!
//! ```text
//! HTTP (cookies, JSON) → Protocol (typed messages) → Session / CSRF core
//! ```

mod error;
mod types;

pub use error::ProtocolError;
pub use types::{
    ChangeEmailRequest, ChangeEmailResponse, CsrfTokenResponse, ErrorResponse,
    HealthResponse, LoginRequest, LoginResponse, SessionId,
    SESSION_COOKIE_NAME,
};
