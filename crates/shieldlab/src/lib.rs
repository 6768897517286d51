//! # Shieldlab
//!
//! Backend for a hands-on CSRF lab.
//!
//! A browser logs in and receives a session cookie plus a CSRF token.
//! Two endpoints change the account email: one insists the token is echoed
//! back, the other doesn't care. A forged cross-site form can hit the second
//! but not the first, and that difference is what the lab shows.
//!
//! ## Crates
//!
//! - `shieldlab-protocol`: session ids and JSON bodies
//! - `shieldlab-csrf`: token generation and timing-safe validation
//! - `shieldlab-session`: the in-memory session store
//! - `shieldlab` (this crate): the protocol service, HTTP routes, config
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shieldlab::prelude::*;
//!
//! # async fn run() -> Result<(), ShieldlabError> {
//! let server = ShieldlabServer::builder()
//!     .config(ServerConfig::load()?)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod cookies;
mod error;
mod handler;
mod server;
mod service;
mod settings;

pub use cookies::{SessionCookieJar, SessionCookies};
pub use error::{RequestError, ShieldlabError};
pub use server::{ShieldlabApp, ShieldlabServer, ShieldlabServerBuilder};
pub use service::{Authenticated, CsrfProtocol, EmailChange, EmailChanged, IssuedToken};
pub use settings::{CookieConfig, ServerConfig};

/// Everything needed to run a server or drive the protocol directly.
pub mod prelude {
    pub use crate::{
        CookieConfig, CsrfProtocol, EmailChange, RequestError, ServerConfig,
        ShieldlabApp, ShieldlabError, ShieldlabServer, ShieldlabServerBuilder,
    };
    pub use shieldlab_csrf::{generate_token, validate_token, CsrfToken};
    pub use shieldlab_protocol::{
        ChangeEmailRequest, ChangeEmailResponse, CsrfTokenResponse,
        ErrorResponse, LoginRequest, LoginResponse, SessionId,
    };
    pub use shieldlab_session::{
        Clock, ManualClock, SessionConfig, SessionStore, SystemClock,
    };
}
