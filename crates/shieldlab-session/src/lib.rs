//! Session management for Shieldlab.
//!
//! This crate owns the server-side half of a browser session:
//!
//! 1. **Records**: who the visitor is and which CSRF token they hold
//!    ([`Session`], [`AuthState`])
//! 2. **Storage**: looking sessions up by id and creating them on first
//!    contact ([`SessionStore`])
//! 3. **Expiry**: forgetting sessions that have been idle too long
//!    ([`SessionConfig`], [`Clock`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Protocol service (above)  ← authenticates and gates mutations
//!     ↕
//! Session Layer (this crate)  ← maps SessionId → Session
//!     ↕
//! CSRF + Protocol crates (below)  ← provide CsrfToken and SessionId
//! ```

mod clock;
mod session;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{AuthState, Session, SessionConfig};
pub use store::SessionStore;
