//! CSRF tokens for Shieldlab.
//!
//! Two operations make up the whole token protocol:
//!
//! 1. **Issue**: [`generate_token`] draws 256 bits from the thread-local
//!    CSPRNG and hex-encodes them.
//! 2. **Validate**: [`validate_token`] compares what the client echoed
//!    back against what the session holds, in constant time.
//!
//! [`CsrfToken`] wraps an issued token so it can be stored on a session
//! without ever showing up in `Debug` output or logs.
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP layer (above)  ← pulls the echoed token out of the request body
//!     ↕
//! Session layer  ← stores one CsrfToken per session
//!     ↕
//! CSRF layer (this crate)  ← mints and compares tokens
//! ```

mod token;

pub use token::{generate_token, validate_token, CsrfToken, TOKEN_BYTES, TOKEN_LEN};
