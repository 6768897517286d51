//! Error types for the protocol layer.
//!
//! Each crate in Shieldlab defines its own error enum. A `ProtocolError`
//! always means "the client sent something shaped wrong", never "the
//! client is not allowed to do this".

/// Errors that can occur while parsing client-supplied protocol values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The session identifier is not in the format the server mints.
    ///
    /// Session ids are always 64 lowercase hex characters. Anything else
    /// came from a tampered or foreign cookie, and is treated by callers
    /// the same as "no session id at all".
    #[error("malformed session id ({len} bytes)")]
    MalformedSessionId {
        /// Length of the rejected value. The value itself is never echoed.
        len: usize,
    },
}
