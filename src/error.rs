//! Error taxonomy for the middleware layer.
//!
//! Every failure that can cross a component boundary is one of these kinds.
//! Validation rule violations are *not* errors; they travel as data in a
//! `MessageMap` (see `validation`); `EngineError` is reserved for input
//! problems, missing resources, and infrastructure failures.

use thiserror::Error;

/// Stable error code strings, preserved verbatim for caller interoperability.
pub mod codes {
    pub const ERR_SYSTEM_EXCEPTION: &str = "ERR_SYSTEM_EXCEPTION";
    pub const ERR_REQUEST_TIMEOUT: &str = "ERR_REQUEST_TIMEOUT";
    pub const ERR_GRAPH_INVALID_GRAPH_ID: &str = "ERR_GRAPH_INVALID_GRAPH_ID";
    pub const ERR_GRAPH_INVALID_REQUEST: &str = "ERR_GRAPH_INVALID_REQUEST";
    pub const ERR_GRAPH_INVALID_NODE: &str = "ERR_GRAPH_INVALID_NODE";
    pub const ERR_GRAPH_INVALID_PROPERTY: &str = "ERR_GRAPH_INVALID_PROPERTY";
    pub const ERR_GRAPH_NODE_NOT_FOUND: &str = "ERR_GRAPH_NODE_NOT_FOUND";
    pub const ERR_GRAPH_UNSUPPORTED_OPERATION: &str = "ERR_GRAPH_UNSUPPORTED_OPERATION";
    pub const ERR_GRAPH_NOT_INITIALIZED: &str = "ERR_GRAPH_NOT_INITIALIZED";
    pub const ERR_RELATION_CREATE: &str = "ERR_RELATION_CREATE";
    pub const ERR_RELATION_DELETE: &str = "ERR_RELATION_DELETE";
    pub const ERR_RELATION_VALIDATE: &str = "ERR_RELATION_VALIDATE";
    pub const ERR_COLLECTION_INVALID_MEMBERS: &str = "ERR_COLLECTION_INVALID_MEMBERS";
}

/// Errors that cross component boundaries.
///
/// Each variant carries a stable code (surfaced in the response envelope)
/// and a human-readable message. Callers react to the code, never to the
/// Rust type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed or missing input. Fails fast, never reaches the store.
    #[error("{code}: {message}")]
    Client { code: String, message: String },

    /// A referenced node or relation does not exist in the store.
    #[error("{code}: {message}")]
    ResourceNotFound { code: String, message: String },

    /// Unexpected failure: store connectivity, unclassified exception.
    #[error("{code}: {message}")]
    Server { code: String, message: String },

    /// Operation not meaningful for the target entity kind.
    #[error("{code}: {message}")]
    UnsupportedOperation { code: String, message: String },

    /// A worker missed the dispatch deadline.
    #[error("ERR_REQUEST_TIMEOUT: {message}")]
    Timeout { message: String },
}

impl EngineError {
    pub fn client(code: &str, message: impl Into<String>) -> Self {
        Self::Client {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(code: &str, message: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn server(code: &str, message: impl Into<String>) -> Self {
        Self::Server {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            code: codes::ERR_GRAPH_UNSUPPORTED_OPERATION.to_string(),
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// The stable code surfaced in the response envelope.
    pub fn code(&self) -> &str {
        match self {
            Self::Client { code, .. }
            | Self::ResourceNotFound { code, .. }
            | Self::Server { code, .. }
            | Self::UnsupportedOperation { code, .. } => code,
            Self::Timeout { .. } => codes::ERR_REQUEST_TIMEOUT,
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Self::Client { message, .. }
            | Self::ResourceNotFound { message, .. }
            | Self::Server { message, .. }
            | Self::UnsupportedOperation { message, .. }
            | Self::Timeout { message } => message,
        }
    }
}

/// Result alias used throughout the crate.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_message_accessors() {
        let e = EngineError::client(codes::ERR_GRAPH_INVALID_GRAPH_ID, "graph id is blank");
        assert_eq!(e.code(), "ERR_GRAPH_INVALID_GRAPH_ID");
        assert_eq!(e.message(), "graph id is blank");

        let t = EngineError::timeout("worker did not respond in 30000ms");
        assert_eq!(t.code(), "ERR_REQUEST_TIMEOUT");
    }

    #[test]
    fn display_includes_code() {
        let e = EngineError::unsupported("setProperty is not supported on collections");
        let s = e.to_string();
        assert!(s.contains("ERR_GRAPH_UNSUPPORTED_OPERATION"));
        assert!(s.contains("setProperty"));
    }
}
