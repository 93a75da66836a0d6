//! Unified error types for page-loader.
//!
//! Every variant is fatal to the navigation attempt that raised it. The
//! orchestrator never retries; it logs the error and escapes to a hard
//! navigation to the intended location.

use std::fmt;

/// Which side of a content swap was missing its content root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSide {
    /// The live page's content root.
    Outgoing,
    /// The content root of the visit being swapped in.
    Incoming,
}

impl fmt::Display for ContentSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSide::Outgoing => f.write_str("old content not found"),
            ContentSide::Incoming => f.write_str("new content not found"),
        }
    }
}

/// Unified error types for page-loader.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The server answered with a non-success status.
    #[error("NETWORK_ERROR: status {status} for {location}")]
    Network { location: String, status: u16 },

    /// The fetch could not complete (DNS, TLS, connection, body read, timeout).
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// The destination ships a different tracked-asset bundle than this session.
    #[error("ASSET_MISMATCH: tracked assets have changed ({location})")]
    AssetMismatch { location: String },

    /// A content root was missing on one side of a swap.
    #[error("CONTENT_NOT_FOUND: {0}")]
    ContentNotFound(ContentSide),

    /// A location could not be parsed or resolved.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Invalid input parameters (e.g., an unknown node id).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
}
