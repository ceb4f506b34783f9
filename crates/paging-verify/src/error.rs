//! Error types for pagination verification.

use thiserror::Error;

/// A search call that could not complete.
///
/// Never retried: a transient failure must not be mistaken for a pagination bug.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or the connection broke.
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("Server returned status {status} for {url}: {body}")]
    Status { url: String, status: u16, body: String },

    /// The response body was not the expected shape.
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The request exceeded the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout { url: String },
}

/// The server broke the paging contract badly enough that a walk cannot go on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error(
        "walk with page size {page_size} issued {pages} calls without receiving an absent continuation token"
    )]
    IterationCapExceeded { page_size: u32, pages: usize },
}

/// Errors that abort a walk or prevent a check from starting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The search call failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server violated the paging protocol.
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// Checker or page-size configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
