//! Error types for the IP change logger
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for iplog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the IP change logger
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP lookup failed (connection, status or body)
    #[error("Network error: {0}")]
    Network(String),

    /// DNS lookup failed
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Log file access errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A log line that does not match the entry format
    #[error("Malformed log line: {line:?}")]
    MalformedLogLine {
        /// The offending line, without its trailing newline
        line: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// An address that cannot be written as a log entry
    #[error("Invalid IP address: {0:?}")]
    InvalidIp(String),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a malformed log line error
    pub fn malformed(line: impl Into<String>) -> Self {
        Self::MalformedLogLine { line: line.into() }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid IP error
    pub fn invalid_ip(ip: impl Into<String>) -> Self {
        Self::InvalidIp(ip.into())
    }

    /// Whether this error came from a resolver lookup
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Resolution(_))
    }
}
