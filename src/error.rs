//! Custom error types for nexo-envelope
//!
//! This module defines the error hierarchy for the library using thiserror
//! for ergonomic error definitions. Every failure in the seal/open path is
//! terminal for the operation in progress; nothing here is retried.

use thiserror::Error;

/// The main error type for nexo-envelope operations
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// Key block was not the expected size
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Malformed base64 or a missing field on open
    #[error("Decode error: {0}")]
    Decode(String),

    /// MAC mismatch, bad padding, or otherwise unverifiable ciphertext.
    ///
    /// Carries no detail so that callers cannot tell the causes apart.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// The OS random source could not produce an IV modifier
    #[error("Secure random source unavailable: {0}")]
    RandomSourceUnavailable(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Protocol message did not have the expected shape
    #[error("Message error: {0}")]
    Message(String),
}

impl EnvelopeError {
    /// Create a decode error for a missing field
    pub fn missing_field(field: &'static str) -> Self {
        Self::Decode(format!("missing required field: {}", field))
    }

    /// Check if this is an authentication failure
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }

    /// Check if this is a decode error
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for EnvelopeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<base64::DecodeError> for EnvelopeError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type alias for nexo-envelope operations
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
