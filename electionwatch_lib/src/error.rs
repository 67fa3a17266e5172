//! Error types for the library layer.

use std::fmt;

use crate::normalize::NormalizeError;

/// Errors produced by the library layer, wrapping upstream API errors
/// and adding normalization, serialization, and input validation failures.
#[derive(Debug)]
pub enum ElectionwatchError {
    /// An error from the underlying API client.
    Api(electionwatch_api::Error),
    /// Contest normalization rejected the fetched rows.
    Normalize(NormalizeError),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
    /// User-provided input failed validation.
    InvalidInput(String),
    /// The query matched no contest or election.
    NotFound(String),
}

impl fmt::Display for ElectionwatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Normalize(e) => write!(f, "Normalization error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::NotFound(what) => write!(f, "Not found: {}", what),
        }
    }
}

impl std::error::Error for ElectionwatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Normalize(e) => Some(e),
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<electionwatch_api::Error> for ElectionwatchError {
    fn from(e: electionwatch_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<NormalizeError> for ElectionwatchError {
    fn from(e: NormalizeError) -> Self {
        Self::Normalize(e)
    }
}

impl From<serde_json::Error> for ElectionwatchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}
