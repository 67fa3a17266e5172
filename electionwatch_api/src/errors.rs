//! Error types for the API client.

/// Errors that can occur when talking to the results API.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or invalid URL).
    #[error("request failed")]
    RequestFailed,
    /// The API answered with a non-success status code.
    #[error("request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The response body did not match the expected envelope shape.
    #[error("could not decode response: {reason}")]
    Decode { reason: String },
}
