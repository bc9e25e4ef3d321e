//! Stream error types.

/// Errors from the byte transport carrying the stream.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed (connect, reset, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Solve endpoint returned a non-success status
    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    /// Any other transport failure
    #[error("transport error: {0}")]
    Other(String),
}

/// A `data:` frame whose payload is not a valid event.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed stream frame: {message} (frame: {frame})")]
pub struct FrameError {
    /// Parser error message
    pub message: String,
    /// Leading part of the offending payload
    pub frame: String,
}

/// Anything that ends event decoding early.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
