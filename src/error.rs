//! Error types shared by the content client, slide builder, session and audio layers

use thiserror::Error;

/// Failures talking to the remote content API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("Failed to {operation}: {status}")]
    Status {
        operation: &'static str,
        status: reqwest::StatusCode,
    },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("Failed to {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The body could not be decoded into the expected shape.
    #[error("{operation} response format is invalid")]
    InvalidPayload { operation: &'static str },
}

/// Failures of the slide builder. Any collaborator failure aborts the whole build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlideError {
    #[error("{0}")]
    Network(String),
}

impl From<ApiError> for SlideError {
    fn from(err: ApiError) -> Self {
        SlideError::Network(err.to_string())
    }
}

/// Session-level failures. These are terminal for a session: the user has to
/// close the overlay and start again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The request was rejected before reaching the state machine.
    #[error("Playback request has no segments")]
    Configuration,

    /// Slides were built successfully but none matched the request.
    #[error("No verses available for this selection")]
    EmptyResult,

    #[error("{0}")]
    Network(String),
}

impl From<SlideError> for SessionError {
    fn from(err: SlideError) -> Self {
        match err {
            SlideError::Network(message) => SessionError::Network(message),
        }
    }
}

/// Audio element failures. Handled locally (skip or silent pause), never
/// escalated into a [`SessionError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("No audio source bound")]
    NoSource,

    #[error("Failed to fetch audio: {0}")]
    Fetch(String),

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("Audio output unavailable")]
    Output,
}
