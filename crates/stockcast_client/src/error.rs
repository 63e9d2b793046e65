use std::fmt;

/// Canonical message used whenever no response reached the transport at all.
pub(crate) const NETWORK_ERROR_MESSAGE: &str = "Network error - please check your connection";

/// Fallback message when an error carries no usable text.
pub(crate) const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// The single error shape every transport failure is normalized into.
///
/// Built once at the transport boundary and never re-interpreted downstream.
/// `Display` yields the canonical human-readable message for UI surfaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = GENERIC_ERROR_MESSAGE.to_string();
        }
        Self { kind, message }
    }

    /// A connection-level failure: nothing came back from the service.
    pub fn network() -> Self {
        Self::new(ErrorKind::Network, NETWORK_ERROR_MESSAGE)
    }

    /// Caller-supplied input rejected before any request was sent.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// A response body that could not be decoded as JSON.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    /// HTTP status code, present only for the Client/Server kinds.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            ErrorKind::Client(code) | ErrorKind::Server(code) => Some(code),
            _ => None,
        }
    }
}

/// Closed taxonomy of failure kinds, one variant per class of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response reached the transport (refused, timeout, DNS).
    Network,
    /// Response with a 4xx status.
    Client(u16),
    /// Response with a 5xx (or otherwise unexpected non-success) status.
    Server(u16),
    /// Response received but its body failed to decode.
    Parse,
    /// Input rejected client-side before any request was issued.
    Validation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network error"),
            ErrorKind::Client(code) => write!(f, "client error {code}"),
            ErrorKind::Server(code) => write!(f, "server error {code}"),
            ErrorKind::Parse => write!(f, "parse error"),
            ErrorKind::Validation => write!(f, "validation error"),
        }
    }
}
