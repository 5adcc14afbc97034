//! Bridge error taxonomy.
//!
//! None of these are fatal to the host application. Callers log them and
//! degrade to "no notification shown".

/// Errors surfaced by the notification bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The backend has not issued a registration token yet.
    #[error("registration token not yet issued")]
    TokenUnavailable,
    /// The user declined notification authorization.
    #[error("notification authorization denied")]
    PermissionDenied,
    /// The payload could not be decoded or lacks an expected field.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl BridgeError {
    /// Build a `MalformedPayload` from any displayable cause.
    pub fn malformed(cause: impl std::fmt::Display) -> Self {
        Self::MalformedPayload(cause.to_string())
    }
}
