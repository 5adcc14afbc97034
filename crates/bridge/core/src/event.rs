//! Application-wide events published by the bridge.

use crate::RegistrationToken;

/// Event name for registration token updates.
pub const TOKEN_UPDATED_EVENT: &str = "push:token_updated";

/// Payload for token updated events.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenUpdated {
    pub token: RegistrationToken,
}

impl TokenUpdated {
    /// Event name this payload is published under.
    pub fn name(&self) -> &'static str {
        TOKEN_UPDATED_EVENT
    }
}
