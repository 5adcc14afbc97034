//! Registration token tracking and fan-out to subscribers.

use std::sync::{Arc, Mutex, RwLock};

use bridge_core::{BridgeError, RegistrationToken, TokenUpdated};
use tokio::sync::mpsc;

/// Holds the current registration token and notifies subscribers when the
/// backend issues a new one.
///
/// Each subscriber owns an unbounded queue, so a slow subscriber never loses
/// an update while it stays registered.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
}

struct Inner {
    current: RwLock<Option<RegistrationToken>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<TokenUpdated>>>,
}

impl TokenManager {
    /// Create a token manager with no token issued yet.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                current: RwLock::new(None),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Record a token from the backend.
    ///
    /// A missing token is a no-op. Otherwise the value replaces the previous
    /// one and every registered subscriber receives one event, even when the
    /// value is unchanged. Returns whether an event was published.
    pub fn on_token(&self, token: Option<String>) -> bool {
        let Some(token) = token.and_then(RegistrationToken::new) else {
            tracing::debug!("ignoring empty registration token");
            return false;
        };

        tracing::info!("registration token updated");
        tracing::debug!(token = %token, "registration token value");

        {
            let mut current = self
                .inner
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *current = Some(token.clone());
        }

        let event = TokenUpdated { token };
        let mut subscribers = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Dropped receivers are pruned here.
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        tracing::debug!(subscribers = subscribers.len(), "token update published");

        true
    }

    /// Current token, or `TokenUnavailable` before the first issuance.
    pub fn current(&self) -> Result<RegistrationToken, BridgeError> {
        self.inner
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(BridgeError::TokenUnavailable)
    }

    /// Receive every token update published after this call, until the
    /// receiver is dropped.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<TokenUpdated> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    /// Number of registered subscribers, as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Default for TokenManager {
    fn default() -> Self {
        Self::new()
    }
}
