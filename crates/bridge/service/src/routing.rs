//! Channel-backed application router.

use bridge_core::NotificationPayload;
use tokio::sync::mpsc;

use crate::AppRouter;

/// Forwards tapped payloads onto an unbounded channel read by the
/// application's navigation layer.
#[derive(Clone)]
pub struct ChannelAppRouter {
    tx: mpsc::UnboundedSender<NotificationPayload>,
}

impl ChannelAppRouter {
    /// Create a router and the receiving end for the application.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationPayload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AppRouter for ChannelAppRouter {
    fn route(&self, payload: NotificationPayload) {
        if self.tx.send(payload).is_err() {
            tracing::warn!("app router receiver dropped, tapped payload discarded");
        }
    }
}
