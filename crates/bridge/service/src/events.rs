//! Inbound host event stream.
//!
//! The host platform delivers callbacks one at a time. They are queued here
//! and drained by [`crate::NotificationBridge::run`], which keeps handling
//! serialized.

use bridge_core::{DeviceToken, LifecycleState, NotificationPayload, PresentationDecision};
use color_eyre::eyre::WrapErr as _;
use tokio::sync::{mpsc, oneshot};

/// Default queue depth between the host adapter and the bridge.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// A host callback.
#[derive(Debug)]
pub enum HostEvent {
    /// Backend issued a registration token (or a null one).
    TokenRefreshed(Option<String>),
    /// OS device token from remote-notification registration.
    DeviceToken(DeviceToken),
    /// A payload arrived; `reply` plays the role of the OS completion handler.
    PayloadReceived {
        payload: NotificationPayload,
        state: LifecycleState,
        reply: oneshot::Sender<PresentationDecision>,
    },
    /// The user tapped a notification; `reply` fires once handling is done.
    PayloadTapped {
        payload: NotificationPayload,
        reply: oneshot::Sender<()>,
    },
}

/// Create a host event queue.
pub fn host_events(buffer: usize) -> (HostEvents, mpsc::Receiver<HostEvent>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (HostEvents { tx }, rx)
}

/// Sending half used by host adapters.
#[derive(Clone)]
pub struct HostEvents {
    tx: mpsc::Sender<HostEvent>,
}

impl HostEvents {
    pub async fn token_refreshed(&self, token: Option<String>) -> color_eyre::eyre::Result<()> {
        self.send(HostEvent::TokenRefreshed(token)).await
    }

    pub async fn device_token(&self, token: DeviceToken) -> color_eyre::eyre::Result<()> {
        self.send(HostEvent::DeviceToken(token)).await
    }

    /// Deliver a payload and wait for the presentation decision.
    pub async fn payload_received(
        &self,
        payload: NotificationPayload,
        state: LifecycleState,
    ) -> color_eyre::eyre::Result<PresentationDecision> {
        let (reply, rx) = oneshot::channel();
        self.send(HostEvent::PayloadReceived {
            payload,
            state,
            reply,
        })
        .await?;

        rx.await.wrap_err("bridge dropped payload without a decision")
    }

    /// Deliver a tap and wait until the bridge has handed it off.
    pub async fn payload_tapped(
        &self,
        payload: NotificationPayload,
    ) -> color_eyre::eyre::Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(HostEvent::PayloadTapped { payload, reply }).await?;

        rx.await.wrap_err("bridge dropped tap without completing")
    }

    async fn send(&self, event: HostEvent) -> color_eyre::eyre::Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| color_eyre::eyre::eyre!("bridge event loop is not running"))
    }
}
