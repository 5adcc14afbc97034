//! Service traits.

use bridge_core::{
    DeviceToken, LifecycleState, MessageId, NotificationPayload, PermissionOptions,
    PresentationDecision,
};

/// Push delivery backend (FCM-style registration and receipt bookkeeping).
#[trait_variant::make(Send)]
pub trait PushBackend: Send + Sync {
    /// Hand the OS device token to the backend so it can mint a registration
    /// token.
    async fn register_device(&self, token: &DeviceToken) -> color_eyre::eyre::Result<()>;

    /// Acknowledge receipt of a message. Must be safe to repeat.
    async fn acknowledge(
        &self,
        id: &MessageId,
        payload: &NotificationPayload,
    ) -> color_eyre::eyre::Result<()>;
}

/// OS notification authorization surface.
#[trait_variant::make(Send)]
pub trait PermissionRequester: Send + Sync {
    /// Request authorization. Returns whether the user granted it.
    async fn request_authorization(
        &self,
        options: PermissionOptions,
    ) -> color_eyre::eyre::Result<bool>;

    /// Ask the OS to register for remote notifications. The device token
    /// arrives later through [`NotificationDelegate::on_device_token`].
    async fn register_for_remote_notifications(&self) -> color_eyre::eyre::Result<()>;
}

/// Application routing layer that receives tapped payloads.
///
/// Implementations must not block; the bridge does not wait on the outcome.
pub trait AppRouter: Send + Sync {
    fn route(&self, payload: NotificationPayload);
}

/// Callbacks the host platform invokes on the bridge.
pub trait NotificationDelegate: Send + Sync {
    /// Backend issued (or reissued) a registration token.
    fn on_token_refreshed(&self, token: Option<String>);

    /// OS finished remote-notification registration.
    fn on_device_token(&self, token: DeviceToken);

    /// A payload arrived. Returns how the host should present it.
    fn on_payload_received(
        &self,
        payload: NotificationPayload,
        state: LifecycleState,
    ) -> PresentationDecision;

    /// The user tapped a presented notification.
    fn on_payload_tapped(&self, payload: NotificationPayload);
}
