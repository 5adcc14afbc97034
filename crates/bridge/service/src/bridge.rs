//! The notification bridge: host delegate over the token manager and the
//! delivery router.

use std::sync::Arc;

use bridge_core::{
    BridgeError, DeviceToken, LifecycleState, NotificationPayload, PermissionOptions,
    PlatformCapabilities, PresentationDecision,
};
use tokio::sync::{OnceCell, mpsc};

use crate::{
    AppRouter, DEFAULT_ACK_LEDGER_CAPACITY, DeliveryRouter, HostEvent, NotificationDelegate,
    PermissionRequester, PushBackend, TokenManager,
};

/// Bridge construction options.
#[derive(Debug, Clone, Copy)]
pub struct BridgeOptions {
    pub capabilities: PlatformCapabilities,
    pub permissions: PermissionOptions,
    pub ack_ledger_capacity: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            capabilities: PlatformCapabilities::default(),
            permissions: PermissionOptions::all(),
            ack_ledger_capacity: DEFAULT_ACK_LEDGER_CAPACITY,
        }
    }
}

/// Mediates between the push backend and the host application.
pub struct NotificationBridge<B, P, R> {
    tokens: TokenManager,
    router: DeliveryRouter<B, R>,
    backend: Arc<B>,
    permissions: P,
    permission_options: PermissionOptions,
    authorization: OnceCell<bool>,
}

impl<B, P, R> NotificationBridge<B, P, R>
where
    B: PushBackend + 'static,
    P: PermissionRequester,
    R: AppRouter,
{
    /// Create a new bridge.
    pub fn new(backend: B, permissions: P, app: R, options: BridgeOptions) -> Self {
        let backend = Arc::new(backend);
        let router = DeliveryRouter::with_ledger_capacity(
            Arc::clone(&backend),
            app,
            options.capabilities,
            options.ack_ledger_capacity,
        );

        Self {
            tokens: TokenManager::new(),
            router,
            backend,
            permissions,
            permission_options: options.permissions,
            authorization: OnceCell::new(),
        }
    }

    /// Token manager handle, shareable with subscribers.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn router(&self) -> &DeliveryRouter<B, R> {
        &self.router
    }

    /// Startup sequence: request notification authorization, then register
    /// for remote notifications. Denial is logged and otherwise ignored.
    pub async fn start(&self) {
        if !self.request_authorization().await {
            tracing::warn!(
                error = %BridgeError::PermissionDenied,
                "continuing without notification authorization"
            );
        }

        if let Err(e) = self.permissions.register_for_remote_notifications().await {
            tracing::warn!(error = %e, "remote notification registration failed");
        }
    }

    /// Request authorization once per process. Later calls return the first
    /// answer without asking again.
    pub async fn request_authorization(&self) -> bool {
        *self
            .authorization
            .get_or_init(|| async {
                match self
                    .permissions
                    .request_authorization(self.permission_options)
                    .await
                {
                    Ok(granted) => {
                        tracing::info!(granted, "notification authorization answered");
                        granted
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "notification authorization request failed");
                        false
                    }
                }
            })
            .await
    }

    /// Forward the OS device token to the backend on a background task.
    pub fn register_device(&self, token: DeviceToken) -> tokio::task::JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let hex = token.hex();
            match backend.register_device(&token).await {
                Ok(()) => tracing::info!(device_token = %hex, "device token registered"),
                Err(e) => tracing::warn!(
                    device_token = %hex,
                    error = %e,
                    "device token registration failed"
                ),
            }
        })
    }

    /// Drain host events until every sender is dropped.
    pub async fn run(&self, mut events: mpsc::Receiver<HostEvent>) {
        tracing::info!("notification bridge running");

        while let Some(event) = events.recv().await {
            self.dispatch(event);
        }

        tracing::info!("host event stream closed, notification bridge stopping");
    }

    fn dispatch(&self, event: HostEvent) {
        match event {
            HostEvent::TokenRefreshed(token) => self.on_token_refreshed(token),
            HostEvent::DeviceToken(token) => self.on_device_token(token),
            HostEvent::PayloadReceived {
                payload,
                state,
                reply,
            } => {
                let decision = self.on_payload_received(payload, state);
                if reply.send(decision).is_err() {
                    tracing::debug!("host stopped waiting for presentation decision");
                }
            }
            HostEvent::PayloadTapped { payload, reply } => {
                self.on_payload_tapped(payload);
                let _ = reply.send(());
            }
        }
    }
}

impl<B, P, R> NotificationDelegate for NotificationBridge<B, P, R>
where
    B: PushBackend + 'static,
    P: PermissionRequester,
    R: AppRouter,
{
    fn on_token_refreshed(&self, token: Option<String>) {
        self.tokens.on_token(token);
    }

    fn on_device_token(&self, token: DeviceToken) {
        self.register_device(token);
    }

    fn on_payload_received(
        &self,
        payload: NotificationPayload,
        state: LifecycleState,
    ) -> PresentationDecision {
        self.router.receive(&payload, state).decision
    }

    fn on_payload_tapped(&self, payload: NotificationPayload) {
        self.router.tap(payload);
    }
}
