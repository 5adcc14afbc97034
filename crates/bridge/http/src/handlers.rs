//! Host adapter handlers.
//!
//! Each endpoint mirrors one platform callback. Malformed input never fails the
//! bridge: undecodable payloads degrade to `suppress`.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bridge_core::{
    BridgeError, DeviceToken, LifecycleState, NotificationPayload, PresentationDecision,
};
use serde::{Deserialize, Serialize};

use crate::HostState;

/// Registration token callback body. `null` is allowed and ignored.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// Device token callback body.
#[derive(Debug, Deserialize)]
pub struct DeviceTokenRequest {
    pub token_hex: String,
}

/// Inbound payload callback body.
#[derive(Debug, Deserialize)]
pub struct PayloadRequest {
    pub state: LifecycleState,
    pub payload: serde_json::Value,
}

/// Tap callback body.
#[derive(Debug, Deserialize)]
pub struct TapRequest {
    pub payload: serde_json::Value,
}

/// Presentation decision response.
#[derive(Debug, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub decision: PresentationDecision,
}

/// Current token response.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Handle a registration token callback.
pub async fn token_handler(
    State(state): State<HostState>,
    Json(req): Json<TokenRequest>,
) -> impl IntoResponse {
    match state.events.token_refreshed(req.token).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::error!(error = %e, "failed to queue token refresh");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Handle a device token callback.
pub async fn device_token_handler(
    State(state): State<HostState>,
    Json(req): Json<DeviceTokenRequest>,
) -> impl IntoResponse {
    let token = match DeviceToken::from_hex(&req.token_hex) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting device token");
            return StatusCode::BAD_REQUEST;
        }
    };

    match state.events.device_token(token).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::error!(error = %e, "failed to queue device token");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Handle an inbound payload and answer with the presentation decision.
pub async fn payload_handler(State(state): State<HostState>, body: Bytes) -> impl IntoResponse {
    let suppress = Json(DecisionResponse {
        decision: PresentationDecision::Suppress,
    });

    let (payload, lifecycle) = match decode_payload_request(&body) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!(error = %e, "suppressing undecodable payload");
            return (StatusCode::OK, suppress);
        }
    };

    match state.events.payload_received(payload, lifecycle).await {
        Ok(decision) => (StatusCode::OK, Json(DecisionResponse { decision })),
        Err(e) => {
            tracing::error!(error = %e, "bridge unavailable, suppressing payload");
            (StatusCode::SERVICE_UNAVAILABLE, suppress)
        }
    }
}

fn decode_payload_request(
    body: &[u8],
) -> Result<(NotificationPayload, LifecycleState), BridgeError> {
    let req: PayloadRequest = serde_json::from_slice(body).map_err(BridgeError::malformed)?;
    let payload = NotificationPayload::from_json_value(req.payload)?;
    Ok((payload, req.state))
}

/// Handle a notification tap.
pub async fn tap_handler(State(state): State<HostState>, body: Bytes) -> impl IntoResponse {
    let payload = match serde_json::from_slice::<TapRequest>(&body)
        .map_err(BridgeError::malformed)
        .and_then(|req| NotificationPayload::from_json_value(req.payload))
    {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable tap");
            return StatusCode::UNPROCESSABLE_ENTITY;
        }
    };

    match state.events.payload_tapped(payload).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::error!(error = %e, "failed to hand off tap");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Return the current registration token.
pub async fn current_token_handler(State(state): State<HostState>) -> impl IntoResponse {
    match state.tokens.current() {
        Ok(token) => (
            StatusCode::OK,
            Json(TokenResponse {
                token: token.as_str().to_string(),
            }),
        )
            .into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use bridge_core::MessageId;
    use bridge_service::{
        BridgeOptions, ChannelAppRouter, NotificationBridge, PushBackend, StaticPermission,
        TokenManager, host_events,
    };
    use tokio::sync::mpsc;
    use tower::ServiceExt as _;

    use super::*;

    struct NullBackend;

    impl PushBackend for NullBackend {
        async fn register_device(&self, _token: &DeviceToken) -> color_eyre::eyre::Result<()> {
            Ok(())
        }

        async fn acknowledge(
            &self,
            _id: &MessageId,
            _payload: &NotificationPayload,
        ) -> color_eyre::eyre::Result<()> {
            Ok(())
        }
    }

    /// Forwards registered device tokens to the test.
    struct DeviceChannelBackend(mpsc::UnboundedSender<DeviceToken>);

    impl PushBackend for DeviceChannelBackend {
        async fn register_device(&self, token: &DeviceToken) -> color_eyre::eyre::Result<()> {
            self.0.send(token.clone())?;
            Ok(())
        }

        async fn acknowledge(
            &self,
            _id: &MessageId,
            _payload: &NotificationPayload,
        ) -> color_eyre::eyre::Result<()> {
            Ok(())
        }
    }

    fn app() -> (axum::Router, mpsc::UnboundedReceiver<NotificationPayload>) {
        app_with(NullBackend)
    }

    fn app_with<B: PushBackend + 'static>(
        backend: B,
    ) -> (axum::Router, mpsc::UnboundedReceiver<NotificationPayload>) {
        let (router, routed) = ChannelAppRouter::new();
        let bridge = Arc::new(NotificationBridge::new(
            backend,
            StaticPermission::new(true),
            router,
            BridgeOptions::default(),
        ));

        let (events, rx) = host_events(8);
        let state = crate::HostState {
            events,
            tokens: bridge.tokens().clone(),
        };
        tokio::spawn(async move { bridge.run(rx).await });

        (crate::host_router(state), routed)
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_foreground_payload_shows_banner() {
        let (app, _routed) = app();

        let response = app
            .oneshot(post(
                "/host/payload",
                r#"{"state":"foreground","payload":{"title":"Hello"}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"decision": "show_banner_and_sound"})
        );
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_suppressed() {
        let (app, _routed) = app();

        let response = app
            .oneshot(post("/host/payload", r#"{"state":"foreground","payload":[1]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"decision": "suppress"})
        );
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let (app, _routed) = app();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/token").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(post("/host/token", r#"{"token":"T1"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // The tap round-trip below completes only after the token event ahead
        // of it in the queue has been handled.
        let response = app
            .clone()
            .oneshot(post("/host/tap", r#"{"payload":{"route":"/inbox"}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(Request::builder().uri("/token").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"token": "T1"}));
    }

    #[tokio::test]
    async fn test_tap_is_forwarded() {
        let (app, mut routed) = app();

        let response = app
            .oneshot(post(
                "/host/tap",
                r#"{"payload":{"gcm.message_id":"m1","route":"/inbox"}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let payload = routed.recv().await.unwrap();
        assert_eq!(payload.get_str("route"), Some("/inbox"));
    }

    #[tokio::test]
    async fn test_bad_device_token_rejected() {
        let (app, _routed) = app();

        let response = app
            .oneshot(post("/host/device-token", r#"{"token_hex":"xyz"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_device_token_reaches_backend() {
        let (devices_tx, mut devices) = mpsc::unbounded_channel();
        let (app, _routed) = app_with(DeviceChannelBackend(devices_tx));

        let response = app
            .oneshot(post("/host/device-token", r#"{"token_hex":"0aff"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let token = tokio::time::timeout(std::time::Duration::from_secs(5), devices.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.as_bytes(), &[0x0a, 0xff]);
    }

    #[tokio::test]
    async fn test_stopped_bridge_is_unavailable() {
        let (events, rx) = host_events(8);
        drop(rx);
        let app = crate::host_router(crate::HostState {
            events,
            tokens: TokenManager::new(),
        });

        let response = app
            .clone()
            .oneshot(post(
                "/host/payload",
                r#"{"state":"foreground","payload":{"title":"Hello"}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"decision": "suppress"})
        );

        let response = app
            .oneshot(post("/host/tap", r#"{"payload":{"route":"/inbox"}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
