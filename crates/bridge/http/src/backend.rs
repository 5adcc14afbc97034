//! Push backend client over HTTP.

use std::time::Duration;

use bridge_core::{DeviceToken, MessageId, NotificationPayload};
use bridge_service::PushBackend;
use color_eyre::eyre::WrapErr as _;

/// Device registration request body.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct DeviceRegistration {
    pub apns_token: String,
}

/// Push backend reached over HTTP.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend client rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> color_eyre::eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .wrap_err("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl PushBackend for HttpBackend {
    async fn register_device(&self, token: &DeviceToken) -> color_eyre::eyre::Result<()> {
        let url = format!("{}/v1/devices", self.base_url);

        self.client
            .post(&url)
            .json(&DeviceRegistration {
                apns_token: token.hex(),
            })
            .send()
            .await
            .wrap_err("device registration request failed")?
            .error_for_status()
            .wrap_err("backend rejected device registration")?;

        Ok(())
    }

    async fn acknowledge(
        &self,
        id: &MessageId,
        payload: &NotificationPayload,
    ) -> color_eyre::eyre::Result<()> {
        // Message IDs carry ':' and '%', so they must be encoded as a path segment.
        let url = format!(
            "{}/v1/messages/{}/ack",
            self.base_url,
            urlencoding::encode(id.as_str())
        );

        self.client
            .post(&url)
            .json(payload)
            .send()
            .await
            .wrap_err("acknowledgment request failed")?
            .error_for_status()
            .wrap_err("backend rejected acknowledgment")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Json;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::post;

    use super::*;

    #[derive(Clone, Default)]
    struct Seen {
        acks: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
        devices: Arc<Mutex<Vec<String>>>,
    }

    async fn serve(seen: Seen, status: StatusCode) -> String {
        let app = axum::Router::new()
            .route(
                "/v1/messages/{id}/ack",
                post(
                    move |State(seen): State<Seen>,
                          Path(id): Path<String>,
                          Json(body): Json<serde_json::Value>| async move {
                        seen.acks.lock().unwrap().push((id, body));
                        status
                    },
                ),
            )
            .route(
                "/v1/devices",
                post(
                    move |State(seen): State<Seen>, Json(body): Json<DeviceRegistration>| async move {
                        seen.devices.lock().unwrap().push(body.apns_token);
                        status
                    },
                ),
            )
            .with_state(seen);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_acknowledge_encodes_message_id() {
        let seen = Seen::default();
        let base = serve(seen.clone(), StatusCode::NO_CONTENT).await;
        let backend = HttpBackend::new(&base, Duration::from_secs(5)).unwrap();

        let payload: NotificationPayload = [("title", "Hello")].into_iter().collect();
        backend
            .acknowledge(&MessageId::new("0:1700%abc"), &payload)
            .await
            .unwrap();

        let acks = seen.acks.lock().unwrap().clone();
        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0].0, "0:1700%abc");
        assert_eq!(acks[0].1, serde_json::json!({"title": "Hello"}));
    }

    #[tokio::test]
    async fn test_register_device_sends_hex() {
        let seen = Seen::default();
        let base = serve(seen.clone(), StatusCode::OK).await;
        let backend = HttpBackend::new(&base, Duration::from_secs(5)).unwrap();

        backend
            .register_device(&DeviceToken::new(vec![0x0a, 0xff]))
            .await
            .unwrap();

        assert_eq!(seen.devices.lock().unwrap().clone(), vec!["0aff".to_string()]);
    }

    #[tokio::test]
    async fn test_backend_error_status_is_reported() {
        let seen = Seen::default();
        let base = serve(seen, StatusCode::SERVICE_UNAVAILABLE).await;
        let backend = HttpBackend::new(&base, Duration::from_secs(5)).unwrap();

        let payload = NotificationPayload::default();
        let result = backend.acknowledge(&MessageId::new("m1"), &payload).await;
        assert!(result.is_err());
    }
}
