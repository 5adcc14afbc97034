//! In-memory collaborators for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bridge_core::{DeviceToken, MessageId, NotificationPayload, PermissionOptions};

use crate::{AppRouter, PermissionRequester, PushBackend};

/// Backend that records calls and optionally fails them.
#[derive(Default)]
pub struct RecordingBackend {
    fail: bool,
    attempts: AtomicUsize,
    acks: Mutex<Vec<MessageId>>,
    devices: Mutex<Vec<DeviceToken>>,
}

impl RecordingBackend {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Acknowledgments that succeeded.
    pub fn acks(&self) -> Vec<MessageId> {
        self.acks.lock().unwrap().clone()
    }

    /// Acknowledgment calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn devices(&self) -> Vec<DeviceToken> {
        self.devices.lock().unwrap().clone()
    }
}

impl PushBackend for RecordingBackend {
    async fn register_device(&self, token: &DeviceToken) -> color_eyre::eyre::Result<()> {
        if self.fail {
            color_eyre::eyre::bail!("backend unavailable");
        }
        self.devices.lock().unwrap().push(token.clone());
        Ok(())
    }

    async fn acknowledge(
        &self,
        id: &MessageId,
        _payload: &NotificationPayload,
    ) -> color_eyre::eyre::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            color_eyre::eyre::bail!("backend unavailable");
        }
        self.acks.lock().unwrap().push(id.clone());
        Ok(())
    }
}

/// App router that collects forwarded payloads.
#[derive(Clone, Default)]
pub struct RecordingApp {
    routed: Arc<Mutex<Vec<NotificationPayload>>>,
}

impl RecordingApp {
    pub fn routed(&self) -> Vec<NotificationPayload> {
        self.routed.lock().unwrap().clone()
    }
}

impl AppRouter for RecordingApp {
    fn route(&self, payload: NotificationPayload) {
        self.routed.lock().unwrap().push(payload);
    }
}

/// Permission surface that counts requests.
#[derive(Default)]
pub struct RecordingPermission {
    pub deny: bool,
    pub requests: AtomicUsize,
    pub registrations: AtomicUsize,
}

impl PermissionRequester for RecordingPermission {
    async fn request_authorization(
        &self,
        _options: PermissionOptions,
    ) -> color_eyre::eyre::Result<bool> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(!self.deny)
    }

    async fn register_for_remote_notifications(&self) -> color_eyre::eyre::Result<()> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
