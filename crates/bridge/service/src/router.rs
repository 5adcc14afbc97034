//! Delivery routing: presentation decisions, acknowledgment and tap handoff.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use bridge_core::{
    BridgeError, LifecycleState, MessageId, NotificationPayload, PlatformCapabilities,
    PresentationDecision,
};

use crate::{AppRouter, PushBackend};

/// Default number of acknowledged message IDs remembered.
pub const DEFAULT_ACK_LEDGER_CAPACITY: usize = 1024;

/// Lifecycle of a single delivered payload.
///
/// `Received -> {Presented, Suppressed} -> Acknowledged`. `Acknowledged` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Received,
    Presented,
    Suppressed,
    Acknowledged,
}

impl DeliveryState {
    /// Move to `next` if the transition is allowed.
    pub fn advance(self, next: DeliveryState) -> Option<DeliveryState> {
        use DeliveryState::*;

        match (self, next) {
            (Received, Presented | Suppressed) => Some(next),
            (Presented | Suppressed, Acknowledged) => Some(next),
            _ => None,
        }
    }
}

/// What happened to an acknowledgment request.
#[derive(Debug)]
pub enum AckOutcome {
    /// First acknowledgment for this message; sent on a background task.
    Dispatched(tokio::task::JoinHandle<()>),
    /// This message was already acknowledged.
    AlreadyAcknowledged,
    /// The payload carries no message ID and cannot be acknowledged.
    Unidentified,
}

impl AckOutcome {
    /// True if the message is acknowledged after this call.
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, Self::Dispatched(_) | Self::AlreadyAcknowledged)
    }
}

/// Result of routing one inbound payload.
#[derive(Debug)]
pub struct Delivery {
    /// Local identity of this delivery instance.
    pub id: uuid::Uuid,
    pub received_at: chrono::DateTime<chrono::Utc>,
    pub message_id: Option<MessageId>,
    pub decision: PresentationDecision,
    pub state: DeliveryState,
    pub ack: AckOutcome,
}

/// Bounded set of acknowledged message IDs, oldest evicted first.
struct AckLedger {
    capacity: usize,
    order: VecDeque<MessageId>,
    seen: HashSet<MessageId>,
}

impl AckLedger {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Record an ID. Returns false if it was already present.
    fn insert(&mut self, id: &MessageId) -> bool {
        if !self.seen.insert(id.clone()) {
            return false;
        }

        self.order.push_back(id.clone());
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }

        true
    }
}

/// Decides presentation for inbound payloads and handles taps.
pub struct DeliveryRouter<B, R> {
    backend: Arc<B>,
    app: R,
    capabilities: PlatformCapabilities,
    ledger: Mutex<AckLedger>,
}

impl<B, R> DeliveryRouter<B, R>
where
    B: PushBackend + 'static,
    R: AppRouter,
{
    /// Create a router with the default ledger capacity.
    pub fn new(backend: Arc<B>, app: R, capabilities: PlatformCapabilities) -> Self {
        Self::with_ledger_capacity(backend, app, capabilities, DEFAULT_ACK_LEDGER_CAPACITY)
    }

    pub fn with_ledger_capacity(
        backend: Arc<B>,
        app: R,
        capabilities: PlatformCapabilities,
        capacity: usize,
    ) -> Self {
        Self {
            backend,
            app,
            capabilities,
            ledger: Mutex::new(AckLedger::new(capacity)),
        }
    }

    /// Presentation for a payload arriving in `state`.
    ///
    /// Foreground always presents. Background leaves presentation to the OS.
    pub fn decide(&self, state: LifecycleState) -> PresentationDecision {
        match state {
            LifecycleState::Foreground => self.capabilities.foreground_decision(),
            LifecycleState::Background => PresentationDecision::Suppress,
        }
    }

    /// Route an inbound payload: decide, then acknowledge receipt.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn receive(&self, payload: &NotificationPayload, state: LifecycleState) -> Delivery {
        let id = uuid::Uuid::new_v4();
        let received_at = chrono::Utc::now();
        let message_id = payload.message_id();
        let decision = self.decide(state);

        tracing::info!(
            delivery_id = %id,
            message_id = ?message_id,
            state = ?state,
            decision = ?decision,
            title = ?payload.title(),
            "payload received"
        );

        let presented = if decision.presents() {
            DeliveryState::Presented
        } else {
            DeliveryState::Suppressed
        };
        debug_assert!(DeliveryState::Received.advance(presented).is_some());

        let ack = self.acknowledge(payload);
        let delivery_state = if ack.is_acknowledged() {
            debug_assert!(presented.advance(DeliveryState::Acknowledged).is_some());
            DeliveryState::Acknowledged
        } else {
            presented
        };

        Delivery {
            id,
            received_at,
            message_id,
            decision,
            state: delivery_state,
            ack,
        }
    }

    /// Handle a tap: acknowledge, then hand the payload to the application
    /// router without waiting on it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn tap(&self, payload: NotificationPayload) -> AckOutcome {
        let ack = self.acknowledge(&payload);

        tracing::info!(
            message_id = ?payload.message_id(),
            title = ?payload.title(),
            "payload tapped, forwarding to app router"
        );

        self.app.route(payload);
        ack
    }

    /// Acknowledge a payload to the backend at most once per message ID.
    ///
    /// The backend call runs on a spawned task, is attempted once and only
    /// logged on failure.
    pub fn acknowledge(&self, payload: &NotificationPayload) -> AckOutcome {
        let Some(message_id) = payload.message_id() else {
            let err = BridgeError::malformed("payload has no message id");
            tracing::warn!(error = %err, "skipping acknowledgment");
            return AckOutcome::Unidentified;
        };

        let first = self
            .ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(&message_id);

        if !first {
            tracing::debug!(message_id = %message_id, "already acknowledged");
            return AckOutcome::AlreadyAcknowledged;
        }

        let backend = Arc::clone(&self.backend);
        let payload = payload.clone();
        let handle = tokio::spawn(async move {
            match backend.acknowledge(&message_id, &payload).await {
                Ok(()) => tracing::debug!(message_id = %message_id, "acknowledged"),
                Err(e) => tracing::warn!(
                    message_id = %message_id,
                    error = %e,
                    "acknowledgment failed, not retrying"
                ),
            }
        });

        AckOutcome::Dispatched(handle)
    }
}
