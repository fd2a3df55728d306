use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

/// A single outbound service request, exactly as a card hands it off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    /// Target domain, e.g. "cover" or "loxone".
    pub domain: String,

    /// Service name within the domain, e.g. "open_cover".
    pub service: String,

    /// Service payload.
    pub data: serde_json::Value,
}

/// Receiving end of the service bus, drained by the host's delivery task.
pub type ServiceCallReceiver = mpsc::UnboundedReceiver<ServiceCall>;

/// Sending half of the service bus.
///
/// Calls are fire-and-forget: the sender never blocks, never awaits an
/// outcome, and never retries. Delivery (and delivery failure) is owned by
/// the host. The channel is unbounded so a press handler can always return
/// immediately.
#[derive(Debug, Clone)]
pub struct ServiceBus {
    tx: mpsc::UnboundedSender<ServiceCall>,
}

impl ServiceBus {
    /// Create a bus and the receiving end the host drains.
    pub fn channel() -> (Self, ServiceCallReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Hand a call off to the host's delivery task.
    pub fn call(&self, call: ServiceCall) {
        if let Err(e) = self.tx.send(call) {
            warn!("Service bus closed, dropping call: {:?}", e.0);
        }
    }
}

/// Host-side delivery of service calls.
///
/// Implementations forward calls to whatever actually executes them: a
/// device gateway, an upstream home-automation instance, or the in-process
/// loopback used by the standalone binary.
#[async_trait]
pub trait ServiceTransport: Send + Sync {
    async fn deliver(&self, call: ServiceCall) -> anyhow::Result<()>;
}

/// Drain the bus into a transport until every sender is dropped.
///
/// Delivery failures are logged and swallowed: from the card's perspective
/// every call already succeeded the moment it was sent.
pub async fn run_delivery(mut rx: ServiceCallReceiver, transport: Box<dyn ServiceTransport>) {
    while let Some(call) = rx.recv().await {
        if let Err(e) = transport.deliver(call).await {
            warn!("Service call delivery failed: {}", e);
        }
    }
}
