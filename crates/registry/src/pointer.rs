//! Deployment-change broadcast.
//!
//! The pointer itself persists in the document store (see
//! [`AssetRegistry::advance_pointer`](crate::AssetRegistry::advance_pointer));
//! this is the in-process fan-out that long-lived subscriptions hang
//! off. Readers compare the observed id against the value captured at
//! their own session start — a mismatch means a newer generation
//! exists. Surfacing that as a prompt (never an automatic reload) is
//! the client's job.

use tokio::sync::watch;

use statichost_protocol::types::DeploymentInfo;

/// Single-writer broadcast of the current deployment pointer.
pub struct DeploymentTracker {
    tx: watch::Sender<Option<DeploymentInfo>>,
}

impl DeploymentTracker {
    /// Creates a tracker seeded with the pointer read at startup
    /// (`None` before the first successful deploy).
    pub fn new(initial: Option<DeploymentInfo>) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// The most recently published pointer value.
    pub fn current(&self) -> Option<DeploymentInfo> {
        self.tx.borrow().clone()
    }

    /// Subscribes to pointer changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<DeploymentInfo>> {
        self.tx.subscribe()
    }

    /// Publishes an advanced pointer to all subscribers.
    pub fn publish(&self, info: DeploymentInfo) {
        // send_replace stores the value even with zero subscribers, so
        // late subscribers still observe the latest pointer.
        self.tx.send_replace(Some(info));
    }
}

impl Default for DeploymentTracker {
    fn default() -> Self {
        Self::new(None)
    }
}
