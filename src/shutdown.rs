//! Graceful shutdown coordination
//!
//! One [`ShutdownCoordinator`] is shared by the signal handler, the chapter
//! loop, and anything else that wants to stop early. Requesting shutdown is
//! idempotent and sticky: once set it stays set, in-flight work runs to
//! completion, and the collector drains its buffer before returning.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::info;

/// Shared shutdown flag with async notification.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownCoordinator {
    /// Create a coordinator with no shutdown requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a coordinator already wrapped for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Request shutdown and wake all waiters. Idempotent.
    pub fn request_shutdown(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            info!("Shutdown requested");
        }
        self.notify.notify_waiters();
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested. Returns immediately if it already
    /// has been.
    pub async fn wait_for_shutdown(&self) {
        loop {
            if self.is_shutdown_requested() {
                return;
            }
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before re-checking so a request landing between the
            // check and the await cannot be missed.
            notified.as_mut().enable();
            if self.is_shutdown_requested() {
                return;
            }
            notified.await;
        }
    }
}

/// Spawn a task that requests shutdown on the first Ctrl+C.
pub fn spawn_ctrl_c_listener(coordinator: Arc<ShutdownCoordinator>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing in-flight work");
            coordinator.request_shutdown();
        }
    });
}
