use futures::FutureExt;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::sync::futures::Notified;

/// Wakes whatever the REPL is currently waiting on: the input read, a running
/// command, or the in-flight agent stream.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    notify: Arc<Notify>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// An interrupt with no waiter is kept until the next wait picks it up,
    /// or until [`InterruptHandle::clear`] drops it.
    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    pub fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }

    /// Drop a pending interrupt nobody waited for.
    pub fn clear(&self) {
        let _ = self.notify.notified().now_or_never();
    }
}
