//! Scoped visibility subscription.
//!
//! Wraps a [`ViewportWatcher`] registration so it is released exactly once,
//! whether through an explicit [`release`](VisibilitySubscription::release)
//! or by being dropped.

use std::fmt;
use std::sync::Arc;

use super::viewport::{SubscriptionId, ViewportWatcher};

/// An active registration with a viewport watcher.
pub struct VisibilitySubscription {
    watcher: Arc<dyn ViewportWatcher>,
    id: SubscriptionId,
    released: bool,
}

impl fmt::Debug for VisibilitySubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilitySubscription")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl VisibilitySubscription {
    /// Take ownership of registration `id` on `watcher`.
    pub fn new(watcher: Arc<dyn ViewportWatcher>, id: SubscriptionId) -> Self {
        Self {
            watcher,
            id,
            released: false,
        }
    }

    /// The watcher's id for this registration.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Unobserve now. Later calls and the eventual drop do nothing.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.watcher.unobserve(self.id);
        tracing::trace!(subscription = %self.id, "Visibility subscription released");
    }

    /// Whether the registration has been released.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for VisibilitySubscription {
    fn drop(&mut self) {
        self.release();
    }
}
