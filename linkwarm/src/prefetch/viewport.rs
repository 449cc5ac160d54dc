//! Viewport intersection watching.
//!
//! The [`ViewportWatcher`] trait is the seam between the prefetch controller
//! and whatever host primitive reports element visibility. Notifications
//! arrive in batches, later than the state change that caused them.
//!
//! [`ManualViewportWatcher`] is a complete in-memory implementation: the
//! caller moves elements in and out of view and decides when queued
//! notifications are delivered.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::config::RootMargin;
use crate::element::ElementHandle;

/// Identifies one registration with a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a raw id. Watcher implementations allocate these.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// One visibility notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry {
    /// Element the notification is about.
    pub element: ElementHandle,

    /// Whether the element now intersects the (margin-expanded) viewport.
    pub is_intersecting: bool,
}

/// Receives batches of notifications for one registration.
pub type IntersectionCallback = Arc<dyn Fn(&[IntersectionEntry]) + Send + Sync>;

/// Host primitive reporting when elements enter or leave the viewport.
pub trait ViewportWatcher: Send + Sync {
    /// Start watching `element`.
    ///
    /// `callback` receives batches of entries until the returned id is
    /// passed to [`unobserve`](Self::unobserve).
    fn observe(
        &self,
        element: ElementHandle,
        root_margin: RootMargin,
        callback: IntersectionCallback,
    ) -> SubscriptionId;

    /// Stop watching. Queued notifications for `id` are discarded.
    fn unobserve(&self, id: SubscriptionId);
}

struct Registration {
    element: ElementHandle,
    root_margin: RootMargin,
    callback: IntersectionCallback,
}

#[derive(Default)]
struct WatcherInner {
    next_id: u64,
    registrations: HashMap<SubscriptionId, Registration>,
    positions: HashMap<ElementHandle, bool>,
    pending: Vec<(SubscriptionId, IntersectionEntry)>,
    observe_calls: u64,
    unobserve_calls: u64,
    double_releases: u64,
}

impl WatcherInner {
    fn queue(&mut self, id: SubscriptionId, element: ElementHandle) {
        let is_intersecting = self.positions.get(&element).copied().unwrap_or(false);
        self.pending.push((
            id,
            IntersectionEntry {
                element,
                is_intersecting,
            },
        ));
    }
}

/// In-memory watcher with explicit, batched delivery.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use linkwarm::prefetch::{IntersectionEntry, ManualViewportWatcher, RootMargin, ViewportWatcher};
/// use linkwarm::ElementHandle;
///
/// let watcher = ManualViewportWatcher::new();
/// let element = ElementHandle::new();
/// let seen = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&seen);
/// let id = watcher.observe(
///     element,
///     RootMargin::default(),
///     Arc::new(move |entries: &[IntersectionEntry]| {
///         counter.fetch_add(entries.len(), Ordering::SeqCst);
///     }),
/// );
///
/// watcher.set_intersecting(element, true);
/// watcher.flush();
/// assert_eq!(seen.load(Ordering::SeqCst), 2); // initial entry + enter
///
/// watcher.unobserve(id);
/// assert_eq!(watcher.active_count(), 0);
/// ```
#[derive(Default)]
pub struct ManualViewportWatcher {
    inner: Mutex<WatcherInner>,
}

impl fmt::Debug for ManualViewportWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ManualViewportWatcher")
            .field("active", &inner.registrations.len())
            .field("pending", &inner.pending.len())
            .field("observe_calls", &inner.observe_calls)
            .field("unobserve_calls", &inner.unobserve_calls)
            .finish_non_exhaustive()
    }
}

impl ManualViewportWatcher {
    /// Create a watcher with no registrations and every element off-screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `element` into or out of the viewport.
    ///
    /// Queues an entry for every registration watching the element when the
    /// state actually changes. Nothing is delivered until [`flush`](Self::flush).
    pub fn set_intersecting(&self, element: ElementHandle, is_intersecting: bool) {
        let mut inner = self.inner.lock();
        let previous = inner.positions.insert(element, is_intersecting);
        if previous.unwrap_or(false) == is_intersecting {
            return;
        }

        let mut watching: Vec<SubscriptionId> = inner
            .registrations
            .iter()
            .filter(|(_, registration)| registration.element == element)
            .map(|(id, _)| *id)
            .collect();
        watching.sort();

        for id in watching {
            inner.queue(id, element);
        }
    }

    /// Deliver every queued notification, one batch per registration.
    ///
    /// Callbacks run with no lock held, so they may call back into the
    /// watcher. Returns the number of entries delivered.
    pub fn flush(&self) -> usize {
        let batches = {
            let mut inner = self.inner.lock();
            let pending = std::mem::take(&mut inner.pending);

            let mut order: Vec<SubscriptionId> = Vec::new();
            let mut grouped: HashMap<SubscriptionId, Vec<IntersectionEntry>> = HashMap::new();
            for (id, entry) in pending {
                if !grouped.contains_key(&id) {
                    order.push(id);
                }
                grouped.entry(id).or_default().push(entry);
            }

            order
                .into_iter()
                .filter_map(|id| {
                    let callback = Arc::clone(&inner.registrations.get(&id)?.callback);
                    let entries = grouped.remove(&id)?;
                    Some((id, callback, entries))
                })
                .collect::<Vec<_>>()
        };

        let mut delivered = 0;
        for (id, callback, entries) in batches {
            tracing::trace!(subscription = %id, entries = entries.len(), "Delivering intersection batch");
            delivered += entries.len();
            callback(&entries);
        }
        delivered
    }

    /// Whether `element` is currently inside the viewport.
    pub fn is_intersecting(&self, element: ElementHandle) -> bool {
        self.inner
            .lock()
            .positions
            .get(&element)
            .copied()
            .unwrap_or(false)
    }

    /// Whether any registration watches `element`.
    pub fn is_observed(&self, element: ElementHandle) -> bool {
        self.inner
            .lock()
            .registrations
            .values()
            .any(|registration| registration.element == element)
    }

    /// Root margin of an active registration.
    pub fn root_margin(&self, id: SubscriptionId) -> Option<RootMargin> {
        self.inner
            .lock()
            .registrations
            .get(&id)
            .map(|registration| registration.root_margin)
    }

    /// Number of live registrations.
    pub fn active_count(&self) -> usize {
        self.inner.lock().registrations.len()
    }

    /// Number of queued, undelivered entries.
    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Total `observe` calls.
    pub fn observe_count(&self) -> u64 {
        self.inner.lock().observe_calls
    }

    /// Total `unobserve` calls, including invalid ones.
    pub fn unobserve_count(&self) -> u64 {
        self.inner.lock().unobserve_calls
    }

    /// `unobserve` calls for ids that were not registered.
    pub fn double_release_count(&self) -> u64 {
        self.inner.lock().double_releases
    }
}

impl ViewportWatcher for ManualViewportWatcher {
    fn observe(
        &self,
        element: ElementHandle,
        root_margin: RootMargin,
        callback: IntersectionCallback,
    ) -> SubscriptionId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        inner.observe_calls += 1;
        let id = SubscriptionId::new(inner.next_id);

        inner.registrations.insert(
            id,
            Registration {
                element,
                root_margin,
                callback,
            },
        );
        inner.queue(id, element);

        tracing::trace!(subscription = %id, element = %element, root_margin = %root_margin, "Observing element");
        id
    }

    fn unobserve(&self, id: SubscriptionId) {
        let mut inner = self.inner.lock();
        inner.unobserve_calls += 1;

        if inner.registrations.remove(&id).is_none() {
            inner.double_releases += 1;
            tracing::warn!(subscription = %id, "Unobserve for unknown subscription");
            return;
        }

        inner.pending.retain(|(pending_id, _)| *pending_id != id);
        tracing::trace!(subscription = %id, "Stopped observing");
    }
}
