//! Speculative prefetch controller for a single navigation link.
//!
//! Two independent signals may ask for the link's destination to be warmed:
//! the pointer entering the element (delivered directly) and the element
//! approaching the viewport (delivered later, in batches, by a
//! [`ViewportWatcher`]). Whichever arrives first issues the warm-up; every
//! later signal for the same destination is a no-op.
//!
//! # State Machine
//!
//! ```text
//! Idle --[hover | visible, enabled, string href]--> Warmed (warm issued)
//! Warmed --[hover | visible]--> Warmed (no-op)
//! Idle | Warmed --[href change]--> Idle
//! ```
//!
//! # Concurrency
//!
//! The dedup flag, the href and the enabled switch live behind one mutex.
//! Every trigger performs its check-and-set inside a single critical
//! section and calls the warmer only after releasing it, so neither
//! signal's ordering nor latency matters and a warmer that re-enters the
//! controller cannot deadlock. An href change resets the flag inside the
//! same critical section, so no trigger can observe a stale flag.
//!
//! # Subscription lifecycle
//!
//! At most one visibility subscription exists at a time. It is opened when
//! the controller is mounted and enabled, and released on unmount, element
//! replacement, href change (then reopened), disabling, and drop. Each
//! subscription carries a generation number; notifications from a
//! generation that has been torn down are ignored.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::config::{PrefetchConfig, RootMargin};
use super::state::{PrefetchState, Trigger, TriggerOutcome};
use super::stats::PrefetchStats;
use super::subscription::VisibilitySubscription;
use super::viewport::{IntersectionCallback, IntersectionEntry, SubscriptionId, ViewportWatcher};
use super::warmer::Warmer;
use crate::destination::Href;
use crate::element::ElementHandle;

#[derive(Debug)]
struct LinkState {
    href: Href,
    prefetched: bool,
    enabled: bool,
    /// Generation of the live subscription, if any.
    armed: Option<u64>,
    next_generation: u64,
}

/// State shared with the observer callback.
struct Core {
    state: Mutex<LinkState>,
    warmer: Arc<dyn Warmer>,
    stats: Arc<PrefetchStats>,
}

impl Core {
    /// Check-and-set the dedup flag, then warm outside the lock.
    ///
    /// `generation` is `Some` for visibility notifications and must match
    /// the armed subscription.
    fn trigger(&self, trigger: Trigger, generation: Option<u64>) -> TriggerOutcome {
        let destination = {
            let mut state = self.state.lock();

            if generation.is_some() && state.armed != generation {
                tracing::trace!(trigger = %trigger, "Ignoring notification from released subscription");
                return TriggerOutcome::Stale;
            }
            if !state.enabled {
                self.stats.record_disabled_skip();
                tracing::trace!(trigger = %trigger, href = %state.href, "Prefetch disabled");
                return TriggerOutcome::Disabled;
            }
            if state.prefetched {
                self.stats.record_deduplicated(trigger);
                tracing::trace!(trigger = %trigger, href = %state.href, "Already warmed");
                return TriggerOutcome::AlreadyWarmed;
            }
            let Some(destination) = state.href.prefetch_target().cloned() else {
                tracing::trace!(trigger = %trigger, href = %state.href, "Href is not prefetchable");
                return TriggerOutcome::NotPrefetchable;
            };

            state.prefetched = true;
            destination
        };

        self.stats.record_warm();
        tracing::debug!(trigger = %trigger, destination = %destination, "Warming destination");

        if let Err(e) = self.warmer.warm(&destination) {
            // Still counts as attempted; the destination stays warmed.
            self.stats.record_warm_failure();
            tracing::warn!(
                trigger = %trigger,
                destination = %destination,
                error = %e,
                "Warm-up failed"
            );
        }

        TriggerOutcome::Warmed
    }
}

/// Decides when to warm a link's destination.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use linkwarm::prefetch::{
///     ManualViewportWatcher, PrefetchConfig, PrefetchController, PrefetchState,
///     RecordingWarmer, TriggerOutcome,
/// };
/// use linkwarm::ElementHandle;
///
/// let warmer = Arc::new(RecordingWarmer::new());
/// let watcher = Arc::new(ManualViewportWatcher::new());
/// let mut controller = PrefetchController::new(
///     "/docs/a",
///     PrefetchConfig::default(),
///     warmer.clone(),
///     watcher.clone(),
/// );
///
/// let element = ElementHandle::new();
/// controller.mount(element);
///
/// watcher.set_intersecting(element, true);
/// watcher.flush();
/// assert_eq!(controller.state(), PrefetchState::Warmed);
///
/// assert_eq!(controller.on_hover(), TriggerOutcome::AlreadyWarmed);
/// assert_eq!(warmer.call_count(), 1);
/// ```
pub struct PrefetchController {
    core: Arc<Core>,
    watcher: Arc<dyn ViewportWatcher>,
    root_margin: RootMargin,
    element: Option<ElementHandle>,
    subscription: Option<VisibilitySubscription>,
}

impl std::fmt::Debug for PrefetchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefetchController")
            .field("state", &*self.core.state.lock())
            .field("root_margin", &self.root_margin)
            .field("element", &self.element)
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

impl PrefetchController {
    /// Create an unmounted controller in the idle state.
    pub fn new(
        href: impl Into<Href>,
        config: PrefetchConfig,
        warmer: Arc<dyn Warmer>,
        watcher: Arc<dyn ViewportWatcher>,
    ) -> Self {
        Self {
            core: Arc::new(Core {
                state: Mutex::new(LinkState {
                    href: href.into(),
                    prefetched: false,
                    enabled: config.enabled,
                    armed: None,
                    next_generation: 0,
                }),
                warmer,
                stats: Arc::new(PrefetchStats::new()),
            }),
            watcher,
            root_margin: config.root_margin,
            element: None,
            subscription: None,
        }
    }

    /// Attach to a rendered element and start observing it when enabled.
    ///
    /// Mounting a different element while mounted replaces the old one.
    pub fn mount(&mut self, element: ElementHandle) {
        if self.element == Some(element) {
            return;
        }
        if self.element.is_some() {
            self.replace_element(element);
            return;
        }

        tracing::debug!(element = %element, "Link mounted");
        self.element = Some(element);
        self.arm();
    }

    /// Swap the rendered element, moving observation to the new one.
    pub fn replace_element(&mut self, element: ElementHandle) {
        if self.element == Some(element) {
            return;
        }

        tracing::debug!(previous = ?self.element, element = %element, "Link element replaced");
        self.teardown();
        self.element = Some(element);
        self.arm();
    }

    /// Detach from the element and release any subscription. Idempotent.
    pub fn unmount(&mut self) {
        self.teardown();
        if let Some(element) = self.element.take() {
            tracing::debug!(element = %element, "Link unmounted");
        }
    }

    /// Point the link somewhere else.
    ///
    /// A different target resets the controller to [`PrefetchState::Idle`]
    /// before any trigger can see it, and reopens observation so the new
    /// destination receives a fresh visibility notification.
    pub fn set_href(&mut self, href: impl Into<Href>) {
        let href = href.into();
        {
            let mut state = self.core.state.lock();
            if state.href.same_target(&href) {
                state.href = href;
                return;
            }

            tracing::debug!(from = %state.href, to = %href, "Href changed, resetting prefetch state");
            state.href = href;
            state.prefetched = false;
        }

        if self.subscription.is_some() {
            self.teardown();
            self.arm();
        }
    }

    /// Enable or disable both triggers.
    ///
    /// Disabling releases the subscription. Re-enabling reopens it but keeps
    /// the dedup flag: an already warmed destination stays warmed.
    pub fn set_enabled(&mut self, enabled: bool) {
        {
            let mut state = self.core.state.lock();
            if state.enabled == enabled {
                return;
            }
            state.enabled = enabled;
        }

        tracing::debug!(enabled, "Prefetch toggled");
        if enabled {
            self.arm();
        } else {
            self.teardown();
        }
    }

    /// Pointer entered the element.
    ///
    /// Without a mounted element there is nothing to hover, so nothing is
    /// warmed.
    pub fn on_hover(&self) -> TriggerOutcome {
        if self.element.is_none() {
            tracing::trace!(trigger = %Trigger::Hover, "Ignoring hover on unmounted link");
            return TriggerOutcome::Unmounted;
        }
        self.core.trigger(Trigger::Hover, None)
    }

    /// Current state for the current destination.
    pub fn state(&self) -> PrefetchState {
        PrefetchState::from_flag(self.core.state.lock().prefetched)
    }

    /// Current href.
    pub fn href(&self) -> Href {
        self.core.state.lock().href.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.core.state.lock().enabled
    }

    /// Whether a visibility subscription is live.
    pub fn is_observing(&self) -> bool {
        self.subscription.is_some()
    }

    /// Watcher id of the live subscription.
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.subscription.as_ref().map(VisibilitySubscription::id)
    }

    /// The mounted element, if any.
    pub fn element(&self) -> Option<ElementHandle> {
        self.element
    }

    pub fn root_margin(&self) -> RootMargin {
        self.root_margin
    }

    /// Counters for this controller.
    pub fn stats(&self) -> Arc<PrefetchStats> {
        Arc::clone(&self.core.stats)
    }

    /// Open a subscription if mounted, enabled and not already observing.
    fn arm(&mut self) {
        let Some(element) = self.element else {
            return;
        };
        if self.subscription.is_some() {
            return;
        }

        let generation = {
            let mut state = self.core.state.lock();
            if !state.enabled {
                return;
            }
            state.next_generation += 1;
            state.armed = Some(state.next_generation);
            state.next_generation
        };

        let callback = visibility_callback(Arc::downgrade(&self.core), element, generation);
        let id = self.watcher.observe(element, self.root_margin, callback);

        self.subscription = Some(VisibilitySubscription::new(Arc::clone(&self.watcher), id));
        self.core.stats.record_subscription_opened();
        tracing::debug!(element = %element, subscription = %id, generation, "Observing link visibility");
    }

    /// Release the subscription, if any. Safe to call on every exit path.
    fn teardown(&mut self) {
        self.core.state.lock().armed = None;

        if let Some(mut subscription) = self.subscription.take() {
            subscription.release();
            self.core.stats.record_subscription_released();
            tracing::debug!(subscription = %subscription.id(), "Stopped observing link visibility");
        }
    }
}

impl Drop for PrefetchController {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn visibility_callback(
    core: Weak<Core>,
    element: ElementHandle,
    generation: u64,
) -> IntersectionCallback {
    Arc::new(move |entries: &[IntersectionEntry]| {
        let Some(core) = core.upgrade() else {
            return;
        };
        for entry in entries {
            if entry.is_intersecting && entry.element == element {
                core.trigger(Trigger::Visibility, Some(generation));
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::{Destination, UrlObject};
    use crate::prefetch::viewport::ManualViewportWatcher;
    use crate::prefetch::warmer::RecordingWarmer;

    struct Fixture {
        warmer: Arc<RecordingWarmer>,
        watcher: Arc<ManualViewportWatcher>,
        controller: PrefetchController,
        element: ElementHandle,
    }

    fn fixture(href: &str, config: PrefetchConfig) -> Fixture {
        let warmer = Arc::new(RecordingWarmer::new());
        let watcher = Arc::new(ManualViewportWatcher::new());
        let mut controller = PrefetchController::new(
            href,
            config,
            Arc::clone(&warmer) as Arc<dyn Warmer>,
            Arc::clone(&watcher) as Arc<dyn ViewportWatcher>,
        );
        let element = ElementHandle::new();
        controller.mount(element);
        Fixture {
            warmer,
            watcher,
            controller,
            element,
        }
    }

    fn enter_viewport(f: &Fixture) {
        f.watcher.set_intersecting(f.element, true);
        f.watcher.flush();
    }

    /// Watcher that hands callbacks back to the test so they can be invoked
    /// after the subscription was released.
    #[derive(Default)]
    struct CapturingWatcher {
        callbacks: Mutex<Vec<IntersectionCallback>>,
        unobserved: Mutex<Vec<SubscriptionId>>,
    }

    impl ViewportWatcher for CapturingWatcher {
        fn observe(
            &self,
            _element: ElementHandle,
            _root_margin: RootMargin,
            callback: IntersectionCallback,
        ) -> SubscriptionId {
            let mut callbacks = self.callbacks.lock();
            callbacks.push(callback);
            SubscriptionId::new(callbacks.len() as u64)
        }

        fn unobserve(&self, id: SubscriptionId) {
            self.unobserved.lock().push(id);
        }
    }

    fn visible(element: ElementHandle) -> Vec<IntersectionEntry> {
        vec![IntersectionEntry {
            element,
            is_intersecting: true,
        }]
    }

    #[test]
    fn test_initial_state_is_idle() {
        let f = fixture("/docs/a", PrefetchConfig::default());
        assert_eq!(f.controller.state(), PrefetchState::Idle);
        assert!(f.controller.is_observing());
        assert_eq!(f.controller.element(), Some(f.element));
        assert_eq!(f.watcher.active_count(), 1);
    }

    #[test]
    fn test_hover_warms_once() {
        let f = fixture("/docs/a", PrefetchConfig::default());

        assert_eq!(f.controller.on_hover(), TriggerOutcome::Warmed);
        assert_eq!(f.controller.on_hover(), TriggerOutcome::AlreadyWarmed);
        assert_eq!(f.controller.on_hover(), TriggerOutcome::AlreadyWarmed);

        assert_eq!(f.warmer.calls(), vec![Destination::from("/docs/a")]);
        assert_eq!(f.controller.state(), PrefetchState::Warmed);
        assert_eq!(f.controller.stats().snapshot().hover_deduplicated, 2);
    }

    #[test]
    fn test_visibility_warms_once() {
        let f = fixture("/docs/a", PrefetchConfig::default());

        enter_viewport(&f);
        f.watcher.set_intersecting(f.element, false);
        enter_viewport(&f);

        assert_eq!(f.warmer.call_count(), 1);
        assert_eq!(f.controller.stats().snapshot().visibility_deduplicated, 1);
    }

    #[test]
    fn test_not_intersecting_does_not_warm() {
        let f = fixture("/docs/a", PrefetchConfig::default());
        f.watcher.flush(); // initial, off-screen entry
        assert_eq!(f.warmer.call_count(), 0);
        assert_eq!(f.controller.state(), PrefetchState::Idle);
    }

    #[test]
    fn test_visibility_then_hover() {
        let f = fixture("/docs/a", PrefetchConfig::default());
        enter_viewport(&f);
        assert_eq!(f.controller.on_hover(), TriggerOutcome::AlreadyWarmed);
        assert_eq!(f.warmer.call_count(), 1);
    }

    #[test]
    fn test_hover_before_batched_visibility() {
        let f = fixture("/docs/a", PrefetchConfig::default());

        // Both signals ready in the same tick; the batch lands after hover.
        f.watcher.set_intersecting(f.element, true);
        assert_eq!(f.controller.on_hover(), TriggerOutcome::Warmed);
        f.watcher.flush();

        assert_eq!(f.warmer.call_count(), 1);
    }

    #[test]
    fn test_href_change_resets_flag() {
        let mut f = fixture("/docs/a", PrefetchConfig::default());
        f.controller.on_hover();

        f.controller.set_href("/docs/b");
        assert_eq!(f.controller.state(), PrefetchState::Idle);

        assert_eq!(f.controller.on_hover(), TriggerOutcome::Warmed);
        assert_eq!(
            f.warmer.calls(),
            vec![Destination::from("/docs/a"), Destination::from("/docs/b")]
        );
    }

    #[test]
    fn test_same_href_keeps_flag() {
        let mut f = fixture("/docs/a", PrefetchConfig::default());
        f.controller.on_hover();
        let subscription = f.controller.subscription_id();

        f.controller.set_href("/docs/a");

        assert_eq!(f.controller.state(), PrefetchState::Warmed);
        assert_eq!(f.controller.subscription_id(), subscription);
    }

    #[test]
    fn test_href_change_reopens_subscription() {
        let mut f = fixture("/docs/a", PrefetchConfig::default());
        enter_viewport(&f);
        let first = f.controller.subscription_id();

        f.controller.set_href("/docs/b");
        assert_ne!(f.controller.subscription_id(), first);
        assert_eq!(f.watcher.active_count(), 1);
        assert_eq!(f.watcher.unobserve_count(), 1);

        // Still on screen: the new subscription's initial entry warms /docs/b.
        f.watcher.flush();
        assert_eq!(f.warmer.count_for("/docs/b"), 1);
    }

    #[test]
    fn test_disabled_never_warms_or_subscribes() {
        let f = fixture("/docs/a", PrefetchConfig::default().with_enabled(false));

        assert!(!f.controller.is_observing());
        assert_eq!(f.watcher.observe_count(), 0);

        assert_eq!(f.controller.on_hover(), TriggerOutcome::Disabled);
        enter_viewport(&f);
        assert_eq!(f.warmer.call_count(), 0);
    }

    #[test]
    fn test_disable_tears_down_and_reenable_rearms() {
        let mut f = fixture("/docs/a", PrefetchConfig::default());
        f.watcher.flush();

        f.controller.set_enabled(false);
        assert!(!f.controller.is_observing());
        assert_eq!(f.watcher.active_count(), 0);

        enter_viewport(&f);
        assert_eq!(f.warmer.call_count(), 0);

        f.controller.set_enabled(true);
        assert!(f.controller.is_observing());
        f.watcher.flush();
        assert_eq!(f.warmer.call_count(), 1);
    }

    #[test]
    fn test_reenable_does_not_reset_flag() {
        let mut f = fixture("/docs/a", PrefetchConfig::default());
        f.controller.on_hover();

        f.controller.set_enabled(false);
        f.controller.set_enabled(true);

        assert_eq!(f.controller.state(), PrefetchState::Warmed);
        assert_eq!(f.controller.on_hover(), TriggerOutcome::AlreadyWarmed);
        assert_eq!(f.warmer.call_count(), 1);
    }

    #[test]
    fn test_unmount_releases_exactly_once() {
        let mut f = fixture("/docs/a", PrefetchConfig::default());

        f.controller.unmount();
        f.controller.unmount();
        drop(f.controller);

        assert_eq!(f.watcher.unobserve_count(), 1);
        assert_eq!(f.watcher.double_release_count(), 0);
        assert_eq!(f.watcher.active_count(), 0);
    }

    #[test]
    fn test_unmount_with_pending_batch() {
        let mut f = fixture("/docs/a", PrefetchConfig::default());
        f.watcher.set_intersecting(f.element, true);

        f.controller.unmount();
        f.watcher.flush();

        assert_eq!(f.warmer.call_count(), 0);
        assert_eq!(f.watcher.active_count(), 0);
    }

    #[test]
    fn test_drop_releases_subscription() {
        let f = fixture("/docs/a", PrefetchConfig::default());
        let watcher = Arc::clone(&f.watcher);
        drop(f);
        assert_eq!(watcher.active_count(), 0);
        assert_eq!(watcher.unobserve_count(), 1);
    }

    #[test]
    fn test_replace_element_moves_observation() {
        let mut f = fixture("/docs/a", PrefetchConfig::default());
        let replacement = ElementHandle::new();

        f.controller.replace_element(replacement);

        assert_eq!(f.controller.element(), Some(replacement));
        assert!(!f.watcher.is_observed(f.element));
        assert!(f.watcher.is_observed(replacement));
        assert_eq!(f.watcher.active_count(), 1);

        // The old element entering the viewport no longer matters.
        enter_viewport(&f);
        assert_eq!(f.warmer.call_count(), 0);

        f.watcher.set_intersecting(replacement, true);
        f.watcher.flush();
        assert_eq!(f.warmer.call_count(), 1);
    }

    #[test]
    fn test_mount_twice_with_new_element_replaces() {
        let mut f = fixture("/docs/a", PrefetchConfig::default());
        let other = ElementHandle::new();
        f.controller.mount(other);
        assert_eq!(f.controller.element(), Some(other));
        assert_eq!(f.watcher.active_count(), 1);
        assert_eq!(f.watcher.unobserve_count(), 1);
    }

    #[test]
    fn test_structured_href_is_never_warmed() {
        let f = fixture("/", PrefetchConfig::default());
        let mut controller = f.controller;
        controller.set_href(UrlObject::new("/docs").with_query("tab", "api"));

        assert_eq!(controller.on_hover(), TriggerOutcome::NotPrefetchable);
        f.watcher.set_intersecting(f.element, true);
        f.watcher.flush();

        assert_eq!(f.warmer.call_count(), 0);
        assert_eq!(controller.state(), PrefetchState::Idle);
    }

    #[test]
    fn test_switching_href_kind_resets_flag() {
        let mut f = fixture("/docs", PrefetchConfig::default());
        assert_eq!(f.controller.on_hover(), TriggerOutcome::Warmed);

        f.controller.set_href(UrlObject::new("/docs"));
        assert_eq!(f.controller.state(), PrefetchState::Idle);
        assert_eq!(f.controller.on_hover(), TriggerOutcome::NotPrefetchable);

        f.controller.set_href("/docs");
        assert_eq!(f.controller.state(), PrefetchState::Idle);
        assert_eq!(f.controller.on_hover(), TriggerOutcome::Warmed);
        assert_eq!(f.warmer.count_for("/docs"), 2);
    }

    #[test]
    fn test_hover_before_mount_does_nothing() {
        let warmer = Arc::new(RecordingWarmer::new());
        let watcher = Arc::new(ManualViewportWatcher::new());
        let mut controller = PrefetchController::new(
            "/docs/a",
            PrefetchConfig::default(),
            Arc::clone(&warmer) as Arc<dyn Warmer>,
            Arc::clone(&watcher) as Arc<dyn ViewportWatcher>,
        );

        assert_eq!(controller.on_hover(), TriggerOutcome::Unmounted);
        assert_eq!(controller.state(), PrefetchState::Idle);
        assert_eq!(warmer.call_count(), 0);

        let element = ElementHandle::new();
        controller.mount(element);
        controller.unmount();
        assert_eq!(controller.on_hover(), TriggerOutcome::Unmounted);

        controller.mount(element);
        assert_eq!(controller.on_hover(), TriggerOutcome::Warmed);
        assert_eq!(warmer.call_count(), 1);
    }

    #[test]
    fn test_warm_failure_stays_warmed() {
        let warmer = Arc::new(RecordingWarmer::failing());
        let watcher = Arc::new(ManualViewportWatcher::new());
        let mut controller = PrefetchController::new(
            "/docs/a",
            PrefetchConfig::default(),
            Arc::clone(&warmer) as Arc<dyn Warmer>,
            watcher as Arc<dyn ViewportWatcher>,
        );
        controller.mount(ElementHandle::new());

        assert_eq!(controller.on_hover(), TriggerOutcome::Warmed);
        assert_eq!(controller.state(), PrefetchState::Warmed);
        assert_eq!(controller.on_hover(), TriggerOutcome::AlreadyWarmed);

        assert_eq!(warmer.call_count(), 1);
        let stats = controller.stats().snapshot();
        assert_eq!(stats.warms_issued, 1);
        assert_eq!(stats.warm_failures, 1);
    }

    #[test]
    fn test_stale_notification_is_ignored() {
        let warmer = Arc::new(RecordingWarmer::new());
        let watcher = Arc::new(CapturingWatcher::default());
        let mut controller = PrefetchController::new(
            "/docs/a",
            PrefetchConfig::default(),
            Arc::clone(&warmer) as Arc<dyn Warmer>,
            Arc::clone(&watcher) as Arc<dyn ViewportWatcher>,
        );
        let element = ElementHandle::new();
        controller.mount(element);
        controller.set_enabled(false);

        // A batch already in flight when the subscription was released.
        let callback = Arc::clone(&watcher.callbacks.lock()[0]);
        callback(&visible(element));

        assert_eq!(warmer.call_count(), 0);
        assert_eq!(watcher.unobserved.lock().len(), 1);

        // Re-enabled: the old generation stays dead, the new one is live.
        controller.set_enabled(true);
        callback(&visible(element));
        assert_eq!(warmer.call_count(), 0);

        let live = Arc::clone(&watcher.callbacks.lock()[1]);
        live(&visible(element));
        assert_eq!(warmer.call_count(), 1);
    }

    #[test]
    fn test_root_margin_is_passed_to_watcher() {
        let f = fixture(
            "/docs/a",
            PrefetchConfig::default().with_root_margin(RootMargin::uniform(120)),
        );
        let id = f.controller.subscription_id().unwrap();
        assert_eq!(f.watcher.root_margin(id), Some(RootMargin::uniform(120)));
        assert_eq!(f.controller.root_margin(), RootMargin::uniform(120));
    }

    #[test]
    fn test_warmer_may_reenter_controller() {
        struct Reentrant {
            controller: Mutex<Option<Weak<Mutex<PrefetchController>>>>,
            calls: Mutex<u32>,
        }

        impl Warmer for Reentrant {
            fn warm(&self, _destination: &Destination) -> Result<(), crate::prefetch::WarmError> {
                *self.calls.lock() += 1;
                if let Some(controller) = self.controller.lock().as_ref().and_then(Weak::upgrade) {
                    // Reading state from inside warm must not deadlock.
                    let _ = controller.lock().state();
                }
                Ok(())
            }
        }

        let warmer = Arc::new(Reentrant {
            controller: Mutex::new(None),
            calls: Mutex::new(0),
        });
        let watcher = Arc::new(ManualViewportWatcher::new());
        let controller = Arc::new(Mutex::new(PrefetchController::new(
            "/docs/a",
            PrefetchConfig::default(),
            Arc::clone(&warmer) as Arc<dyn Warmer>,
            Arc::clone(&watcher) as Arc<dyn ViewportWatcher>,
        )));
        let element = ElementHandle::new();
        controller.lock().mount(element);
        *warmer.controller.lock() = Some(Arc::downgrade(&controller));

        watcher.set_intersecting(element, true);
        watcher.flush();

        assert_eq!(*warmer.calls.lock(), 1);
        assert_eq!(controller.lock().state(), PrefetchState::Warmed);
    }
}
