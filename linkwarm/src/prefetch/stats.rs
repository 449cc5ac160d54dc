//! Prefetch counters.
//!
//! Lock-free atomic counters shared between a controller and its observer
//! callback. Relaxed ordering is enough: the counters are diagnostics and
//! never gate a decision.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::state::Trigger;

/// Live counters for one controller.
#[derive(Debug, Default)]
pub struct PrefetchStats {
    warms_issued: AtomicU64,
    warm_failures: AtomicU64,
    hover_deduplicated: AtomicU64,
    visibility_deduplicated: AtomicU64,
    disabled_skips: AtomicU64,
    subscriptions_opened: AtomicU64,
    subscriptions_released: AtomicU64,
}

/// Point-in-time copy of [`PrefetchStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrefetchStatsSnapshot {
    pub warms_issued: u64,
    pub warm_failures: u64,
    pub hover_deduplicated: u64,
    pub visibility_deduplicated: u64,
    pub disabled_skips: u64,
    pub subscriptions_opened: u64,
    pub subscriptions_released: u64,
}

impl PrefetchStatsSnapshot {
    /// Subscriptions opened but not yet released.
    pub fn subscriptions_active(&self) -> u64 {
        self.subscriptions_opened
            .saturating_sub(self.subscriptions_released)
    }
}

impl PrefetchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_warm(&self) {
        self.warms_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_warm_failure(&self) {
        self.warm_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deduplicated(&self, trigger: Trigger) {
        let counter = match trigger {
            Trigger::Hover => &self.hover_deduplicated,
            Trigger::Visibility => &self.visibility_deduplicated,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disabled_skip(&self) {
        self.disabled_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_subscription_opened(&self) {
        self.subscriptions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_subscription_released(&self) {
        self.subscriptions_released.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> PrefetchStatsSnapshot {
        PrefetchStatsSnapshot {
            warms_issued: self.warms_issued.load(Ordering::Relaxed),
            warm_failures: self.warm_failures.load(Ordering::Relaxed),
            hover_deduplicated: self.hover_deduplicated.load(Ordering::Relaxed),
            visibility_deduplicated: self.visibility_deduplicated.load(Ordering::Relaxed),
            disabled_skips: self.disabled_skips.load(Ordering::Relaxed),
            subscriptions_opened: self.subscriptions_opened.load(Ordering::Relaxed),
            subscriptions_released: self.subscriptions_released.load(Ordering::Relaxed),
        }
    }
}
