//! Prefetch state and trigger vocabulary.

use std::fmt;

use serde::Serialize;

/// Per-destination prefetch state.
///
/// ```text
///            hover / visible                 href change
///    Idle ---------------------> Warmed ---------------------> Idle
///      ^                           |
///      +--- href change -----------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrefetchState {
    /// No warm-up issued for the current destination.
    Idle,

    /// A warm-up has been issued for the current destination.
    Warmed,
}

impl PrefetchState {
    /// Short name for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrefetchState::Idle => "Idle",
            PrefetchState::Warmed => "Warmed",
        }
    }

    /// Build from the dedup flag.
    pub fn from_flag(prefetched: bool) -> Self {
        if prefetched {
            PrefetchState::Warmed
        } else {
            PrefetchState::Idle
        }
    }
}

impl fmt::Display for PrefetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Signal that asked for a warm-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Pointer entered the element.
    Hover,

    /// Element came within the margin-expanded viewport.
    Visibility,
}

impl Trigger {
    /// Short name for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Hover => "hover",
            Trigger::Visibility => "visibility",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A warm-up was issued.
    Warmed,

    /// The current destination was already warmed.
    AlreadyWarmed,

    /// Prefetching is disabled.
    Disabled,

    /// The href cannot be prefetched (structured href).
    NotPrefetchable,

    /// Notification from a subscription that has since been torn down.
    Stale,

    /// Hover arrived while no element was mounted.
    Unmounted,
}

impl TriggerOutcome {
    /// Whether this outcome issued a warm-up.
    pub fn warmed(&self) -> bool {
        matches!(self, TriggerOutcome::Warmed)
    }
}
