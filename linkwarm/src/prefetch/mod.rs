//! Speculative link prefetching.
//!
//! # Architecture
//!
//! ```text
//! PrefetchController (per link)
//!     │
//!     ├─► warmer.rs: Warmer trait, the warm(destination) action
//!     │
//!     ├─► viewport.rs: ViewportWatcher trait, batched visibility signal
//!     │     └─ subscription.rs: VisibilitySubscription, released exactly once
//!     │
//!     ├─► state.rs: PrefetchState, Trigger, TriggerOutcome
//!     │
//!     ├─► stats.rs: PrefetchStats counters
//!     │
//!     └─► config.rs: PrefetchConfig, RootMargin, INI loading
//! ```

mod config;
mod controller;
mod state;
mod stats;
mod subscription;
mod viewport;
mod warmer;

pub use config::{
    default_config_path, ConfigError, PrefetchConfig, RootMargin, CONFIG_SECTION,
    DEFAULT_ROOT_MARGIN_PX,
};
pub use controller::PrefetchController;
pub use state::{PrefetchState, Trigger, TriggerOutcome};
pub use stats::{PrefetchStats, PrefetchStatsSnapshot};
pub use subscription::VisibilitySubscription;
pub use viewport::{
    IntersectionCallback, IntersectionEntry, ManualViewportWatcher, SubscriptionId,
    ViewportWatcher,
};
pub use warmer::{FailingWarmer, NoopWarmer, RecordingWarmer, SpawnWarmer, WarmError, Warmer};
