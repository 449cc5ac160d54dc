//! Scenario replay against a real link and controller.
//!
//! The replay owns an in-memory viewport watcher and a router that records
//! warm-ups and navigations, so every decision the controller makes ends
//! up in the [`Report`].

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use linkwarm::prefetch::{
    ManualViewportWatcher, PrefetchConfig, PrefetchStatsSnapshot, ViewportWatcher, WarmError,
    Warmer,
};
use linkwarm::{Destination, ElementHandle, Href, Link, LinkProps, PointerEvent, Router};

use crate::scenario::{Scenario, Step};

/// Router that records instead of fetching or navigating.
#[derive(Debug, Default)]
struct ReplayRouter {
    warmed: Mutex<Vec<String>>,
    navigations: Mutex<Vec<String>>,
}

impl Warmer for ReplayRouter {
    fn warm(&self, destination: &Destination) -> Result<(), WarmError> {
        tracing::info!(destination = %destination, "warm");
        self.warmed.lock().push(destination.to_string());
        Ok(())
    }
}

impl Router for ReplayRouter {
    fn navigate(&self, href: &Href) {
        tracing::info!(href = %href, "navigate");
        self.navigations.lock().push(href.to_string());
    }
}

/// What happened at one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub line: usize,
    pub step: String,
    pub outcome: String,
}

/// Watcher registration counters at the end of the replay.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WatcherSummary {
    pub observe_calls: u64,
    pub unobserve_calls: u64,
    pub double_releases: u64,
    pub active: usize,
}

/// Result of replaying a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub initial_href: String,
    pub final_href: String,
    pub final_state: String,
    pub enabled: bool,
    pub observing: bool,
    pub warmed: Vec<String>,
    pub navigations: Vec<String>,
    pub steps: Vec<StepRecord>,
    pub stats: PrefetchStatsSnapshot,
    pub watcher: WatcherSummary,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario starting at {}", self.initial_href)?;
        for record in &self.steps {
            writeln!(
                f,
                "  {:>4}  {:<24} {}",
                record.line, record.step, record.outcome
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Warmed:       {}", join_or_none(&self.warmed))?;
        writeln!(f, "Navigations:  {}", join_or_none(&self.navigations))?;
        writeln!(
            f,
            "Final:        {} ({}, {}, {})",
            self.final_href,
            self.final_state,
            if self.enabled { "enabled" } else { "disabled" },
            if self.observing {
                "observing"
            } else {
                "not observing"
            }
        )?;
        writeln!(
            f,
            "Deduplicated: {} hover, {} visibility",
            self.stats.hover_deduplicated, self.stats.visibility_deduplicated
        )?;
        write!(
            f,
            "Watcher:      {} observe, {} unobserve, {} active, {} double releases",
            self.watcher.observe_calls,
            self.watcher.unobserve_calls,
            self.watcher.active,
            self.watcher.double_releases
        )
    }
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.join(", ")
    }
}

/// Drives a [`Link`] through scenario steps.
pub struct Replay {
    watcher: Arc<ManualViewportWatcher>,
    router: Arc<ReplayRouter>,
    link: Link,
    element: Option<ElementHandle>,
    initial_href: String,
}

impl Replay {
    /// Create an unmounted link pointed at `initial_href`.
    pub fn new(initial_href: &str, config: &PrefetchConfig) -> Self {
        let watcher = Arc::new(ManualViewportWatcher::new());
        let router = Arc::new(ReplayRouter::default());
        let link = Link::new(
            LinkProps::new(initial_href).with_prefetch(config.enabled),
            Arc::clone(&router) as Arc<dyn Router>,
            Arc::clone(&watcher) as Arc<dyn ViewportWatcher>,
            config.root_margin,
        );

        Self {
            watcher,
            router,
            link,
            element: None,
            initial_href: initial_href.to_string(),
        }
    }

    /// Apply one step and describe the result.
    pub fn apply(&mut self, step: &Step) -> String {
        match step {
            Step::Mount => {
                if self.element.is_some() {
                    return "already mounted".to_string();
                }
                let element = ElementHandle::new();
                self.link.mount(element);
                self.element = Some(element);
                format!("mounted {}", element)
            }
            Step::Remount => {
                let element = ElementHandle::new();
                if self.element.is_some() {
                    self.link.replace_element(element);
                } else {
                    self.link.mount(element);
                }
                self.element = Some(element);
                format!("mounted {}", element)
            }
            Step::Unmount => match self.element.take() {
                Some(element) => {
                    self.link.unmount();
                    format!("unmounted {}", element)
                }
                None => "not mounted".to_string(),
            },
            Step::Hover => match self.element {
                Some(element) => {
                    let outcome = self.link.pointer_enter(&PointerEvent::new(element));
                    format!("{:?}", outcome)
                }
                None => {
                    tracing::warn!("hover on unmounted link ignored");
                    "not mounted".to_string()
                }
            },
            Step::Enter | Step::Leave => match self.element {
                Some(element) => {
                    let visible = matches!(step, Step::Enter);
                    self.watcher.set_intersecting(element, visible);
                    format!("{} queued", if visible { "enter" } else { "leave" })
                }
                None => "not mounted".to_string(),
            },
            Step::Flush => {
                let before = self.router.warmed.lock().len();
                let delivered = self.watcher.flush();
                let warmed = self.router.warmed.lock().len() - before;
                format!("{} entries delivered, {} warmed", delivered, warmed)
            }
            Step::Href(href) => {
                let enabled = self.link.controller().is_enabled();
                self.set_props(Href::from(href.as_str()), enabled);
                format!("state {}", self.link.controller().state())
            }
            Step::Enable | Step::Disable => {
                let enabled = matches!(step, Step::Enable);
                let href = self.link.href();
                self.set_props(href, enabled);
                if self.link.controller().is_observing() {
                    "observing".to_string()
                } else {
                    "not observing".to_string()
                }
            }
            Step::Click => {
                self.link.activate();
                format!("navigated to {}", self.link.href())
            }
        }
    }

    fn set_props(&mut self, href: Href, prefetch: bool) {
        let mut props = LinkProps::new(href);
        props.prefetch = prefetch;
        self.link.set_props(props);
    }

    /// Summarise the current state.
    pub fn report(&self, steps: Vec<StepRecord>) -> Report {
        let controller = self.link.controller();
        Report {
            initial_href: self.initial_href.clone(),
            final_href: controller.href().to_string(),
            final_state: controller.state().to_string(),
            enabled: controller.is_enabled(),
            observing: controller.is_observing(),
            warmed: self.router.warmed.lock().clone(),
            navigations: self.router.navigations.lock().clone(),
            steps,
            stats: controller.stats().snapshot(),
            watcher: WatcherSummary {
                observe_calls: self.watcher.observe_count(),
                unobserve_calls: self.watcher.unobserve_count(),
                double_releases: self.watcher.double_release_count(),
                active: self.watcher.active_count(),
            },
        }
    }
}

/// Replay a whole scenario.
pub fn replay(scenario: &Scenario, config: &PrefetchConfig) -> Report {
    let mut replay = Replay::new(&scenario.initial_href, config);
    let mut records = Vec::with_capacity(scenario.steps.len());

    for script_step in &scenario.steps {
        let outcome = replay.apply(&script_step.step);
        tracing::debug!(line = script_step.line, step = %script_step.step, outcome = %outcome, "step");
        records.push(StepRecord {
            line: script_step.line,
            step: script_step.step.to_string(),
            outcome,
        });
    }

    replay.report(records)
}
