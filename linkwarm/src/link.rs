//! Navigation link with speculative prefetching.
//!
//! [`Link`] behaves like a plain navigation link (activation navigates to
//! its href) and owns a [`PrefetchController`] that warms the destination
//! on hover or near-visibility. The link's own built-in prefetching is
//! always off; the controller is the only prefetcher.
//!
//! A consumer hover handler always runs, before and independently of the
//! controller's gating.

use std::fmt;
use std::sync::Arc;

use crate::destination::Href;
use crate::element::ElementHandle;
use crate::prefetch::{
    PrefetchConfig, PrefetchController, RootMargin, TriggerOutcome, ViewportWatcher, Warmer,
};

/// Navigation subsystem: warms destinations and performs navigation.
pub trait Router: Warmer {
    /// Navigate to `href`.
    fn navigate(&self, href: &Href);
}

/// Pointer entering a link element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Element the pointer entered.
    pub element: ElementHandle,

    /// Client x coordinate.
    pub x: f64,

    /// Client y coordinate.
    pub y: f64,
}

impl PointerEvent {
    pub fn new(element: ElementHandle) -> Self {
        Self {
            element,
            x: 0.0,
            y: 0.0,
        }
    }
}

/// Consumer-supplied hover handler.
pub type HoverHandler = Box<dyn Fn(&PointerEvent) + Send + Sync>;

/// Link properties supplied by the consumer.
pub struct LinkProps {
    /// Link target.
    pub href: Href,

    /// Whether hover and visibility may warm the destination. Default: true.
    pub prefetch: bool,

    /// Extra hover behaviour; runs on every pointer enter.
    pub on_pointer_enter: Option<HoverHandler>,
}

impl fmt::Debug for LinkProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkProps")
            .field("href", &self.href)
            .field("prefetch", &self.prefetch)
            .field("on_pointer_enter", &self.on_pointer_enter.is_some())
            .finish()
    }
}

impl LinkProps {
    /// Props for `href` with prefetching on and no hover handler.
    pub fn new(href: impl Into<Href>) -> Self {
        Self {
            href: href.into(),
            prefetch: true,
            on_pointer_enter: None,
        }
    }

    /// Enable or disable prefetching.
    pub fn with_prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Attach a hover handler.
    pub fn on_pointer_enter<F>(mut self, handler: F) -> Self
    where
        F: Fn(&PointerEvent) + Send + Sync + 'static,
    {
        self.on_pointer_enter = Some(Box::new(handler));
        self
    }
}

/// A navigation link that warms its destination ahead of time.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use linkwarm::prefetch::{ManualViewportWatcher, RootMargin, WarmError, Warmer};
/// use linkwarm::{Destination, ElementHandle, Href, Link, LinkProps, PointerEvent, Router};
///
/// struct AppRouter;
///
/// impl Warmer for AppRouter {
///     fn warm(&self, _destination: &Destination) -> Result<(), WarmError> {
///         Ok(())
///     }
/// }
///
/// impl Router for AppRouter {
///     fn navigate(&self, _href: &Href) {}
/// }
///
/// let watcher = Arc::new(ManualViewportWatcher::new());
/// let mut link = Link::new(
///     LinkProps::new("/pricing").on_pointer_enter(|_event| println!("hovered")),
///     Arc::new(AppRouter),
///     watcher,
///     RootMargin::default(),
/// );
///
/// let element = ElementHandle::new();
/// link.mount(element);
/// assert!(link.pointer_enter(&PointerEvent::new(element)).warmed());
/// link.activate();
/// ```
pub struct Link {
    router: Arc<dyn Router>,
    on_pointer_enter: Option<HoverHandler>,
    controller: PrefetchController,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("controller", &self.controller)
            .field("on_pointer_enter", &self.on_pointer_enter.is_some())
            .finish_non_exhaustive()
    }
}

impl Link {
    /// Create an unmounted link.
    pub fn new(
        props: LinkProps,
        router: Arc<dyn Router>,
        watcher: Arc<dyn ViewportWatcher>,
        root_margin: RootMargin,
    ) -> Self {
        let config = PrefetchConfig::new()
            .with_enabled(props.prefetch)
            .with_root_margin(root_margin);
        let warmer: Arc<dyn Warmer> = Arc::new(Arc::clone(&router));
        let controller = PrefetchController::new(props.href, config, warmer, watcher);

        Self {
            router,
            on_pointer_enter: props.on_pointer_enter,
            controller,
        }
    }

    /// The element was rendered.
    pub fn mount(&mut self, element: ElementHandle) {
        self.controller.mount(element);
    }

    /// The element was re-rendered as a new node.
    pub fn replace_element(&mut self, element: ElementHandle) {
        self.controller.replace_element(element);
    }

    /// The element was removed.
    pub fn unmount(&mut self) {
        self.controller.unmount();
    }

    /// The rendered element, exposed to consumers that need a handle to it.
    pub fn element(&self) -> Option<ElementHandle> {
        self.controller.element()
    }

    /// Apply new props from the consumer.
    ///
    /// Disabling takes effect before the href changes and enabling after
    /// it, so a combined update opens at most one subscription and never
    /// one for disabled props.
    pub fn set_props(&mut self, props: LinkProps) {
        if !props.prefetch {
            self.controller.set_enabled(false);
        }
        self.controller.set_href(props.href);
        if props.prefetch {
            self.controller.set_enabled(true);
        }
        self.on_pointer_enter = props.on_pointer_enter;
    }

    /// Pointer entered the element.
    ///
    /// The consumer's handler runs first, whatever the controller decides.
    pub fn pointer_enter(&self, event: &PointerEvent) -> TriggerOutcome {
        if let Some(handler) = &self.on_pointer_enter {
            handler(event);
        }
        self.controller.on_hover()
    }

    /// The link was clicked or otherwise activated.
    pub fn activate(&self) {
        let href = self.controller.href();
        tracing::debug!(href = %href, "Link activated");
        self.router.navigate(&href);
    }

    /// Current href.
    pub fn href(&self) -> Href {
        self.controller.href()
    }

    /// The link's prefetch controller.
    pub fn controller(&self) -> &PrefetchController {
        &self.controller
    }
}
