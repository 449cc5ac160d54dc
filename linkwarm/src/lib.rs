//! Linkwarm - speculative prefetching for navigation links
//!
//! A link warms its destination ahead of navigation when the pointer
//! hovers it or when it comes near the viewport, at most once per
//! destination. The host environment supplies the warm-up action, the
//! visibility primitive and the pointer events; this crate supplies the
//! decision logic and the observer lifecycle.

pub mod destination;
pub mod element;
pub mod link;
pub mod logging;
pub mod prefetch;

pub use destination::{Destination, Href, UrlObject};
pub use element::ElementHandle;
pub use link::{HoverHandler, Link, LinkProps, PointerEvent, Router};
