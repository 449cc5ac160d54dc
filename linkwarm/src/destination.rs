//! Navigation targets.
//!
//! A link points at an [`Href`]. Only plain string hrefs carry a
//! [`Destination`] that can be warmed; structured hrefs are still
//! navigable but never prefetched.

use std::fmt;
use std::sync::Arc;

/// Opaque navigation target (a path or URL).
///
/// Cheap to clone: the underlying string is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Destination(Arc<str>);

impl Destination {
    /// Create a destination from any string-like value.
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    /// The destination as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Destination {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Destination {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Destination {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

/// Structured href: a pathname plus ordered query pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlObject {
    /// Path component, e.g. `/docs`.
    pub pathname: String,

    /// Query parameters in insertion order.
    pub query: Vec<(String, String)>,
}

impl UrlObject {
    /// Create a structured href with no query.
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            query: Vec::new(),
        }
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for UrlObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pathname)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

/// What a link points at.
#[derive(Debug, Clone)]
pub enum Href {
    /// Plain string href. Eligible for prefetching.
    Path(Destination),

    /// Structured href. Navigable, never prefetched.
    Object(UrlObject),
}

impl Href {
    /// The destination to warm, if this href can be prefetched.
    pub fn prefetch_target(&self) -> Option<&Destination> {
        match self {
            Href::Path(destination) => Some(destination),
            Href::Object(_) => None,
        }
    }

    /// Whether two hrefs point at the same target.
    ///
    /// Hrefs of the same kind compare by value. Switching between a path
    /// and a structured href is always a destination change, even when both
    /// render the same URL.
    pub fn same_target(&self, other: &Href) -> bool {
        match (self, other) {
            (Href::Path(a), Href::Path(b)) => a == b,
            (Href::Object(a), Href::Object(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Href::Path(destination) => destination.fmt(f),
            Href::Object(url) => url.fmt(f),
        }
    }
}

impl From<&str> for Href {
    fn from(value: &str) -> Self {
        Href::Path(Destination::from(value))
    }
}

impl From<String> for Href {
    fn from(value: String) -> Self {
        Href::Path(Destination::from(value))
    }
}

impl From<Destination> for Href {
    fn from(value: Destination) -> Self {
        Href::Path(value)
    }
}

impl From<UrlObject> for Href {
    fn from(value: UrlObject) -> Self {
        Href::Object(value)
    }
}
