//! Warm-up action abstraction.
//!
//! The controller decides *when* to warm a destination; a [`Warmer`]
//! decides *how*. Warming is best-effort: the controller never retries
//! and never reverts a destination to idle because a warm-up failed.
//!
//! # Implementors
//!
//! - [`SpawnWarmer`] - Runs an async warm function as a detached tokio task
//! - [`RecordingWarmer`] - Testing: records every call
//! - [`NoopWarmer`] - Testing: accepts and ignores every call
//! - [`FailingWarmer`] - Testing: rejects every call

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;

use crate::destination::Destination;

/// Failure reported by a warm-up.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WarmError {
    /// The navigation subsystem refused the warm-up.
    #[error("Warm-up rejected: {0}")]
    Rejected(String),

    /// No warm-up facility is available.
    #[error("Warm-up unavailable")]
    Unavailable,
}

/// Pre-loads resources for a destination ahead of navigation.
///
/// Implementations must tolerate redundant calls; the controller's
/// at-most-once gating is an optimisation, not a contract callers rely on.
pub trait Warmer: Send + Sync {
    /// Start warming `destination`.
    ///
    /// Returning `Err` only gets the failure logged.
    fn warm(&self, destination: &Destination) -> Result<(), WarmError>;
}

impl<W: Warmer + ?Sized> Warmer for Arc<W> {
    fn warm(&self, destination: &Destination) -> Result<(), WarmError> {
        (**self).warm(destination)
    }
}

/// Runs an async warm function on a tokio runtime without waiting for it.
///
/// # Example
///
/// ```
/// use linkwarm::prefetch::{SpawnWarmer, WarmError, Warmer};
/// use linkwarm::Destination;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let warmer = SpawnWarmer::new(runtime.handle().clone(), |destination: Destination| async move {
///     // fetch route data for `destination` here
///     let _ = destination;
///     Ok::<(), WarmError>(())
/// });
///
/// warmer.warm(&Destination::from("/docs")).unwrap();
/// ```
pub struct SpawnWarmer<F> {
    handle: Handle,
    warm_fn: F,
}

impl<F> std::fmt::Debug for SpawnWarmer<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnWarmer").finish_non_exhaustive()
    }
}

impl<F> SpawnWarmer<F> {
    /// Create a warmer spawning onto `handle`.
    pub fn new(handle: Handle, warm_fn: F) -> Self {
        Self { handle, warm_fn }
    }
}

impl<F, Fut> Warmer for SpawnWarmer<F>
where
    F: Fn(Destination) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), WarmError>> + Send + 'static,
{
    fn warm(&self, destination: &Destination) -> Result<(), WarmError> {
        let task = (self.warm_fn)(destination.clone());
        let destination = destination.clone();

        self.handle.spawn(async move {
            if let Err(e) = task.await {
                tracing::warn!(destination = %destination, error = %e, "Background warm-up failed");
            }
        });

        Ok(())
    }
}

/// Testing warmer that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingWarmer {
    calls: Mutex<Vec<Destination>>,
    fail: bool,
}

impl RecordingWarmer {
    /// Create a recorder that accepts every warm-up.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder that records and then rejects every warm-up.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// All destinations warmed so far, in call order.
    pub fn calls(&self) -> Vec<Destination> {
        self.calls.lock().clone()
    }

    /// Number of warm-ups issued.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of warm-ups issued for `destination`.
    pub fn count_for(&self, destination: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|d| d.as_str() == destination)
            .count()
    }
}

impl Warmer for RecordingWarmer {
    fn warm(&self, destination: &Destination) -> Result<(), WarmError> {
        self.calls.lock().push(destination.clone());
        if self.fail {
            Err(WarmError::Rejected(format!("refused {destination}")))
        } else {
            Ok(())
        }
    }
}

/// Testing warmer that accepts and ignores every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWarmer;

impl Warmer for NoopWarmer {
    fn warm(&self, _destination: &Destination) -> Result<(), WarmError> {
        Ok(())
    }
}

/// Testing warmer that rejects every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingWarmer;

impl Warmer for FailingWarmer {
    fn warm(&self, _destination: &Destination) -> Result<(), WarmError> {
        Err(WarmError::Unavailable)
    }
}
