//! Observers for resolution and lifecycle events.
//!
//! Observers see every resolution and every lifecycle phase the registry
//! runs. The registry emits `tracing` events on its own; observers are for
//! callers that want the events as data (tests, diagnostics, audits).

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::DiError;
use crate::instance::InstanceId;
use crate::scope::ScopeKind;
use crate::traits::LifecyclePhase;

/// One lifecycle phase that ran for one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub name: &'static str,
    pub scope: ScopeKind,
    pub instance: InstanceId,
    pub phase: LifecyclePhase,
}

/// A completed resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionEvent {
    pub name: &'static str,
    pub scope: ScopeKind,
    pub instance: InstanceId,
    /// True when this resolution constructed the instance
    pub created: bool,
    pub duration: Duration,
}

/// Observer trait for resolution and lifecycle events.
///
/// Calls are made synchronously on the resolving thread. Keep
/// implementations lightweight.
///
/// # Examples
///
/// ```
/// use scoped_di::{ComponentCollection, LifecycleEvent, LifecycleObserver, LifecyclePhase};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct ConstructionCounter(AtomicUsize);
///
/// impl LifecycleObserver for ConstructionCounter {
///     fn phase(&self, event: &LifecycleEvent) {
///         if event.phase == LifecyclePhase::Constructed {
///             self.0.fetch_add(1, Ordering::SeqCst);
///         }
///     }
/// }
///
/// let counter = Arc::new(ConstructionCounter::default());
/// let mut components = ComponentCollection::new();
/// components.add_singleton("clock", |_| 0u64).unwrap();
/// components.add_observer(counter.clone());
/// let _registry = components.build().unwrap();
///
/// assert_eq!(counter.0.load(Ordering::SeqCst), 1);
/// ```
pub trait LifecycleObserver: Send + Sync {
    /// Called before a resolution starts.
    fn resolving(&self, _name: &str, _scope: ScopeKind) {}

    /// Called when a resolution returned an instance.
    fn resolved(&self, _event: &ResolutionEvent) {}

    /// Called when a resolution failed.
    fn resolution_failed(&self, _name: &str, _error: &DiError) {}

    /// Called after each lifecycle phase that ran.
    fn phase(&self, event: &LifecycleEvent);
}

/// Container for registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn LifecycleObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, name: &str, scope: ScopeKind) {
        for observer in &self.observers {
            observer.resolving(name, scope);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, event: &ResolutionEvent) {
        for observer in &self.observers {
            observer.resolved(event);
        }
    }

    #[inline]
    pub(crate) fn resolution_failed(&self, name: &str, error: &DiError) {
        for observer in &self.observers {
            observer.resolution_failed(name, error);
        }
    }

    #[inline]
    pub(crate) fn phase(&self, event: &LifecycleEvent) {
        for observer in &self.observers {
            observer.phase(event);
        }
    }
}

/// Forwards every event to `tracing`.
///
/// Phases are logged at `info`, resolutions at `debug`, failures at `warn`.
/// Useful in demos and for ad-hoc debugging of lifecycle order.
#[derive(Debug, Default, Clone)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl LifecycleObserver for TracingObserver {
    fn resolving(&self, name: &str, scope: ScopeKind) {
        tracing::trace!(component = name, scope = %scope, "resolving");
    }

    fn resolved(&self, event: &ResolutionEvent) {
        tracing::debug!(
            component = event.name,
            scope = %event.scope,
            instance = %event.instance,
            created = event.created,
            elapsed_us = event.duration.as_micros() as u64,
            "resolved"
        );
    }

    fn resolution_failed(&self, name: &str, error: &DiError) {
        tracing::warn!(component = name, error = %error, "resolution failed");
    }

    fn phase(&self, event: &LifecycleEvent) {
        tracing::info!(
            component = event.name,
            scope = %event.scope,
            instance = %event.instance,
            phase = %event.phase,
            "lifecycle"
        );
    }
}

/// Records lifecycle events in memory.
///
/// # Examples
///
/// ```
/// use scoped_di::{ComponentCollection, LifecyclePhase, RecordingObserver, Resolver};
/// use std::sync::Arc;
///
/// let recorder = Arc::new(RecordingObserver::new());
/// let mut components = ComponentCollection::new();
/// let key = components.add_prototype("transaction", |_| String::from("tx")).unwrap();
/// components.add_observer(recorder.clone());
/// let registry = components.build().unwrap();
///
/// let tx = registry.get(&key).unwrap();
/// assert_eq!(recorder.phases_for(tx.id()), vec![LifecyclePhase::Constructed]);
/// ```
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<LifecycleEvent>>,
    resolutions: Mutex<Vec<ResolutionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every lifecycle event so far, in order.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().clone()
    }

    /// Every successful resolution so far, in order.
    pub fn resolutions(&self) -> Vec<ResolutionEvent> {
        self.resolutions.lock().clone()
    }

    /// Phases that ran for one instance, in order.
    pub fn phases_for(&self, instance: InstanceId) -> Vec<LifecyclePhase> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.instance == instance)
            .map(|event| event.phase)
            .collect()
    }

    /// Phases that ran for every instance of one definition, in order.
    pub fn phases_named(&self, name: &str) -> Vec<LifecyclePhase> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.name == name)
            .map(|event| event.phase)
            .collect()
    }

    /// How many times `phase` ran for instances of `name`.
    pub fn count(&self, name: &str, phase: LifecyclePhase) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.name == name && event.phase == phase)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
        self.resolutions.lock().clear();
    }
}

impl LifecycleObserver for RecordingObserver {
    fn resolved(&self, event: &ResolutionEvent) {
        self.resolutions.lock().push(event.clone());
    }

    fn phase(&self, event: &LifecycleEvent) {
        self.events.lock().push(event.clone());
    }
}
