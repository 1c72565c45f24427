//! Request and session execution contexts.
//!
//! Request and session scoped components are bound to the context they were
//! first resolved in. Contexts are passed explicitly
//! ([`Resolver::get_in`](crate::Resolver::get_in)) or activated ambiently for
//! the current thread with [`ExecutionContext::enter`] (and, with the `async`
//! feature, for the current tokio task with [`ExecutionContext::scope`]).
//!
//! The HTTP layer or session manager that owns units of work creates one
//! [`RequestContext`] per inbound request and one [`SessionContext`] per
//! session, and ends them when the unit of work completes.

mod store;

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::scope::ScopeKind;

pub use store::ContextId;
pub(crate) use store::ContextStore;

thread_local! {
    static ACTIVE: RefCell<Vec<ExecutionContext>> = RefCell::new(Vec::new());
}

#[cfg(feature = "async")]
tokio::task_local! {
    static TASK_CONTEXT: ExecutionContext;
}

/// A session: shared by every request that belongs to it.
///
/// Cheap to clone; clones refer to the same session.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<ContextStore>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            store: Arc::new(ContextStore::new(ScopeKind::Session)),
        }
    }

    pub fn id(&self) -> ContextId {
        self.store.id()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.store.created_at()
    }

    pub fn is_active(&self) -> bool {
        self.store.is_active()
    }

    /// Number of session scoped instances currently bound.
    pub fn instance_count(&self) -> usize {
        self.store.len()
    }

    /// Starts a request belonging to this session.
    pub fn new_request(&self) -> RequestContext {
        RequestContext::with_session(self)
    }

    /// Ends the session, discarding its instances without destruction
    /// callbacks. Returns how many were discarded.
    pub fn invalidate(&self) -> usize {
        self.store.end()
    }

    /// Activates the session on the current thread until the guard drops.
    pub fn enter(&self) -> ContextGuard {
        ExecutionContext::Session(self.clone()).enter()
    }

    pub(crate) fn store(&self) -> &ContextStore {
        &self.store
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("id", &self.id())
            .field("active", &self.is_active())
            .finish()
    }
}

struct RequestInner {
    store: ContextStore,
    session: Option<SessionContext>,
}

/// A single unit of work, optionally belonging to a session.
///
/// Never shared across concurrently executing requests; clones refer to the
/// same request.
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<RequestInner>,
}

impl RequestContext {
    /// A request without a session. Session scoped components cannot be
    /// resolved through it.
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_session(session: &SessionContext) -> Self {
        Self::build(Some(session.clone()))
    }

    fn build(session: Option<SessionContext>) -> Self {
        Self {
            inner: Arc::new(RequestInner {
                store: ContextStore::new(ScopeKind::Request),
                session,
            }),
        }
    }

    pub fn id(&self) -> ContextId {
        self.inner.store.id()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.store.created_at()
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.inner.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.inner.store.is_active()
    }

    /// Number of request scoped instances currently bound.
    pub fn instance_count(&self) -> usize {
        self.inner.store.len()
    }

    /// Ends the request, discarding its instances without destruction
    /// callbacks. The session, if any, stays active.
    pub fn end(&self) -> usize {
        self.inner.store.end()
    }

    /// Activates the request on the current thread until the guard drops.
    pub fn enter(&self) -> ContextGuard {
        ExecutionContext::Request(self.clone()).enter()
    }

    pub(crate) fn store(&self) -> &ContextStore {
        &self.inner.store
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("id", &self.id())
            .field("session", &self.session().map(|s| s.id()))
            .field("active", &self.is_active())
            .finish()
    }
}

/// The unit of work a request or session scoped resolution binds to.
///
/// # Examples
///
/// ```
/// use scoped_di::{ComponentCollection, ExecutionContext, RequestContext, Resolver, SessionContext};
///
/// struct Tracker;
///
/// let mut components = ComponentCollection::new();
/// let tracker = components.add_request("requestTracker", |_| Tracker).unwrap();
/// let registry = components.build().unwrap();
///
/// let session = SessionContext::new();
/// let request = session.new_request();
/// let context = ExecutionContext::from(request.clone());
///
/// let a = registry.get_in(&tracker, &context).unwrap();
/// let b = context.run(|| registry.get(&tracker).unwrap());
/// assert_eq!(a.id(), b.id());
///
/// // A different request sees a different instance
/// let other = ExecutionContext::from(session.new_request());
/// assert_ne!(a.id(), registry.get_in(&tracker, &other).unwrap().id());
///
/// // Outside any context the scope is not active
/// assert!(registry.get(&tracker).is_err());
/// ```
#[derive(Clone, Debug)]
pub enum ExecutionContext {
    Request(RequestContext),
    Session(SessionContext),
}

impl ExecutionContext {
    /// Identity of the request or session.
    pub fn id(&self) -> ContextId {
        match self {
            ExecutionContext::Request(request) => request.id(),
            ExecutionContext::Session(session) => session.id(),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            ExecutionContext::Request(request) => request.is_active(),
            ExecutionContext::Session(session) => session.is_active(),
        }
    }

    pub fn request(&self) -> Option<&RequestContext> {
        match self {
            ExecutionContext::Request(request) => Some(request),
            ExecutionContext::Session(_) => None,
        }
    }

    /// The session, directly or through the request.
    pub fn session(&self) -> Option<&SessionContext> {
        match self {
            ExecutionContext::Request(request) => request.session(),
            ExecutionContext::Session(session) => Some(session),
        }
    }

    /// Store holding instances of `scope`, if this context provides one.
    ///
    /// An ended request provides none, not even its session's.
    pub(crate) fn store_for(&self, scope: ScopeKind) -> Option<&ContextStore> {
        if let ExecutionContext::Request(request) = self {
            if !request.is_active() {
                return None;
            }
        }
        match scope {
            ScopeKind::Request => self.request().map(RequestContext::store),
            ScopeKind::Session => self.session().map(SessionContext::store),
            _ => None,
        }
    }

    /// Innermost context activated on this thread, else the current task's.
    pub fn current() -> Option<ExecutionContext> {
        let entered = ACTIVE.with(|active| active.borrow().last().cloned());
        if entered.is_some() {
            return entered;
        }
        #[cfg(feature = "async")]
        {
            if let Ok(context) = TASK_CONTEXT.try_with(|context| context.clone()) {
                return Some(context);
            }
        }
        None
    }

    /// Activates this context on the current thread until the guard drops.
    pub fn enter(&self) -> ContextGuard {
        ACTIVE.with(|active| active.borrow_mut().push(self.clone()));
        tracing::trace!(context = %self.id(), "entered execution context");
        ContextGuard {
            id: self.id(),
            _not_send: PhantomData,
        }
    }

    /// Runs `f` with this context active on the current thread.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter();
        f()
    }

    /// Runs `future` with this context active for the current task.
    #[cfg(feature = "async")]
    pub async fn scope<F>(self, future: F) -> F::Output
    where
        F: std::future::Future,
    {
        TASK_CONTEXT.scope(self, future).await
    }
}

impl From<RequestContext> for ExecutionContext {
    fn from(request: RequestContext) -> Self {
        ExecutionContext::Request(request)
    }
}

impl From<SessionContext> for ExecutionContext {
    fn from(session: SessionContext) -> Self {
        ExecutionContext::Session(session)
    }
}

/// Keeps an [`ExecutionContext`] active on the current thread.
///
/// Not `Send`: the activation belongs to the thread that created it.
/// Dropping guards out of order deactivates exactly the guard's own context.
#[must_use = "the context is deactivated when the guard is dropped"]
pub struct ContextGuard {
    id: ContextId,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(index) = active.iter().rposition(|context| context.id() == self.id) {
                active.remove(index);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_nest() {
        assert!(ExecutionContext::current().is_none());
        let outer = RequestContext::new();
        let inner = SessionContext::new();
        {
            let _outer = outer.enter();
            assert_eq!(ExecutionContext::current().map(|c| c.id()), Some(outer.id()));
            {
                let _inner = inner.enter();
                assert_eq!(ExecutionContext::current().map(|c| c.id()), Some(inner.id()));
            }
            assert_eq!(ExecutionContext::current().map(|c| c.id()), Some(outer.id()));
        }
        assert!(ExecutionContext::current().is_none());
    }

    #[test]
    fn request_reaches_its_session_store() {
        let session = SessionContext::new();
        let request = session.new_request();
        let context = ExecutionContext::from(request.clone());

        assert!(context.store_for(ScopeKind::Request).is_some());
        assert_eq!(
            context.store_for(ScopeKind::Session).map(|s| s.id()),
            Some(session.id())
        );
        assert!(context.store_for(ScopeKind::Singleton).is_none());

        let lone = ExecutionContext::from(RequestContext::new());
        assert!(lone.store_for(ScopeKind::Session).is_none());

        let session_only = ExecutionContext::from(session);
        assert!(session_only.store_for(ScopeKind::Request).is_none());
    }

    #[test]
    fn guards_dropped_out_of_order_release_their_own_context() {
        let first = RequestContext::new();
        let second = RequestContext::new();
        let a = first.enter();
        let b = second.enter();
        drop(a);
        assert_eq!(ExecutionContext::current().map(|c| c.id()), Some(second.id()));
        drop(b);
        assert!(ExecutionContext::current().is_none());
    }

    #[test]
    fn ended_request_provides_no_stores() {
        let session = SessionContext::new();
        let request = session.new_request();
        let context = ExecutionContext::from(request.clone());
        request.end();

        assert!(context.store_for(ScopeKind::Request).is_none());
        assert!(context.store_for(ScopeKind::Session).is_none());
        assert!(session.is_active());
    }

    #[test]
    fn ending_a_request_keeps_the_session() {
        let session = SessionContext::new();
        let request = session.new_request();
        request.end();
        assert!(!request.is_active());
        assert!(session.is_active());
        session.invalidate();
        assert!(!session.is_active());
    }
}
