/// Concurrent access integration tests
///
/// Racing first accesses must construct shared, session and request
/// instances at most once; prototypes stay independent per call.

use scoped_di::{
    ComponentCollection, ComponentDefinition, ContainerConfig, ExecutionContext, InstanceId,
    RequestContext, Resolver, ResolverContext, ScopeKind, SessionContext,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const THREADS: usize = 16;

struct SlowService {
    serial: usize,
}

fn slow_factory(
    counter: Arc<AtomicUsize>,
) -> impl Fn(&ResolverContext<'_>) -> SlowService + Send + Sync + 'static {
    move |_| {
        let serial = counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        SlowService { serial }
    }
}

#[test]
fn racing_first_access_creates_one_singleton() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let mut components = ComponentCollection::new();
    components
        .register(
            ComponentDefinition::plain(
                "slowSingleton",
                ScopeKind::Singleton,
                slow_factory(constructions.clone()),
            )
            .lazy(),
        )
        .unwrap();
    let registry = components.build().unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.get_named::<SlowService>("slowSingleton").unwrap().id()
            })
        })
        .collect();

    let ids: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids.len(), 1);
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert_eq!(registry.teardown().destroyed_count(), 1);
}

#[test]
fn racing_requests_of_one_session_share_one_instance() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let mut components = ComponentCollection::new();
    let key = components
        .add_session("sessionTracker", slow_factory(constructions.clone()))
        .unwrap();
    let registry = components.build().unwrap();
    let session = SessionContext::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            let request = session.new_request();
            thread::spawn(move || {
                let _guard = request.enter();
                barrier.wait();
                registry.get(&key).unwrap().id()
            })
        })
        .collect();

    let ids: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids.len(), 1);
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert_eq!(session.instance_count(), 1);
}

#[test]
fn one_request_shared_across_threads_binds_once() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let mut components = ComponentCollection::new();
    let key = components
        .add_request("requestTracker", slow_factory(constructions.clone()))
        .unwrap();
    let registry = components.build().unwrap();
    let context = ExecutionContext::from(RequestContext::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            let context = context.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.get_in(&key, &context).unwrap().serial
            })
        })
        .collect();

    let serials: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(serials.len(), 1);
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

#[test]
fn separate_requests_on_separate_threads_are_isolated() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let mut components = ComponentCollection::new();
    let key = components
        .add_request("requestTracker", slow_factory(constructions.clone()))
        .unwrap();
    let registry = components.build().unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                let request = RequestContext::new();
                let _guard = request.enter();
                let first = registry.get(&key).unwrap().id();
                let second = registry.get(&key).unwrap().id();
                assert_eq!(first, second);
                first
            })
        })
        .collect();

    let ids: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids.len(), THREADS);
    assert_eq!(constructions.load(Ordering::SeqCst), THREADS);
}

#[test]
fn concurrent_prototypes_are_distinct() {
    let mut components = ComponentCollection::new();
    let key = components.add_prototype("transaction", |_| ()).unwrap();
    let registry = components.build().unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                (0..10)
                    .map(|_| registry.get(&key).unwrap().id())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let ids: HashSet<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(ids.len(), THREADS * 10);
}

struct Cart {
    settings: u32,
}

struct CartHolder {
    cart: InstanceId,
}

#[test]
fn session_and_singleton_creation_resolve_each_other_across_threads() {
    let mut components =
        ComponentCollection::with_config(ContainerConfig::new().with_eager_singletons(false));
    let settings = components.add_application("appSettings", |_| 7u32).unwrap();
    let cart = components
        .add_session("cart", move |r| {
            thread::sleep(Duration::from_millis(50));
            Cart {
                settings: *r.get(&settings).unwrap(),
            }
        })
        .unwrap();
    let session = SessionContext::new();
    let holder = components
        .add_singleton("cartHolder", {
            let session = session.clone();
            move |r| {
                thread::sleep(Duration::from_millis(50));
                let request = ExecutionContext::from(session.new_request());
                let cart = request.run(|| r.get(&cart).unwrap());
                CartHolder { cart: cart.id() }
            }
        })
        .unwrap();
    let registry = components.build().unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let (tx, rx) = mpsc::channel();

    let shopper = {
        let (registry, session, barrier, tx) =
            (registry.clone(), session.clone(), barrier.clone(), tx.clone());
        thread::spawn(move || {
            let request = ExecutionContext::from(session.new_request());
            barrier.wait();
            let cart = registry.get_in(&cart, &request).unwrap();
            assert_eq!(cart.settings, 7);
            tx.send(("cart", cart.id())).unwrap();
        })
    };
    let owner = {
        let (registry, barrier) = (registry.clone(), barrier.clone());
        thread::spawn(move || {
            barrier.wait();
            let holder = registry.get(&holder).unwrap();
            tx.send(("holder", holder.cart)).unwrap();
        })
    };

    let mut seen = Vec::new();
    for _ in 0..2 {
        seen.push(
            rx.recv_timeout(Duration::from_secs(10))
                .expect("both resolutions complete"),
        );
    }
    shopper.join().unwrap();
    owner.join().unwrap();

    assert_eq!(seen[0].1, seen[1].1, "one cart per session: {:?}", seen);
    assert_eq!(session.instance_count(), 1);
}

