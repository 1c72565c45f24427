#![cfg(feature = "async")]

/// Task-local execution context tests
///
/// With the `async` feature a request or session can be bound to a task
/// rather than a thread, so the binding follows the task across awaits.

use scoped_di::{
    ComponentCollection, DiError, ExecutionContext, RequestContext, Resolver, ScopeKind,
    SessionContext,
};
use std::collections::HashSet;
use std::time::Duration;

#[tokio::test]
async fn request_scope_follows_the_task() {
    let mut components = ComponentCollection::new();
    let key = components.add_request("requestTracker", |_| ()).unwrap();
    let registry = components.build().unwrap();

    let context = ExecutionContext::from(RequestContext::new());
    let (before, after) = context
        .clone()
        .scope(async {
            let before = registry.get(&key).unwrap().id();
            tokio::time::sleep(Duration::from_millis(5)).await;
            let after = registry.get(&key).unwrap().id();
            (before, after)
        })
        .await;

    assert_eq!(before, after);
    assert_eq!(registry.get_in(&key, &context).unwrap().id(), before);
    assert!(matches!(
        registry.get(&key),
        Err(DiError::ScopeNotActive { scope: ScopeKind::Request, .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_see_their_own_requests() {
    let mut components = ComponentCollection::new();
    let key = components.add_request("requestTracker", |_| ()).unwrap();
    let registry = components.build().unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        let context = ExecutionContext::from(RequestContext::new());
        tasks.push(tokio::spawn(context.scope(async move {
            let first = registry.get(&key).unwrap().id();
            tokio::task::yield_now().await;
            let second = registry.get(&key).unwrap().id();
            assert_eq!(first, second);
            first
        })));
    }

    let mut ids = HashSet::new();
    for task in tasks {
        ids.insert(task.await.unwrap());
    }
    assert_eq!(ids.len(), 8);
}

#[tokio::test]
async fn session_handle_inside_task_scope() {
    let mut components = ComponentCollection::new();
    let cart = components
        .add_session("cart", |_| std::sync::Mutex::new(Vec::<String>::new()))
        .unwrap();
    let registry = components.build().unwrap();
    let handle = registry.proxy(&cart).unwrap();

    let session = SessionContext::new();
    for item in ["book", "pen"] {
        let request = ExecutionContext::from(session.new_request());
        let handle = handle.clone();
        request
            .scope(async move {
                handle
                    .with(|cart| cart.lock().unwrap().push(item.to_string()))
                    .unwrap();
            })
            .await;
    }

    let items = handle
        .with_in(&ExecutionContext::from(session), |cart| cart.lock().unwrap().clone())
        .unwrap();
    assert_eq!(items, vec!["book", "pen"]);
}

#[tokio::test]
async fn thread_binding_takes_precedence_over_task_binding() {
    let mut components = ComponentCollection::new();
    let key = components.add_request("requestTracker", |_| ()).unwrap();
    let registry = components.build().unwrap();

    let task_context = ExecutionContext::from(RequestContext::new());
    let thread_context = ExecutionContext::from(RequestContext::new());

    let resolved = task_context
        .clone()
        .scope(async {
            let _guard = thread_context.enter();
            registry.get(&key).unwrap().id()
        })
        .await;

    assert_eq!(resolved, registry.get_in(&key, &thread_context).unwrap().id());
    assert_ne!(resolved, registry.get_in(&key, &task_context).unwrap().id());
}
