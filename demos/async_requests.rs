//! Async Requests Demo - request contexts bound to tokio tasks
//!
//! This example demonstrates:
//! - Binding a request context to a task with `ExecutionContext::scope`
//! - Concurrent tasks each seeing their own request scoped instance
//! - Session scoped state shared by the requests of one session
//!
//! Requires the `async` feature: `cargo run --example async_requests --features async`.

use scoped_di::{
    ComponentCollection, DiResult, ExecutionContext, Resolver, ScopedProxy, SessionContext,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

struct RequestLog {
    path: String,
    steps: AtomicUsize,
}

#[derive(Default)]
struct Cart {
    items: AtomicUsize,
}

struct CheckoutService {
    log: Arc<ScopedProxy<RequestLog>>,
    cart: Arc<ScopedProxy<Cart>>,
}

impl CheckoutService {
    async fn handle(&self) -> DiResult<String> {
        self.log.with(|l| l.steps.fetch_add(1, Ordering::SeqCst))?;
        tokio::time::sleep(Duration::from_millis(10)).await;
        let items = self.cart.with(|c| c.items.fetch_add(1, Ordering::SeqCst) + 1)?;
        self.log.with(|l| {
            let steps = l.steps.fetch_add(1, Ordering::SeqCst) + 1;
            format!("{} finished after {} steps, cart has {} item(s)", l.path, steps, items)
        })
    }
}

#[tokio::main]
async fn main() -> DiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scoped_di=debug")),
        )
        .init();

    println!("=== Async Requests Demo ===\n");

    let paths = Arc::new(AtomicUsize::new(0));
    let mut components = ComponentCollection::new();
    let log = components.add_request("requestLog", move |_| RequestLog {
        path: format!("/checkout/{}", paths.fetch_add(1, Ordering::SeqCst)),
        steps: AtomicUsize::new(0),
    })?;
    let cart = components.add_session("cart", |_| Cart::default())?;
    let checkout = components.add_singleton("checkoutService", move |r| CheckoutService {
        log: r.proxy(&log).expect("request log handle"),
        cart: r.proxy(&cart).expect("cart handle"),
    })?;
    let registry = components.build()?;
    let service = registry.get(&checkout)?.into_arc();

    let sessions = [SessionContext::new(), SessionContext::new()];
    let mut tasks = Vec::new();
    for i in 0..6 {
        let session = &sessions[i % sessions.len()];
        let context = ExecutionContext::from(session.new_request());
        let service = service.clone();
        tasks.push(tokio::spawn(context.scope(async move { service.handle().await })));
    }

    for task in tasks {
        match task.await {
            Ok(Ok(line)) => println!("  {}", line),
            Ok(Err(e)) => println!("  request failed: {}", e),
            Err(e) => println!("  task panicked: {}", e),
        }
    }

    for (i, session) in sessions.iter().enumerate() {
        let items = registry
            .get_in(&cart, &ExecutionContext::from(session.clone()))?
            .items
            .load(Ordering::SeqCst);
        println!("session {} holds {} item(s)", i, items);
    }

    registry.teardown();
    Ok(())
}
