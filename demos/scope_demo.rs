//! Scope Demo - request, session and application scoped components
//!
//! This example demonstrates:
//! - One instance per request, one per session, one per application
//! - A singleton reaching per-request state through a forwarding handle
//! - A singleton fetching fresh prototypes through a provider
//! - Configuration loaded from `SCOPED_DI_*` environment variables
//!
//! Try `SCOPED_DI_SCOPES=sessionTracker=request cargo run --example scope_demo`.

use scoped_di::{
    ComponentCollection, ComponentProvider, ContainerConfig, DiError, DiResult, Resolver,
    ScopedProxy, SessionContext, TracingObserver,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct RequestTracker {
    calls: AtomicUsize,
}

#[derive(Default)]
struct SessionTracker {
    visits: AtomicUsize,
}

#[derive(Default)]
struct VisitCounter {
    total: AtomicUsize,
}

struct AuditLogger {
    lines: Mutex<Vec<String>>,
}

struct Transaction {
    id: usize,
}

struct PaymentService {
    audit: Arc<AuditLogger>,
    request: Arc<ScopedProxy<RequestTracker>>,
    session: Arc<ScopedProxy<SessionTracker>>,
    visits: Arc<ScopedProxy<VisitCounter>>,
    transactions: ComponentProvider<Transaction>,
}

impl PaymentService {
    fn pay(&self, amount: u32) -> DiResult<()> {
        let call = self.request.with(|r| r.calls.fetch_add(1, Ordering::SeqCst) + 1)?;
        let visit = self.session.with(|s| s.visits.fetch_add(1, Ordering::SeqCst) + 1)?;
        let total = self.visits.with(|v| v.total.fetch_add(1, Ordering::SeqCst) + 1)?;
        let transaction = self.transactions.get()?;

        let line = format!(
            "tx #{} amount {} (request call {}, session visit {}, total {})",
            transaction.id, amount, call, visit, total
        );
        println!("  {}", line);
        self.audit.lines.lock().unwrap().push(line);
        Ok(())
    }
}

fn main() -> DiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scoped_di=info")),
        )
        .init();

    println!("=== Scope Demo ===\n");

    let config = ContainerConfig::from_env()?.with_application_name("payments-demo");
    let mut components = ComponentCollection::with_config(config);
    components.add_observer(Arc::new(TracingObserver::new()));

    let next_transaction = Arc::new(AtomicUsize::new(0));
    let audit = components.add_singleton("auditLogger", |_| AuditLogger {
        lines: Mutex::new(Vec::new()),
    })?;
    let transaction = components.add_prototype("transaction", move |_| Transaction {
        id: next_transaction.fetch_add(1, Ordering::SeqCst) + 1,
    })?;
    let request_tracker = components.add_request("requestTracker", |_| RequestTracker::default())?;
    let session_tracker = components.add_session("sessionTracker", |_| SessionTracker::default())?;
    let visit_counter = components.add_application("visitCounter", |_| VisitCounter::default())?;
    let payments = components.add_singleton("paymentService", move |r| PaymentService {
        audit: r.get(&audit).expect("audit logger").into_arc(),
        request: r.proxy(&request_tracker).expect("request handle"),
        session: r.proxy(&session_tracker).expect("session handle"),
        visits: r.proxy(&visit_counter).expect("application handle"),
        transactions: r.provider(&transaction),
    })?;

    let registry = components.build()?;
    for descriptor in registry.descriptors() {
        println!("  {:<16} {}", descriptor.name, descriptor.scope);
    }

    let service = registry.get(&payments)?;
    let alice = SessionContext::new();
    let bob = SessionContext::new();

    let visits = [("alice", &alice, 2), ("bob", &bob, 1), ("alice", &alice, 1)];
    for (who, session, payments_in_request) in visits {
        let request = session.new_request();
        println!("\n{} / request {}", who, request.id());
        let _guard = request.enter();
        for amount in 0..payments_in_request {
            service.pay(10 * (amount + 1))?;
        }
        request.end();
    }

    println!("\nOutside any request:");
    match service.pay(99) {
        Err(DiError::ScopeNotActive { name, scope }) => {
            println!("  {} is not available: no active {} scope", name, scope)
        }
        other => println!("  unexpected: {:?}", other),
    }

    alice.invalidate();
    bob.invalidate();

    let report = registry.teardown();
    println!(
        "\nAudit lines: {}; destroyed singletons: {}",
        service.audit.lines.lock().unwrap().len(),
        report.destroyed_count()
    );
    Ok(())
}
