//! Lifecycle Demo - every callback a managed component can receive, in order
//!
//! This example demonstrates:
//! - Aware callbacks (name, registry, application context)
//! - Post-processors wrapping the init callbacks
//! - Custom init and destroy hooks on a definition
//! - Singleton vs prototype destruction at teardown
//!
//! Run with `RUST_LOG=scoped_di=trace` to see the registry's own events.

use scoped_di::{
    ApplicationContext, CallbackResult, ComponentCollection, ComponentDefinition, DiResult,
    Lifecycle, ManagedInstance, PostProcessor, Registry, Resolver, ScopeKind,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

// ===== Components =====

struct NotificationService {
    name: Mutex<String>,
    connected: AtomicBool,
}

impl NotificationService {
    fn new() -> Self {
        println!("  [1] constructor");
        Self {
            name: Mutex::new(String::new()),
            connected: AtomicBool::new(false),
        }
    }

    fn connect(&self) -> CallbackResult {
        println!("  [7] custom init: connecting");
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) -> CallbackResult {
        println!("  [8c] custom destroy: disconnecting");
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn send(&self, message: &str) {
        println!(
            "  {} -> {} (connected: {})",
            self.name.lock().unwrap(),
            message,
            self.connected.load(Ordering::SeqCst)
        );
    }
}

impl Lifecycle for NotificationService {
    fn set_component_name(&self, name: &str) {
        println!("  [2] component name: {}", name);
        *self.name.lock().unwrap() = name.to_string();
    }

    fn set_registry(&self, registry: &Registry) {
        println!("  [3] registry with {} definitions", registry.descriptors().len());
    }

    fn set_application_context(&self, context: &ApplicationContext) {
        println!("  [4] application context '{}'", context.application_name());
    }

    fn post_construct(&self) -> CallbackResult {
        println!("  [5] post construct");
        Ok(())
    }

    fn after_properties_set(&self) -> CallbackResult {
        println!("  [6] properties set");
        Ok(())
    }

    fn pre_destroy(&self) -> CallbackResult {
        println!("  [8a] pre destroy");
        Ok(())
    }

    fn destroy(&self) -> CallbackResult {
        println!("  [8b] destroy");
        Ok(())
    }
}

static TRANSACTIONS: AtomicU64 = AtomicU64::new(0);

struct Transaction {
    number: u64,
}

impl Lifecycle for Transaction {
    fn destroy(&self) -> CallbackResult {
        println!("  transaction #{} released", self.number);
        Ok(())
    }
}

/// Announces every instance the registry initializes.
struct AuditProcessor;

impl PostProcessor for AuditProcessor {
    fn before_initialization(&self, instance: &ManagedInstance) -> CallbackResult {
        println!("  [pp] before init: {} ({})", instance.name(), instance.scope());
        Ok(())
    }

    fn after_initialization(&self, instance: &ManagedInstance) -> CallbackResult {
        println!("  [pp] after init: {}", instance.name());
        Ok(())
    }
}

fn main() -> DiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scoped_di=info")),
        )
        .init();

    println!("=== Lifecycle Demo ===\n");

    let mut components = ComponentCollection::new();
    let notifications = components.register(
        ComponentDefinition::managed("notificationService", ScopeKind::Singleton, |_| {
            NotificationService::new()
        })
        .init_hook(NotificationService::connect)
        .destroy_hook(NotificationService::disconnect),
    )?;
    let transaction = components.add_managed("transaction", ScopeKind::Prototype, |_| {
        Transaction {
            number: TRANSACTIONS.fetch_add(1, Ordering::SeqCst) + 1,
        }
    })?;
    components.add_post_processor(Arc::new(AuditProcessor));

    println!("Building registry (eager singletons are created now):");
    let registry = components.build()?;

    println!("\nResolving the singleton twice:");
    let first = registry.get(&notifications)?;
    let second = registry.get(&notifications)?;
    println!("  same instance: {}", first.id() == second.id());
    first.send("welcome");

    println!("\nResolving two prototypes:");
    let t1 = registry.get(&transaction)?;
    let t2 = registry.get(&transaction)?;
    println!("  transactions #{} and #{}", t1.number, t2.number);

    println!("\nDestroying one prototype by hand:");
    registry.destroy(&t1)?;
    match registry.destroy(&t1) {
        Err(e) => println!("  second destroy rejected: {}", e),
        Ok(()) => println!("  unexpected: destroyed twice"),
    }

    println!("\nTeardown:");
    let report = registry.teardown();
    println!(
        "  destroyed {} singleton(s), {} failure(s); transaction #{} was never destroyed",
        report.destroyed_count(),
        report.failures.len(),
        t2.number
    );

    Ok(())
}
