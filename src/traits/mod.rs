//! Core traits for the scope registry.

mod lifecycle;
mod post_processor;
mod resolver;

pub use lifecycle::{CallbackResult, Capabilities, Lifecycle, LifecyclePhase};
pub use post_processor::PostProcessor;
pub use resolver::{Resolver, ResolverCore};
