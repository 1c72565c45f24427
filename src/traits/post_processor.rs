//! Cross-cutting hooks that see every instance during initialization.

use crate::instance::ManagedInstance;
use crate::traits::CallbackResult;

/// Hook invoked for every instance the registry initializes.
///
/// `before_initialization` runs after the aware callbacks and before
/// `post_construct`; `after_initialization` runs after the custom init hook.
/// Processors run in ascending [`order`](PostProcessor::order).
///
/// # Examples
///
/// ```
/// use scoped_di::{CallbackResult, ComponentCollection, ManagedInstance, PostProcessor};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct CountingProcessor {
///     seen: AtomicUsize,
/// }
///
/// impl PostProcessor for CountingProcessor {
///     fn after_initialization(&self, _instance: &ManagedInstance) -> CallbackResult {
///         self.seen.fetch_add(1, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let processor = Arc::new(CountingProcessor::default());
/// let mut components = ComponentCollection::new();
/// components.add_singleton("answer", |_| 42u32).unwrap();
/// components.add_post_processor(processor.clone());
/// let _registry = components.build().unwrap();
///
/// assert_eq!(processor.seen.load(Ordering::SeqCst), 1);
/// ```
pub trait PostProcessor: Send + Sync {
    fn before_initialization(&self, _instance: &ManagedInstance) -> CallbackResult {
        Ok(())
    }

    fn after_initialization(&self, _instance: &ManagedInstance) -> CallbackResult {
        Ok(())
    }

    /// Lower values run first.
    fn order(&self) -> i32 {
        1000
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
