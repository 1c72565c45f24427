//! Grouping registrations into reusable modules.

use crate::collection::ComponentCollection;
use crate::error::DiResult;

/// A unit of related registrations, applied with
/// [`ComponentCollection::add_module`].
///
/// # Examples
///
/// ```
/// use scoped_di::{ComponentCollection, ComponentModule, DiResult, ResolverCore};
///
/// struct AuditLogger;
/// struct Transaction;
///
/// struct PaymentsModule;
///
/// impl ComponentModule for PaymentsModule {
///     fn register(self, components: &mut ComponentCollection) -> DiResult<()> {
///         components.add_singleton("auditLogger", |_| AuditLogger)?;
///         components.add_prototype("transaction", |_| Transaction)?;
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut components = ComponentCollection::new();
/// components.add_module(PaymentsModule)?;
/// let registry = components.build()?;
/// assert!(registry.contains_component("transaction"));
/// # Ok(())
/// # }
/// ```
pub trait ComponentModule {
    fn register(self, components: &mut ComponentCollection) -> DiResult<()>;
}

impl<F> ComponentModule for F
where
    F: FnOnce(&mut ComponentCollection) -> DiResult<()>,
{
    fn register(self, components: &mut ComponentCollection) -> DiResult<()> {
        self(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiError;

    #[test]
    fn closures_are_modules() {
        let mut components = ComponentCollection::new();
        components
            .add_module(|c: &mut ComponentCollection| -> DiResult<()> {
                c.add_singleton("a", |_| 1u8)?;
                c.add_prototype("b", |_| 2u8)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(components.len(), 2);
    }

    #[test]
    fn module_errors_propagate() {
        let mut components = ComponentCollection::new();
        components.add_singleton("a", |_| 1u8).unwrap();
        let result = components.add_module(|c: &mut ComponentCollection| -> DiResult<()> {
            c.add_singleton("a", |_| 1u8)?;
            Ok(())
        });
        assert!(matches!(result, Err(DiError::DuplicateDefinition(_))));
    }
}
