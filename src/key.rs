//! Typed definition keys.

use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed handle for a registered component definition.
///
/// Definitions are identified by their unique name. The key additionally
/// carries the component type so resolution through it is type-checked at
/// compile time. Two keys with the same type may point at different
/// definitions, e.g. a singleton and a prototype built by the same factory.
///
/// # Examples
///
/// ```rust
/// use scoped_di::{ComponentCollection, Resolver};
///
/// struct Greeter(&'static str);
///
/// let mut components = ComponentCollection::new();
/// let english = components.add_singleton("english", |_| Greeter("hello")).unwrap();
/// let french = components.add_singleton("french", |_| Greeter("bonjour")).unwrap();
/// let registry = components.build().unwrap();
///
/// assert_eq!(registry.get(&english).unwrap().0, "hello");
/// assert_eq!(registry.get(&french).unwrap().0, "bonjour");
/// assert_eq!(english.name(), "english");
/// ```
pub struct DefinitionKey<T: ?Sized> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ?Sized + 'static> DefinitionKey<T> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Registered definition name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Component type name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

impl<T: ?Sized> Clone for DefinitionKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for DefinitionKey<T> {}

impl<T: ?Sized> PartialEq for DefinitionKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T: ?Sized> Eq for DefinitionKey<T> {}

impl<T: ?Sized> Hash for DefinitionKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T: ?Sized + 'static> fmt::Debug for DefinitionKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionKey")
            .field("name", &self.name)
            .field("type", &type_name::<T>())
            .finish()
    }
}

impl<T: ?Sized> fmt::Display for DefinitionKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Bean;

    #[test]
    fn keys_compare_by_name() {
        let a = DefinitionKey::<Bean>::new("singletonBean");
        let b = DefinitionKey::<Bean>::new("singletonBean");
        let c = DefinitionKey::<Bean>::new("prototypeBean");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn debug_includes_type() {
        let key = DefinitionKey::<Bean>::new("bean");
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("bean"));
        assert!(rendered.contains("Bean"));
        assert_eq!(key.to_string(), "bean");
    }
}
