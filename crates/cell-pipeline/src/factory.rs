//! Keyed component factory
//!
//! Components (forbidden-word providers, user processors) are registered under
//! a key either as a shared instance or as a constructor. Chains only ever see
//! the instances handed out by [`ComponentFactory::create`].

use cell_constraint::ForbiddenWordProvider;
use cell_core::{CellProcessor, Error, Result};
use dashmap::DashMap;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Named shared resources handed to constructors.
#[derive(Clone, Default)]
pub struct Resources {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Resources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<R: Any + Send + Sync>(&mut self, name: impl Into<String>, resource: R) {
        self.entries.insert(name.into(), Arc::new(resource));
    }

    #[must_use]
    pub fn with<R: Any + Send + Sync>(mut self, name: impl Into<String>, resource: R) -> Self {
        self.insert(name, resource);
        self
    }

    /// Look up a resource by name and type.
    #[must_use]
    pub fn get<R: Any + Send + Sync>(&self, name: &str) -> Option<Arc<R>> {
        self.entries
            .get(name)
            .and_then(|entry| Arc::clone(entry).downcast::<R>().ok())
    }

    /// Like [`Resources::get`] but fails when the resource is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingArgument`] naming the resource.
    pub fn require<R: Any + Send + Sync>(&self, name: &str) -> Result<Arc<R>> {
        self.get(name).ok_or_else(|| Error::missing(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl fmt::Debug for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// Builds a component, pulling dependencies from [`Resources`].
pub type Constructor<T> = Arc<dyn Fn(&Resources) -> Result<Arc<T>> + Send + Sync>;

/// How a key resolves to an instance.
pub enum Registration<T: ?Sized> {
    /// A pre-built instance shared by every lookup.
    Managed(Arc<T>),
    /// A constructor run on every lookup.
    Constructed(Constructor<T>),
}

impl<T: ?Sized> Clone for Registration<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Managed(instance) => Self::Managed(Arc::clone(instance)),
            Self::Constructed(constructor) => Self::Constructed(Arc::clone(constructor)),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Registration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Managed(_) => f.write_str("Managed"),
            Self::Constructed(_) => f.write_str("Constructed"),
        }
    }
}

/// Concurrent registry resolving keys to component instances.
pub struct ComponentFactory<T: ?Sized> {
    registrations: DashMap<String, Registration<T>>,
    resources: Resources,
}

impl<T: ?Sized> ComponentFactory<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: DashMap::new(),
            resources: Resources::new(),
        }
    }

    /// Factory whose constructors receive `resources`.
    #[must_use]
    pub fn with_resources(resources: Resources) -> Self {
        Self {
            registrations: DashMap::new(),
            resources,
        }
    }

    #[must_use]
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Register a shared instance under `key`, replacing any previous entry.
    pub fn register_managed(&self, key: impl Into<String>, instance: Arc<T>) {
        self.registrations
            .insert(key.into(), Registration::Managed(instance));
    }

    /// Register a constructor under `key`, replacing any previous entry.
    pub fn register_constructed<F>(&self, key: impl Into<String>, constructor: F)
    where
        F: Fn(&Resources) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        self.registrations
            .insert(key.into(), Registration::Constructed(Arc::new(constructor)));
    }

    /// Resolve `key` to an instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownComponent`] for unregistered keys, or the
    /// constructor's error.
    pub fn create(&self, key: &str) -> Result<Arc<T>> {
        let registration = self
            .registrations
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::UnknownComponent(key.to_string()))?;

        debug!(key, kind = ?registration, "creating component");
        match registration {
            Registration::Managed(instance) => Ok(instance),
            Registration::Constructed(constructor) => constructor(&self.resources),
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.registrations.contains_key(key)
    }

    /// Registered keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .registrations
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }
}

impl<T: ?Sized> Default for ComponentFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for ComponentFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("keys", &self.keys())
            .field("resources", &self.resources)
            .finish()
    }
}

/// The factories consulted while building field mappings.
#[derive(Debug, Default)]
pub struct Components {
    pub word_providers: ComponentFactory<dyn ForbiddenWordProvider>,
    pub processors: ComponentFactory<dyn CellProcessor>,
}

impl Components {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cell_constraint::StaticWordProvider;
    use cell_core::FieldIdentity;

    #[test]
    fn test_managed_instance_is_shared() {
        let factory: ComponentFactory<dyn ForbiddenWordProvider> = ComponentFactory::new();
        let provider: Arc<dyn ForbiddenWordProvider> =
            Arc::new(StaticWordProvider::new().common(["x"]));
        factory.register_managed("static", Arc::clone(&provider));

        let first = factory.create("static").unwrap();
        let second = factory.create("static").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_constructed_instance_gets_resources() {
        let resources = Resources::new().with("banned", vec!["spam".to_string()]);
        let factory: ComponentFactory<dyn ForbiddenWordProvider> =
            ComponentFactory::with_resources(resources);
        factory.register_constructed("from-resources", |resources| {
            let words = resources.require::<Vec<String>>("banned")?;
            let provider: Arc<dyn ForbiddenWordProvider> =
                Arc::new(StaticWordProvider::new().common(words.iter().cloned()));
            Ok(provider)
        });

        let provider = factory.create("from-resources").unwrap();
        let words = provider.forbidden_words(&FieldIdentity::new("any", 1));
        assert_eq!(words, vec!["spam"]);

        let again = factory.create("from-resources").unwrap();
        assert!(!Arc::ptr_eq(&provider, &again));
    }

    #[test]
    fn test_missing_resource() {
        let factory: ComponentFactory<dyn ForbiddenWordProvider> = ComponentFactory::new();
        factory.register_constructed("needs", |resources| {
            let _ = resources.require::<String>("path")?;
            Err(Error::config("unreachable"))
        });
        assert_eq!(factory.create("needs").unwrap_err(), Error::missing("path"));
    }

    #[test]
    fn test_unknown_key() {
        let factory: ComponentFactory<dyn CellProcessor> = ComponentFactory::new();
        assert_eq!(
            factory.create("nope").unwrap_err(),
            Error::UnknownComponent("nope".to_string())
        );
        assert!(factory.keys().is_empty());
    }

    #[test]
    fn test_resource_type_must_match() {
        let resources = Resources::new().with("n", 5_u32);
        assert!(resources.get::<u32>("n").is_some());
        assert!(resources.get::<String>("n").is_none());
        assert!(resources.contains("n"));
    }
}
