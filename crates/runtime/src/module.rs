use crate::error::Result;
use crate::injector::{Injector, Instance};
use crate::key::{BindingKey, Key};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Provider runs on every resolution.
    #[default]
    Unscoped,
    /// Provider runs once per owning injector; the result is shared with
    /// every descendant.
    Singleton,
}

#[derive(Clone)]
pub(crate) enum Provider {
    Factory(Arc<dyn Fn() -> Instance + Send + Sync>),
    /// Receives the injector that declared the binding.
    Dependent(Arc<dyn Fn(&Injector) -> Result<Instance> + Send + Sync>),
}

impl Provider {
    pub(crate) fn invoke(&self, owner: &Injector) -> Result<Instance> {
        match self {
            Provider::Factory(factory) => Ok(factory()),
            Provider::Dependent(factory) => factory(owner),
        }
    }
}

#[derive(Clone)]
pub struct Binding {
    key: BindingKey,
    scope: Scope,
    pub(crate) provider: Provider,
}

impl Binding {
    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// A named set of provider declarations.
///
/// ```
/// use saber_runtime::{Key, Module, Scope};
///
/// let module = Module::new("ParentModule")
///     .provide(Key::<String>::of(), Scope::Singleton, || "Parent String".to_string());
/// assert_eq!(module.bindings().len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Module {
    name: String,
    bindings: Vec<Binding>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn keys(&self) -> impl Iterator<Item = &BindingKey> {
        self.bindings.iter().map(Binding::key)
    }

    pub fn provide<T, F>(self, key: Key<T>, scope: Scope, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.provide_instance(key.into(), scope, move || Arc::new(factory()) as Instance)
    }

    /// Declares a provider whose dependencies are resolved through the
    /// injector owning the binding.
    pub fn provide_with<T, F>(self, key: Key<T>, scope: Scope, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Injector) -> Result<T> + Send + Sync + 'static,
    {
        self.bind(
            key.into(),
            scope,
            Provider::Dependent(Arc::new(move |injector: &Injector| {
                factory(injector).map(|value| Arc::new(value) as Instance)
            })),
        )
    }

    /// Untyped form of [`Module::provide`]; the key's type need not match the
    /// concrete type behind the returned instance.
    pub fn provide_instance<F>(self, key: BindingKey, scope: Scope, factory: F) -> Self
    where
        F: Fn() -> Instance + Send + Sync + 'static,
    {
        self.bind(key, scope, Provider::Factory(Arc::new(factory)))
    }

    fn bind(mut self, key: BindingKey, scope: Scope, provider: Provider) -> Self {
        self.bindings.push(Binding {
            key,
            scope,
            provider,
        });
        self
    }
}
