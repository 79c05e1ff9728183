//! Dependency-resolution scopes.
//!
//! The scheduler and gate do not know about any particular container; they
//! depend on a narrow capability: open a scope, resolve typed instances inside
//! it, release it when the invocation is done. [`ServiceRegistry`] is the
//! provided constructor-based implementation of that capability.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::core::error::ResolveError;

type Provider = Arc<dyn Fn(&Scope) -> Arc<dyn Any + Send + Sync> + Send + Sync>;

/// Source of fresh dependency scopes, one per job invocation.
pub trait ScopeFactory: Send + Sync {
    /// Open a new scope. Instances resolved inside it live until the scope
    /// is dropped.
    fn new_scope(&self) -> Scope;
}

/// Constructor-based provider table.
///
/// Register factories with [`provide`](Self::provide) (a fresh instance per
/// scope, cached within one scope) or [`provide_shared`](Self::provide_shared)
/// (one instance cloned into every scope), then freeze the table with
/// [`into_factory`](Self::into_factory).
#[derive(Default)]
pub struct ServiceRegistry {
    providers: HashMap<TypeId, Provider>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scoped factory for `T`.
    ///
    /// The factory receives the scope it is constructing into, so it can
    /// resolve its own dependencies (constructor injection). Within a single
    /// scope the first constructed instance is cached and reused.
    pub fn provide<T, F>(&mut self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> T + Send + Sync + 'static,
    {
        self.providers.insert(
            TypeId::of::<T>(),
            Arc::new(move |scope| Arc::new(factory(scope)) as Arc<dyn Any + Send + Sync>),
        );
    }

    /// Register a shared singleton for `T`; every scope resolves the same
    /// instance.
    pub fn provide_shared<T: Send + Sync + 'static>(&mut self, instance: Arc<T>) {
        self.providers.insert(
            TypeId::of::<T>(),
            Arc::new(move |_| Arc::clone(&instance) as Arc<dyn Any + Send + Sync>),
        );
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Freeze the registry into a shareable scope factory.
    pub fn into_factory(self) -> Arc<dyn ScopeFactory> {
        Arc::new(RegistryFactory {
            registry: Arc::new(self),
        })
    }
}

struct RegistryFactory {
    registry: Arc<ServiceRegistry>,
}

impl ScopeFactory for RegistryFactory {
    fn new_scope(&self) -> Scope {
        Scope {
            registry: Arc::clone(&self.registry),
            instances: Mutex::new(HashMap::new()),
        }
    }
}

/// A bounded-lifetime resolution context.
///
/// Instances resolved here are cached for the life of the scope and released
/// when it is dropped, on every exit path.
pub struct Scope {
    registry: Arc<ServiceRegistry>,
    instances: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Scope {
    /// Resolve an instance of `T` within this scope.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotRegistered`] when no provider exists for `T`.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        let id = TypeId::of::<T>();
        {
            let instances = self.instances.lock();
            if let Some(existing) = instances.get(&id) {
                return Ok(downcast::<T>(Arc::clone(existing)));
            }
        }

        let provider = self
            .registry
            .providers
            .get(&id)
            .cloned()
            .ok_or(ResolveError::NotRegistered {
                type_name: type_name::<T>(),
            })?;

        // Constructed outside the cache lock so the factory may resolve its
        // own dependencies through this same scope.
        let instance = provider(self);
        let mut instances = self.instances.lock();
        let cached = instances.entry(id).or_insert(instance);
        Ok(downcast::<T>(Arc::clone(cached)))
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        trace!(instances = self.instances.lock().len(), "scope released");
    }
}

fn downcast<T: Send + Sync + 'static>(instance: Arc<dyn Any + Send + Sync>) -> Arc<T> {
    instance
        .downcast::<T>()
        .expect("provider cached under a mismatched TypeId")
}
