//! Tests for the dependency-resolution scope capability

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tickwarden::core::ResolveError;
use tickwarden::runtime::{ScopeFactory, ServiceRegistry};

#[derive(Default)]
struct Repo {
    id: usize,
}

struct Service {
    repo: Arc<Repo>,
}

#[test]
fn test_resolve_scoped_instance() {
    let mut services = ServiceRegistry::new();
    services.provide(|_| Repo { id: 7 });
    let factory = services.into_factory();

    let scope = factory.new_scope();
    let repo = scope.resolve::<Repo>().unwrap();
    assert_eq!(repo.id, 7);
}

#[test]
fn test_scoped_instance_cached_within_scope() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&constructed);

    let mut services = ServiceRegistry::new();
    services.provide(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Repo::default()
    });
    let factory = services.into_factory();

    let scope = factory.new_scope();
    let a = scope.resolve::<Repo>().unwrap();
    let b = scope.resolve::<Repo>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(constructed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_fresh_instance_per_scope() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&constructed);

    let mut services = ServiceRegistry::new();
    services.provide(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Repo::default()
    });
    let factory = services.into_factory();

    drop(factory.new_scope().resolve::<Repo>().unwrap());
    drop(factory.new_scope().resolve::<Repo>().unwrap());
    assert_eq!(constructed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_shared_instance_spans_scopes() {
    let mut services = ServiceRegistry::new();
    services.provide_shared(Arc::new(Repo { id: 1 }));
    let factory = services.into_factory();

    let a = factory.new_scope().resolve::<Repo>().unwrap();
    let b = factory.new_scope().resolve::<Repo>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_constructor_injection() {
    let mut services = ServiceRegistry::new();
    services.provide(|_| Repo { id: 3 });
    services.provide(|scope| Service {
        repo: scope.resolve::<Repo>().expect("repo registered"),
    });
    let factory = services.into_factory();

    let scope = factory.new_scope();
    let service = scope.resolve::<Service>().unwrap();
    assert_eq!(service.repo.id, 3);

    // The injected dependency is the same scoped instance.
    let repo = scope.resolve::<Repo>().unwrap();
    assert!(Arc::ptr_eq(&service.repo, &repo));
}

#[test]
fn test_unregistered_type_fails() {
    let factory = ServiceRegistry::new().into_factory();
    let scope = factory.new_scope();
    let result = scope.resolve::<Repo>();
    assert!(matches!(result, Err(ResolveError::NotRegistered { .. })));
}
