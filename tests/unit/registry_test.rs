//! Tests for job registration and discovery

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use tickwarden::core::{CronJob, JobError, JobHandler, JobRegistry};

#[derive(Default)]
struct Noop;

#[async_trait]
impl CronJob for Noop {
    async fn execute(&self, _cancel: CancellationToken) -> Result<(), JobError> {
        Ok(())
    }
}

#[test]
fn test_discover_method_job() {
    let mut registry = JobRegistry::new();
    registry.register_method("sweep", "*/10 * * * * *", |_state: Arc<Noop>| async { Ok(()) });

    let definitions = registry.discover();
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].name, "sweep");
    assert_eq!(definitions[0].expression, "*/10 * * * * *");
    assert!(matches!(definitions[0].handler, JobHandler::Method(_)));
}

#[test]
fn test_discover_class_job() {
    let mut registry = JobRegistry::new();
    registry.register_class::<Noop>("noop", "0 0 * * * *");

    let definitions = registry.discover();
    assert_eq!(definitions.len(), 1);
    assert!(matches!(definitions[0].handler, JobHandler::Class(_)));
}

#[test]
fn test_bad_expression_disables_only_its_job() {
    let mut registry = JobRegistry::new();
    registry.register_method("first", "*/5 * * * * *", |_state: Arc<Noop>| async { Ok(()) });
    registry.register_method("broken", "not a schedule", |_state: Arc<Noop>| async { Ok(()) });
    registry.register_method("last", "0 * * * * *", |_state: Arc<Noop>| async { Ok(()) });

    assert_eq!(registry.len(), 3);
    let definitions = registry.discover();
    assert_eq!(definitions.len(), 2);
    assert_eq!(definitions[0].name, "first");
    assert_eq!(definitions[1].name, "last");
}

#[test]
fn test_discover_preserves_registration_order() {
    let mut registry = JobRegistry::new();
    for name in ["a", "b", "c"] {
        registry.register_method(name, "0 * * * * *", |_state: Arc<Noop>| async { Ok(()) });
    }

    let names: Vec<_> = registry.discover().into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["a", "b", "c"]);
}

#[test]
fn test_empty_registry() {
    let registry = JobRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.discover().is_empty());
}
