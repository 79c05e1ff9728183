//! Job definitions and the explicit registration table.
//!
//! Jobs come in two shapes, mirroring how hosts structure their maintenance
//! code: a *class job* is a type implementing [`CronJob`], resolved fresh from
//! a dependency scope on every tick; a *method job* is a bound closure over a
//! resolved instance, with or without a cancellation token. Both are declared
//! up front in a [`JobRegistry`]; there is no runtime type scanning.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::error::{JobError, ResolveError};
use crate::core::schedule::CronSpec;
use crate::runtime::scope::Scope;

/// A self-contained scheduled job.
///
/// Implementors are resolved from a fresh scope for every invocation, so a
/// job may hold scoped dependencies (a repository handle, a client) without
/// caring about invocation lifetimes.
#[async_trait]
pub trait CronJob: Send + Sync {
    /// Run one occurrence of the job.
    ///
    /// `cancel` fires when the scheduler is shutting down; a body that
    /// observes it should stop early and return [`JobError::Cancelled`],
    /// which is never logged as a failure.
    async fn execute(&self, cancel: CancellationToken) -> Result<(), JobError>;
}

/// Boxed future produced by a job invocation.
pub type JobFuture = Pin<Box<dyn Future<Output = Result<(), JobError>> + Send>>;

type ClassResolver = dyn Fn(&Scope) -> Result<Arc<dyn CronJob>, ResolveError> + Send + Sync;
type MethodInvoker =
    dyn Fn(&Scope, CancellationToken) -> Result<JobFuture, ResolveError> + Send + Sync;

/// How a job invocation is produced from a scope.
#[derive(Clone)]
pub enum JobHandler {
    /// Resolve an implementation of [`CronJob`] and drive it.
    Class(Arc<ClassResolver>),
    /// Resolve a target instance and invoke a bound method on it.
    Method(Arc<MethodInvoker>),
}

/// A discovered job: identity, diagnostics string, compiled schedule, handler.
pub struct JobDefinition {
    /// Stable job name, used in every log line about this job.
    pub name: String,
    /// The declared expression, kept for diagnostics.
    pub expression: String,
    /// Compiled schedule.
    pub schedule: CronSpec,
    /// Invocation target.
    pub handler: JobHandler,
}

struct JobEntry {
    name: String,
    expression: String,
    handler: JobHandler,
}

/// Explicit, statically-maintained job registration table.
#[derive(Default)]
pub struct JobRegistry {
    entries: Vec<JobEntry>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class job: `J` is resolved from a fresh scope on every tick.
    pub fn register_class<J>(&mut self, name: impl Into<String>, expression: impl Into<String>)
    where
        J: CronJob + 'static,
    {
        let resolver: Arc<ClassResolver> = Arc::new(|scope: &Scope| {
            let job = scope.resolve::<J>()?;
            Ok(job as Arc<dyn CronJob>)
        });
        self.entries.push(JobEntry {
            name: name.into(),
            expression: expression.into(),
            handler: JobHandler::Class(resolver),
        });
    }

    /// Register a method job that does not observe cancellation.
    pub fn register_method<T, F, Fut>(
        &mut self,
        name: impl Into<String>,
        expression: impl Into<String>,
        invoke: F,
    ) where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        self.register_method_with_cancel(name, expression, move |target, _cancel| invoke(target));
    }

    /// Register a cancellation-aware method job.
    ///
    /// The target `T` is resolved from a fresh scope per invocation; `invoke`
    /// binds the call to it.
    pub fn register_method_with_cancel<T, F, Fut>(
        &mut self,
        name: impl Into<String>,
        expression: impl Into<String>,
        invoke: F,
    ) where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let invoker: Arc<MethodInvoker> = Arc::new(move |scope: &Scope, cancel| {
            let target = scope.resolve::<T>()?;
            Ok(Box::pin(invoke(target, cancel)) as JobFuture)
        });
        self.entries.push(JobEntry {
            name: name.into(),
            expression: expression.into(),
            handler: JobHandler::Method(invoker),
        });
    }

    /// Number of registered entries (before schedule validation).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no jobs are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compile every registered entry into a [`JobDefinition`], in
    /// registration order.
    ///
    /// An entry whose expression fails to parse is logged and excluded; it
    /// never affects the other entries.
    pub fn discover(&self) -> Vec<JobDefinition> {
        let mut definitions = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            match CronSpec::parse(&entry.expression) {
                Ok(schedule) => definitions.push(JobDefinition {
                    name: entry.name.clone(),
                    expression: entry.expression.clone(),
                    schedule,
                    handler: entry.handler.clone(),
                }),
                Err(error) => warn!(
                    job = %entry.name,
                    expression = %entry.expression,
                    %error,
                    "invalid cron expression; job disabled"
                ),
            }
        }
        definitions
    }
}
