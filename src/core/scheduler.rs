//! Per-job execution loops with isolated failure handling.
//!
//! Every discovered job gets its own tokio task. A loop wakes on a short
//! fixed tick rather than sleeping until the exact next-fire instant; that
//! trades a bounded dispatch latency for tolerance of clock and schedule
//! recomputation. Within one loop, invocations are strictly sequential: a
//! job never re-enters itself, and occurrences missed while a body was slow
//! are skipped, never fired late.
//!
//! # Shutdown
//!
//! [`JobScheduler::shutdown`] raises one cancellation signal observed by all
//! loops, waits for them to drain under a fixed timeout, and returns
//! regardless. A body that never completes is abandoned, not aborted.

use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::error::JobError;
use crate::core::registry::{JobDefinition, JobFuture, JobHandler, JobRegistry};
use crate::runtime::scope::ScopeFactory;

/// Timing knobs for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// How often each loop wakes to compare wall-clock time against its
    /// next-fire instant.
    pub tick_interval: Duration,
    /// How long `shutdown` waits for loops to drain before giving up.
    pub shutdown_timeout: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Default)]
struct SchedulerInner {
    cancel: Option<CancellationToken>,
    runners: Vec<JoinHandle<()>>,
}

/// Owns one independent execution loop per discovered job.
pub struct JobScheduler {
    scopes: Arc<dyn ScopeFactory>,
    options: SchedulerOptions,
    inner: Mutex<SchedulerInner>,
    active_loops: Arc<AtomicUsize>,
}

impl JobScheduler {
    /// Create a scheduler that resolves job instances through `scopes`.
    pub fn new(scopes: Arc<dyn ScopeFactory>, options: SchedulerOptions) -> Self {
        Self {
            scopes,
            options,
            inner: Mutex::new(SchedulerInner::default()),
            active_loops: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Discover jobs from `registry` and spawn one loop per definition.
    ///
    /// Returns the number of loops started. Calling `start` while already
    /// running is a no-op returning 0. Must be called from within a tokio
    /// runtime.
    pub fn start(&self, registry: &JobRegistry) -> usize {
        let mut inner = self.inner.lock();
        if inner.cancel.is_some() {
            debug!("cron scheduler already started");
            return 0;
        }

        let cancel = CancellationToken::new();
        let definitions = registry.discover();
        let count = definitions.len();

        for definition in definitions {
            let scopes = Arc::clone(&self.scopes);
            let token = cancel.child_token();
            let tick = self.options.tick_interval;
            let active = Arc::clone(&self.active_loops);
            active.fetch_add(1, Ordering::Relaxed);
            inner.runners.push(tokio::spawn(async move {
                run_job_loop(definition, scopes, token, tick).await;
                active.fetch_sub(1, Ordering::Relaxed);
            }));
        }

        inner.cancel = Some(cancel);
        info!(jobs = count, "cron scheduler started");
        count
    }

    /// Whether `start` has been called without a matching `shutdown`.
    pub fn is_running(&self) -> bool {
        self.inner.lock().cancel.is_some()
    }

    /// Number of loops that have not yet exited.
    pub fn active_loops(&self) -> usize {
        self.active_loops.load(Ordering::Relaxed)
    }

    /// Cancel every loop and wait for them to drain, bounded by the
    /// configured timeout.
    ///
    /// Returns once all loops have exited or the timeout elapses, whichever
    /// comes first. No-op if the scheduler is not running.
    pub async fn shutdown(&self) {
        let (cancel, runners) = {
            let mut inner = self.inner.lock();
            (inner.cancel.take(), mem::take(&mut inner.runners))
        };
        let Some(cancel) = cancel else {
            return;
        };

        cancel.cancel();
        match tokio::time::timeout(self.options.shutdown_timeout, join_all(runners)).await {
            Ok(results) => {
                for result in results {
                    if let Err(join) = result {
                        if join.is_panic() {
                            warn!(error = %join, "job loop panicked");
                        }
                    }
                }
                info!("cron scheduler stopped");
            }
            Err(_) => warn!(
                remaining = self.active_loops.load(Ordering::Relaxed),
                timeout_ms = self.options.shutdown_timeout.as_millis() as u64,
                "cron scheduler shutdown timed out; abandoning remaining loops"
            ),
        }
    }
}

/// Tick every interval; compute the next run via cron and trigger when reached.
async fn run_job_loop(
    definition: JobDefinition,
    scopes: Arc<dyn ScopeFactory>,
    cancel: CancellationToken,
    tick: Duration,
) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let Some(mut next) = definition.schedule.next_occurrence(Utc::now()) else {
        warn!(
            job = %definition.name,
            expression = %definition.expression,
            "schedule has no future occurrence; loop not started"
        );
        return;
    };
    debug!(job = %definition.name, next = %next, "job loop started");

    loop {
        // Biased so a pending cancellation always beats a ready tick.
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(job = %definition.name, "job loop stopping");
                return;
            }
            _ = interval.tick() => {}
        }

        if Utc::now() < next {
            continue;
        }

        invoke_job(&definition, scopes.as_ref(), &cancel).await;

        match definition.schedule.next_after_catchup(next, Utc::now()) {
            Some(n) => next = n,
            None => {
                warn!(job = %definition.name, "schedule exhausted; loop exiting");
                return;
            }
        }
    }
}

/// Run one occurrence against a fresh scope, containing every failure mode.
async fn invoke_job(definition: &JobDefinition, scopes: &dyn ScopeFactory, cancel: &CancellationToken) {
    let scope = scopes.new_scope();

    let body: JobFuture = match &definition.handler {
        JobHandler::Class(resolve) => match resolve(&scope) {
            Ok(job) => {
                let token = cancel.child_token();
                Box::pin(async move { job.execute(token).await })
            }
            Err(error) => {
                warn!(job = %definition.name, %error, "cron job failed");
                return;
            }
        },
        JobHandler::Method(invoke) => match invoke(&scope, cancel.child_token()) {
            Ok(body) => body,
            Err(error) => {
                warn!(job = %definition.name, %error, "cron job failed");
                return;
            }
        },
    };

    // The body runs in its own task so a panic is contained here instead of
    // unwinding through the owning loop.
    match tokio::spawn(body).await {
        Ok(Ok(())) => {}
        Ok(Err(JobError::Cancelled)) => {}
        Ok(Err(error)) => warn!(job = %definition.name, %error, "cron job failed"),
        Err(join) if join.is_cancelled() => {}
        Err(join) => warn!(job = %definition.name, error = %join, "cron job panicked"),
    }
    // `scope` drops here; resolved instances are released on every exit path.
}
