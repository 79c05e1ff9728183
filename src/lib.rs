//! # Tickwarden
//!
//! A cron-driven job scheduler and command cooldown gate for chat bot runtimes.
//!
//! Chat bots accumulate two kinds of recurring plumbing that are easy to get
//! subtly wrong: background maintenance work (expiry sweeps, cache refreshes,
//! scheduled announcements) and per-command rate limiting across an unbounded
//! number of concurrent command invocations. This crate owns both, behind
//! narrow seams the host application plugs its platform SDK and persistence
//! layer into.
//!
//! ## Key Features
//!
//! - **Cron Schedules**: six-field expressions (with seconds) compiled once at
//!   startup; an invalid expression disables only its own job.
//! - **Isolated Job Loops**: one independent tokio task per job. A failing or
//!   panicking job body never takes down its loop, and a stuck job never
//!   stalls the others.
//! - **Scoped Resolution**: every invocation runs against a fresh dependency
//!   scope, released on all exit paths.
//! - **Cooldown Gate**: per-user, per-guild, or global rate limiting with a
//!   bypass allow-list and a structured "try again in N seconds" rejection.
//! - **Bounded Shutdown**: a single shutdown call cancels every loop and waits
//!   a fixed budget, returning even if a job body never completes.
//!
//! ## Scheduling a Job
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickwarden::core::{JobRegistry, JobScheduler, SchedulerOptions};
//! use tickwarden::runtime::ServiceRegistry;
//!
//! let mut services = ServiceRegistry::new();
//! services.provide_shared(Arc::new(SweepState::default()));
//!
//! let mut jobs = JobRegistry::new();
//! jobs.register_method("expiry-sweep", "*/10 * * * * *", |state: Arc<SweepState>| async move {
//!     state.sweep();
//!     Ok(())
//! });
//!
//! let scheduler = JobScheduler::new(services.into_factory(), SchedulerOptions::default());
//! scheduler.start(&jobs);
//! // ... later
//! scheduler.shutdown().await;
//! ```
//!
//! ## Gating a Command
//!
//! ```rust,ignore
//! use tickwarden::core::CommandContext;
//!
//! let ctx = CommandContext::user(invoker_id).in_guild(guild_id);
//! match gate.execute(spec, &ctx, async { run_command().await }).await {
//!     Ok(outcome) => report(outcome),
//!     Err(rejection) => reply(rejection.to_string()),
//! }
//! ```
//!
//! For complete examples, see the integration tests under `tests/`.

#![deny(unsafe_code)]
#![warn(clippy::all)]

/// Core scheduling, cooldown, and precondition-gate components.
pub mod core;
/// Configuration models for scheduler timing and command policies.
pub mod config;
/// Builders to construct the core components from configuration.
pub mod builders;
/// Runtime adapters: the dependency-resolution scope capability.
pub mod runtime;
/// Shared utilities.
pub mod util;
