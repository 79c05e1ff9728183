//! Core scheduling, cooldown, and precondition-gate components.

pub mod cooldown;
pub mod detached;
pub mod error;
pub mod gate;
pub mod registry;
pub mod schedule;
pub mod scheduler;

pub use cooldown::{CommandContext, CooldownScope, CooldownStore};
pub use detached::spawn_after;
pub use error::{AppResult, GateRejection, JobError, ResolveError, ScheduleError};
pub use gate::{
    BypassCheck, CommandRegistry, CommandSpec, CooldownPolicy, InMemoryBypassList, NoBypass,
    PreconditionGate,
};
pub use registry::{CronJob, JobDefinition, JobFuture, JobHandler, JobRegistry};
pub use schedule::CronSpec;
pub use scheduler::{JobScheduler, SchedulerOptions};
