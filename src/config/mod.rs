//! Configuration models for scheduler timing and command policies.

pub mod settings;

pub use settings::{CommandRuleConfig, CoreConfig, SchedulerSettings};
