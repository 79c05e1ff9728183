//! Builders to construct the core components from configuration.

pub mod core_builder;

pub use core_builder::{build_core, BotCore};
