//! Runtime adapters: the dependency-resolution scope capability.

pub mod scope;

pub use scope::{Scope, ScopeFactory, ServiceRegistry};
