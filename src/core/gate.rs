//! Precondition gate wrapping command dispatch.
//!
//! Before a command body runs, the gate consults the bypass allow-list, the
//! command's role requirement, and the cooldown store, in that order. After
//! an allowed attempt the cooldown is charged whether or not the body itself
//! succeeded: the window pays for the attempt, not the outcome.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::cooldown::{CommandContext, CooldownScope, CooldownStore};
use crate::core::error::{AppResult, GateRejection};
use crate::util::clock::ceil_secs;

/// A configured rate limit: how long, shared at what granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownPolicy {
    /// Window length in whole seconds. Zero disables the policy.
    pub seconds: u32,
    /// Sharing granularity.
    #[serde(default)]
    pub scope: CooldownScope,
}

impl CooldownPolicy {
    /// Build a policy.
    pub fn new(seconds: u32, scope: CooldownScope) -> Self {
        Self { seconds, scope }
    }

    /// Whether the policy imposes any window at all.
    pub fn is_enabled(&self) -> bool {
        self.seconds > 0
    }
}

/// Static metadata for one dispatchable command.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Command identity; also the cooldown key component.
    pub name: String,
    /// Command-level cooldown. Takes precedence over the module-level one.
    pub cooldown: Option<CooldownPolicy>,
    /// Module-level cooldown, applied when the command declares none of its
    /// own. Never merged or summed with the command-level policy.
    pub module_cooldown: Option<CooldownPolicy>,
    /// Role the invoker must hold, if any.
    pub required_role: Option<u64>,
}

impl CommandSpec {
    /// A spec with no preconditions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cooldown: None,
            module_cooldown: None,
            required_role: None,
        }
    }

    /// Set the command-level cooldown.
    #[must_use]
    pub fn with_cooldown(mut self, policy: CooldownPolicy) -> Self {
        self.cooldown = Some(policy);
        self
    }

    /// Set the module-level cooldown.
    #[must_use]
    pub fn with_module_cooldown(mut self, policy: CooldownPolicy) -> Self {
        self.module_cooldown = Some(policy);
        self
    }

    /// Require the invoker to hold `role_id`.
    #[must_use]
    pub fn require_role(mut self, role_id: u64) -> Self {
        self.required_role = Some(role_id);
        self
    }

    /// The single policy in effect: command-level when present, else
    /// module-level.
    pub fn effective_cooldown(&self) -> Option<CooldownPolicy> {
        self.cooldown.or(self.module_cooldown)
    }
}

/// Owned command-metadata table.
///
/// Created at startup and passed by reference to whatever renders help text
/// or dispatches commands; nothing here is process-global.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandSpec>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a spec, replacing any previous spec with the same name.
    pub fn insert(&mut self, spec: CommandSpec) {
        self.commands.insert(spec.name.clone(), spec);
    }

    /// Look up a spec by command name.
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    /// Iterate over every registered spec.
    pub fn all(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Allow-list exempting specific actors from precondition enforcement.
///
/// The read seam the gate consumes. A host backed by durable storage
/// implements this against its own records; [`InMemoryBypassList`] covers
/// tests and single-process deployments.
#[async_trait]
pub trait BypassCheck: Send + Sync {
    /// Whether `user_id` is exempt from preconditions.
    async fn is_bypassed(&self, user_id: u64) -> bool;
}

/// In-memory bypass allow-list.
#[derive(Default)]
pub struct InMemoryBypassList {
    users: RwLock<HashSet<u64>>,
}

impl InMemoryBypassList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user to the allow-list. Returns false if already present.
    pub fn add(&self, user_id: u64) -> bool {
        self.users.write().insert(user_id)
    }

    /// Remove a user from the allow-list. Returns false if not present.
    pub fn remove(&self, user_id: u64) -> bool {
        self.users.write().remove(&user_id)
    }

    /// Whether the user is on the allow-list.
    pub fn contains(&self, user_id: u64) -> bool {
        self.users.read().contains(&user_id)
    }
}

#[async_trait]
impl BypassCheck for InMemoryBypassList {
    async fn is_bypassed(&self, user_id: u64) -> bool {
        self.contains(user_id)
    }
}

/// A bypass check that exempts nobody.
pub struct NoBypass;

#[async_trait]
impl BypassCheck for NoBypass {
    async fn is_bypassed(&self, _user_id: u64) -> bool {
        false
    }
}

/// Cooldown and precondition enforcement wrapper around command dispatch.
pub struct PreconditionGate {
    cooldowns: Arc<CooldownStore>,
    bypass: Arc<dyn BypassCheck>,
}

impl PreconditionGate {
    /// Build a gate over the given store and bypass check.
    pub fn new(cooldowns: Arc<CooldownStore>, bypass: Arc<dyn BypassCheck>) -> Self {
        Self { cooldowns, bypass }
    }

    /// Handle to the underlying store, for maintenance jobs and diagnostics.
    pub fn cooldown_store(&self) -> Arc<CooldownStore> {
        Arc::clone(&self.cooldowns)
    }

    /// Decide whether the command may be attempted.
    ///
    /// Order: bypass (exempts everything), role requirement, cooldown. A
    /// cooldown rejection carries the remaining whole seconds, rounded up.
    ///
    /// # Errors
    ///
    /// Returns the [`GateRejection`] to surface to the invoker.
    pub async fn check(
        &self,
        spec: &CommandSpec,
        ctx: &CommandContext,
    ) -> Result<(), GateRejection> {
        if self.bypass.is_bypassed(ctx.user_id).await {
            debug!(command = %spec.name, user = ctx.user_id, "bypassed actor; preconditions skipped");
            return Ok(());
        }

        if let Some(role_id) = spec.required_role {
            if !ctx.role_ids.contains(&role_id) {
                return Err(GateRejection::Forbidden {
                    reason: "You do not have the required role to use this command.".to_string(),
                });
            }
        }

        let Some(policy) = spec.effective_cooldown().filter(CooldownPolicy::is_enabled) else {
            return Ok(());
        };
        if let Some(remaining) = self.cooldowns.try_get_remaining(policy.scope, ctx, &spec.name) {
            return Err(GateRejection::CooldownActive {
                remaining_secs: ceil_secs(remaining),
            });
        }
        Ok(())
    }

    /// Record a fresh cooldown window after an allowed attempt.
    ///
    /// No-op for bypassed actors and for commands without an enabled policy.
    pub async fn charge(&self, spec: &CommandSpec, ctx: &CommandContext) {
        let Some(policy) = spec.effective_cooldown().filter(CooldownPolicy::is_enabled) else {
            return;
        };
        if self.bypass.is_bypassed(ctx.user_id).await {
            return;
        }
        self.cooldowns
            .set_cooldown(policy.scope, ctx, &spec.name, policy.seconds);
    }

    /// Run `body` behind the gate.
    ///
    /// On rejection the body never runs and nothing is charged. On an allowed
    /// attempt the cooldown is charged after the body finishes, regardless of
    /// whether the body itself succeeded.
    ///
    /// # Errors
    ///
    /// Returns the [`GateRejection`] when the attempt was not allowed; the
    /// body's own result is returned inside `Ok`.
    pub async fn execute<T, Fut>(
        &self,
        spec: &CommandSpec,
        ctx: &CommandContext,
        body: Fut,
    ) -> Result<AppResult<T>, GateRejection>
    where
        Fut: Future<Output = AppResult<T>>,
    {
        self.check(spec, ctx).await?;
        let outcome = body.await;
        self.charge(spec, ctx).await;
        Ok(outcome)
    }
}
