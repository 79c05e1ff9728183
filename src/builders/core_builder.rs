//! Builders to construct the scheduling and gating core from configuration.

use std::sync::Arc;

use crate::config::CoreConfig;
use crate::core::cooldown::CooldownStore;
use crate::core::gate::{
    BypassCheck, CommandRegistry, CommandSpec, CooldownPolicy, PreconditionGate,
};
use crate::core::scheduler::JobScheduler;
use crate::runtime::scope::ScopeFactory;

/// The assembled core: scheduler, gate, and command metadata.
pub struct BotCore {
    /// Job scheduler; call `start` with a populated registry.
    pub scheduler: JobScheduler,
    /// Precondition gate for command dispatch.
    pub gate: PreconditionGate,
    /// Command metadata built from configuration.
    pub commands: CommandRegistry,
    /// Shared cooldown store backing the gate.
    pub cooldowns: Arc<CooldownStore>,
}

/// Build the core components from validated configuration.
///
/// # Errors
///
/// Returns a description of the configuration problem.
pub fn build_core(
    cfg: &CoreConfig,
    scopes: Arc<dyn ScopeFactory>,
    bypass: Arc<dyn BypassCheck>,
) -> Result<BotCore, String> {
    cfg.validate().map_err(|e| format!("config invalid: {e}"))?;

    let cooldowns = Arc::new(CooldownStore::new());

    let mut commands = CommandRegistry::new();
    for (name, rule) in &cfg.commands {
        let mut spec = CommandSpec::new(name.clone())
            .with_cooldown(CooldownPolicy::new(rule.seconds, rule.scope));
        if let Some(role_id) = rule.required_role {
            spec = spec.require_role(role_id);
        }
        commands.insert(spec);
    }

    let gate = PreconditionGate::new(Arc::clone(&cooldowns), bypass);
    let scheduler = JobScheduler::new(scopes, cfg.scheduler.to_options());

    Ok(BotCore {
        scheduler,
        gate,
        commands,
        cooldowns,
    })
}
