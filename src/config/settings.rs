//! Scheduler timing and command policy configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::cooldown::CooldownScope;
use crate::core::scheduler::SchedulerOptions;

/// Scheduler timing knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Loop wake interval in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Shutdown drain budget in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_shutdown_timeout_secs() -> u64 {
    5
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl SchedulerSettings {
    /// Validate timing values.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".into());
        }
        if self.shutdown_timeout_secs == 0 {
            return Err("shutdown_timeout_secs must be greater than 0".into());
        }
        Ok(())
    }

    /// Convert into the scheduler's option struct.
    pub fn to_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_secs),
        }
    }

    /// Read settings from the environment, loading a `.env` file if present.
    ///
    /// Recognized variables: `TICKWARDEN_TICK_INTERVAL_MS`,
    /// `TICKWARDEN_SHUTDOWN_TIMEOUT_SECS`. Unset variables keep their
    /// defaults.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        let mut settings = Self::default();
        if let Ok(raw) = std::env::var("TICKWARDEN_TICK_INTERVAL_MS") {
            settings.tick_interval_ms = raw
                .parse()
                .map_err(|e| format!("TICKWARDEN_TICK_INTERVAL_MS: {e}"))?;
        }
        if let Ok(raw) = std::env::var("TICKWARDEN_SHUTDOWN_TIMEOUT_SECS") {
            settings.shutdown_timeout_secs = raw
                .parse()
                .map_err(|e| format!("TICKWARDEN_SHUTDOWN_TIMEOUT_SECS: {e}"))?;
        }
        settings.validate()?;
        Ok(settings)
    }
}

/// Per-command rate-limit and role rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRuleConfig {
    /// Cooldown window in seconds; zero disables the cooldown.
    pub seconds: u32,
    /// Sharing granularity for the cooldown.
    #[serde(default)]
    pub scope: CooldownScope,
    /// Role the invoker must hold, if any.
    #[serde(default)]
    pub required_role: Option<u64>,
}

/// Root configuration for the scheduling and gating core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Scheduler timing.
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    /// Map of command name to rule.
    #[serde(default)]
    pub commands: HashMap<String, CommandRuleConfig>,
}

impl CoreConfig {
    /// Validate the scheduler settings and every command rule.
    pub fn validate(&self) -> Result<(), String> {
        self.scheduler.validate()?;
        for name in self.commands.keys() {
            if name.trim().is_empty() {
                return Err("command names must be non-empty".into());
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: CoreConfig = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
