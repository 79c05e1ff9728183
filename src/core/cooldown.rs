//! Central cooldown store used by the precondition gate.
//!
//! Thread-safe, in-memory. Keyed by scope + command + entity id. Entries are
//! never required to be evicted for correctness; an entry whose expiry has
//! passed reads as "no active cooldown". [`CooldownStore::purge_expired`]
//! exists so a host can bound memory with a periodic sweep.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// The granularity at which a rate limit is shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScope {
    /// One cooldown per invoking user. The default.
    #[default]
    User,
    /// One cooldown shared by everyone in the guild. Outside a guild (a
    /// direct message) this degrades to per-user.
    Guild,
    /// One cooldown shared by every invoker everywhere.
    Global,
}

/// Actor and guild context supplied by the command-dispatch layer.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Invoking user id.
    pub user_id: u64,
    /// Guild the command was invoked in, if any.
    pub guild_id: Option<u64>,
    /// Role ids held by the invoker in that guild.
    pub role_ids: Vec<u64>,
}

impl CommandContext {
    /// Context for a direct-message invocation by `user_id`.
    pub fn user(user_id: u64) -> Self {
        Self {
            user_id,
            guild_id: None,
            role_ids: Vec::new(),
        }
    }

    /// Attach the guild the command was invoked in.
    #[must_use]
    pub fn in_guild(mut self, guild_id: u64) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    /// Attach the invoker's role ids.
    #[must_use]
    pub fn with_roles(mut self, role_ids: impl IntoIterator<Item = u64>) -> Self {
        self.role_ids = role_ids.into_iter().collect();
        self
    }
}

/// Composite key a cooldown window is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CooldownKey {
    Global { command: String },
    Guild { command: String, guild_id: u64 },
    User { command: String, user_id: u64 },
}

impl CooldownKey {
    fn derive(scope: CooldownScope, ctx: &CommandContext, command: &str) -> Self {
        match scope {
            CooldownScope::Global => Self::Global {
                command: command.to_string(),
            },
            CooldownScope::Guild => match ctx.guild_id {
                Some(guild_id) => Self::Guild {
                    command: command.to_string(),
                    guild_id,
                },
                None => Self::User {
                    command: command.to_string(),
                    user_id: ctx.user_id,
                },
            },
            CooldownScope::User => Self::User {
                command: command.to_string(),
                user_id: ctx.user_id,
            },
        }
    }
}

/// Thread-safe map from scoped key to absolute expiry instant.
///
/// Reads take the read lock and writes the write lock; every operation is
/// O(1) beyond the lock itself, so concurrent callers on disjoint keys never
/// wait on each other's work.
#[derive(Default)]
pub struct CooldownStore {
    expiries: RwLock<HashMap<CooldownKey, Instant>>,
}

impl CooldownStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining cooldown for the derived key, if one is active.
    ///
    /// Pure read; an expired entry reads as `None` without being removed.
    pub fn try_get_remaining(
        &self,
        scope: CooldownScope,
        ctx: &CommandContext,
        command: &str,
    ) -> Option<Duration> {
        let key = CooldownKey::derive(scope, ctx, command);
        let now = Instant::now();
        let expiries = self.expiries.read();
        expiries.get(&key).and_then(|expiry| {
            if *expiry > now {
                Some(*expiry - now)
            } else {
                None
            }
        })
    }

    /// Record a fresh cooldown window for the derived key.
    ///
    /// Unconditionally overwrites any previous expiry (later writes win;
    /// windows never stack). No-op when `seconds` is zero.
    pub fn set_cooldown(
        &self,
        scope: CooldownScope,
        ctx: &CommandContext,
        command: &str,
        seconds: u32,
    ) {
        if seconds == 0 {
            return;
        }
        let key = CooldownKey::derive(scope, ctx, command);
        let expiry = Instant::now() + Duration::from_secs(u64::from(seconds));
        self.expiries.write().insert(key, expiry);
    }

    /// Drop every entry whose expiry has passed. Returns the count removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut expiries = self.expiries.write();
        let before = expiries.len();
        expiries.retain(|_, expiry| *expiry > now);
        before - expiries.len()
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.expiries.read().len()
    }

    /// Whether the store holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.expiries.read().is_empty()
    }
}
