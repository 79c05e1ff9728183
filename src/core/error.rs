//! Error types for scheduler and gate operations.

use thiserror::Error;

/// Errors produced while compiling a cron schedule expression.
///
/// These surface at registration/startup time, never while a loop is ticking.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Expression was empty or whitespace-only.
    #[error("cron expression is empty")]
    Empty,
    /// Expression did not have exactly six fields.
    #[error("cron expression must have 6 fields (seconds minute hour day month weekday), found {found}")]
    FieldCount {
        /// Number of whitespace-delimited fields observed.
        found: usize,
    },
    /// Expression was rejected by the evaluator.
    #[error("invalid cron expression: {0}")]
    Invalid(#[from] cron::error::Error),
}

/// A dependency scope could not produce a requested instance.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// No provider registered for the requested type.
    #[error("no provider registered for `{type_name}`")]
    NotRegistered {
        /// Name of the requested type.
        type_name: &'static str,
    },
}

/// Outcome of a single job invocation, as seen by the owning loop.
#[derive(Debug, Error)]
pub enum JobError {
    /// The body observed shutdown and stopped early. Not a failure; never
    /// logged as one.
    #[error("job cancelled")]
    Cancelled,
    /// The job's backing instance could not be resolved from the scope.
    #[error("job resolution failed: {0}")]
    Resolution(#[from] ResolveError),
    /// The body itself failed. Logged and contained; the loop continues.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// A command was turned away by the precondition gate.
///
/// Rejections are expected control flow, not infrastructure errors. The
/// `Display` output is the user-facing message the dispatch layer should send.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateRejection {
    /// The command is still cooling down for this key.
    #[error("Command is on cooldown. Try again in {remaining_secs} seconds.")]
    CooldownActive {
        /// Whole seconds remaining, rounded up; always at least 1.
        remaining_secs: u64,
    },
    /// A non-cooldown precondition failed (missing role, unresolvable check).
    #[error("{reason}")]
    Forbidden {
        /// Non-empty human-readable explanation.
        reason: String,
    },
}

impl From<ResolveError> for GateRejection {
    /// A command whose dependencies cannot be resolved is turned away with a
    /// generic explanation rather than a cooldown message or a crash.
    fn from(_: ResolveError) -> Self {
        Self::Forbidden {
            reason: "This command is currently unavailable.".to_string(),
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
