//! Fire-and-forget delayed tasks.
//!
//! For one-shot cleanup work (deleting an ephemeral reply after a grace
//! period, say) that should neither block the caller nor surface its failures
//! to it. The task carries its own failure containment, mirroring the job
//! loops: an error is logged under the task's name, a cancellation is not.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::error::JobError;

/// Spawn `task` to run once after `delay`.
///
/// If `cancel` fires before the delay elapses, the task never runs. The
/// returned handle may be dropped; the task keeps running detached.
pub fn spawn_after<F>(
    name: impl Into<String>,
    delay: Duration,
    cancel: CancellationToken,
    task: F,
) -> JoinHandle<()>
where
    F: Future<Output = Result<(), JobError>> + Send + 'static,
{
    let name = name.into();
    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!(task = %name, "delayed task cancelled before firing");
                return;
            }
            () = tokio::time::sleep(delay) => {}
        }
        match task.await {
            Ok(()) | Err(JobError::Cancelled) => {}
            Err(error) => warn!(task = %name, %error, "delayed task failed"),
        }
    })
}
