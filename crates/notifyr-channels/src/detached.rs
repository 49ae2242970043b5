//! Detached background work: best-effort, fire-and-forget.
//!
//! Used for deferred message deletion. The spawned task has no return
//! channel: its outcome is logged and then dropped. The `JoinHandle` is
//! handed back only so callers that care can await completion; dropping
//! it does not cancel the task.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use notifyr_core::NotifyError;

/// Sleep for `delay`, then run `work` once, logging (never returning) its error.
pub fn spawn_after<F>(channel: &'static str, what: String, delay: Duration, work: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), NotifyError>> + Send + 'static,
{
    debug!(channel, task = %what, delay = ?delay, "scheduled detached task");
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match work.await {
            Ok(()) => debug!(channel, task = %what, "detached task finished"),
            Err(e) => warn!(channel, task = %what, error = %e, "detached task failed"),
        }
    })
}
