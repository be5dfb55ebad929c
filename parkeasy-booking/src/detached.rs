use std::future::Future;
use std::time::Duration;

use tokio_util::task::TaskTracker;
use tracing::{debug, warn};
use uuid::Uuid;

pub type TaskResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Fire-and-forget work that must never affect the request that spawned it.
///
/// Each task runs under a bounded timeout; failures and timeouts are logged
/// with the booking id and dropped. `drain` waits for everything in flight,
/// which the binary uses on shutdown and tests use to observe side effects.
#[derive(Clone)]
pub struct DetachedTasks {
    tracker: TaskTracker,
    timeout: Duration,
}

impl DetachedTasks {
    pub fn new(timeout: Duration) -> Self {
        Self { tracker: TaskTracker::new(), timeout }
    }

    pub fn spawn<F>(&self, task: &'static str, booking_id: Uuid, work: F)
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        let timeout = self.timeout;
        self.tracker.spawn(async move {
            match tokio::time::timeout(timeout, work).await {
                Ok(Ok(())) => debug!(task, booking_id = %booking_id, "Detached task finished"),
                Ok(Err(e)) => {
                    warn!(task, booking_id = %booking_id, error = %e, "Detached task failed")
                }
                Err(_) => warn!(
                    task,
                    booking_id = %booking_id,
                    timeout_secs = timeout.as_secs(),
                    "Detached task timed out"
                ),
            }
        });
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every spawned task, then accept new ones again.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
