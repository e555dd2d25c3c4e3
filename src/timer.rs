use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// A one-shot timer running on the current tokio runtime.
///
/// Dropping the handle does not cancel the timer.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Runs `on_fire` once `duration` has elapsed.
    pub fn arm<F>(duration: Duration, on_fire: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            sleep(duration).await;
            on_fire();
        });

        TimerHandle { task }
    }

    /// Best-effort cancellation. A fire that already ran, or whose effect is
    /// already queued, is not undone.
    pub fn cancel(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
