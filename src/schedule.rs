use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// a unit of work that runs once after a delay unless cancelled first
///
/// Dropping the handle cancels the task, so whoever owns it decides its
/// lifetime.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// run `work` after `delay` on the current tokio runtime
    pub fn schedule<F>(delay: Duration, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        });
        Self {
            handle: Some(handle),
        }
    }

    /// cancel the task if it has not fired yet
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// true while the task is scheduled and has not completed
    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
