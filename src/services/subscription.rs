use std::sync::Weak;

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use uuid::Uuid;

use crate::models::job::Job;
use crate::services::engine::Registry;

/// Ordered stream of snapshots for one job.
///
/// Yields every state or progress change after the subscription was taken,
/// ending after the terminal snapshot. Unsubscribes on drop.
pub struct Subscription {
    id: u64,
    job_id: Uuid,
    initial: Job,
    updates: mpsc::UnboundedReceiver<Job>,
    registry: Weak<Registry>,
    active: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: u64,
        initial: Job,
        updates: mpsc::UnboundedReceiver<Job>,
        registry: Weak<Registry>,
    ) -> Self {
        Self {
            id,
            job_id: initial.id,
            initial,
            updates,
            registry,
            active: true,
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Snapshot taken atomically with the subscription.
    pub fn initial(&self) -> &Job {
        &self.initial
    }

    /// Next update, or `None` once the job is terminal or this subscription was dropped.
    pub async fn recv(&mut self) -> Option<Job> {
        if !self.active {
            return None;
        }
        self.updates.recv().await
    }

    /// Non-blocking variant of [`Subscription::recv`].
    pub fn try_recv(&mut self) -> Option<Job> {
        if !self.active {
            return None;
        }
        self.updates.try_recv().ok()
    }

    /// Stop receiving updates. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.updates.close();
        if let Some(registry) = self.registry.upgrade() {
            registry.remove_subscriber(self.job_id, self.id);
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Job> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            let job = subscription.recv().await?;
            Some((job, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Handle for a callback registered with `TranscriptionEngine::on_update`.
///
/// Dropping the handle leaves the callback attached until the job ends.
#[derive(Debug)]
pub struct UpdateHandle {
    task: AbortHandle,
}

impl UpdateHandle {
    pub(crate) fn new(task: AbortHandle) -> Self {
        Self { task }
    }

    /// Detach the callback. Safe to call more than once.
    pub fn unsubscribe(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
