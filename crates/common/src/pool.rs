use std::{future::Future, sync::Arc};

use {
    tokio::{sync::Semaphore, task::JoinHandle},
    tokio_util::sync::CancellationToken,
};

/// Bounded executor: every spawned future holds a permit while it runs.
///
/// Spawning never blocks the caller; excess work queues on the semaphore.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// A pool running at most `size` futures at once (at least one).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            fut.await
        })
    }

    /// Like [`spawn`](Self::spawn), but `fut` is dropped without running when
    /// `cancel` fires before it gets a permit. Resolves to `None` then.
    pub fn spawn_cancellable<F>(
        &self,
        fut: F,
        cancel: CancellationToken,
    ) -> JoinHandle<Option<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        tokio::spawn(async move {
            let _permit = tokio::select! {
                biased;
                () = cancel.cancelled() => return None,
                permit = semaphore.acquire_owned() => permit.ok(),
            };
            if cancel.is_cancelled() {
                return None;
            }
            Some(fut.await)
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Futures currently holding a permit.
    pub fn busy(&self) -> usize {
        self.size - self.semaphore.available_permits()
    }
}
